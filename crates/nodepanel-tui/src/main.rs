mod action;
mod app;
mod app_state;
mod component;
mod components;
mod theme;
mod widgets;

use std::path::PathBuf;

use clap::Parser;

use nodepanel_proto::config::Config;
use nodepanel_proto::platform;

/// Terminal panel for a networked DMX/RDM lighting node.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Node address (overrides [device] host)
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Node HTTP port (overrides [device] port)
    #[arg(short, long)]
    port: Option<u16>,

    /// Seconds between refreshes (overrides [polling] interval_secs)
    #[arg(short, long)]
    interval: Option<u64>,

    /// Only refresh on `r`
    #[arg(long)]
    no_poll: bool,

    /// Config file to use instead of ~/.config/nodepanel/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.device.host = host.clone();
        }
        if let Some(port) = self.port {
            config.device.port = port;
        }
        if let Some(interval) = self.interval {
            config.polling.interval_secs = interval;
        }
        if self.no_poll {
            config.polling.auto_polling = false;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = platform::log_file();

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but suppress noisy
    // connection-level DEBUG from HTTP client internals (hyper_util, reqwest).
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("nodepanel log: {}", log_path.display());
    tracing::info!("nodepanel starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let loaded = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let mut config = loaded.unwrap_or_else(|e| {
        tracing::warn!("config not loaded, using defaults: {}", e);
        Config::default()
    });
    args.apply(&mut config);
    tracing::info!(
        "node {}:{}, polling {} every {}s, missing ports {:?}",
        config.device.host,
        config.device.port,
        if config.polling.auto_polling { "on" } else { "off" },
        config.polling.interval_secs,
        config.panels.missing_port
    );

    // ── Single-threaded runtime: all node requests run as local tasks ────────
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local = tokio::task::LocalSet::new();
    local.block_on(&runtime, async move { app::App::new(&config)?.run().await })
}
