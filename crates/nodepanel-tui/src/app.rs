//! App: component-based event loop.
//!
//! Architecture:
//! - `App` owns the components and `AppState` (read-only data for components).
//! - A `tokio::mpsc` channel carries `AppMessage` events in from local tasks.
//! - Every node request runs in its own `spawn_local` task. Refreshes may
//!   overlap; each one reports back through the channel when it finishes.
//! - The event loop draws a frame, then awaits the next message or timer.

use std::future::Future;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use nodepanel_proto::config::Config;
use nodepanel_proto::device::{refresh_banner, send_action, NodeAction};
use nodepanel_proto::playback::{PlaybackController, PlayerSnapshot};
use nodepanel_proto::poller::{refresh_panel, DmxPanel, MissingPolicy, PortPanel, RdmPanel};
use nodepanel_proto::settings::{refresh_config_directory, refresh_config_file};
use nodepanel_proto::table::{DisplayTable, PanelId, RenderTarget};
use nodepanel_proto::transport::HttpTransport;
use nodepanel_proto::NodeError;

use crate::{
    action::{Action, ComponentId, Pending, Tab},
    app_state::AppState,
    component::Component,
    components::{
        config_panel::ConfigPanel, header::Header, log_panel::LogPanel, show_panel::ShowPanel,
        table_panel::TablePanel,
    },
    widgets::status_bar,
};

type Player = PlaybackController<HttpTransport>;

// ── Internal event bus ────────────────────────────────────────────────────────

pub enum AppMessage {
    Event(Event),
    Table(PanelId, DisplayTable),
    Player(PlayerSnapshot),
    /// A request reached the node and got a usable answer.
    Online,
    Failed(&'static str, NodeError),
    Log(String),
}

/// Forwards presented tables into the event loop.
pub struct ChannelTarget {
    tx: mpsc::Sender<AppMessage>,
}

impl RenderTarget for ChannelTarget {
    fn present(&mut self, panel: PanelId, table: DisplayTable) {
        if self.tx.try_send(AppMessage::Table(panel, table)).is_err() {
            warn!("ui channel full, dropped {:?} table", panel);
        }
    }
}

/// Messages for one finished controller operation: the snapshot first, then
/// the failure if any, so the connection dot ends on the failure.
fn player_messages(
    what: &'static str,
    result: Result<(), NodeError>,
    snapshot: PlayerSnapshot,
) -> Vec<AppMessage> {
    let mut msgs = vec![AppMessage::Player(snapshot)];
    if let Err(e) = result {
        msgs.push(AppMessage::Failed(what, e));
    }
    msgs
}

pub struct App {
    state: AppState,
    transport: HttpTransport,
    player: Rc<Player>,
    missing_port: MissingPolicy,

    header: Header,
    dmx_panel: TablePanel,
    rdm_panel: TablePanel,
    show_panel: ShowPanel,
    config_panel: ConfigPanel,
    log_panel: LogPanel,

    tx: mpsc::Sender<AppMessage>,
    rx: Option<mpsc::Receiver<AppMessage>>,
    should_quit: bool,
}

impl App {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let transport = HttpTransport::new(&config.device.host, config.device.port)?;
        let (tx, rx) = mpsc::channel::<AppMessage>(1024);
        Ok(Self {
            state: AppState::new(
                transport.base_url().to_string(),
                config.polling.auto_polling,
                config.polling.interval_secs.max(1),
            ),
            player: Rc::new(PlaybackController::new(transport.clone())),
            transport,
            missing_port: config.panels.missing_port,
            header: Header,
            dmx_panel: TablePanel::new(ComponentId::DmxPanel, PanelId::Dmx, "dmx ports", '1'),
            rdm_panel: TablePanel::new(ComponentId::RdmPanel, PanelId::Rdm, "rdm devices", '2'),
            show_panel: ShowPanel::new(),
            config_panel: ConfigPanel::new(),
            log_panel: LogPanel::new(),
            tx,
            rx: Some(rx),
            should_quit: false,
        })
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    /// Must be called inside a `LocalSet`: node requests use `spawn_local`.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut rx = self
            .rx
            .take()
            .ok_or_else(|| anyhow::anyhow!("event loop already started"))?;

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        self.state.push_log(format!("nodepanel started, node {}", self.state.base_url));

        // ── Background task: keyboard events ──────────────────────────────────
        let event_tx = self.tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Periodic timers ───────────────────────────────────────────────────
        let mut poll_tick = tokio::time::interval(Duration::from_secs(self.state.interval_secs));
        poll_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        self.refresh_all();
        poll_tick.reset();

        // Redraw at least once a second.
        let mut ui_tick = tokio::time::interval(Duration::from_secs(1));
        ui_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        loop {
            terminal.draw(|f| self.draw(f))?;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    self.handle_message(msg);
                    while let Ok(next) = rx.try_recv() {
                        self.handle_message(next);
                    }
                }

                _ = poll_tick.tick() => {
                    if self.state.auto_polling {
                        self.refresh_all();
                    }
                }

                _ = ui_tick.tick() => {}
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        info!("nodepanel exiting");

        Ok(())
    }

    fn handle_message(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::Event(Event::Key(key)) => {
                if key.kind == KeyEventKind::Release {
                    return;
                }
                for action in self.handle_key(key) {
                    self.apply_action(action);
                }
            }
            AppMessage::Event(_) => {}
            AppMessage::Table(panel, table) => {
                self.state.connected = true;
                self.state.present(panel, table);
            }
            AppMessage::Player(snapshot) => {
                if self.state.accept_player(snapshot) {
                    self.state.connected = true;
                } else {
                    debug!("player snapshot rev {} not newer, kept", self.state.player.rev);
                }
            }
            AppMessage::Online => self.state.connected = true,
            AppMessage::Failed(what, e) => {
                // An HTTP error status still proves the node is reachable.
                self.state.connected = !e.is_transport();
                self.state.push_log(format!("{} failed: {}", what, e));
            }
            AppMessage::Log(line) => self.state.push_log(line),
        }
    }

    // ── Keys ──────────────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if let Some(pending) = self.state.pending {
            return match key.code {
                KeyCode::Char('y') => match pending {
                    Pending::Reboot => vec![Action::Cancel, Action::Node(NodeAction::Reboot)],
                    Pending::Delete(show) => vec![Action::Cancel, Action::Delete(show)],
                },
                _ => vec![Action::Cancel],
            };
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers == KeyModifiers::CONTROL => {
                return vec![Action::Quit]
            }
            KeyCode::Char('q') => return vec![Action::Quit],
            KeyCode::Char('L') => return vec![Action::ToggleLogs],
            KeyCode::Tab => return vec![Action::NextTab],
            KeyCode::BackTab => return vec![Action::PrevTab],
            KeyCode::Char('1') => return vec![Action::SwitchTab(Tab::Dmx)],
            KeyCode::Char('2') => return vec![Action::SwitchTab(Tab::Rdm)],
            KeyCode::Char('3') => return vec![Action::SwitchTab(Tab::Show)],
            KeyCode::Char('4') => return vec![Action::SwitchTab(Tab::Config)],
            KeyCode::Char('r') => return vec![Action::Refresh],
            KeyCode::Char('a') => return vec![Action::ToggleAutoPolling],
            KeyCode::Char('i') => return vec![Action::Node(NodeAction::Identify(true))],
            KeyCode::Char('I') => return vec![Action::Node(NodeAction::Identify(false))],
            KeyCode::Char('d') => return vec![Action::Node(NodeAction::Display(true))],
            KeyCode::Char('D') => return vec![Action::Node(NodeAction::Display(false))],
            KeyCode::Char('e') => return vec![Action::Node(NodeAction::Rdm(true))],
            KeyCode::Char('E') => return vec![Action::Node(NodeAction::Rdm(false))],
            KeyCode::Char('B') => return vec![Action::Confirm(Pending::Reboot)],
            KeyCode::PageUp | KeyCode::PageDown if self.log_panel.expanded => {
                return self.log_panel.handle_key(key, &self.state);
            }
            _ => {}
        }

        let component: &mut dyn Component = match self.state.tab {
            Tab::Dmx => &mut self.dmx_panel,
            Tab::Rdm => &mut self.rdm_panel,
            Tab::Show => &mut self.show_panel,
            Tab::Config => &mut self.config_panel,
        };
        trace!("key {:?} -> {:?}", key.code, component.id());
        component.handle_key(key, &self.state)
    }

    fn apply_action(&mut self, action: Action) {
        match action {
            Action::Select(show) => {
                self.spawn_player("select", move |p| async move { p.select(show).await.map(drop) })
            }
            Action::Start => self.spawn_player("start", |p| async move { p.start().await.map(drop) }),
            Action::Stop => self.spawn_player("stop", |p| async move { p.stop().await.map(drop) }),
            Action::Resume => {
                self.spawn_player("resume", |p| async move { p.resume().await.map(drop) })
            }
            Action::ToggleLoop => {
                self.spawn_player("loop", |p| async move { p.toggle_loop().await.map(drop) })
            }
            Action::Delete(show) => {
                self.spawn_player("delete", move |p| async move { p.delete(show).await.map(drop) })
            }
            Action::OpenConfig(name) => {
                self.spawn_config_file(name.clone());
                self.state.config_open = Some(name);
            }
            Action::Node(node_action) => self.spawn_node_action(node_action),
            Action::Confirm(pending) => self.state.pending = Some(pending),
            Action::Cancel => self.state.pending = None,
            Action::SwitchTab(tab) => self.state.tab = tab,
            Action::NextTab => self.state.tab = self.state.tab.next(),
            Action::PrevTab => self.state.tab = self.state.tab.prev(),
            Action::Refresh => self.refresh_all(),
            Action::ToggleAutoPolling => {
                self.state.auto_polling = !self.state.auto_polling;
                let mode = if self.state.auto_polling { "on" } else { "off" };
                self.state.push_log(format!("auto polling {}", mode));
            }
            Action::ToggleLogs => self.log_panel.toggle(),
            Action::Quit => self.should_quit = true,
        }
    }

    // ── Node requests ─────────────────────────────────────────────────────────

    fn refresh_all(&self) {
        self.spawn_banner();
        self.spawn_ports::<DmxPanel>("dmx refresh");
        self.spawn_ports::<RdmPanel>("rdm refresh");
        self.spawn_player("player refresh", |p| async move { p.refresh().await });
        self.spawn_config_directory();
        if let Some(name) = &self.state.config_open {
            self.spawn_config_file(name.clone());
        }
    }

    fn spawn_config_directory(&self) {
        let transport = self.transport.clone();
        let tx = self.tx.clone();
        tokio::task::spawn_local(async move {
            let mut target = ChannelTarget { tx: tx.clone() };
            if let Err(e) = refresh_config_directory(&transport, &mut target).await {
                let _ = tx.send(AppMessage::Failed("config directory", e)).await;
            }
        });
    }

    fn spawn_config_file(&self, name: String) {
        let transport = self.transport.clone();
        let tx = self.tx.clone();
        tokio::task::spawn_local(async move {
            let mut target = ChannelTarget { tx: tx.clone() };
            if let Err(e) = refresh_config_file(&transport, &name, &mut target).await {
                let _ = tx.send(AppMessage::Failed("config file", e)).await;
            }
        });
    }

    fn spawn_banner(&self) {
        let transport = self.transport.clone();
        let tx = self.tx.clone();
        tokio::task::spawn_local(async move {
            let mut target = ChannelTarget { tx: tx.clone() };
            if let Err(e) = refresh_banner(&transport, &mut target).await {
                let _ = tx.send(AppMessage::Failed("banner", e)).await;
            }
        });
    }

    fn spawn_ports<P: PortPanel + 'static>(&self, what: &'static str) {
        let transport = self.transport.clone();
        let policy = self.missing_port;
        let tx = self.tx.clone();
        tokio::task::spawn_local(async move {
            let mut target = ChannelTarget { tx: tx.clone() };
            let msg = match refresh_panel::<P, _, _>(&transport, policy, &mut target).await {
                Ok(()) => AppMessage::Online,
                Err(e) => AppMessage::Failed(what, e),
            };
            let _ = tx.send(msg).await;
        });
    }

    /// Run one controller operation, then hand the controller's snapshot to
    /// the loop whatever the outcome: a partly failed operation may still
    /// have completed one of its polls.
    fn spawn_player<F, Fut>(&self, what: &'static str, op: F)
    where
        F: FnOnce(Rc<Player>) -> Fut + 'static,
        Fut: Future<Output = Result<(), NodeError>> + 'static,
    {
        let player = Rc::clone(&self.player);
        let tx = self.tx.clone();
        tokio::task::spawn_local(async move {
            let result = op(Rc::clone(&player)).await;
            for msg in player_messages(what, result, player.snapshot().await) {
                let _ = tx.send(msg).await;
            }
        });
    }

    fn spawn_node_action(&self, action: NodeAction) {
        let transport = self.transport.clone();
        let tx = self.tx.clone();
        tokio::task::spawn_local(async move {
            let msg = match send_action(&transport, action).await {
                Ok(()) => AppMessage::Log(format!("{:?} sent", action)),
                Err(e) => AppMessage::Failed("node action", e),
            };
            let _ = tx.send(msg).await;
        });
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        use crate::theme::C_BG;
        use ratatui::widgets::Block;
        let area = frame.area();

        frame.render_widget(
            Block::default().style(ratatui::style::Style::default().bg(C_BG)),
            area,
        );

        // ── Outer layout: header | body | (log) | log line | keys ───────────
        let log_h = if self.log_panel.expanded { 10u16 } else { 0 };
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(log_h),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        self.header.draw(frame, outer[0], &self.state);

        match self.state.tab {
            Tab::Dmx => self.dmx_panel.draw(frame, outer[1], true, &self.state),
            Tab::Rdm => self.rdm_panel.draw(frame, outer[1], true, &self.state),
            Tab::Show => self.show_panel.draw(frame, outer[1], true, &self.state),
            Tab::Config => self.config_panel.draw(frame, outer[1], true, &self.state),
        }

        if self.log_panel.expanded {
            self.log_panel.draw(frame, outer[2], false, &self.state);
        }

        status_bar::draw_log_bar(
            frame,
            outer[3],
            self.state.logs.last().map(String::as_str),
            self.state.connected,
        );
        status_bar::draw_keys_bar(
            frame,
            outer[4],
            self.state.tab,
            self.state.pending,
            self.state.auto_polling,
        );
    }
}
