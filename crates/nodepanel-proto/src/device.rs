//! Node identity banner and node-level actions (identify, display, RDM,
//! reboot).

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::NodeError;
use crate::protocol::{de_flag, Action, Flag, DISPLAY};
use crate::table::{DisplayTable, PanelId, RenderTarget};
use crate::transport::{get_json, Transport};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub name: String,
    /// Node personality, e.g. "Art-Net 4" or "sACN E1.31".
    #[serde(default)]
    pub node: String,
    #[serde(default)]
    pub output: String,
}

#[derive(Debug, Deserialize)]
struct ListBody {
    #[serde(default)]
    list: DeviceInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceVersion {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub board: String,
    #[serde(default)]
    pub build: BuildInfo,
}

#[derive(Debug, Deserialize)]
struct UptimeBody {
    uptime: u64,
}

/// Body of `display`: `{"active":"Yes"}` while the panel is awake.
#[derive(Debug, Deserialize)]
struct DisplayBody {
    #[serde(default, deserialize_with = "de_flag")]
    active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceBanner {
    pub info: DeviceInfo,
    pub version: DeviceVersion,
    /// `None` when the node has the uptime endpoint disabled.
    pub uptime_secs: Option<u64>,
    /// `Some(true)` when the node's display is awake; `None` on boards
    /// without one.
    pub display_on: Option<bool>,
}

pub async fn fetch_banner<X: Transport>(transport: &X) -> Result<DeviceBanner, NodeError> {
    let (list, version, uptime, display) = tokio::join!(
        get_json::<ListBody, _>(transport, "list"),
        get_json::<DeviceVersion, _>(transport, "version"),
        get_json::<UptimeBody, _>(transport, "uptime"),
        get_json::<DisplayBody, _>(transport, DISPLAY),
    );
    let uptime_secs = match uptime {
        Ok(body) => Some(body.uptime),
        Err(e) => {
            debug!("uptime unavailable: {}", e);
            None
        }
    };
    let display_on = match display {
        Ok(body) => Some(body.active),
        Err(e) => {
            debug!("display state unavailable: {}", e);
            None
        }
    };
    Ok(DeviceBanner {
        info: list?.list,
        version: version?,
        uptime_secs,
        display_on,
    })
}

/// `3d 04:05:06`, or `04:05:06` under a day.
pub fn format_uptime(secs: u64) -> String {
    let days = secs / 86_400;
    let h = (secs % 86_400) / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if days > 0 {
        format!("{}d {:02}:{:02}:{:02}", days, h, m, s)
    } else {
        format!("{:02}:{:02}:{:02}", h, m, s)
    }
}

pub fn render_banner(banner: &DeviceBanner) -> DisplayTable {
    let mut table = DisplayTable::new(
        "Node",
        &["Name", "IP", "Mode", "Board", "Version", "Uptime", "Display"],
    );
    table.rows.push(vec![
        banner.info.name.clone(),
        banner.info.ip.clone(),
        banner.info.node.clone(),
        banner.version.board.clone(),
        banner.version.version.clone(),
        banner
            .uptime_secs
            .map(format_uptime)
            .unwrap_or_else(|| "-".to_string()),
        match banner.display_on {
            Some(true) => "on",
            Some(false) => "sleep",
            None => "-",
        }
        .to_string(),
    ]);
    table
}

pub async fn refresh_banner<X, R>(transport: &X, target: &mut R) -> Result<DeviceBanner, NodeError>
where
    X: Transport,
    R: RenderTarget,
{
    let banner = fetch_banner(transport).await?;
    target.present(PanelId::Device, render_banner(&banner));
    Ok(banner)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeAction {
    Identify(bool),
    /// `true` wakes the display, `false` puts it to sleep.
    Display(bool),
    Rdm(bool),
    Reboot,
}

impl NodeAction {
    pub fn action(self) -> Action {
        match self {
            NodeAction::Identify(on) => Action::Identify(Flag(on)),
            NodeAction::Display(on) => Action::Display(Flag(on)),
            NodeAction::Rdm(on) => Action::Rdm(Flag(on)),
            NodeAction::Reboot => Action::Reboot(Flag(true)),
        }
    }
}

pub async fn send_action<X: Transport>(transport: &X, action: NodeAction) -> Result<(), NodeError> {
    info!("node action {:?}", action);
    transport.post_action(&action.action()).await
}
