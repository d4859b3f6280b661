//! Action enum: user intents produced by key handling.

use nodepanel_proto::device::NodeAction;
use nodepanel_proto::protocol::ShowId;

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    DmxPanel,
    RdmPanel,
    ShowPanel,
    ConfigPanel,
    LogPanel,
}

/// Which tab fills the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Dmx,
    Rdm,
    Show,
    Config,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Dmx, Tab::Rdm, Tab::Show, Tab::Config];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Dmx => "DMX",
            Tab::Rdm => "RDM",
            Tab::Show => "Show",
            Tab::Config => "Config",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Tab::Dmx => Tab::Rdm,
            Tab::Rdm => Tab::Show,
            Tab::Show => Tab::Config,
            Tab::Config => Tab::Dmx,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Tab::Dmx => Tab::Config,
            Tab::Rdm => Tab::Dmx,
            Tab::Show => Tab::Rdm,
            Tab::Config => Tab::Show,
        }
    }
}

/// Something that needs a `y` before it is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    Reboot,
    Delete(ShowId),
}

impl Pending {
    pub fn prompt(self) -> String {
        match self {
            Pending::Reboot => "reboot the node? y/n".to_string(),
            Pending::Delete(show) => format!("delete show {}? y/n", show),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    // ── Player ───────────────────────────────────────────────────────────────
    Select(ShowId),
    Start,
    Stop,
    Resume,
    ToggleLoop,
    Delete(ShowId),

    // ── Config ───────────────────────────────────────────────────────────────
    /// Read one `.txt` block from the node into the config panel.
    OpenConfig(String),

    // ── Node ─────────────────────────────────────────────────────────────────
    Node(NodeAction),
    Confirm(Pending),
    Cancel,

    // ── Navigation ───────────────────────────────────────────────────────────
    SwitchTab(Tab),
    NextTab,
    PrevTab,

    // ── System ───────────────────────────────────────────────────────────────
    Refresh,
    ToggleAutoPolling,
    ToggleLogs,
    Quit,
}
