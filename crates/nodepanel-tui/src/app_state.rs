//! AppState: shared read-only data passed to all components during render/event.
//!
//! Components read this but never mutate it. The App event-loop is the only
//! writer: tables arrive through `RenderTarget::present`.

use std::collections::HashMap;

use chrono::{DateTime, Local};

use nodepanel_proto::playback::PlayerSnapshot;
use nodepanel_proto::table::{DisplayTable, PanelId, RenderTarget};

use crate::action::{Pending, Tab};

const MAX_LOGS: usize = 500;

pub struct AppState {
    // ── Node ───────────────────────────────────────────────────────────────
    pub base_url: String,
    /// False after a transport-level failure, true again on the next success.
    pub connected: bool,
    pub tables: HashMap<PanelId, DisplayTable>,
    pub updated: HashMap<PanelId, DateTime<Local>>,
    /// Player snapshot with the highest `rev` seen. The controller bumps
    /// `rev` when a poll completes, so this is the most recently completed
    /// poll, not the most recently issued one.
    pub player: PlayerSnapshot,
    /// Config block shown in the config panel, re-read on every refresh.
    pub config_open: Option<String>,

    // ── UI mode ─────────────────────────────────────────────────────────────
    pub tab: Tab,
    pub auto_polling: bool,
    pub interval_secs: u64,
    pub pending: Option<Pending>,

    // ── Session ─────────────────────────────────────────────────────────────
    pub logs: Vec<String>,
}

impl AppState {
    pub fn new(base_url: String, auto_polling: bool, interval_secs: u64) -> Self {
        Self {
            base_url,
            connected: false,
            tables: HashMap::new(),
            updated: HashMap::new(),
            player: PlayerSnapshot::default(),
            config_open: None,
            tab: Tab::Dmx,
            auto_polling,
            interval_secs,
            pending: None,
            logs: Vec::new(),
        }
    }

    pub fn table(&self, panel: PanelId) -> Option<&DisplayTable> {
        self.tables.get(&panel)
    }

    /// `HH:MM:SS` of the last successful render of `panel`.
    pub fn updated_label(&self, panel: PanelId) -> Option<String> {
        self.updated
            .get(&panel)
            .map(|t| t.format("%H:%M:%S").to_string())
    }

    /// Returns false when `snapshot` is not newer than the one already held.
    pub fn accept_player(&mut self, snapshot: PlayerSnapshot) -> bool {
        if snapshot.rev <= self.player.rev {
            return false;
        }
        snapshot.present(self);
        self.player = snapshot;
        true
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        let line = format!("{} {}", Local::now().format("%H:%M:%S"), msg.into());
        self.logs.push(line);
        if self.logs.len() > MAX_LOGS {
            self.logs.remove(0);
        }
    }
}

impl RenderTarget for AppState {
    fn present(&mut self, panel: PanelId, table: DisplayTable) {
        self.tables.insert(panel, table);
        self.updated.insert(panel, Local::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodepanel_proto::protocol::{PlaybackStatus, ShowStatus};

    fn snapshot(rev: u64, status: PlaybackStatus) -> PlayerSnapshot {
        PlayerSnapshot {
            rev,
            status: Some(ShowStatus {
                status,
                ..ShowStatus::default()
            }),
            directory: None,
        }
    }

    #[test]
    fn test_late_player_snapshot_is_dropped() {
        let mut state = AppState::new("http://node/json".into(), true, 2);
        assert!(state.accept_player(snapshot(4, PlaybackStatus::Playing)));
        assert!(!state.accept_player(snapshot(3, PlaybackStatus::Paused)));
        assert!(!state.accept_player(snapshot(4, PlaybackStatus::Paused)));

        assert_eq!(state.player.rev, 4);
        assert_eq!(state.table(PanelId::ShowStatus).unwrap().rows[0][1], "Playing");
    }

    #[test]
    fn test_log_is_bounded() {
        let mut state = AppState::new(String::new(), false, 2);
        for i in 0..(MAX_LOGS + 10) {
            state.push_log(format!("line {}", i));
        }
        assert_eq!(state.logs.len(), MAX_LOGS);
        assert!(state.logs[0].ends_with("line 10"));
    }
}
