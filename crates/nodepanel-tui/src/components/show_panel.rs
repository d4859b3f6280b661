//! ShowPanel: player status on top, the show directory with a cursor below.
//!
//! The cursor is local view state. Pressing Enter asks the node to select the
//! show under it; the `>` marker only moves once a poll confirms the change.

use ratatui::crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, TableState},
    Frame,
};

use nodepanel_proto::protocol::{PlayCommand, PlaybackStatus, ShowId};
use nodepanel_proto::table::PanelId;

use crate::{
    action::{Action, ComponentId, Pending},
    app_state::AppState,
    component::Component,
    theme::{style_muted, C_BADGE_LIVE, C_MUTED, C_PRIMARY},
    widgets::{
        data_table::data_table,
        pane_chrome::{pane_chrome, Badge},
    },
};

pub struct ShowPanel {
    cursor: usize,
}

impl ShowPanel {
    pub fn new() -> Self {
        Self { cursor: 0 }
    }

    fn shows<'a>(&self, state: &'a AppState) -> &'a [ShowId] {
        state
            .player
            .directory
            .as_ref()
            .map(|d| d.shows.as_slice())
            .unwrap_or(&[])
    }

    /// Show under the cursor, clamped to the current directory.
    pub fn current(&self, state: &AppState) -> Option<ShowId> {
        let shows = self.shows(state);
        shows.get(self.cursor.min(shows.len().saturating_sub(1))).copied()
    }
}

impl Component for ShowPanel {
    fn id(&self) -> ComponentId {
        ComponentId::ShowPanel
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        let count = self.shows(state).len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = self.cursor.min(count.saturating_sub(1)).saturating_sub(1);
                vec![]
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.cursor + 1 < count {
                    self.cursor += 1;
                }
                vec![]
            }
            KeyCode::Enter => self.current(state).map(Action::Select).into_iter().collect(),
            KeyCode::Delete | KeyCode::Char('X') => self
                .current(state)
                .map(|show| Action::Confirm(Pending::Delete(show)))
                .into_iter()
                .collect(),
            KeyCode::Char('p') => vec![Action::Start],
            KeyCode::Char('x') => vec![Action::Stop],
            KeyCode::Char('u') => vec![Action::Resume],
            KeyCode::Char('l') => vec![Action::ToggleLoop],
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(3)])
            .split(area);

        let updated = state.updated_label(PanelId::ShowStatus);
        let badge = updated.as_deref().map(|t| Badge {
            text: t,
            color: C_BADGE_LIVE,
        });
        let block = pane_chrome("player", None, false, badge);
        let inner = block.inner(parts[0]);
        frame.render_widget(block, parts[0]);
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(inner);
        match state.table(PanelId::ShowStatus) {
            Some(table) => frame.render_widget(data_table(table), rows[0]),
            None => frame.render_widget(
                Paragraph::new(Span::styled("  waiting for node…", style_muted())),
                rows[0],
            ),
        }
        let polled = state.player.status.as_ref().map(|s| s.status);
        frame.render_widget(Paragraph::new(command_hints(polled)), rows[1]);

        let block = pane_chrome("shows", Some('3'), focused, None);
        let inner = block.inner(parts[1]);
        frame.render_widget(block, parts[1]);
        match state.table(PanelId::ShowDirectory) {
            Some(table) if !table.rows.is_empty() => {
                self.cursor = self.cursor.min(table.rows.len() - 1);
                let mut table_state = TableState::default().with_selected(Some(self.cursor));
                frame.render_stateful_widget(data_table(table), inner, &mut table_state);
            }
            Some(_) => frame.render_widget(
                Paragraph::new(Span::styled("  no shows on the node", style_muted())),
                inner,
            ),
            None => {}
        }
    }
}

/// Key hints for the player commands, dimmed where the last polled state
/// says the node would likely ignore them. The keys work either way.
fn command_hints(status: Option<PlaybackStatus>) -> Line<'static> {
    const HINTS: [(PlayCommand, &str); 3] = [
        (PlayCommand::Start, "p play"),
        (PlayCommand::Stop, "x stop"),
        (PlayCommand::Resume, "u resume"),
    ];
    let mut spans = Vec::new();
    for (cmd, hint) in HINTS {
        let likely = status.map_or(true, |s| s.accepts(cmd));
        let color = if likely { C_PRIMARY } else { C_MUTED };
        spans.push(Span::styled(format!(" {} ", hint), Style::default().fg(color)));
    }
    spans.push(Span::styled(" l loop", Style::default().fg(C_PRIMARY)));
    Line::from(spans)
}
