//! ConfigPanel: the node's configuration files on the left, the opened one as
//! a key/value table on the right. Read-only.

use ratatui::crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::Span,
    widgets::{Paragraph, TableState},
    Frame,
};

use nodepanel_proto::table::PanelId;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{style_muted, C_BADGE_LIVE},
    widgets::{
        data_table::data_table,
        pane_chrome::{pane_chrome, Badge},
    },
};

pub struct ConfigPanel {
    cursor: usize,
}

impl ConfigPanel {
    pub fn new() -> Self {
        Self { cursor: 0 }
    }

    fn file_count(state: &AppState) -> usize {
        state
            .table(PanelId::ConfigFiles)
            .map_or(0, |t| t.rows.len())
    }

    /// File name under the cursor, clamped to the current listing.
    pub fn current(&self, state: &AppState) -> Option<String> {
        let rows = &state.table(PanelId::ConfigFiles)?.rows;
        rows.get(self.cursor.min(rows.len().saturating_sub(1)))
            .and_then(|row| row.first())
            .cloned()
    }
}

impl Component for ConfigPanel {
    fn id(&self) -> ComponentId {
        ComponentId::ConfigPanel
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        let count = Self::file_count(state);
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
            KeyCode::Enter => self.current(state).map(Action::OpenConfig).into_iter().collect(),
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(area);

        let block = pane_chrome("config files", Some('4'), focused, None);
        let inner = block.inner(cols[0]);
        frame.render_widget(block, cols[0]);
        match state.table(PanelId::ConfigFiles) {
            Some(table) if !table.rows.is_empty() => {
                self.cursor = self.cursor.min(table.rows.len() - 1);
                let mut table_state = TableState::default().with_selected(Some(self.cursor));
                frame.render_stateful_widget(data_table(table), inner, &mut table_state);
            }
            Some(_) => frame.render_widget(
                Paragraph::new(Span::styled("  no config files", style_muted())),
                inner,
            ),
            None => frame.render_widget(
                Paragraph::new(Span::styled("  waiting for node…", style_muted())),
                inner,
            ),
        }

        let updated = state.updated_label(PanelId::ConfigFile);
        let badge = updated.as_deref().map(|t| Badge {
            text: t,
            color: C_BADGE_LIVE,
        });
        let title = state.config_open.as_deref().unwrap_or("settings");
        let block = pane_chrome(title, None, false, badge);
        let inner = block.inner(cols[1]);
        frame.render_widget(block, cols[1]);
        match (state.config_open.as_ref(), state.table(PanelId::ConfigFile)) {
            (Some(open), Some(table)) if table.title == *open => {
                frame.render_widget(data_table(table), inner);
            }
            (Some(_), _) => frame.render_widget(
                Paragraph::new(Span::styled("  loading…", style_muted())),
                inner,
            ),
            (None, _) => frame.render_widget(
                Paragraph::new(Span::styled("  Enter opens a file", style_muted())),
                inner,
            ),
        }
    }
}
