//! TablePanel: one port panel (DMX or RDM) drawn straight from its table.

use ratatui::crossterm::event::KeyEvent;
use ratatui::{layout::Rect, text::Span, widgets::Paragraph, Frame};

use nodepanel_proto::table::PanelId;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{style_muted, C_BADGE_ERR, C_BADGE_LIVE},
    widgets::{
        data_table::data_table,
        pane_chrome::{pane_chrome, Badge},
    },
};

pub struct TablePanel {
    id: ComponentId,
    panel: PanelId,
    title: &'static str,
    number_key: char,
}

impl TablePanel {
    pub fn new(id: ComponentId, panel: PanelId, title: &'static str, number_key: char) -> Self {
        Self {
            id,
            panel,
            title,
            number_key,
        }
    }
}

impl Component for TablePanel {
    fn id(&self) -> ComponentId {
        self.id
    }

    fn handle_key(&mut self, _key: KeyEvent, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let updated = state.updated_label(self.panel);
        let badge = match (&updated, state.connected) {
            (Some(t), true) => Some(Badge {
                text: t.as_str(),
                color: C_BADGE_LIVE,
            }),
            (Some(t), false) => Some(Badge {
                text: t.as_str(),
                color: C_BADGE_ERR,
            }),
            (None, _) => None,
        };
        let block = pane_chrome(self.title, Some(self.number_key), focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        match state.table(self.panel) {
            Some(table) if !table.rows.is_empty() => {
                frame.render_widget(data_table(table), inner);
            }
            Some(_) => {
                frame.render_widget(Paragraph::new(Span::styled("  no ports", style_muted())), inner);
            }
            None => {
                frame.render_widget(
                    Paragraph::new(Span::styled("  waiting for node…", style_muted())),
                    inner,
                );
            }
        }
    }
}
