//! LogPanel: session log, newest last. Hidden until toggled with `L`.

use ratatui::crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Clear, Paragraph, Wrap},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_MUTED, C_SECONDARY},
    widgets::pane_chrome::pane_chrome,
};

pub struct LogPanel {
    pub expanded: bool,
    /// Lines scrolled up from the bottom.
    back: usize,
}

impl LogPanel {
    pub fn new() -> Self {
        Self {
            expanded: false,
            back: 0,
        }
    }

    pub fn toggle(&mut self) {
        self.expanded = !self.expanded;
        self.back = 0;
    }
}

impl Component for LogPanel {
    fn id(&self) -> ComponentId {
        ComponentId::LogPanel
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if !self.expanded {
            return vec![];
        }
        match key.code {
            KeyCode::PageUp => {
                self.back = (self.back + 5).min(state.logs.len().saturating_sub(1));
            }
            KeyCode::PageDown => {
                self.back = self.back.saturating_sub(5);
            }
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        if area.height == 0 {
            return;
        }
        frame.render_widget(Clear, area);

        let block = pane_chrome("log", None, focused, None);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if state.logs.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("  no log entries yet", Style::default().fg(C_MUTED))),
                inner,
            );
            return;
        }

        let height = inner.height as usize;
        let end = state.logs.len().saturating_sub(self.back);
        let start = end.saturating_sub(height);
        let lines: Vec<Line> = state.logs[start..end]
            .iter()
            .map(|msg| {
                Line::from(vec![
                    Span::raw("  "),
                    Span::styled(msg.as_str(), Style::default().fg(C_SECONDARY)),
                ])
            })
            .collect();

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
    }
}
