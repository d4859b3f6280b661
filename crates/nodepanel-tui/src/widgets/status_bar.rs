//! Status bar: bottom line with mode, last log line and keybindings.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::action::{Pending, Tab};
use crate::theme::{C_ACCENT, C_MODE_CONFIRM, C_MODE_NORMAL, C_MUTED, C_PLAYING, C_SECONDARY};

/// Connection dot followed by the newest log line.
pub fn draw_log_bar(frame: &mut Frame, area: Rect, last_log: Option<&str>, connected: bool) {
    let conn_span = if connected {
        Span::styled("●", Style::default().fg(C_PLAYING))
    } else {
        Span::styled("○", Style::default().fg(C_ACCENT))
    };

    let log_span = Span::styled(last_log.unwrap_or(""), Style::default().fg(C_SECONDARY));

    let line = Line::from(vec![conn_span, Span::raw(" "), log_span]);
    frame.render_widget(Paragraph::new(line), area);
}

pub fn keys_for(tab: Tab) -> &'static str {
    match tab {
        Tab::Show => {
            " ↑↓/jk move  Enter select  p play  x stop  u resume  l loop  Del delete  r refresh  a auto  i/I ident  d/D display  e/E rdm  B reboot  L logs  q quit"
        }
        Tab::Config => {
            " ↑↓/jk move  Enter open  Tab/1-4 tabs  r refresh  a auto  L logs  q quit"
        }
        Tab::Dmx | Tab::Rdm => {
            " Tab/1-4 tabs  r refresh  a auto  i/I ident  d/D display  e/E rdm  B reboot  L logs  q quit"
        }
    }
}

/// Mode label, then either the confirmation prompt or the key hints.
pub fn draw_keys_bar(frame: &mut Frame, area: Rect, tab: Tab, pending: Option<Pending>, auto_polling: bool) {
    let (label, color, hint) = match pending {
        Some(p) => ("CONFIRM", C_MODE_CONFIRM, format!(" {}", p.prompt())),
        None => (
            if auto_polling { "AUTO" } else { "MANUAL" },
            C_MODE_NORMAL,
            keys_for(tab).to_string(),
        ),
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", label),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(hint, Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
