//! Header: node banner on the first row, tab strip on the second.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Tabs},
    Frame,
};

use nodepanel_proto::table::PanelId;

use crate::action::Tab;
use crate::app_state::AppState;
use crate::theme::{status_color, C_MUTED, C_PRIMARY, C_SECONDARY, C_SEPARATOR};

pub struct Header;

impl Header {
    pub fn draw(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(area);

        frame.render_widget(Paragraph::new(banner_line(state)), rows[0]);

        let titles: Vec<Line> = Tab::ALL
            .iter()
            .enumerate()
            .map(|(i, t)| Line::from(format!("{} {}", i + 1, t.label())))
            .collect();
        let selected = Tab::ALL.iter().position(|t| *t == state.tab).unwrap_or(0);
        let tabs = Tabs::new(titles)
            .select(selected)
            .style(Style::default().fg(C_MUTED))
            .highlight_style(Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD))
            .divider(Span::styled("│", Style::default().fg(C_SEPARATOR)));
        frame.render_widget(tabs, rows[1]);
    }
}

fn banner_line(state: &AppState) -> Line<'static> {
    let sep = || Span::styled("  ", Style::default());
    let mut spans = Vec::new();

    match state.table(PanelId::Device).and_then(|t| t.rows.first()) {
        // Name, IP, Mode, Board, Version, Uptime, Display
        Some(row) if row.len() >= 7 => {
            spans.push(Span::styled(
                format!(" {}", row[0]),
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            ));
            spans.push(sep());
            spans.push(Span::styled(row[1].clone(), Style::default().fg(C_SECONDARY)));
            spans.push(sep());
            spans.push(Span::styled(row[2].clone(), Style::default().fg(C_SECONDARY)));
            spans.push(sep());
            spans.push(Span::styled(
                format!("{} v{}", row[3], row[4]),
                Style::default().fg(C_MUTED),
            ));
            spans.push(sep());
            spans.push(Span::styled(format!("up {}", row[5]), Style::default().fg(C_MUTED)));
            if row[6] != "-" {
                spans.push(sep());
                spans.push(Span::styled(format!("display {}", row[6]), Style::default().fg(C_MUTED)));
            }
        }
        _ => spans.push(Span::styled(
            format!(" {}", state.base_url),
            Style::default().fg(C_MUTED),
        )),
    }

    if let Some(status) = &state.player.status {
        spans.push(sep());
        spans.push(Span::styled(
            status.status.label(),
            Style::default()
                .fg(status_color(status.status))
                .add_modifier(Modifier::BOLD),
        ));
        if let Some(show) = status.show {
            spans.push(Span::styled(format!(" show {}", show), Style::default().fg(C_SECONDARY)));
        }
    }

    Line::from(spans)
}
