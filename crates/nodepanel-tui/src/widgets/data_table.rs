//! Turns a `DisplayTable` into a ratatui `Table`.

use ratatui::{
    layout::Constraint,
    style::Style,
    widgets::{Cell, Row, Table},
};

use nodepanel_proto::table::{DisplayTable, UNKNOWN_CELL};

use crate::theme::{style_default, style_header_row, style_selected_focused, C_UNKNOWN};

/// Column widths: the widest of header and cells, plus one space of padding.
pub fn column_widths(table: &DisplayTable) -> Vec<u16> {
    let mut widths: Vec<usize> = table.header.iter().map(|h| h.chars().count()).collect();
    for row in &table.rows {
        for (i, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            match widths.get_mut(i) {
                Some(w) => *w = (*w).max(len),
                None => widths.push(len),
            }
        }
    }
    widths
        .into_iter()
        .map(|w| u16::try_from(w + 1).unwrap_or(u16::MAX))
        .collect()
}

pub fn data_table(table: &DisplayTable) -> Table<'_> {
    let header = Row::new(table.header.iter().map(|h| Cell::from(h.as_str()))).style(style_header_row());

    let rows = table.rows.iter().map(|row| {
        Row::new(row.iter().map(|cell| {
            let style = if cell == UNKNOWN_CELL {
                Style::default().fg(C_UNKNOWN)
            } else {
                style_default()
            };
            Cell::from(cell.as_str()).style(style)
        }))
    });

    let widths: Vec<Constraint> = column_widths(table)
        .into_iter()
        .map(Constraint::Length)
        .collect();

    Table::new(rows, widths)
        .header(header)
        .column_spacing(2)
        .row_highlight_style(style_selected_focused())
}
