//! Table rendering and the render-target seam.
//!
//! Everything here is synchronous and pure: the same rows always produce the
//! same `DisplayTable`. Only a `RenderTarget` mutates what is on screen.

use crate::poller::{PortReading, PortRow};
use crate::protocol::{DmxPortStatus, RdmTod, ShowDirectory, ShowId, ShowStatus};

/// Placeholder cell for a port whose status fetch failed.
pub const UNKNOWN_CELL: &str = "?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelId {
    Device,
    Dmx,
    Rdm,
    ShowStatus,
    ShowDirectory,
    ConfigFiles,
    ConfigFile,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayTable {
    pub title: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DisplayTable {
    pub fn new(title: impl Into<String>, header: &[&str]) -> Self {
        Self {
            title: title.into(),
            header: header.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.header.len()
    }
}

/// Owns display mutation. Pollers and the controller hand finished tables
/// here and never touch the screen themselves.
pub trait RenderTarget {
    fn present(&mut self, panel: PanelId, table: DisplayTable);
}

/// Per-protocol status columns appended after the port identity columns.
pub trait StatusColumns {
    fn columns() -> &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

impl StatusColumns for DmxPortStatus {
    fn columns() -> &'static [&'static str] {
        &["Sent pkts", "Sent slots", "Recv pkts", "Recv slots"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.sent.packets.to_string(),
            self.sent.slots.to_string(),
            self.received.packets.to_string(),
            self.received.slots.to_string(),
        ]
    }
}

impl StatusColumns for RdmTod {
    fn columns() -> &'static [&'static str] {
        &["Devices", "Full", "Incr", "UIDs"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.tod.len().to_string(),
            self.discovery.full.to_string(),
            self.discovery.incremental.to_string(),
            self.tod.join(" "),
        ]
    }
}

pub fn render<S: StatusColumns>(title: &str, rows: &[PortRow<S>]) -> DisplayTable {
    let mut header = vec!["Port", "Direction"];
    header.extend_from_slice(S::columns());
    let mut table = DisplayTable::new(title, &header);

    for row in rows {
        let mut cells = vec![
            row.identity.port.clone(),
            row.identity.direction.label().to_string(),
        ];
        match &row.reading {
            PortReading::Status(status) => cells.extend(status.cells()),
            PortReading::Unknown => {
                cells.extend(S::columns().iter().map(|_| UNKNOWN_CELL.to_string()))
            }
        }
        table.rows.push(cells);
    }
    table
}

pub fn render_show_status(status: &ShowStatus) -> DisplayTable {
    let mut table = DisplayTable::new("Player", &["Show", "Status", "Loop"]);
    table.rows.push(vec![
        status
            .show
            .map(|s| s.to_string())
            .unwrap_or_else(|| "none".to_string()),
        status.status.label().to_string(),
        if status.looping { "on" } else { "off" }.to_string(),
    ]);
    table
}

/// Directory rows in node order, the selected show marked with `>`.
pub fn render_directory(directory: &ShowDirectory, selected: Option<ShowId>) -> DisplayTable {
    let mut table = DisplayTable::new("Shows", &["", "Show"]);
    for show in &directory.shows {
        let marker = if Some(*show) == selected { ">" } else { "" };
        table.rows.push(vec![marker.to_string(), show.to_string()]);
    }
    table
}
