pub mod config_panel;
pub mod header;
pub mod log_panel;
pub mod show_panel;
pub mod table_panel;
