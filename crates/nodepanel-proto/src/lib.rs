//! Client core for the node's JSON control API.
//!
//! Pollers and the playback controller only ever produce plain data; display
//! mutation goes through a [`table::RenderTarget`] supplied by the caller.

pub mod config;
pub mod device;
pub mod error;
pub mod platform;
pub mod playback;
pub mod poller;
pub mod protocol;
pub mod settings;
pub mod table;
pub mod transport;

pub use error::NodeError;
