use thiserror::Error;

/// Everything a network-facing operation can fail with.
///
/// None of these are fatal: callers log them and keep the previous display.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("node answered {0}")]
    Status(u16),

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no show status polled yet")]
    NotPolled,

    #[error("show {0} out of range 0..=99")]
    InvalidShow(u32),

    #[error("not a config file name: {0:?}")]
    InvalidConfigName(String),
}

impl NodeError {
    /// True for failures that happened before the node could answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, NodeError::Http(_))
    }
}
