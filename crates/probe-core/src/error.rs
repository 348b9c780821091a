//! Error types for the measurement session engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("invalid index")]
    InvalidIndex,

    #[error("index out of range")]
    IndexOutOfRange,

    #[error("no previous measurements found")]
    NoPreviousMeasurements,

    #[error("continuous mode is currently limited to {0} probes")]
    ContinuousLimitExceeded(u32),

    #[error("{0}")]
    InvalidCommand(String),

    /// Rejected by the measurement API. `show_help` marks usage-format
    /// problems (bad parameters) as opposed to quota, auth or server errors.
    #[error("{message}")]
    Api { message: String, show_help: bool },

    #[error("{0}")]
    Render(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProbeError {
    /// Whether the CLI should print command help next to this error.
    pub fn shows_help(&self) -> bool {
        match self {
            ProbeError::InvalidCommand(_) => true,
            ProbeError::Api { show_help, .. } => *show_help,
            _ => false,
        }
    }
}
