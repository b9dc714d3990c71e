//! Error type for host and configuration failures.
//!
//! Nothing here reaches the visitor: components log these and degrade.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PageError {
    #[error("storage unavailable")]
    StorageUnavailable,

    #[error("storage access failed: {0}")]
    Storage(String),

    #[error("invalid page configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("unknown clock locale `{0}`")]
    UnknownLocale(String),

    #[error("timer could not be scheduled: {0}")]
    Timer(String),

    #[error("navigation to {href} failed: {reason}")]
    Navigation { href: String, reason: String },

    #[error("playback failed: {0}")]
    Playback(String),
}
