use derive_more::Display;
use thiserror::Error;

use crate::core::types::TabId;

#[derive(Error, Debug)]
pub enum TabError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Unsupported command: {0}")]
    UnsupportedCommand(String),

    #[error("Tab not found: {0}")]
    NotFound(TabId),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("Another command is still in progress")]
    Busy,

    #[error("Discarded response for stale request {0}")]
    StaleResponse(u64),

    #[error("Command was abandoned")]
    Cancelled,

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Coarse error classification kept in history records and lifecycle state
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    CommandFailed,
    UnsupportedCommand,
    NotFound,
    Timeout,
    Busy,
    Stale,
    Cancelled,
    Internal,
}

impl TabError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TabError::Network(_) => ErrorKind::Network,
            TabError::CommandFailed(_) => ErrorKind::CommandFailed,
            TabError::UnsupportedCommand(_) => ErrorKind::UnsupportedCommand,
            TabError::NotFound(_) => ErrorKind::NotFound,
            TabError::Timeout(_) => ErrorKind::Timeout,
            TabError::Busy => ErrorKind::Busy,
            TabError::StaleResponse(_) => ErrorKind::Stale,
            TabError::Cancelled => ErrorKind::Cancelled,
            TabError::Config(_)
            | TabError::IoError(_)
            | TabError::SerdeError(_)
            | TabError::TomlError(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, TabError>;
