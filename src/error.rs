//! Error types for the log watcher

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    /// Neither agent carries FIRST_PLAYER=1 although both are known.
    #[error("Turn owner unresolved: neither player {player} nor opponent {opponent} is marked first player")]
    FirstPlayerUnresolved { player: u32, opponent: u32 },

    #[error("Failed to attach log reader to {path}: {source}")]
    AttachFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Entity not found: {0}")]
    EntityNotFound(u32),

    #[error("No active session (call reset first)")]
    NoSession,

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WatchError>;
