// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::types::EventKind;

#[derive(Error, Debug)]
pub enum CoalesceError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// A kind that has no row in the merge table was handed to `register`.
    /// This is a programming error on the caller's side, not an upstream
    /// protocol violation.
    #[error("event kind {0:?} cannot be registered")]
    UnregistrableKind(EventKind),

    /// `rename` was handed an event without a previous name.
    #[error("rename event carries no previous name")]
    MissingRenameInfo,

    #[error("failed to spawn dispatch worker: {0}")]
    WorkerSpawn(std::io::Error),

    #[error("dispatch worker is no longer running")]
    WorkerStopped,
}

pub type Result<T> = std::result::Result<T, CoalesceError>;
