use poise::serenity_prelude as serenity;
use std::path::PathBuf;
use thiserror::Error;

/// Everything a command or flow can fail with. Validation and permission
/// failures are reported to the invoking user; the rest end up in the log.
#[derive(Debug, Error)]
pub enum Error {
    #[error("You don't have permission to use this command.")]
    PermissionDenied,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Platform(#[from] serenity::Error),
    #[error("Timed out waiting for a response.")]
    Timeout,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures of the persisted record stores. A corrupt store is surfaced
/// loudly instead of being treated as empty.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("corrupt record store at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode record store for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to access record store at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
