//! Sync-engine and worker error types.

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("a worker is already running for this repo")]
    AlreadyRunning,

    #[error(transparent)]
    Storage(#[from] lb_storage::StorageError),

    #[error(transparent)]
    Remote(#[from] lb_remote::RemoteError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Jsonl(#[from] lb_core::jsonl::JsonlError),

    /// Raised by read commands' `ensure_fresh` when the Remote is
    /// unreachable; callers degrade to cache-only reads (§9 "Offline
    /// tolerance").
    #[error("remote unreachable: {0}")]
    Offline(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
