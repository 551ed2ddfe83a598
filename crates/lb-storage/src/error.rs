//! Storage error types.

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("database not initialized: {reason}")]
    NotInitialized { reason: String },

    #[error("validation error: {message}")]
    Validation { message: String },

    /// Adding a dependency would create a cycle in the reachability graph
    /// (only `blocks`/`parent-child` edges are checked, §9).
    #[error("adding this dependency would create a cycle")]
    CycleDetected,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("migration {name} failed: {reason}")]
    Migration { name: String, reason: String },

    #[error("query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this is transient -- the caller's operation may succeed on
    /// retry (§7 "Storage"/"Transient network" distinction: this flags only
    /// the storage-layer half).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}
