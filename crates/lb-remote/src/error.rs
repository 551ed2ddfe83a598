//! Remote client error types (§4.3, §9 error taxonomy).

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Retriable -- the outbox keeps the row and the worker backs off (§4.4).
    #[error("network error: {0}")]
    Network(String),

    /// Fatal -- commands exit with guidance to run `auth`.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The Remote rejected the request despite passing local validation;
    /// surfaces to the outbox as `last_error` (§9 "RemoteRejection").
    #[error("remote rejected request: {message}")]
    Rejected { message: String },

    #[error("unexpected response shape: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, RemoteError>;

impl RemoteError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

impl From<ureq::Error> for RemoteError {
    fn from(err: ureq::Error) -> Self {
        match &err {
            ureq::Error::StatusCode(401) | ureq::Error::StatusCode(403) => {
                Self::Auth(err.to_string())
            }
            ureq::Error::StatusCode(code) if *code >= 400 && *code < 500 => Self::Rejected {
                message: err.to_string(),
            },
            _ => Self::Network(err.to_string()),
        }
    }
}

impl From<std::io::Error> for RemoteError {
    fn from(err: std::io::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
