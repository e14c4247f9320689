use thiserror::Error;

/// Errors surfaced by the API client, the token manager and the stores.
///
/// The categories drive session policy: auth failures clear tokens, transient
/// failures keep them and let the caller retry.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Response error: {0}")]
    Parse(String),
    #[error("Request error: {0}")]
    Serialization(String),
    #[error("Not authenticated: {0}")]
    Unauthorized(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppError {
    /// HTTP status carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 401/403 responses and missing credentials.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, AppError::Unauthorized(_))
            || matches!(self.status(), Some(401 | 403))
    }

    /// Failures worth retrying later without touching the session.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Network(_) | AppError::Timeout(_) => true,
            AppError::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
