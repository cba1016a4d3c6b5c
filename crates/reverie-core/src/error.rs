//! Error types for Reverie.

use std::time::Duration;

use thiserror::Error;

/// Result type alias using Reverie's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Reverie.
#[derive(Error, Debug)]
pub enum Error {
    // Playback errors
    #[error("Failed to load audio: {0}")]
    LoadFailed(String),

    #[error("Access denied: {requester} cannot play private item {item_id}")]
    AccessDenied { item_id: String, requester: String },

    #[error("Storage backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] HttpError),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    // Generic errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// HTTP-specific errors.
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Request failed with status {status}: {message}")]
    StatusError { status: u16, message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,
}

/// The failure classes a playback request can end in.
///
/// Every [`Error`] folds into exactly one of these so a failed request can be
/// reported with a single notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    LoadFailed,
    AccessDenied,
    BackendUnavailable,
    Timeout,
}

impl Error {
    /// Classify this error into the playback failure taxonomy.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AccessDenied { .. } => ErrorKind::AccessDenied,
            Self::Timeout(_) | Self::Http(HttpError::Timeout) => ErrorKind::Timeout,
            Self::BackendUnavailable(_) | Self::Http(_) | Self::Json(_) => {
                ErrorKind::BackendUnavailable
            }
            Self::LoadFailed(_)
            | Self::Io(_)
            | Self::Url(_)
            | Self::InvalidArgument(_)
            | Self::Config(_)
            | Self::Internal(_) => ErrorKind::LoadFailed,
        }
    }

    /// Returns true if trying again later could succeed.
    ///
    /// Only used to pick notice wording; failed requests are never retried
    /// automatically.
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::BackendUnavailable(_)
                | Self::Timeout(_)
                | Self::Http(
                    HttpError::ConnectionFailed(_)
                        | HttpError::Timeout
                        | HttpError::StatusError {
                            status: 500..=599,
                            ..
                        }
                )
        )
    }
}

impl ErrorKind {
    /// Short user-facing description of the failure.
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::LoadFailed => "This recording could not be played.",
            Self::AccessDenied => "This recording is private.",
            Self::BackendUnavailable => "Couldn't reach the server. Check your connection.",
            Self::Timeout => "The recording took too long to load.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind() {
        assert_eq!(
            Error::AccessDenied {
                item_id: "d1".into(),
                requester: "u2".into()
            }
            .kind(),
            ErrorKind::AccessDenied
        );
        assert_eq!(
            Error::Http(HttpError::Timeout).kind(),
            ErrorKind::Timeout
        );
        assert_eq!(
            Error::Http(HttpError::StatusError {
                status: 404,
                message: "missing".into()
            })
            .kind(),
            ErrorKind::BackendUnavailable
        );
        assert_eq!(
            Error::Io(std::io::Error::other("gone")).kind(),
            ErrorKind::LoadFailed
        );
    }

    #[test]
    fn test_error_transient() {
        assert!(Error::Timeout(Duration::from_secs(10)).is_transient());
        assert!(Error::Http(HttpError::StatusError {
            status: 503,
            message: String::new()
        })
        .is_transient());
        assert!(!Error::Http(HttpError::StatusError {
            status: 403,
            message: String::new()
        })
        .is_transient());
        assert!(!Error::LoadFailed("bad codec".into()).is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = Error::AccessDenied {
            item_id: "d1".into(),
            requester: "u2".into(),
        };
        assert_eq!(
            err.to_string(),
            "Access denied: u2 cannot play private item d1"
        );
    }
}
