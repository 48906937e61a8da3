//! Error types for the AudioBookShelf provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// AudioBookShelf provider errors
#[derive(Error, Debug)]
pub enum AbsError {
    /// The backend session is missing or expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The library item does not exist
    #[error("Library item not found: {item_id}")]
    NotFound { item_id: String },

    /// The backend could not reach the AudioBookShelf server (HTTP 502)
    #[error("Could not reach AudioBookShelf: {0}")]
    Upstream(String),

    /// The backend is temporarily unavailable (HTTP 503)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Any other non-success status
    #[error("Backend error (status {status}): {message}")]
    Http { status: u16, message: String },

    /// Failed to parse a response body
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// Result type for AudioBookShelf operations
pub type Result<T> = std::result::Result<T, AbsError>;

impl From<AbsError> for BridgeError {
    fn from(error: AbsError) -> Self {
        match error {
            AbsError::Unauthorized(msg) => BridgeError::Unauthorized(msg),
            AbsError::NotFound { item_id } => BridgeError::NotFound(item_id),
            e @ AbsError::Upstream(_) | e @ AbsError::ServiceUnavailable(_) => {
                BridgeError::Network(e.to_string())
            }
            e @ AbsError::Http { .. } | e @ AbsError::ParseError(_) => {
                BridgeError::OperationFailed(e.to_string())
            }
            AbsError::Bridge(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = AbsError::Upstream("connect ECONNREFUSED".to_string());
        assert_eq!(
            error.to_string(),
            "Could not reach AudioBookShelf: connect ECONNREFUSED"
        );
    }

    #[test]
    fn test_error_conversion() {
        let bridge: BridgeError = AbsError::Unauthorized("session expired".to_string()).into();
        assert!(matches!(bridge, BridgeError::Unauthorized(_)));

        let bridge: BridgeError = AbsError::ServiceUnavailable("maintenance".to_string()).into();
        assert!(bridge.is_transient());

        let bridge: BridgeError = AbsError::NotFound {
            item_id: "li_404".to_string(),
        }
        .into();
        assert!(matches!(bridge, BridgeError::NotFound(id) if id == "li_404"));
    }
}
