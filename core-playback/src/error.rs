//! # Playback Error Types

use bridge_traits::error::BridgeError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by the playback session manager API.
///
/// Usage errors (seeking with nothing loaded, an invalid rate) are not
/// errors here; the manager ignores them and logs a warning.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// Playback configuration is invalid.
    #[error("Invalid playback configuration: {0}")]
    InvalidConfig(String),

    /// The session task has shut down and no longer accepts commands.
    #[error("Playback session is no longer running")]
    SessionStopped,

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// Failure categories visible in session state and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The media element could not buffer or play the resource.
    StreamLoadFailed,
    /// `play()` was rejected, e.g. by an autoplay policy.
    PlaybackFailed,
    /// A progress report did not reach the server. Logged only.
    SyncFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::StreamLoadFailed => "stream_load_failed",
            ErrorKind::PlaybackFailed => "playback_failed",
            ErrorKind::SyncFailed => "sync_failed",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The last error recorded in the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl PlaybackFailure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_wire_name_matches_display() {
        for kind in [
            ErrorKind::StreamLoadFailed,
            ErrorKind::PlaybackFailed,
            ErrorKind::SyncFailed,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind));
        }
    }

    #[test]
    fn test_bridge_error_conversion() {
        let error: PlaybackError = BridgeError::NotAvailable("media element".to_string()).into();
        assert!(error.to_string().contains("media element"));
    }
}
