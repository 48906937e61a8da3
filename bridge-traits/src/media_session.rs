//! System Media Controls
//!
//! OS-level "now playing" integration: lock screen, media keys, headset
//! buttons. The core pushes metadata and play state out; the platform pushes
//! [`RemoteCommand`]s back in.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Artwork entry for the now-playing card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artwork {
    pub src: String,
    /// e.g. `"512x512"`
    pub sizes: String,
    pub mime_type: String,
}

/// Metadata shown by the system media controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NowPlayingMetadata {
    pub title: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default)]
    pub artwork: Vec<Artwork>,
}

/// Play state mirrored to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaPlaybackState {
    Playing,
    Paused,
    None,
}

/// Commands issued by the platform (media keys, lock screen, headset).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum RemoteCommand {
    Play,
    Pause,
    /// Jump back by `offset` seconds, or the player's default skip.
    SeekBackward { offset: Option<f64> },
    /// Jump ahead by `offset` seconds, or the player's default skip.
    SeekForward { offset: Option<f64> },
    /// Jump to an absolute position in seconds.
    SeekTo { position: f64 },
}

/// System media controls trait
///
/// Implementations must not call back into the player synchronously from
/// `set_metadata`/`set_playback_state`; commands travel through the stream
/// returned by [`subscribe_commands`](SystemMediaControls::subscribe_commands).
#[async_trait]
pub trait SystemMediaControls: Send + Sync {
    /// Replace the now-playing metadata. `None` clears it.
    async fn set_metadata(&self, metadata: Option<NowPlayingMetadata>) -> Result<()>;

    async fn set_playback_state(&self, state: MediaPlaybackState) -> Result<()>;

    /// Subscribe to remote commands.
    async fn subscribe_commands(&self) -> Result<Box<dyn RemoteCommandStream>>;
}

/// Stream of remote commands
#[async_trait]
pub trait RemoteCommandStream: Send {
    /// Returns `None` when the controls have been torn down.
    async fn next(&mut self) -> Option<RemoteCommand>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_command_wire_format() {
        let command: RemoteCommand =
            serde_json::from_str(r#"{"action":"seekForward","offset":null}"#).unwrap();
        assert_eq!(command, RemoteCommand::SeekForward { offset: None });

        let command: RemoteCommand =
            serde_json::from_str(r#"{"action":"seekTo","position":120.0}"#).unwrap();
        assert_eq!(command, RemoteCommand::SeekTo { position: 120.0 });
    }

    #[test]
    fn test_playback_state_serializes_lowercase() {
        let json = serde_json::to_string(&MediaPlaybackState::None).unwrap();
        assert_eq!(json, "\"none\"");
    }
}
