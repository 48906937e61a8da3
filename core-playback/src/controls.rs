//! Bridge between the session and the platform's system media controls.

use std::sync::Arc;

use bridge_traits::books::BookDetail;
use bridge_traits::media_session::{
    Artwork, MediaPlaybackState, NowPlayingMetadata, RemoteCommand, SystemMediaControls,
};
use tracing::warn;

use crate::config::PlaybackConfig;

/// Session operation requested by a remote command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlAction {
    Play,
    Pause,
    /// Relative seek in seconds, negative to go back.
    SeekBy(f64),
    SeekTo(f64),
}

impl ControlAction {
    /// Map a remote command onto a session operation. Missing or unusable
    /// offsets fall back to `default_offset`.
    pub fn from_remote(command: RemoteCommand, default_offset: f64) -> Self {
        let offset = |requested: Option<f64>| match requested {
            Some(offset) if offset.is_finite() && offset > 0.0 => offset,
            _ => default_offset,
        };

        match command {
            RemoteCommand::Play => ControlAction::Play,
            RemoteCommand::Pause => ControlAction::Pause,
            RemoteCommand::SeekBackward { offset: requested } => {
                ControlAction::SeekBy(-offset(requested))
            }
            RemoteCommand::SeekForward { offset: requested } => {
                ControlAction::SeekBy(offset(requested))
            }
            RemoteCommand::SeekTo { position } => ControlAction::SeekTo(position),
        }
    }
}

/// Now-playing card for `book`.
pub fn now_playing_metadata(
    book: &BookDetail,
    cover_url: String,
    config: &PlaybackConfig,
) -> NowPlayingMetadata {
    NowPlayingMetadata {
        title: book.title.clone(),
        artist: book.author.clone(),
        album: book.subtitle.clone(),
        artwork: vec![Artwork {
            src: cover_url,
            sizes: config.artwork_size.clone(),
            mime_type: config.artwork_mime_type.clone(),
        }],
    }
}

/// Optional media controls. Failures are logged and otherwise ignored.
#[derive(Clone, Default)]
pub(crate) struct ControlsLink {
    controls: Option<Arc<dyn SystemMediaControls>>,
}

impl ControlsLink {
    pub fn new(controls: Option<Arc<dyn SystemMediaControls>>) -> Self {
        Self { controls }
    }

    pub async fn set_metadata(&self, metadata: Option<NowPlayingMetadata>) {
        if let Some(controls) = &self.controls {
            if let Err(e) = controls.set_metadata(metadata).await {
                warn!(error = %e, "Failed to update now playing metadata");
            }
        }
    }

    pub async fn set_state(&self, state: MediaPlaybackState) {
        if let Some(controls) = &self.controls {
            if let Err(e) = controls.set_playback_state(state).await {
                warn!(?state, error = %e, "Failed to update media control state");
            }
        }
    }
}
