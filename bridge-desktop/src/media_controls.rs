//! In-process system media controls for desktop hosts without an OS
//! now-playing integration.
//!
//! Keeps the latest metadata and play state so a tray icon or terminal UI can
//! render them, and lets the host inject remote commands (global hotkeys,
//! keyboard shortcuts) through [`HeadlessMediaControls::send_command`].

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    media_session::{
        MediaPlaybackState, NowPlayingMetadata, RemoteCommand, RemoteCommandStream,
        SystemMediaControls,
    },
};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};

const COMMAND_BUFFER: usize = 32;

#[derive(Debug)]
struct NowPlaying {
    metadata: Option<NowPlayingMetadata>,
    state: MediaPlaybackState,
}

/// Media controls that live entirely inside the process.
#[derive(Clone)]
pub struct HeadlessMediaControls {
    now_playing: Arc<RwLock<NowPlaying>>,
    commands: broadcast::Sender<RemoteCommand>,
}

impl HeadlessMediaControls {
    pub fn new() -> Self {
        let (commands, _) = broadcast::channel(COMMAND_BUFFER);
        Self {
            now_playing: Arc::new(RwLock::new(NowPlaying {
                metadata: None,
                state: MediaPlaybackState::None,
            })),
            commands,
        }
    }

    /// Deliver a remote command to every subscriber.
    ///
    /// Returns `false` when nobody is listening.
    pub fn send_command(&self, command: RemoteCommand) -> bool {
        match self.commands.send(command) {
            Ok(receivers) => {
                debug!(?command, receivers, "Remote command dispatched");
                true
            }
            Err(_) => {
                warn!(?command, "Remote command dropped: no subscribers");
                false
            }
        }
    }

    pub async fn metadata(&self) -> Option<NowPlayingMetadata> {
        self.now_playing.read().await.metadata.clone()
    }

    pub async fn playback_state(&self) -> MediaPlaybackState {
        self.now_playing.read().await.state
    }
}

impl Default for HeadlessMediaControls {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SystemMediaControls for HeadlessMediaControls {
    async fn set_metadata(&self, metadata: Option<NowPlayingMetadata>) -> Result<()> {
        debug!(
            title = ?metadata.as_ref().map(|m| &m.title),
            "Now playing metadata updated"
        );
        self.now_playing.write().await.metadata = metadata;
        Ok(())
    }

    async fn set_playback_state(&self, state: MediaPlaybackState) -> Result<()> {
        self.now_playing.write().await.state = state;
        Ok(())
    }

    async fn subscribe_commands(&self) -> Result<Box<dyn RemoteCommandStream>> {
        Ok(Box::new(HeadlessCommandStream {
            receiver: self.commands.subscribe(),
        }))
    }
}

struct HeadlessCommandStream {
    receiver: broadcast::Receiver<RemoteCommand>,
}

#[async_trait]
impl RemoteCommandStream for HeadlessCommandStream {
    async fn next(&mut self) -> Option<RemoteCommand> {
        loop {
            match self.receiver.recv().await {
                Ok(command) => return Some(command),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Remote command stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
