//! Media Element Abstraction
//!
//! Wraps the single playable audio resource owned by the playback session
//! (an HTML audio element, a native player, a test double).
//!
//! Commands are async calls; everything the element reports back arrives as
//! [`MediaEvent`]s on the stream returned by
//! [`subscribe_events`](MediaElementAdapter::subscribe_events).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Notifications emitted by a media element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MediaEvent {
    /// Position changed. May fire several times per second.
    TimeUpdate { position: f64 },
    /// Metadata finished loading and the resource length is known.
    DurationKnown { duration: f64 },
    /// Playback actually started or resumed.
    Playing,
    /// Playback paused, whoever asked for it.
    Paused,
    /// Waiting for data.
    Buffering,
    /// Reached the end of the resource.
    Ended,
    /// The resource could not be loaded or decoded.
    Error { message: String },
}

impl MediaEvent {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            MediaEvent::TimeUpdate { .. } => "timeupdate",
            MediaEvent::DurationKnown { .. } => "durationknown",
            MediaEvent::Playing => "playing",
            MediaEvent::Paused => "paused",
            MediaEvent::Buffering => "buffering",
            MediaEvent::Ended => "ended",
            MediaEvent::Error { .. } => "error",
        }
    }
}

/// Media element trait
///
/// After [`load`](MediaElementAdapter::load) the element must eventually emit
/// exactly one `DurationKnown` or `Error` before normal playback.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::media::{MediaElementAdapter, MediaEvent};
///
/// async fn start(media: &dyn MediaElementAdapter) -> Result<()> {
///     let mut events = media.subscribe_events().await?;
///     media.load("http://localhost:3000/api/abs/items/li_1/stream", 42.0).await?;
///     media.play().await?;
///     while let Some(event) = events.next().await {
///         if event == MediaEvent::Playing {
///             break;
///         }
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait MediaElementAdapter: Send + Sync {
    /// Assign a new source and begin buffering at `start_time` seconds.
    async fn load(&self, url: &str, start_time: f64) -> Result<()>;

    /// Start or resume playback.
    ///
    /// # Errors
    ///
    /// Fails when the platform refuses to play (e.g. autoplay policy).
    async fn play(&self) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    /// Move the playhead to `position` seconds.
    async fn seek(&self, position: f64) -> Result<()>;

    async fn set_rate(&self, rate: f64) -> Result<()>;

    /// Detach the current source.
    async fn unload(&self) -> Result<()>;

    /// Current playhead position in seconds.
    fn current_time(&self) -> f64;

    /// Subscribe to element notifications.
    ///
    /// Each call starts a new stream that only sees events emitted after the
    /// call. The session subscribes again before every `load`; streams handed
    /// out earlier may end or simply stop receiving.
    async fn subscribe_events(&self) -> Result<Box<dyn MediaEventStream>>;
}

/// Stream of media element notifications
#[async_trait]
pub trait MediaEventStream: Send {
    /// Returns `None` when the element has been dropped.
    async fn next(&mut self) -> Option<MediaEvent>;
}
