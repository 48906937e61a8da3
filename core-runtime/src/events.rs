//! # Event Bus System
//!
//! Typed domain events broadcast with `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The playback session publishes what happened (a book was loaded, progress
//! reached the server, the sleep timer fired) so that UI layers, analytics or
//! a host shell can react without holding a reference to the session itself.
//!
//! ```text
//! ┌──────────────────┐   emit    ┌───────────┐  subscribe  ┌────────────┐
//! │ Playback session ├──────────>│ EventBus  ├────────────>│ Subscriber │
//! └──────────────────┘           │ (broadcast│             └────────────┘
//! ┌──────────────────┐   emit    │  channel) │  subscribe  ┌────────────┐
//! │ Progress sync    ├──────────>│           ├────────────>│ Subscriber │
//! └──────────────────┘           └───────────┘             └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Playback(PlaybackEvent::Started {
//!         book_id: "li_42".to_string(),
//!     }))
//!     .ok();
//!
//! let event = subscriber.recv().await.unwrap();
//! assert_eq!(event.description(), "Playback started");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber fell behind and missed `n` events.
//!   Keep consuming; the next `recv` returns the oldest retained event.
//! - **`RecvError::Closed`**: every `EventBus` clone was dropped.
//!
//! `emit` fails only when nobody is subscribed. Publishers ignore that error.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast::{
    self,
    error::{RecvError, SendError},
    Receiver,
};

/// Default buffer size for the event bus.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Session and transport events
    Playback(PlaybackEvent),
    /// Progress reporting events
    Sync(SyncEvent),
    /// Sleep timer events
    SleepTimer(SleepTimerEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Sync(e) => e.description(),
            CoreEvent::SleepTimer(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Sync(SyncEvent::ProgressSyncFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Playback(PlaybackEvent::BookLoaded { .. }) => EventSeverity::Info,
            CoreEvent::Playback(PlaybackEvent::Closed { .. }) => EventSeverity::Info,
            CoreEvent::SleepTimer(SleepTimerEvent::Elapsed) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events emitted by the playback session.
///
/// Positions are whole milliseconds so events stay `Eq` and compact on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// A new book became the active session.
    BookLoaded {
        book_id: String,
        title: String,
        /// Position the stream was opened at.
        start_position_ms: u64,
    },
    /// The media element reported that audio is playing.
    Started { book_id: String },
    /// Playback paused.
    Paused { book_id: String, position_ms: u64 },
    /// The playhead was moved by the user or a remote command.
    Seeked { book_id: String, position_ms: u64 },
    /// The chapter containing the playhead changed.
    ChapterChanged {
        book_id: String,
        /// `None` when the playhead is outside every chapter.
        chapter_id: Option<String>,
        title: Option<String>,
    },
    /// The stream reached its end.
    Ended { book_id: String },
    /// The session was closed and the player is idle again.
    Closed { book_id: String },
    /// Loading or starting playback failed.
    Error {
        book_id: Option<String>,
        /// Stable error kind, e.g. `"stream_load_failed"`.
        kind: String,
        message: String,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::BookLoaded { .. } => "Book loaded",
            PlaybackEvent::Started { .. } => "Playback started",
            PlaybackEvent::Paused { .. } => "Playback paused",
            PlaybackEvent::Seeked { .. } => "Playback position changed",
            PlaybackEvent::ChapterChanged { .. } => "Chapter changed",
            PlaybackEvent::Ended { .. } => "Book ended",
            PlaybackEvent::Closed { .. } => "Player closed",
            PlaybackEvent::Error { .. } => "Playback error",
        }
    }
}

// ============================================================================
// Sync Events
// ============================================================================

/// Events about listening progress reported to the book server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SyncEvent {
    /// The server acknowledged a progress report.
    ProgressSynced {
        book_id: String,
        position_ms: u64,
        is_finished: bool,
    },
    /// A progress report did not reach the server. It is not retried.
    ProgressSyncFailed {
        book_id: String,
        position_ms: u64,
        message: String,
    },
}

impl SyncEvent {
    fn description(&self) -> &str {
        match self {
            SyncEvent::ProgressSynced { .. } => "Progress synced",
            SyncEvent::ProgressSyncFailed { .. } => "Progress sync failed",
        }
    }
}

// ============================================================================
// Sleep Timer Events
// ============================================================================

/// Events from the sleep timer countdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SleepTimerEvent {
    /// A countdown was armed, replacing any previous one.
    Armed { seconds: u64 },
    /// The countdown was cancelled before reaching zero.
    Cancelled,
    /// The countdown reached zero and playback was paused.
    Elapsed,
}

impl SleepTimerEvent {
    fn description(&self) -> &str {
        match self {
            SleepTimerEvent::Armed { .. } => "Sleep timer armed",
            SleepTimerEvent::Cancelled => "Sleep timer cancelled",
            SleepTimerEvent::Elapsed => "Sleep timer elapsed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Clones share the same channel. Each `subscribe()` returns an independent
/// receiver that sees every event emitted after it was created.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` with an optional predicate.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let sync_only = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Sync(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events
    /// and `RecvError::Closed` once all senders are gone.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.matches(&event) {
                return Ok(event);
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv). `None` means no event is ready.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }

    fn matches(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn paused(position_ms: u64) -> CoreEvent {
        CoreEvent::Playback(PlaybackEvent::Paused {
            book_id: "li_1".to_string(),
            position_ms,
        })
    }

    #[tokio::test]
    async fn test_event_bus_creation() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_fails() {
        let bus = EventBus::new(10);
        assert!(bus.emit(paused(0)).is_err());
    }

    #[tokio::test]
    async fn test_all_subscribers_receive_event() {
        let bus = EventBus::new(10);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        assert_eq!(bus.emit(paused(1500)).unwrap(), 2);

        assert_eq!(first.recv().await.unwrap(), paused(1500));
        assert_eq!(second.recv().await.unwrap(), paused(1500));
    }

    #[tokio::test]
    async fn test_event_stream_filter() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| matches!(event, CoreEvent::SleepTimer(_)));

        bus.emit(paused(10)).unwrap();
        bus.emit(CoreEvent::SleepTimer(SleepTimerEvent::Armed { seconds: 300 }))
            .unwrap();

        let event = stream.recv().await.unwrap();
        assert_eq!(
            event,
            CoreEvent::SleepTimer(SleepTimerEvent::Armed { seconds: 300 })
        );
        assert!(stream.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_lagging_subscriber() {
        let bus = EventBus::new(2);
        let mut receiver = bus.subscribe();

        for position in 0..5 {
            bus.emit(paused(position)).unwrap();
        }

        match receiver.recv().await {
            Err(RecvError::Lagged(n)) => assert_eq!(n, 3),
            other => panic!("expected lag, got {:?}", other),
        }
    }

    #[test]
    fn test_severity_mapping() {
        let failed = CoreEvent::Sync(SyncEvent::ProgressSyncFailed {
            book_id: "li_1".to_string(),
            position_ms: 0,
            message: "timeout".to_string(),
        });
        let error = CoreEvent::Playback(PlaybackEvent::Error {
            book_id: None,
            kind: "playback_failed".to_string(),
            message: "autoplay blocked".to_string(),
        });

        assert_eq!(failed.severity(), EventSeverity::Warning);
        assert_eq!(error.severity(), EventSeverity::Error);
        assert_eq!(paused(0).severity(), EventSeverity::Debug);
        assert!(EventSeverity::Error > EventSeverity::Warning);
    }

    #[test]
    fn test_event_serialization() {
        let event = CoreEvent::Sync(SyncEvent::ProgressSynced {
            book_id: "li_1".to_string(),
            position_ms: 61_000,
            is_finished: false,
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Sync");
        assert_eq!(json["payload"]["event"], "ProgressSynced");
        assert_eq!(json["payload"]["position_ms"], 61_000);

        let decoded: CoreEvent = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, event);
    }
}
