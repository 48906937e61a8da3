//! Observable session state.
//!
//! The session manager is the only writer; everyone else reads snapshots or
//! subscribes to changes through a `tokio::sync::watch` receiver.

use bridge_traits::books::{BookDetail, Chapter};
use serde::{Deserialize, Serialize};

use crate::chapters::chapter_at;
use crate::error::PlaybackFailure;

/// An armed sleep timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepTimerState {
    pub seconds_remaining: u64,
}

/// Coarse player status derived from [`PlayerState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    /// No active book.
    Idle,
    /// Waiting for playable audio.
    Loading,
    Playing,
    Paused,
    /// The stream reached its end.
    Ended,
    /// Loading or starting playback failed.
    Errored,
}

/// Snapshot of the playback session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub active_book: Option<BookDetail>,
    pub is_playing: bool,
    /// Seconds, within `[0, duration]` once the duration is known.
    pub current_time: f64,
    /// Seconds, 0 until known.
    pub duration: f64,
    /// Survives book switches and close.
    pub playback_rate: f64,
    pub loading: bool,
    pub last_error: Option<PlaybackFailure>,
    pub sleep_timer: Option<SleepTimerState>,
    pub ended: bool,
}

impl PlayerState {
    pub fn new(playback_rate: f64) -> Self {
        Self {
            active_book: None,
            is_playing: false,
            current_time: 0.0,
            duration: 0.0,
            playback_rate,
            loading: false,
            last_error: None,
            sleep_timer: None,
            ended: false,
        }
    }

    pub fn status(&self) -> PlayerStatus {
        if self.active_book.is_none() {
            PlayerStatus::Idle
        } else if self.last_error.is_some() {
            PlayerStatus::Errored
        } else if self.ended {
            PlayerStatus::Ended
        } else if self.loading {
            PlayerStatus::Loading
        } else if self.is_playing {
            PlayerStatus::Playing
        } else {
            PlayerStatus::Paused
        }
    }

    pub fn active_book_id(&self) -> Option<&str> {
        self.active_book.as_ref().map(|book| book.id.as_str())
    }

    /// Chapter containing the playhead.
    pub fn current_chapter(&self) -> Option<&Chapter> {
        self.active_book
            .as_ref()
            .and_then(|book| chapter_at(&book.chapters, self.current_time))
    }

    /// Seconds left in the current chapter.
    pub fn remaining_in_chapter(&self) -> Option<f64> {
        self.current_chapter()
            .map(|chapter| (chapter.end - self.current_time).max(0.0))
    }

    /// Clamp a position into the playable range.
    ///
    /// Before the duration is known only the lower bound applies.
    pub fn clamp_time(&self, time: f64) -> f64 {
        clamp_position(time, self.duration)
    }
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::new(1.0)
    }
}

pub(crate) fn clamp_position(time: f64, duration: f64) -> f64 {
    let time = if time.is_finite() { time.max(0.0) } else { 0.0 };
    if duration > 0.0 {
        time.min(duration)
    } else {
        time
    }
}
