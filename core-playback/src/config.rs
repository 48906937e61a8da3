//! # Playback Configuration
//!
//! Tunables for the playback session manager.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{PlaybackError, Result};

/// Seconds moved by skip forward/backward and by remote seek commands
/// without an explicit offset.
pub const SKIP_OFFSET_SECS: f64 = 30.0;

/// Playback drift from the last reported position that triggers a sync.
pub const SYNC_INTERVAL_SECS: f64 = 60.0;

/// A book counts as finished once within this many seconds of its end.
pub const FINISHED_THRESHOLD_SECS: f64 = 10.0;

/// Playback session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Offset for skip forward/backward.
    ///
    /// Default: 30 seconds.
    #[serde(default = "default_skip_offset_secs")]
    pub skip_offset_secs: f64,

    /// Drift between the playhead and the last synced position that
    /// triggers an automatic progress report.
    ///
    /// Default: 60 seconds.
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: f64,

    /// Distance from the end at which a book is reported as finished.
    ///
    /// Default: 10 seconds.
    #[serde(default = "default_finished_threshold_secs")]
    pub finished_threshold_secs: f64,

    /// Sleep timer tick period in milliseconds. Each tick removes one second
    /// from the countdown.
    ///
    /// Default: 1000.
    #[serde(default = "default_sleep_tick_ms")]
    pub sleep_tick_ms: u64,

    /// Playback rate used until the user picks one.
    ///
    /// Default: 1.0.
    #[serde(default = "default_playback_rate")]
    pub default_playback_rate: f64,

    /// `sizes` advertised for now-playing artwork.
    #[serde(default = "default_artwork_size")]
    pub artwork_size: String,

    /// MIME type advertised for now-playing artwork.
    #[serde(default = "default_artwork_mime_type")]
    pub artwork_mime_type: String,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            skip_offset_secs: default_skip_offset_secs(),
            sync_interval_secs: default_sync_interval_secs(),
            finished_threshold_secs: default_finished_threshold_secs(),
            sleep_tick_ms: default_sleep_tick_ms(),
            default_playback_rate: default_playback_rate(),
            artwork_size: default_artwork_size(),
            artwork_mime_type: default_artwork_mime_type(),
        }
    }
}

impl PlaybackConfig {
    pub fn sleep_tick(&self) -> Duration {
        Duration::from_millis(self.sleep_tick_ms)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("skip_offset_secs", self.skip_offset_secs),
            ("sync_interval_secs", self.sync_interval_secs),
            ("default_playback_rate", self.default_playback_rate),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(PlaybackError::InvalidConfig(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        if !self.finished_threshold_secs.is_finite() || self.finished_threshold_secs < 0.0 {
            return Err(PlaybackError::InvalidConfig(format!(
                "finished_threshold_secs must not be negative, got {}",
                self.finished_threshold_secs
            )));
        }

        if self.sleep_tick_ms == 0 {
            return Err(PlaybackError::InvalidConfig(
                "sleep_tick_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn default_skip_offset_secs() -> f64 {
    SKIP_OFFSET_SECS
}

fn default_sync_interval_secs() -> f64 {
    SYNC_INTERVAL_SECS
}

fn default_finished_threshold_secs() -> f64 {
    FINISHED_THRESHOLD_SECS
}

fn default_sleep_tick_ms() -> u64 {
    1000
}

fn default_playback_rate() -> f64 {
    1.0
}

fn default_artwork_size() -> String {
    "512x512".to_string()
}

fn default_artwork_mime_type() -> String {
    "image/jpeg".to_string()
}
