//! # Playback Session
//!
//! Client-side manager for a single audiobook playback session.
//!
//! ## Overview
//!
//! This module handles:
//! - Loading a book into the media element and driving play/pause/seek
//! - Reporting listening progress to the book service (on pause, book
//!   switch, close, and every 60 seconds of drift)
//! - A cancellable sleep timer, including "end of chapter"
//! - Chapter derivation from the playhead
//! - Mirroring state to system media controls and accepting their commands
//!
//! ## Usage
//!
//! ```ignore
//! use core_playback::{PlaybackConfig, PlaybackSessionManager, SessionDeps};
//!
//! let manager = PlaybackSessionManager::spawn(deps, PlaybackConfig::default()).await?;
//! manager.load(book).await?;
//! manager.set_sleep_timer(15).await?;
//!
//! let mut state = manager.subscribe();
//! while state.changed().await.is_ok() {
//!     render(&state.borrow());
//! }
//! ```

pub mod chapters;
pub mod config;
pub mod controls;
pub mod error;
pub mod progress;
mod session;
mod sleep_timer;
pub mod state;

pub use config::PlaybackConfig;
pub use error::{ErrorKind, PlaybackError, PlaybackFailure, Result};
pub use session::{PlaybackSessionManager, SessionDeps};
pub use state::{PlayerState, PlayerStatus, SleepTimerState};
