//! Progress sync policy and reporting.
//!
//! Reports are fire-and-forget: each one runs on its own task, failures are
//! logged and published as [`SyncEvent::ProgressSyncFailed`], and nothing is
//! retried.

use std::sync::Arc;

use bridge_traits::books::{BookService, ProgressUpdate};
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use tokio::sync::oneshot;
use tracing::{debug, warn, Instrument};

use crate::config::PlaybackConfig;
use crate::error::ErrorKind;

/// When to report progress and what to report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncPolicy {
    pub interval_secs: f64,
    pub finished_threshold_secs: f64,
}

impl SyncPolicy {
    pub fn from_config(config: &PlaybackConfig) -> Self {
        Self {
            interval_secs: config.sync_interval_secs,
            finished_threshold_secs: config.finished_threshold_secs,
        }
    }

    /// A book with an unknown duration is never finished.
    pub fn is_finished(&self, current_time: f64, duration: f64) -> bool {
        duration > 0.0 && current_time >= duration - self.finished_threshold_secs
    }

    /// True once the playhead has drifted a full interval from the last
    /// reported position, in either direction.
    pub fn is_due(&self, current_time: f64, last_synced_time: f64) -> bool {
        (current_time - last_synced_time).abs() >= self.interval_secs
    }
}

/// Sends progress reports in the background.
#[derive(Clone)]
pub(crate) struct ProgressReporter {
    books: Arc<dyn BookService>,
    events: EventBus,
}

/// Resolves once the report request has been handed to the book service.
pub(crate) struct SyncTicket {
    issued: oneshot::Receiver<()>,
}

impl SyncTicket {
    pub async fn issued(self) {
        let _ = self.issued.await;
    }
}

impl ProgressReporter {
    pub fn new(books: Arc<dyn BookService>, events: EventBus) -> Self {
        Self { books, events }
    }

    pub fn report(&self, book_id: String, update: ProgressUpdate) -> SyncTicket {
        let (issued_tx, issued) = oneshot::channel();
        let books = Arc::clone(&self.books);
        let events = self.events.clone();
        let span = tracing::debug_span!(
            "progress_sync",
            book_id = %book_id,
            current_time = update.current_time,
            is_finished = update.is_finished
        );

        tokio::spawn(
            async move {
                let _ = issued_tx.send(());
                let position_ms = to_millis(update.current_time);

                let event = match books.report_progress(&book_id, update).await {
                    Ok(()) => {
                        debug!("Progress synced");
                        SyncEvent::ProgressSynced {
                            book_id,
                            position_ms,
                            is_finished: update.is_finished,
                        }
                    }
                    Err(e) => {
                        warn!(kind = %ErrorKind::SyncFailed, error = %e, "Progress sync failed");
                        SyncEvent::ProgressSyncFailed {
                            book_id,
                            position_ms,
                            message: e.to_string(),
                        }
                    }
                };
                let _ = events.emit(CoreEvent::Sync(event));
            }
            .instrument(span),
        );

        SyncTicket { issued }
    }
}

pub(crate) fn to_millis(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    }
}
