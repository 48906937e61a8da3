//! Sleep timer ticker.
//!
//! The countdown itself lives in session state; this module only owns the
//! background task that produces one tick per period. Each armed timer gets
//! a generation number so ticks from a replaced timer can be told apart and
//! dropped.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::trace;

/// Handle to a running ticker. Dropping it stops the ticker.
pub(crate) struct SleepTimerHandle {
    generation: u64,
    cancel: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SleepTimerHandle {
    /// Start ticking every `period`, first tick one period from now.
    ///
    /// `on_tick` returns `false` when the receiver is gone, which ends the
    /// task.
    pub fn spawn<F>(generation: u64, period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut(u64) -> bool + Send + 'static,
    {
        let (cancel, mut cancelled) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);

            loop {
                tokio::select! {
                    _ = &mut cancelled => {
                        trace!(generation, "Sleep timer ticker cancelled");
                        break;
                    }
                    _ = interval.tick() => {
                        if !on_tick(generation) {
                            break;
                        }
                    }
                }
            }
        });

        Self {
            generation,
            cancel: Some(cancel),
            task,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        self.task.abort();
    }
}

impl Drop for SleepTimerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = SleepTimerHandle::spawn(7, Duration::from_secs(1), move |generation| {
            tx.send(generation).is_ok()
        });

        tokio::time::sleep(Duration::from_millis(3500)).await;
        handle.cancel();

        let mut ticks = Vec::new();
        while let Ok(generation) = rx.try_recv() {
            ticks.push(generation);
        }
        assert_eq!(ticks, vec![7, 7, 7]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_ticker() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = SleepTimerHandle::spawn(1, Duration::from_secs(1), move |generation| {
            tx.send(generation).is_ok()
        });
        drop(handle);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }
}
