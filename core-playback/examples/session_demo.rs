//! # Playback Session Example
//!
//! Drives a session against a simulated media element and an in-memory book
//! service: load, speed change, a media-key skip, and a short sleep timer.
//!
//! Run with: `cargo run --example session_demo --package core-playback`

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bridge_desktop::HeadlessMediaControls;
use bridge_traits::books::{BookDetail, BookService, Chapter, ProgressUpdate};
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::logging::LogLevel;
use bridge_traits::media::{MediaElementAdapter, MediaEvent, MediaEventStream};
use bridge_traits::media_session::RemoteCommand;
use core_playback::{PlaybackConfig, PlaybackSessionManager, SessionDeps};
use core_runtime::events::{EventBus, EventStream};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use tokio::sync::mpsc;
use tracing::info;

// ============================================================================
// Simulated media element
// ============================================================================

type Subscriber = Arc<Mutex<Option<mpsc::UnboundedSender<MediaEvent>>>>;

/// Advances its clock every 250ms while playing.
struct SimulatedMedia {
    clock: Arc<Mutex<Clock>>,
    subscriber: Subscriber,
}

#[derive(Default)]
struct Clock {
    time: f64,
    rate: f64,
    playing: bool,
}

impl SimulatedMedia {
    fn new() -> Self {
        let subscriber: Subscriber = Arc::new(Mutex::new(None));
        let clock = Arc::new(Mutex::new(Clock {
            rate: 1.0,
            ..Default::default()
        }));

        let ticker_clock = Arc::clone(&clock);
        let ticker_subscriber = Arc::clone(&subscriber);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(250));
            loop {
                interval.tick().await;
                let position = {
                    let mut clock = ticker_clock.lock().unwrap();
                    if !clock.playing {
                        continue;
                    }
                    // Ten seconds of audio per real second, scaled by rate.
                    clock.time += 2.5 * clock.rate;
                    clock.time
                };
                if let Some(events) = ticker_subscriber.lock().unwrap().as_ref() {
                    let _ = events.send(MediaEvent::TimeUpdate { position });
                }
            }
        });

        Self { clock, subscriber }
    }

    fn emit(&self, event: MediaEvent) {
        if let Some(events) = self.subscriber.lock().unwrap().as_ref() {
            let _ = events.send(event);
        }
    }
}

#[async_trait]
impl MediaElementAdapter for SimulatedMedia {
    async fn load(&self, url: &str, start_time: f64) -> Result<()> {
        info!(url, start_time, "media: load");
        self.clock.lock().unwrap().time = start_time;
        self.emit(MediaEvent::DurationKnown { duration: 7200.0 });
        Ok(())
    }

    async fn play(&self) -> Result<()> {
        self.clock.lock().unwrap().playing = true;
        self.emit(MediaEvent::Playing);
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.clock.lock().unwrap().playing = false;
        self.emit(MediaEvent::Paused);
        Ok(())
    }

    async fn seek(&self, position: f64) -> Result<()> {
        self.clock.lock().unwrap().time = position;
        Ok(())
    }

    async fn set_rate(&self, rate: f64) -> Result<()> {
        self.clock.lock().unwrap().rate = rate;
        Ok(())
    }

    async fn unload(&self) -> Result<()> {
        self.clock.lock().unwrap().playing = false;
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.clock.lock().unwrap().time
    }

    async fn subscribe_events(&self) -> Result<Box<dyn MediaEventStream>> {
        let (events, receiver) = mpsc::unbounded_channel();
        *self.subscriber.lock().unwrap() = Some(events);
        Ok(Box::new(ChannelStream(receiver)))
    }
}

struct ChannelStream(mpsc::UnboundedReceiver<MediaEvent>);

#[async_trait]
impl MediaEventStream for ChannelStream {
    async fn next(&mut self) -> Option<MediaEvent> {
        self.0.recv().await
    }
}

// ============================================================================
// In-memory book service
// ============================================================================

struct MemoryBooks;

#[async_trait]
impl BookService for MemoryBooks {
    async fn fetch_book_detail(&self, id: &str) -> Result<BookDetail> {
        Err(BridgeError::NotFound(id.to_string()))
    }

    async fn report_progress(&self, id: &str, update: ProgressUpdate) -> Result<()> {
        info!(
            id,
            current_time = update.current_time,
            is_finished = update.is_finished,
            "book service: progress"
        );
        Ok(())
    }

    fn stream_url(&self, id: &str) -> String {
        format!("memory://{}/stream", id)
    }

    fn cover_url(&self, id: &str) -> String {
        format!("memory://{}/cover", id)
    }

    fn ebook_url(&self, id: &str) -> String {
        format!("memory://{}/ebook", id)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Debug),
    )?;

    let controls = HeadlessMediaControls::new();
    let events = EventBus::default();
    let mut stream = EventStream::new(events.subscribe());
    tokio::spawn(async move {
        while let Ok(event) = stream.recv().await {
            info!(description = event.description(), ?event, "core event");
        }
    });

    let deps = SessionDeps {
        media: Arc::new(SimulatedMedia::new()),
        books: Arc::new(MemoryBooks),
        controls: Some(Arc::new(controls.clone())),
        events,
    };
    // A tenth-of-a-second tick turns a one-minute timer into six seconds.
    let config = PlaybackConfig {
        sleep_tick_ms: 100,
        ..Default::default()
    };
    let manager = PlaybackSessionManager::spawn(deps, config).await?;

    let book = BookDetail::new("li_demo", "The Left Hand of Darkness", "Ursula K. Le Guin")
        .with_duration(7200.0)
        .with_current_time(540.0)
        .with_chapters(vec![
            Chapter::new("0", "A Parade in Erhenrang", 0.0, 600.0),
            Chapter::new("1", "The Place Inside the Blizzard", 600.0, 1500.0),
        ]);

    manager.set_speed(1.5).await?;
    manager.load(book).await?;
    tokio::time::sleep(Duration::from_secs(2)).await;

    controls.send_command(RemoteCommand::SeekForward { offset: None });
    manager.set_sleep_timer(1).await?;

    let mut state = manager.subscribe();
    tokio::time::timeout(Duration::from_secs(10), async {
        while state.changed().await.is_ok() {
            let snapshot = state.borrow_and_update().clone();
            if snapshot.sleep_timer.is_none() && !snapshot.is_playing {
                break;
            }
        }
    })
    .await?;

    let state = manager.state();
    info!(
        status = ?state.status(),
        position = state.current_time,
        chapter = ?state.current_chapter().map(|c| c.title.as_str()),
        "sleep timer elapsed"
    );

    manager.close().await?;
    tokio::time::sleep(Duration::from_millis(100)).await;
    Ok(())
}
