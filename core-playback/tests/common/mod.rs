//! Test doubles shared by the session integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_desktop::HeadlessMediaControls;
use bridge_traits::books::{BookDetail, BookService, Chapter, ProgressUpdate};
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::media::{MediaElementAdapter, MediaEvent, MediaEventStream};
use bridge_traits::media_session::SystemMediaControls;
use core_playback::{PlaybackConfig, PlaybackSessionManager, SessionDeps};
use core_runtime::events::{CoreEvent, EventBus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::sync::mpsc;

/// Ordered record of calls made on the media element and the book service.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| e.as_str() == entry).count()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.entries().iter().filter(|e| e.starts_with(prefix)).count()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }
}

/// Media element that records every call and echoes the events a browser
/// audio element would fire.
pub struct FakeMedia {
    log: CallLog,
    time: Mutex<f64>,
    /// Latest subscriber; a new subscription replaces it.
    sender: Mutex<Option<mpsc::UnboundedSender<MediaEvent>>>,
    fail_load: AtomicBool,
    fail_play: AtomicBool,
    hold_playing: AtomicBool,
}

impl FakeMedia {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            time: Mutex::new(0.0),
            sender: Mutex::new(None),
            fail_load: AtomicBool::new(false),
            fail_play: AtomicBool::new(false),
            hold_playing: AtomicBool::new(false),
        }
    }

    pub fn emit(&self, event: MediaEvent) {
        if let Some(sender) = self.sender.lock().unwrap().as_ref() {
            let _ = sender.send(event);
        }
    }

    pub fn set_time(&self, time: f64) {
        *self.time.lock().unwrap() = time;
    }

    /// Move the playhead and report it, like a playing element would.
    pub fn advance_to(&self, time: f64) {
        self.set_time(time);
        self.emit(MediaEvent::TimeUpdate { position: time });
    }

    pub fn fail_load(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::SeqCst);
    }

    pub fn fail_play(&self, fail: bool) {
        self.fail_play.store(fail, Ordering::SeqCst);
    }

    /// Accept `play` without firing `Playing`, like an element still buffering.
    pub fn hold_playing(&self, hold: bool) {
        self.hold_playing.store(hold, Ordering::SeqCst);
    }
}

#[async_trait]
impl MediaElementAdapter for FakeMedia {
    async fn load(&self, url: &str, start_time: f64) -> Result<()> {
        self.log.push(format!("load {} @{}", url, start_time));
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(BridgeError::Media("MEDIA_ERR_SRC_NOT_SUPPORTED".to_string()));
        }
        self.set_time(start_time);
        Ok(())
    }

    async fn play(&self) -> Result<()> {
        self.log.push("play".to_string());
        if self.fail_play.load(Ordering::SeqCst) {
            return Err(BridgeError::Media("NotAllowedError".to_string()));
        }
        if !self.hold_playing.load(Ordering::SeqCst) {
            self.emit(MediaEvent::Playing);
        }
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.log.push("pause".to_string());
        self.emit(MediaEvent::Paused);
        Ok(())
    }

    async fn seek(&self, position: f64) -> Result<()> {
        self.log.push(format!("seek {}", position));
        self.set_time(position);
        Ok(())
    }

    async fn set_rate(&self, rate: f64) -> Result<()> {
        self.log.push(format!("rate {}", rate));
        Ok(())
    }

    async fn unload(&self) -> Result<()> {
        self.log.push("unload".to_string());
        Ok(())
    }

    fn current_time(&self) -> f64 {
        *self.time.lock().unwrap()
    }

    async fn subscribe_events(&self) -> Result<Box<dyn MediaEventStream>> {
        let (sender, receiver) = mpsc::unbounded_channel();
        *self.sender.lock().unwrap() = Some(sender);
        Ok(Box::new(FakeEventStream { receiver }))
    }
}

struct FakeEventStream {
    receiver: mpsc::UnboundedReceiver<MediaEvent>,
}

#[async_trait]
impl MediaEventStream for FakeEventStream {
    async fn next(&mut self) -> Option<MediaEvent> {
        self.receiver.recv().await
    }
}

/// Book service that records progress reports.
pub struct FakeBooks {
    log: CallLog,
    reports: Mutex<Vec<(String, ProgressUpdate)>>,
    fail: AtomicBool,
}

impl FakeBooks {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            reports: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn reports(&self) -> Vec<(String, ProgressUpdate)> {
        self.reports.lock().unwrap().clone()
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BookService for FakeBooks {
    async fn fetch_book_detail(&self, id: &str) -> Result<BookDetail> {
        Err(BridgeError::NotFound(id.to_string()))
    }

    async fn report_progress(&self, id: &str, update: ProgressUpdate) -> Result<()> {
        self.log.push(format!(
            "sync {} {} {}",
            id, update.current_time, update.is_finished
        ));
        self.reports.lock().unwrap().push((id.to_string(), update));
        if self.fail.load(Ordering::SeqCst) {
            return Err(BridgeError::Network("connection reset".to_string()));
        }
        Ok(())
    }

    fn stream_url(&self, id: &str) -> String {
        format!("/api/abs/items/{}/stream", id)
    }

    fn cover_url(&self, id: &str) -> String {
        format!("/api/abs/items/{}/cover", id)
    }

    fn ebook_url(&self, id: &str) -> String {
        format!("/api/abs/items/{}/ebook", id)
    }
}

pub struct Harness {
    pub manager: PlaybackSessionManager,
    pub media: Arc<FakeMedia>,
    pub books: Arc<FakeBooks>,
    pub controls: HeadlessMediaControls,
    pub events: EventBus,
    pub log: CallLog,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_config(PlaybackConfig::default()).await
    }

    pub async fn with_config(config: PlaybackConfig) -> Self {
        let log = CallLog::default();
        let media = Arc::new(FakeMedia::new(log.clone()));
        let books = Arc::new(FakeBooks::new(log.clone()));
        let controls = HeadlessMediaControls::new();
        let events = EventBus::new(256);

        let deps = SessionDeps {
            media: media.clone(),
            books: books.clone(),
            controls: Some(Arc::new(controls.clone()) as Arc<dyn SystemMediaControls>),
            events: events.clone(),
        };
        let manager = PlaybackSessionManager::spawn(deps, config)
            .await
            .expect("session starts");

        Self {
            manager,
            media,
            books,
            controls,
            events,
            log,
        }
    }

    /// Load `book` and let the element's `Playing` event arrive.
    pub async fn load(&self, book: BookDetail) {
        self.manager.load(book).await.unwrap();
        settle().await;
    }
}

/// Let queued events, pumps and background reports run.
pub async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

pub fn book(id: &str, duration: f64, current_time: f64) -> BookDetail {
    BookDetail::new(id, format!("Book {}", id), "Ursula K. Le Guin")
        .with_duration(duration)
        .with_current_time(current_time)
}

/// Two chapters covering `[0, 1200)`, in a book 3600 seconds long.
pub fn book_with_chapters(id: &str, current_time: f64) -> BookDetail {
    book(id, 3600.0, current_time).with_chapters(vec![
        Chapter::new("0", "The Shadow", 0.0, 600.0),
        Chapter::new("1", "The Wizard's Isle", 600.0, 1200.0),
    ])
}

pub fn drain(receiver: &mut broadcast::Receiver<CoreEvent>) -> Vec<CoreEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}
