//! # Playback Session Manager
//!
//! Owns the single playback session: the active book, the media element,
//! the progress-sync cursor and the sleep timer.
//!
//! ## Model
//!
//! All mutation happens on one task. UI calls, media element events, remote
//! commands and sleep timer ticks are queued on the same channel and handled
//! one at a time to completion, so a remote `pause` behaves exactly like a
//! UI `pause` and no locking is needed around session state.
//!
//! State is published through a `watch` channel; events go to the
//! [`EventBus`].
//!
//! Every stream load starts a fresh media event subscription. Events are
//! tagged with the subscription they came from, and anything still queued
//! from an earlier stream is dropped, so a late `timeupdate` or `ended` from
//! the previous book can never be applied to the new one.

use std::sync::Arc;

use bridge_traits::books::{BookDetail, BookService, ProgressUpdate};
use bridge_traits::media::{MediaElementAdapter, MediaEvent, MediaEventStream};
use bridge_traits::media_session::{MediaPlaybackState, RemoteCommandStream, SystemMediaControls};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent, SleepTimerEvent};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace, warn};

use crate::chapters::{chapter_at, seconds_to_chapter_end};
use crate::config::PlaybackConfig;
use crate::controls::{now_playing_metadata, ControlAction, ControlsLink};
use crate::error::{ErrorKind, PlaybackError, PlaybackFailure, Result};
use crate::progress::{to_millis, ProgressReporter, SyncPolicy, SyncTicket};
use crate::sleep_timer::SleepTimerHandle;
use crate::state::{clamp_position, PlayerState, SleepTimerState};

/// Collaborators injected into the session manager.
#[derive(Clone)]
pub struct SessionDeps {
    pub media: Arc<dyn MediaElementAdapter>,
    pub books: Arc<dyn BookService>,
    pub controls: Option<Arc<dyn SystemMediaControls>>,
    pub events: EventBus,
}

#[derive(Debug)]
enum Command {
    Load(BookDetail),
    Play,
    Pause,
    Seek(f64),
    SkipForward,
    SkipBackward,
    SetSpeed(f64),
    SetSleepTimer(u32),
    SetSleepTimerEndOfChapter,
    Close,
    SyncProgress,
    Media { stream: u64, event: MediaEvent },
    Control(ControlAction),
    SleepTick { generation: u64 },
}

struct Envelope {
    command: Command,
    done: Option<oneshot::Sender<()>>,
}

impl Envelope {
    fn notify(command: Command) -> Self {
        Self {
            command,
            done: None,
        }
    }
}

/// Handle to the playback session.
///
/// Every operation is queued and resolves once the session has applied it.
/// Dropping the handle stops the session task.
pub struct PlaybackSessionManager {
    commands: mpsc::UnboundedSender<Envelope>,
    state: watch::Receiver<PlayerState>,
    tasks: Vec<JoinHandle<()>>,
}

impl PlaybackSessionManager {
    /// Start the session task and subscribe to the media element and the
    /// system media controls.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn spawn(deps: SessionDeps, config: PlaybackConfig) -> Result<Self> {
        config.validate()?;

        let media_events = deps.media.subscribe_events().await?;
        let remote_commands = match &deps.controls {
            Some(controls) => match controls.subscribe_commands().await {
                Ok(stream) => Some(stream),
                Err(e) => {
                    warn!(error = %e, "Remote commands unavailable");
                    None
                }
            },
            None => None,
        };

        let (commands, receiver) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(PlayerState::new(config.default_playback_rate));

        let media_pump = MediaPump::spawn(0, media_events, commands.clone());

        let mut tasks = Vec::with_capacity(2);
        if let Some(stream) = remote_commands {
            tasks.push(spawn_remote_pump(
                stream,
                commands.clone(),
                config.skip_offset_secs,
            ));
        }

        let actor = SessionActor {
            policy: SyncPolicy::from_config(&config),
            reporter: ProgressReporter::new(Arc::clone(&deps.books), deps.events.clone()),
            controls: ControlsLink::new(deps.controls),
            media: deps.media,
            books: deps.books,
            events: deps.events,
            config,
            state: state_tx,
            commands: commands.clone(),
            media_pump,
            last_synced_time: 0.0,
            last_chapter_id: None,
            sleep_timer: None,
            next_timer_generation: 0,
        };
        tasks.push(tokio::spawn(actor.run(receiver)));

        info!("Playback session started");
        Ok(Self {
            commands,
            state,
            tasks,
        })
    }

    /// Current state snapshot.
    pub fn state(&self) -> PlayerState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<PlayerState> {
        self.state.clone()
    }

    /// Make `book` the active book and start playing it.
    ///
    /// Loading the book that is already active resumes it instead of
    /// reopening the stream.
    pub async fn load(&self, book: BookDetail) -> Result<()> {
        self.dispatch(Command::Load(book)).await
    }

    pub async fn play(&self) -> Result<()> {
        self.dispatch(Command::Play).await
    }

    /// Pause and report progress immediately.
    pub async fn pause(&self) -> Result<()> {
        self.dispatch(Command::Pause).await
    }

    /// Seek to `time` seconds, clamped to the book.
    pub async fn seek(&self, time: f64) -> Result<()> {
        self.dispatch(Command::Seek(time)).await
    }

    pub async fn skip_forward(&self) -> Result<()> {
        self.dispatch(Command::SkipForward).await
    }

    pub async fn skip_backward(&self) -> Result<()> {
        self.dispatch(Command::SkipBackward).await
    }

    /// Set the playback rate. It persists across book switches and close.
    pub async fn set_speed(&self, rate: f64) -> Result<()> {
        self.dispatch(Command::SetSpeed(rate)).await
    }

    /// Arm a countdown that pauses playback. `0` cancels the timer.
    pub async fn set_sleep_timer(&self, minutes: u32) -> Result<()> {
        self.dispatch(Command::SetSleepTimer(minutes)).await
    }

    /// Arm the sleep timer to fire at the end of the current chapter.
    pub async fn set_sleep_timer_end_of_chapter(&self) -> Result<()> {
        self.dispatch(Command::SetSleepTimerEndOfChapter).await
    }

    /// Pause, report progress, release the stream and go idle.
    pub async fn close(&self) -> Result<()> {
        self.dispatch(Command::Close).await
    }

    /// Report the current position now.
    pub async fn sync_progress(&self) -> Result<()> {
        self.dispatch(Command::SyncProgress).await
    }

    async fn dispatch(&self, command: Command) -> Result<()> {
        let (done, applied) = oneshot::channel();
        self.commands
            .send(Envelope {
                command,
                done: Some(done),
            })
            .map_err(|_| PlaybackError::SessionStopped)?;
        applied.await.map_err(|_| PlaybackError::SessionStopped)
    }
}

impl Drop for PlaybackSessionManager {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Forwards one media event subscription into the session queue.
///
/// Dropping the pump stops forwarding.
struct MediaPump {
    generation: u64,
    task: JoinHandle<()>,
}

impl MediaPump {
    fn spawn(
        generation: u64,
        mut stream: Box<dyn MediaEventStream>,
        commands: mpsc::UnboundedSender<Envelope>,
    ) -> Self {
        let task = tokio::spawn(async move {
            while let Some(event) = stream.next().await {
                let command = Command::Media {
                    stream: generation,
                    event,
                };
                if commands.send(Envelope::notify(command)).is_err() {
                    break;
                }
            }
            debug!(generation, "Media event stream ended");
        });
        Self { generation, task }
    }
}

impl Drop for MediaPump {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn spawn_remote_pump(
    mut stream: Box<dyn RemoteCommandStream>,
    commands: mpsc::UnboundedSender<Envelope>,
    default_offset: f64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(command) = stream.next().await {
            debug!(?command, "Remote command received");
            let action = ControlAction::from_remote(command, default_offset);
            if commands
                .send(Envelope::notify(Command::Control(action)))
                .is_err()
            {
                break;
            }
        }
        debug!("Remote command stream ended");
    })
}

struct SessionActor {
    media: Arc<dyn MediaElementAdapter>,
    books: Arc<dyn BookService>,
    controls: ControlsLink,
    events: EventBus,
    reporter: ProgressReporter,
    policy: SyncPolicy,
    config: PlaybackConfig,
    state: watch::Sender<PlayerState>,
    /// Queue handed to the sleep timer ticker and media pumps.
    commands: mpsc::UnboundedSender<Envelope>,
    /// Subscription for the stream currently loaded.
    media_pump: MediaPump,
    /// Position as of the last issued progress report.
    last_synced_time: f64,
    last_chapter_id: Option<String>,
    sleep_timer: Option<SleepTimerHandle>,
    next_timer_generation: u64,
}

impl SessionActor {
    async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<Envelope>) {
        while let Some(envelope) = receiver.recv().await {
            self.handle(envelope.command).await;
            if let Some(done) = envelope.done {
                let _ = done.send(());
            }
        }
        debug!("Playback session stopped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Load(book) => self.load(book).await,
            Command::Play => self.play().await,
            Command::Pause => self.pause().await,
            Command::Seek(time) => self.seek(time).await,
            Command::SkipForward => self.skip(self.config.skip_offset_secs).await,
            Command::SkipBackward => self.skip(-self.config.skip_offset_secs).await,
            Command::SetSpeed(rate) => self.set_speed(rate).await,
            Command::SetSleepTimer(minutes) => self.set_sleep_timer(minutes),
            Command::SetSleepTimerEndOfChapter => self.set_sleep_timer_end_of_chapter(),
            Command::Close => self.close().await,
            Command::SyncProgress => {
                self.sync_progress();
            }
            Command::Media { stream, event } => {
                if stream == self.media_pump.generation {
                    self.on_media_event(event).await;
                } else {
                    trace!(event = event.name(), stream, "Dropping event from a previous stream");
                }
            }
            Command::Control(action) => self.on_control(action).await,
            Command::SleepTick { generation } => self.on_sleep_tick(generation).await,
        }
    }

    // ------------------------------------------------------------------
    // State helpers
    // ------------------------------------------------------------------

    fn snapshot(&self) -> PlayerState {
        self.state.borrow().clone()
    }

    fn active_book(&self) -> Option<BookDetail> {
        self.state.borrow().active_book.clone()
    }

    fn active_book_id(&self) -> Option<String> {
        self.state.borrow().active_book_id().map(str::to_string)
    }

    fn emit(&self, event: CoreEvent) {
        if self.events.emit(event).is_err() {
            trace!("No event subscribers");
        }
    }

    fn emit_playback(&self, event: PlaybackEvent) {
        self.emit(CoreEvent::Playback(event));
    }

    fn fail(&mut self, kind: ErrorKind, message: String) {
        let book_id = self.active_book_id();
        warn!(book_id = ?book_id, %kind, %message, "Playback error");

        self.state.send_modify(|s| {
            s.last_error = Some(PlaybackFailure::new(kind, message.clone()));
            s.loading = false;
            s.is_playing = false;
        });
        self.emit_playback(PlaybackEvent::Error {
            book_id,
            kind: kind.as_str().to_string(),
            message,
        });
    }

    /// Emit `ChapterChanged` when the playhead crosses a chapter boundary.
    fn track_chapter(&mut self) {
        let (book_id, chapter) = {
            let state = self.state.borrow();
            let Some(book) = state.active_book.as_ref() else {
                return;
            };
            let chapter = chapter_at(&book.chapters, state.current_time)
                .map(|c| (c.id.clone(), c.title.clone()));
            (book.id.clone(), chapter)
        };

        let chapter_id = chapter.as_ref().map(|(id, _)| id.clone());
        if chapter_id == self.last_chapter_id {
            return;
        }

        debug!(book_id = %book_id, chapter_id = ?chapter_id, "Chapter changed");
        self.last_chapter_id = chapter_id.clone();
        self.emit_playback(PlaybackEvent::ChapterChanged {
            book_id,
            chapter_id,
            title: chapter.map(|(_, title)| title),
        });
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    #[instrument(skip(self, book), fields(book_id = %book.id))]
    async fn load(&mut self, book: BookDetail) {
        let current = self.snapshot();

        if current.active_book_id() == Some(book.id.as_str()) {
            if current.last_error.is_some() {
                info!("Reopening stream after error");
                self.open(book, current.current_time).await;
            } else if current.ended {
                info!("Restarting finished book");
                self.open(book, 0.0).await;
            } else if !current.is_playing && !current.loading {
                self.play().await;
            } else {
                debug!("Book already playing or loading");
            }
            return;
        }

        if let Some(previous) = current.active_book_id() {
            info!(previous_book_id = %previous, "Switching books");
            if let Err(e) = self.media.pause().await {
                warn!(error = %e, "Failed to pause previous book");
            }
            self.state.send_if_modified(|s| std::mem::replace(&mut s.is_playing, false));
            if let Some(ticket) = self.sync_progress() {
                ticket.issued().await;
            }
        }

        let start = book.current_time;
        self.open(book, start).await;
    }

    /// Point the media element at `book` from `start` and begin playback.
    async fn open(&mut self, book: BookDetail, start: f64) {
        let duration = if book.duration.is_finite() && book.duration > 0.0 {
            book.duration
        } else {
            0.0
        };
        let start = clamp_position(start, duration);
        let url = self.books.stream_url(&book.id);
        let cover_url = if book.cover_url.is_empty() {
            self.books.cover_url(&book.id)
        } else {
            book.cover_url.clone()
        };
        let metadata = now_playing_metadata(&book, cover_url, &self.config);
        let book_id = book.id.clone();
        let title = book.title.clone();

        self.last_chapter_id = None;
        self.last_synced_time = start;
        self.state.send_modify(|s| {
            s.active_book = Some(book);
            s.is_playing = false;
            s.current_time = start;
            s.duration = duration;
            s.loading = true;
            s.last_error = None;
            s.ended = false;
        });

        if let Err(e) = self.restart_media_events().await {
            self.fail(
                ErrorKind::StreamLoadFailed,
                format!("Media events unavailable: {}", e),
            );
            return;
        }

        debug!(url = %url, start, "Loading stream");
        if let Err(e) = self.media.load(&url, start).await {
            self.fail(ErrorKind::StreamLoadFailed, e.to_string());
            return;
        }

        let rate = self.state.borrow().playback_rate;
        if let Err(e) = self.media.set_rate(rate).await {
            warn!(rate, error = %e, "Failed to apply playback rate");
        }

        self.controls.set_metadata(Some(metadata)).await;
        self.controls.set_state(MediaPlaybackState::Playing).await;

        self.emit_playback(PlaybackEvent::BookLoaded {
            book_id,
            title,
            start_position_ms: to_millis(start),
        });
        self.track_chapter();

        self.play().await;
    }

    /// Replace the media event subscription. Events already queued from the
    /// old one no longer match the current generation.
    async fn restart_media_events(&mut self) -> bridge_traits::error::Result<()> {
        let stream = self.media.subscribe_events().await?;
        let generation = self.media_pump.generation + 1;
        self.media_pump = MediaPump::spawn(generation, stream, self.commands.clone());
        trace!(generation, "Media event subscription replaced");
        Ok(())
    }

    async fn play(&mut self) {
        let current = self.snapshot();
        let Some(book_id) = current.active_book_id() else {
            debug!("Play ignored: no active book");
            return;
        };
        if current.ended {
            debug!("Play ignored: book ended, load it again to restart");
            return;
        }

        match self.media.play().await {
            // `is_playing` follows the element's `Playing` event.
            Ok(()) => {
                self.state
                    .send_if_modified(|s| s.last_error.take().is_some());
                trace!(book_id = %book_id, "Play issued");
            }
            Err(e) => self.fail(ErrorKind::PlaybackFailed, e.to_string()),
        }
    }

    async fn pause(&mut self) {
        let Some(book_id) = self.active_book_id() else {
            debug!("Pause ignored: no active book");
            return;
        };

        if let Err(e) = self.media.pause().await {
            warn!(error = %e, "Media element failed to pause");
        }
        self.state.send_if_modified(|s| std::mem::replace(&mut s.is_playing, false));
        self.controls.set_state(MediaPlaybackState::Paused).await;

        let position_ms = to_millis(self.state.borrow().current_time);
        self.emit_playback(PlaybackEvent::Paused {
            book_id,
            position_ms,
        });
        self.sync_progress();
    }

    async fn seek(&mut self, time: f64) {
        let Some(book_id) = self.active_book_id() else {
            debug!("Seek ignored: no active book");
            return;
        };
        if !time.is_finite() {
            warn!(time, "Seek ignored: position is not a number");
            return;
        }

        let target = self.state.borrow().clamp_time(time);
        if let Err(e) = self.media.seek(target).await {
            warn!(target, error = %e, "Media element failed to seek");
        }
        self.state.send_if_modified(|s| {
            let changed = s.current_time != target;
            s.current_time = target;
            changed
        });

        self.emit_playback(PlaybackEvent::Seeked {
            book_id,
            position_ms: to_millis(target),
        });
        self.track_chapter();
    }

    async fn skip(&mut self, offset: f64) {
        if self.active_book_id().is_none() {
            return;
        }
        let target = self.state.borrow().current_time + offset;
        self.seek(target).await;
    }

    async fn set_speed(&mut self, rate: f64) {
        if !rate.is_finite() || rate <= 0.0 {
            warn!(rate, "Playback rate ignored: must be a positive number");
            return;
        }

        self.state.send_if_modified(|s| {
            let changed = s.playback_rate != rate;
            s.playback_rate = rate;
            changed
        });
        if let Err(e) = self.media.set_rate(rate).await {
            warn!(rate, error = %e, "Failed to apply playback rate");
        }
    }

    /// Report the media element's current position. Returns `None` when no
    /// book is active.
    fn sync_progress(&mut self) -> Option<SyncTicket> {
        let time = self.media.current_time();
        self.sync_progress_at(time)
    }

    fn sync_progress_at(&mut self, time: f64) -> Option<SyncTicket> {
        let (book_id, duration) = {
            let state = self.state.borrow();
            let book = state.active_book.as_ref()?;
            let duration = if book.duration > 0.0 {
                book.duration
            } else {
                state.duration
            };
            (book.id.clone(), duration)
        };

        let current_time = clamp_position(time, duration);
        let is_finished = self.policy.is_finished(current_time, duration);
        self.last_synced_time = current_time;

        debug!(book_id = %book_id, current_time, is_finished, "Syncing progress");
        Some(self.reporter.report(
            book_id,
            ProgressUpdate {
                current_time,
                is_finished,
            },
        ))
    }

    #[instrument(skip(self))]
    async fn close(&mut self) {
        let closing = self.active_book_id();

        if closing.is_some() {
            if let Err(e) = self.media.pause().await {
                warn!(error = %e, "Media element failed to pause");
            }
            self.state.send_if_modified(|s| std::mem::replace(&mut s.is_playing, false));
            self.sync_progress();
            if let Err(e) = self.media.unload().await {
                warn!(error = %e, "Failed to release stream");
            }
            self.controls.set_metadata(None).await;
            self.controls.set_state(MediaPlaybackState::None).await;
        }

        self.cancel_sleep_timer();

        self.last_synced_time = 0.0;
        self.last_chapter_id = None;
        self.state.send_modify(|s| {
            let rate = s.playback_rate;
            *s = PlayerState::new(rate);
        });

        if let Some(book_id) = closing {
            info!(book_id = %book_id, "Player closed");
            self.emit_playback(PlaybackEvent::Closed { book_id });
        }
    }

    // ------------------------------------------------------------------
    // Sleep timer
    // ------------------------------------------------------------------

    fn set_sleep_timer(&mut self, minutes: u32) {
        if minutes == 0 {
            self.cancel_sleep_timer();
            return;
        }
        self.arm_sleep_timer(u64::from(minutes) * 60);
    }

    fn set_sleep_timer_end_of_chapter(&mut self) {
        let remaining = {
            let state = self.state.borrow();
            state
                .active_book
                .as_ref()
                .and_then(|book| seconds_to_chapter_end(&book.chapters, state.current_time))
        };

        match remaining {
            Some(seconds) if seconds > 0 => self.arm_sleep_timer(seconds),
            _ => debug!("End-of-chapter timer ignored: no chapter at the playhead"),
        }
    }

    fn arm_sleep_timer(&mut self, seconds: u64) {
        if let Some(previous) = self.sleep_timer.take() {
            previous.cancel();
        }

        self.next_timer_generation += 1;
        let commands = self.commands.clone();
        let handle = SleepTimerHandle::spawn(
            self.next_timer_generation,
            self.config.sleep_tick(),
            move |generation| {
                commands
                    .send(Envelope::notify(Command::SleepTick { generation }))
                    .is_ok()
            },
        );
        debug!(seconds, generation = handle.generation(), "Sleep timer armed");
        self.sleep_timer = Some(handle);

        self.state.send_modify(|s| {
            s.sleep_timer = Some(SleepTimerState {
                seconds_remaining: seconds,
            });
        });
        self.emit(CoreEvent::SleepTimer(SleepTimerEvent::Armed { seconds }));
    }

    fn cancel_sleep_timer(&mut self) {
        let Some(handle) = self.sleep_timer.take() else {
            return;
        };
        handle.cancel();
        self.state.send_modify(|s| s.sleep_timer = None);
        debug!("Sleep timer cancelled");
        self.emit(CoreEvent::SleepTimer(SleepTimerEvent::Cancelled));
    }

    async fn on_sleep_tick(&mut self, generation: u64) {
        let current = self.sleep_timer.as_ref().map(SleepTimerHandle::generation);
        if current != Some(generation) {
            trace!(generation, "Stale sleep timer tick");
            return;
        }

        let mut remaining = 0;
        self.state.send_modify(|s| {
            if let Some(timer) = s.sleep_timer.as_mut() {
                timer.seconds_remaining = timer.seconds_remaining.saturating_sub(1);
                remaining = timer.seconds_remaining;
            }
        });
        if remaining > 0 {
            return;
        }

        info!("Sleep timer elapsed");
        self.pause().await;
        if let Some(handle) = self.sleep_timer.take() {
            handle.cancel();
        }
        self.state.send_modify(|s| s.sleep_timer = None);
        self.emit(CoreEvent::SleepTimer(SleepTimerEvent::Elapsed));
    }

    // ------------------------------------------------------------------
    // Inbound events
    // ------------------------------------------------------------------

    async fn on_control(&mut self, action: ControlAction) {
        match action {
            ControlAction::Play => self.play().await,
            ControlAction::Pause => self.pause().await,
            ControlAction::SeekBy(offset) => self.skip(offset).await,
            ControlAction::SeekTo(position) => self.seek(position).await,
        }
    }

    async fn on_media_event(&mut self, event: MediaEvent) {
        let Some(book_id) = self.active_book_id() else {
            trace!(event = event.name(), "Media event ignored: no active book");
            return;
        };

        match event {
            MediaEvent::TimeUpdate { position } => {
                let time = self.state.borrow().clamp_time(position);
                self.state.send_if_modified(|s| {
                    let changed = s.current_time != time;
                    s.current_time = time;
                    changed
                });
                self.track_chapter();

                if self.policy.is_due(time, self.last_synced_time) {
                    self.sync_progress_at(time);
                }
            }
            MediaEvent::DurationKnown { duration } => {
                if !duration.is_finite() || duration <= 0.0 {
                    debug!(duration, "Ignoring unusable duration");
                    return;
                }
                self.state.send_modify(|s| {
                    s.duration = duration;
                    s.current_time = clamp_position(s.current_time, duration);
                });
            }
            MediaEvent::Playing => {
                self.state.send_if_modified(|s| {
                    let changed = !s.is_playing || s.loading || s.ended;
                    s.is_playing = true;
                    s.loading = false;
                    s.ended = false;
                    changed
                });
                self.controls.set_state(MediaPlaybackState::Playing).await;
                self.emit_playback(PlaybackEvent::Started { book_id });
            }
            MediaEvent::Paused => {
                // A pause the session asked for has already been handled.
                if !self.state.borrow().is_playing {
                    return;
                }
                self.state.send_modify(|s| s.is_playing = false);
                self.controls.set_state(MediaPlaybackState::Paused).await;
                let position_ms = to_millis(self.state.borrow().current_time);
                self.emit_playback(PlaybackEvent::Paused {
                    book_id,
                    position_ms,
                });
                self.sync_progress();
            }
            MediaEvent::Buffering => {
                self.state.send_if_modified(|s| !std::mem::replace(&mut s.loading, true));
            }
            MediaEvent::Ended => {
                self.state.send_modify(|s| {
                    s.is_playing = false;
                    s.loading = false;
                    s.ended = true;
                    if s.duration > 0.0 {
                        s.current_time = s.duration;
                    }
                });
                self.controls.set_state(MediaPlaybackState::Paused).await;
                info!(book_id = %book_id, "Book ended");
                self.emit_playback(PlaybackEvent::Ended { book_id });

                let end = self.state.borrow().current_time;
                self.sync_progress_at(end);
            }
            MediaEvent::Error { message } => {
                self.fail(ErrorKind::StreamLoadFailed, message);
            }
        }
    }
}
