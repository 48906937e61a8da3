//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP transport,
//! media element, system media controls) into the playback core. Desktop
//! hosts typically enable the `desktop-shims` feature, which supplies a
//! `reqwest` HTTP client and in-process media controls; other hosts pass
//! every bridge explicitly through [`CoreConfig`].

pub mod error;

pub use error::{CoreError, Result};

pub use core_playback::{PlaybackConfig, PlaybackSessionManager, PlayerState, PlayerStatus};
pub use core_runtime::config::{CoreConfig, CoreConfigBuilder};
pub use core_runtime::events::{CoreEvent, EventBus, EventStream};

use std::sync::Arc;

use bridge_traits::books::{BookDetail, BookService};
use core_playback::SessionDeps;
use provider_abs::AbsBookService;
use tracing::{info, instrument};

#[cfg(feature = "desktop-shims")]
use bridge_traits::media::MediaElementAdapter;

/// Primary façade exposed to host applications.
///
/// Owns the book service client, the event bus and the playback session.
pub struct PlayerService {
    books: Arc<dyn BookService>,
    events: EventBus,
    player: PlaybackSessionManager,
}

impl PlayerService {
    /// Build the book service client and start the playback session.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn new(config: CoreConfig, playback: PlaybackConfig) -> Result<Self> {
        config.validate()?;

        let mut books = AbsBookService::new(Arc::clone(&config.http_client), &config.api_base_url)
            .with_request_timeout(config.request_timeout);
        if let Some(token) = &config.auth_token {
            books = books.with_auth_token(token.clone());
        }
        let books: Arc<dyn BookService> = Arc::new(books);

        let events = EventBus::new(config.event_buffer_size);
        let deps = SessionDeps {
            media: Arc::clone(&config.media_adapter),
            books: Arc::clone(&books),
            controls: config.media_controls.clone(),
            events: events.clone(),
        };
        let player = PlaybackSessionManager::spawn(deps, playback).await?;

        info!(api_base_url = %config.api_base_url, "Player service ready");
        Ok(Self {
            books,
            events,
            player,
        })
    }

    /// Fetch a book's detail without touching the session.
    pub async fn book_detail(&self, id: &str) -> Result<BookDetail> {
        Ok(self.books.fetch_book_detail(id).await?)
    }

    /// Fetch `id` and make it the active book.
    #[instrument(skip(self))]
    pub async fn open_book(&self, id: &str) -> Result<BookDetail> {
        let book = self.books.fetch_book_detail(id).await?;
        self.player.load(book.clone()).await?;
        Ok(book)
    }

    /// The playback session.
    pub fn player(&self) -> &PlaybackSessionManager {
        &self.player
    }

    pub fn books(&self) -> Arc<dyn BookService> {
        Arc::clone(&self.books)
    }

    /// Subscribe to core events emitted after this call.
    pub fn subscribe_events(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    pub fn ebook_url(&self, id: &str) -> String {
        self.books.ebook_url(id)
    }
}

/// Convenience bootstrapper for desktop hosts.
///
/// Uses the default `reqwest` client and in-process media controls; the
/// returned controls handle lets the host inject media-key commands.
///
/// ```no_run
/// # #[cfg(feature = "desktop-shims")]
/// # async fn example(media: std::sync::Arc<dyn bridge_traits::media::MediaElementAdapter>) -> core_service::Result<()> {
/// use core_service::bootstrap_desktop;
///
/// let (service, controls) = bootstrap_desktop("http://localhost:3000/api", media).await?;
/// service.open_book("li_8x2k").await?;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub async fn bootstrap_desktop(
    api_base_url: &str,
    media: Arc<dyn MediaElementAdapter>,
) -> Result<(PlayerService, bridge_desktop::HeadlessMediaControls)> {
    let controls = bridge_desktop::HeadlessMediaControls::new();
    let config = CoreConfig::builder()
        .api_base_url(api_base_url)
        .media_adapter(media)
        .media_controls(Arc::new(controls.clone()))
        .build()?;

    let service = PlayerService::new(config, PlaybackConfig::default()).await?;
    Ok((service, controls))
}
