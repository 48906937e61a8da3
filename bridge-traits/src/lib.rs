//! # Host Bridge Traits
//!
//! Capabilities the playback core needs from its host, expressed as traits.
//!
//! ## Overview
//!
//! The core never talks to a browser, an OS media framework or a socket
//! directly. Each of those is behind a trait in this crate and injected at
//! construction time, so the same session logic runs against a real audio
//! element, a desktop shim or a test double.
//!
//! ## Traits
//!
//! ### Book server
//! - [`BookService`](books::BookService) - Book details, progress reports, media URLs
//! - [`HttpClient`](http::HttpClient) - Async HTTP transport the book service is built on
//!
//! ### Playback
//! - [`MediaElementAdapter`](media::MediaElementAdapter) - The single playable audio resource
//! - [`SystemMediaControls`](media_session::SystemMediaControls) - OS "now playing" integration
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ HTTP, headless media controls |
//! | Web      | host application    | 📋 Planned |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform errors into the closest variant and keep the
//! message actionable.
//!
//! ## Thread Safety
//!
//! Every trait requires `Send + Sync` so implementations can be shared across
//! the session task and its helpers behind `Arc`.

pub mod books;
pub mod error;
pub mod http;
pub mod logging;
pub mod media;
pub mod media_session;

pub use error::BridgeError;

// Re-export commonly used types
pub use books::{BookDetail, BookService, Chapter, ProgressUpdate};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use logging::{LogEntry, LogLevel, LoggerSink};
pub use media::{MediaElementAdapter, MediaEvent, MediaEventStream};
pub use media_session::{
    Artwork, MediaPlaybackState, NowPlayingMetadata, RemoteCommand, RemoteCommandStream,
    SystemMediaControls,
};
