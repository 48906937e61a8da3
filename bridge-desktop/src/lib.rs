//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux):
//! - `HttpClient` using `reqwest` with a cookie jar
//! - `SystemMediaControls` as an in-process now-playing mirror
//!
//! The media element itself is supplied by the host application.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{HeadlessMediaControls, ReqwestHttpClient};
//! use std::sync::Arc;
//!
//! let http_client = Arc::new(ReqwestHttpClient::new()?);
//! let controls = Arc::new(HeadlessMediaControls::new());
//! ```

mod http;
mod media_controls;

pub use http::ReqwestHttpClient;
pub use media_controls::HeadlessMediaControls;
