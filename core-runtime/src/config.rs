//! # Core Configuration Module
//!
//! Builder-based configuration holding the host bridges and connection
//! settings the player needs.
//!
//! ## Required Dependencies
//!
//! - API base URL of the backend (e.g. `http://localhost:3000/api`)
//! - `MediaElementAdapter` - the audio element the session drives
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `HttpClient` - desktop default: reqwest (`desktop-shims` feature)
//! - `SystemMediaControls` - omitted means no OS now-playing integration
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .api_base_url("http://localhost:3000/api")
//!     .auth_token(session_token)
//!     .media_adapter(Arc::new(MyAudioElement::new()))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! `build()` fails fast with [`Error::Config`] for bad values and
//! [`Error::CapabilityMissing`] when a required bridge is absent and no
//! platform default exists.

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{HttpClient, MediaElementAdapter, SystemMediaControls};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_EVENT_BUFFER_SIZE: usize = 10_000;

/// Core configuration for the player.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Backend API prefix without trailing slash
    pub api_base_url: String,

    /// Session token sent with every backend request
    pub auth_token: Option<String>,

    /// Transport for book service calls
    pub http_client: Arc<dyn HttpClient>,

    /// The single media element owned by the playback session
    pub media_adapter: Arc<dyn MediaElementAdapter>,

    /// OS now-playing integration (optional)
    pub media_controls: Option<Arc<dyn SystemMediaControls>>,

    /// Per-subscriber buffer of the event bus
    pub event_buffer_size: usize,

    /// Timeout applied to book service requests
    pub request_timeout: Duration,
}

impl fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreConfig")
            .field("api_base_url", &self.api_base_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("media_controls", &self.media_controls.is_some())
            .field("event_buffer_size", &self.event_buffer_size)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// This checks:
    /// - The base URL is an absolute http(s) URL
    /// - The event buffer is in `1..=10_000`
    /// - The request timeout is non-zero
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.is_empty() {
            return Err(Error::Config("API base URL cannot be empty".to_string()));
        }

        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://"))
        {
            return Err(Error::Config(format!(
                "API base URL must start with http:// or https://, got '{}'",
                self.api_base_url
            )));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size > MAX_EVENT_BUFFER_SIZE {
            return Err(Error::Config(format!(
                "Event buffer size exceeds maximum of {}",
                MAX_EVENT_BUFFER_SIZE
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn media_adapter_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "MediaElementAdapter".to_string(),
        message: "A media element is required to play audio. \
                 Web: wrap the page's HTMLAudioElement. \
                 Desktop: inject a native player adapter."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::with_timeout(timeout)
        .map_err(|e| Error::Internal(format!("Failed to create default HttpClient: {}", e)))?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required to reach the book server. \
                 Desktop: enable the 'desktop-shims' feature to use the default ReqwestHttpClient. \
                 Web: inject a fetch-based client."
            .to_string(),
    })
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    api_base_url: Option<String>,
    auth_token: Option<String>,
    http_client: Option<Arc<dyn HttpClient>>,
    media_adapter: Option<Arc<dyn MediaElementAdapter>>,
    media_controls: Option<Arc<dyn SystemMediaControls>>,
    event_buffer_size: Option<usize>,
    request_timeout: Option<Duration>,
}

impl CoreConfigBuilder {
    /// Sets the backend API prefix. A trailing slash is removed.
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder().api_base_url("http://localhost:3000/api/");
    /// ```
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.api_base_url = Some(url.trim_end_matches('/').to_string());
        self
    }

    /// Sets the opaque session token issued by the backend.
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the desktop default (reqwest-based) is used when the
    /// `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the media element the playback session drives (required).
    pub fn media_adapter(mut self, adapter: Arc<dyn MediaElementAdapter>) -> Self {
        self.media_adapter = Some(adapter);
        self
    }

    /// Sets the system media controls bridge (optional).
    pub fn media_controls(mut self, controls: Arc<dyn SystemMediaControls>) -> Self {
        self.media_controls = Some(controls);
        self
    }

    /// Sets the event bus buffer size.
    ///
    /// Default: 100
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Sets the timeout for book service requests.
    ///
    /// Default: 30 seconds
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the base URL is missing or any value is invalid
    /// - [`Error::CapabilityMissing`] if the media adapter is missing, or the
    ///   HTTP client is missing without the `desktop-shims` feature
    pub fn build(self) -> Result<CoreConfig> {
        let api_base_url = self.api_base_url.ok_or_else(|| {
            Error::Config("API base URL is required. Use .api_base_url() to set it.".to_string())
        })?;

        let media_adapter = self.media_adapter.ok_or_else(media_adapter_missing_error)?;

        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(request_timeout)?,
        };

        let config = CoreConfig {
            api_base_url,
            auth_token: self.auth_token,
            http_client,
            media_adapter,
            media_controls: self.media_controls,
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            request_timeout,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{HttpRequest, HttpResponse, MediaEventStream};

    struct NullHttpClient;

    #[async_trait]
    impl HttpClient for NullHttpClient {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            unimplemented!()
        }
    }

    struct NullMedia;

    #[async_trait]
    impl MediaElementAdapter for NullMedia {
        async fn load(&self, _url: &str, _start_time: f64) -> BridgeResult<()> {
            Ok(())
        }
        async fn play(&self) -> BridgeResult<()> {
            Ok(())
        }
        async fn pause(&self) -> BridgeResult<()> {
            Ok(())
        }
        async fn seek(&self, _position: f64) -> BridgeResult<()> {
            Ok(())
        }
        async fn set_rate(&self, _rate: f64) -> BridgeResult<()> {
            Ok(())
        }
        async fn unload(&self) -> BridgeResult<()> {
            Ok(())
        }
        fn current_time(&self) -> f64 {
            0.0
        }
        async fn subscribe_events(&self) -> BridgeResult<Box<dyn MediaEventStream>> {
            unimplemented!()
        }
    }

    fn complete_builder() -> CoreConfigBuilder {
        CoreConfig::builder()
            .api_base_url("http://localhost:3000/api")
            .http_client(Arc::new(NullHttpClient))
            .media_adapter(Arc::new(NullMedia))
    }

    #[test]
    fn test_builder_with_all_required_fields() {
        let config = complete_builder().build().unwrap();

        assert_eq!(config.api_base_url, "http://localhost:3000/api");
        assert_eq!(config.event_buffer_size, DEFAULT_EVENT_BUFFER_SIZE);
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert!(config.media_controls.is_none());
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = complete_builder()
            .api_base_url("https://books.example.com/api/")
            .build()
            .unwrap();
        assert_eq!(config.api_base_url, "https://books.example.com/api");
    }

    #[test]
    fn test_builder_requires_base_url() {
        let result = CoreConfig::builder()
            .http_client(Arc::new(NullHttpClient))
            .media_adapter(Arc::new(NullMedia))
            .build();

        let err = result.unwrap_err().to_string();
        assert!(err.contains("API base URL is required"));
    }

    #[test]
    fn test_builder_requires_media_adapter() {
        let result = CoreConfig::builder()
            .api_base_url("http://localhost:3000/api")
            .http_client(Arc::new(NullHttpClient))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "MediaElementAdapter")
            }
            other => panic!("expected CapabilityMissing, got {:?}", other),
        }
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_http_client_without_shims() {
        let result = CoreConfig::builder()
            .api_base_url("http://localhost:3000/api")
            .media_adapter(Arc::new(NullMedia))
            .build();

        let err = result.unwrap_err().to_string();
        assert!(err.contains("HttpClient"));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_build_with_desktop_http_client() {
        let config = CoreConfig::builder()
            .api_base_url("http://localhost:3000/api")
            .media_adapter(Arc::new(NullMedia))
            .build();
        assert!(config.is_ok());
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let err = complete_builder()
            .api_base_url("ftp://books")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("http:// or https://"));
    }

    #[test]
    fn test_validate_rejects_bad_buffer_and_timeout() {
        assert!(complete_builder().event_buffer_size(0).build().is_err());
        assert!(complete_builder().event_buffer_size(10_001).build().is_err());
        assert!(complete_builder()
            .request_timeout(Duration::ZERO)
            .build()
            .is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = complete_builder().auth_token("s3cr3t").build().unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("s3cr3t"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
