//! AudioBookShelf backend connector
//!
//! Implements the `BookService` trait against the backend's `/abs` routes.

use async_trait::async_trait;
use bridge_traits::books::{BookDetail, BookService, Chapter, ProgressUpdate};
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::AbsError;
use crate::types::{AbsItem, ApiEnvelope, ApiErrorBody};

/// Name of the backend session cookie
pub const SESSION_COOKIE: &str = "fumiki_session";

const DEFAULT_TITLE: &str = "Unknown Title";
const DEFAULT_AUTHOR: &str = "Unknown Author";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// AudioBookShelf connector
///
/// Talks to the backend rather than to an ABS server directly; the backend
/// holds the ABS credentials and authenticates this client by its session
/// cookie.
///
/// # Example
///
/// ```ignore
/// use provider_abs::AbsBookService;
/// use bridge_traits::books::BookService;
///
/// let service = AbsBookService::new(http_client, "/api").with_auth_token(token);
/// let book = service.fetch_book_detail("li_8x2k").await?;
/// ```
pub struct AbsBookService {
    http_client: Arc<dyn HttpClient>,

    /// Backend API prefix without trailing slash, e.g. `https://host/api`
    base_url: String,

    /// Value of the session cookie, when the host manages it explicitly
    auth_token: Option<String>,

    request_timeout: Duration,
}

impl AbsBookService {
    pub fn new(http_client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http_client,
            base_url,
            auth_token: None,
            request_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn item_url(&self, id: &str) -> String {
        format!("{}/abs/items/{}", self.base_url, urlencoding::encode(id))
    }

    fn prepare(&self, request: HttpRequest) -> HttpRequest {
        let request = request
            .header("Accept", "application/json")
            .timeout(self.request_timeout);

        match &self.auth_token {
            Some(token) => request.cookie(SESSION_COOKIE, token),
            None => request,
        }
    }

    /// Map a non-success response to a typed error.
    fn check_status(response: &HttpResponse, item_id: &str) -> std::result::Result<(), AbsError> {
        if response.is_success() {
            return Ok(());
        }

        let body: ApiErrorBody = response.json().unwrap_or_default();
        let message = body
            .message()
            .unwrap_or_else(|| format!("HTTP {}", response.status));

        let error = match response.status {
            401 => AbsError::Unauthorized(message),
            404 => AbsError::NotFound {
                item_id: item_id.to_string(),
            },
            502 => AbsError::Upstream(body.detail.unwrap_or(message)),
            503 => AbsError::ServiceUnavailable(message),
            status => AbsError::Http { status, message },
        };

        warn!(status = response.status, error = %error, "Backend request failed");
        Err(error)
    }

    /// Convert a raw ABS library item into a `BookDetail`.
    fn convert_item(&self, item: AbsItem) -> BookDetail {
        let media = item.media;
        let metadata = media.metadata;

        let title = metadata
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let author = metadata
            .author_name
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());

        let chapters = media
            .chapters
            .into_iter()
            .enumerate()
            .map(|(index, chapter)| {
                let title = chapter
                    .title
                    .unwrap_or_else(|| format!("Chapter {}", index + 1));
                Chapter::new(chapter.id.to_string(), title, chapter.start, chapter.end)
            })
            .collect();

        let (current_time, progress, is_finished) = item
            .user_media_progress
            .map(|p| (p.current_time.unwrap_or(0.0), p.progress, p.is_finished))
            .unwrap_or((0.0, None, false));

        let has_ebook = media.ebook_file.is_some() || media.ebook_format.is_some();

        let mut detail = BookDetail::new(item.id.clone(), title, author)
            .with_cover_url(self.cover_url(&item.id))
            .with_duration(sanitize_seconds(media.duration.unwrap_or(0.0)))
            .with_current_time(sanitize_seconds(current_time))
            .with_chapters(chapters);

        if let Some(subtitle) = metadata.subtitle.filter(|s| !s.trim().is_empty()) {
            detail = detail.with_subtitle(subtitle);
        }
        detail.media_type = item.media_type;
        detail.progress = progress
            .filter(|p| p.is_finite())
            .map(|p| p.clamp(0.0, 1.0));
        detail.is_finished = is_finished;
        detail.has_ebook = has_ebook;
        detail
    }
}

fn sanitize_seconds(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[async_trait]
impl BookService for AbsBookService {
    #[instrument(skip(self))]
    async fn fetch_book_detail(&self, id: &str) -> Result<BookDetail> {
        let request = self.prepare(HttpRequest::get(self.item_url(id)));
        let response = self.http_client.execute(request).await?;
        Self::check_status(&response, id)?;

        let envelope: ApiEnvelope<AbsItem> = serde_json::from_slice(&response.body)
            .map_err(|e| AbsError::ParseError(e.to_string()))?;

        let item = match envelope.data {
            Some(item) => item,
            None => {
                return Err(AbsError::ParseError(
                    envelope
                        .error
                        .unwrap_or_else(|| "response has no data".to_string()),
                )
                .into())
            }
        };

        let detail = self.convert_item(item);
        debug!(
            title = %detail.title,
            duration = detail.duration,
            chapters = detail.chapters.len(),
            "Fetched book detail"
        );
        Ok(detail)
    }

    #[instrument(skip(self), fields(current_time = update.current_time, is_finished = update.is_finished))]
    async fn report_progress(&self, id: &str, update: ProgressUpdate) -> Result<()> {
        let url = format!("{}/progress", self.item_url(id));
        let request = self.prepare(HttpRequest::patch(url).json(&update)?);

        let response = self.http_client.execute(request).await?;
        Self::check_status(&response, id)?;

        info!("Progress reported");
        Ok(())
    }

    fn stream_url(&self, id: &str) -> String {
        format!("{}/stream", self.item_url(id))
    }

    fn cover_url(&self, id: &str) -> String {
        format!("{}/cover", self.item_url(id))
    }

    fn ebook_url(&self, id: &str) -> String {
        format!("{}/ebook", self.item_url(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;
    use bridge_traits::http::HttpMethod;
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
        }
    }

    fn create_response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn service(mock_http: MockHttpClient) -> AbsBookService {
        AbsBookService::new(Arc::new(mock_http), "/api/").with_auth_token("s3ss10n")
    }

    #[test]
    fn test_url_builders() {
        let service = AbsBookService::new(Arc::new(MockHttpClient::new()), "/api");

        assert_eq!(service.stream_url("li_1"), "/api/abs/items/li_1/stream");
        assert_eq!(service.cover_url("li_1"), "/api/abs/items/li_1/cover");
        assert_eq!(service.ebook_url("li 2"), "/api/abs/items/li%202/ebook");
    }

    #[tokio::test]
    async fn test_fetch_book_detail() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .withf(|req| {
                req.method == HttpMethod::Get
                    && req.url == "/api/abs/items/li_1"
                    && req.headers.get("Cookie").map(String::as_str)
                        == Some("fumiki_session=s3ss10n")
            })
            .times(1)
            .returning(|_| {
                let body = r#"{
                    "data": {
                        "id": "li_1",
                        "mediaType": "book",
                        "media": {
                            "metadata": {
                                "title": "The Hobbit",
                                "subtitle": "There and Back Again",
                                "authorName": "J.R.R. Tolkien"
                            },
                            "duration": 3600.5,
                            "chapters": [
                                { "id": 0, "start": 0, "end": 1200.0, "title": "An Unexpected Party" },
                                { "id": "ch-2", "start": 1200.0, "end": 3600.5 }
                            ],
                            "ebookFormat": "epub"
                        },
                        "userMediaProgress": { "currentTime": 754.2, "progress": 0.21, "isFinished": false }
                    }
                }"#;
                Ok(create_response(200, body))
            });

        let detail = service(mock_http).fetch_book_detail("li_1").await.unwrap();

        assert_eq!(detail.title, "The Hobbit");
        assert_eq!(detail.author, "J.R.R. Tolkien");
        assert_eq!(detail.subtitle.as_deref(), Some("There and Back Again"));
        assert_eq!(detail.cover_url, "/api/abs/items/li_1/cover");
        assert_eq!(detail.duration, 3600.5);
        assert_eq!(detail.current_time, 754.2);
        assert_eq!(detail.chapters.len(), 2);
        assert_eq!(detail.chapters[0].id, "0");
        assert_eq!(detail.chapters[1].id, "ch-2");
        assert_eq!(detail.chapters[1].title, "Chapter 2");
        assert_eq!(detail.media_type.as_deref(), Some("book"));
        assert!(detail.has_ebook);
        assert_eq!(detail.progress, Some(0.21));
        assert!(!detail.is_finished);
    }

    #[tokio::test]
    async fn test_fetch_book_detail_defaults() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(create_response(200, r#"{ "data": { "id": "li_bare" } }"#)));

        let detail = service(mock_http).fetch_book_detail("li_bare").await.unwrap();

        assert_eq!(detail.title, "Unknown Title");
        assert_eq!(detail.author, "Unknown Author");
        assert_eq!(detail.duration, 0.0);
        assert_eq!(detail.current_time, 0.0);
        assert!(detail.chapters.is_empty());
        assert!(!detail.has_ebook);
        assert_eq!(detail.progress, None);
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let cases: Vec<(u16, &str)> = vec![
            (401, r#"{"error":"Unauthorized"}"#),
            (404, r#"{"error":"Not found"}"#),
            (502, r#"{"error":"Could not reach AudioBookShelf","detail":"ECONNREFUSED"}"#),
            (503, r#"{"error":"Service unavailable"}"#),
            (500, "oops"),
        ];

        for (status, body) in cases {
            let mut mock_http = MockHttpClient::new();
            let body = body.to_string();
            mock_http
                .expect_execute()
                .times(1)
                .returning(move |_| Ok(create_response(status, &body)));

            let error = service(mock_http).fetch_book_detail("li_1").await.unwrap_err();

            match status {
                401 => assert!(matches!(error, BridgeError::Unauthorized(_))),
                404 => assert!(matches!(error, BridgeError::NotFound(ref id) if id == "li_1")),
                502 => {
                    assert!(error.is_transient());
                    assert!(error.to_string().contains("ECONNREFUSED"));
                }
                503 => assert!(error.is_transient()),
                _ => assert!(
                    matches!(error, BridgeError::OperationFailed(ref m) if m.contains("HTTP 500"))
                ),
            }
        }
    }

    #[tokio::test]
    async fn test_report_progress() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .withf(|req| {
                let body: serde_json::Value =
                    serde_json::from_slice(req.body.as_deref().unwrap_or_default()).unwrap();
                req.method == HttpMethod::Patch
                    && req.url == "/api/abs/items/li_1/progress"
                    && body == serde_json::json!({ "currentTime": 3591.0, "isFinished": true })
            })
            .times(1)
            .returning(|_| Ok(create_response(200, r#"{"data":{}}"#)));

        service(mock_http)
            .report_progress(
                "li_1",
                ProgressUpdate {
                    current_time: 3591.0,
                    is_finished: true,
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(create_response(200, "<html>")));

        let error = service(mock_http).fetch_book_detail("li_1").await.unwrap_err();
        assert!(error.to_string().contains("Failed to parse response"));
    }
}
