//! AudioBookShelf wire types
//!
//! The backend wraps every JSON payload in `{ "data": ... }` and reports
//! failures as `{ "error": "...", "detail": "..." }`. Item payloads are raw
//! ABS library items, so most fields are optional and defaulted.

use serde::Deserialize;

/// Backend response envelope
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Backend error body
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl ApiErrorBody {
    /// `error` with `detail` appended when both are present.
    pub fn message(&self) -> Option<String> {
        match (&self.error, &self.detail) {
            (Some(error), Some(detail)) => Some(format!("{} ({})", error, detail)),
            (Some(error), None) => Some(error.clone()),
            (None, Some(detail)) => Some(detail.clone()),
            (None, None) => None,
        }
    }
}

/// ABS library item
///
/// See: https://api.audiobookshelf.org/#library-item
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsItem {
    pub id: String,

    /// `"book"` or `"podcast"`
    #[serde(default)]
    pub media_type: Option<String>,

    #[serde(default)]
    pub media: AbsMedia,

    /// Present only when the request was made with a user session
    #[serde(default)]
    pub user_media_progress: Option<AbsMediaProgress>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsMedia {
    #[serde(default)]
    pub metadata: AbsMetadata,

    /// Total duration in seconds
    #[serde(default)]
    pub duration: Option<f64>,

    #[serde(default)]
    pub chapters: Vec<AbsChapter>,

    #[serde(default)]
    pub ebook_file: Option<serde_json::Value>,

    #[serde(default)]
    pub ebook_format: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
}

/// Chapter ids are integers on most servers but strings on some imports.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AbsChapterId {
    Number(serde_json::Number),
    Text(String),
}

impl std::fmt::Display for AbsChapterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbsChapterId::Number(n) => write!(f, "{}", n),
            AbsChapterId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsChapter {
    pub id: AbsChapterId,
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsMediaProgress {
    #[serde(default)]
    pub current_time: Option<f64>,
    /// Fraction in `0.0..=1.0`
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub is_finished: bool,
}
