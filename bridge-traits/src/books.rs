//! Book Service Abstraction
//!
//! The playback core talks to the book server through [`BookService`]: it
//! reads book details, reports listening progress and asks for the URLs the
//! media element and artwork views load directly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A named sub-interval of a book.
///
/// `start < end` is expected for well-formed input; it is not enforced here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: String,
    pub title: String,
    /// Seconds from the start of the book
    pub start: f64,
    /// Seconds from the start of the book (exclusive)
    pub end: f64,
}

impl Chapter {
    pub fn new(id: impl Into<String>, title: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            start,
            end,
        }
    }

    /// Half-open containment: `start <= time < end`.
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time < self.end
    }

    pub fn length(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// Book metadata needed to start a playback session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDetail {
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub cover_url: String,
    /// Total length in seconds, 0 when the server does not know it
    pub duration: f64,
    /// Last position the server has on record, in seconds
    pub current_time: f64,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Server-side completion fraction in `0.0..=1.0`, when it reported one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(default)]
    pub is_finished: bool,
    #[serde(default)]
    pub has_ebook: bool,
}

impl BookDetail {
    pub fn new(id: impl Into<String>, title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            subtitle: None,
            cover_url: String::new(),
            duration: 0.0,
            current_time: 0.0,
            chapters: Vec::new(),
            media_type: None,
            progress: None,
            is_finished: false,
            has_ebook: false,
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_cover_url(mut self, url: impl Into<String>) -> Self {
        self.cover_url = url.into();
        self
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_current_time(mut self, current_time: f64) -> Self {
        self.current_time = current_time;
        self
    }

    pub fn with_chapters(mut self, chapters: Vec<Chapter>) -> Self {
        self.chapters = chapters;
        self
    }
}

/// Body of a progress report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub current_time: f64,
    pub is_finished: bool,
}

/// Client for the book server.
///
/// `report_progress` must be safe to call repeatedly with the same values;
/// the server is expected to upsert.
#[async_trait]
pub trait BookService: Send + Sync {
    /// Fetch metadata, chapters and last known progress for a book.
    async fn fetch_book_detail(&self, id: &str) -> Result<BookDetail>;

    /// Persist the listening position of a book.
    async fn report_progress(&self, id: &str, update: ProgressUpdate) -> Result<()>;

    /// URL of the audio stream (served with byte-range support).
    fn stream_url(&self, id: &str) -> String;

    /// URL of the cover image.
    fn cover_url(&self, id: &str) -> String;

    /// URL of the ebook file, if the item has one.
    fn ebook_url(&self, id: &str) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chapter_is_half_open() {
        let chapter = Chapter::new("0", "Opening", 0.0, 600.0);
        assert!(chapter.contains(0.0));
        assert!(chapter.contains(599.9));
        assert!(!chapter.contains(600.0));
        assert_eq!(chapter.length(), 600.0);
    }

    #[test]
    fn test_progress_update_wire_format() {
        let update = ProgressUpdate {
            current_time: 12.5,
            is_finished: false,
        };
        let json = serde_json::to_value(update).unwrap();
        assert_eq!(json, serde_json::json!({"currentTime": 12.5, "isFinished": false}));
    }
}
