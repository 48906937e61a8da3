//! Chapter lookup by playback position.
//!
//! Chapters are assumed ordered by `start` and non-overlapping; nothing here
//! checks that. Intervals are half-open, so a position equal to a chapter's
//! `end` belongs to the next chapter (or to none).

use bridge_traits::books::Chapter;

/// First chapter whose `[start, end)` interval contains `time`.
pub fn chapter_at(chapters: &[Chapter], time: f64) -> Option<&Chapter> {
    chapters.iter().find(|chapter| chapter.contains(time))
}

/// Whole seconds from `time` to the end of the chapter containing it,
/// rounded up so the countdown never stops short of the boundary.
pub fn seconds_to_chapter_end(chapters: &[Chapter], time: f64) -> Option<u64> {
    chapter_at(chapters, time).map(|chapter| (chapter.end - time).max(0.0).ceil() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapters() -> Vec<Chapter> {
        vec![
            Chapter::new("0", "Prologue", 0.0, 600.0),
            Chapter::new("1", "The Road", 600.0, 1200.0),
        ]
    }

    #[test]
    fn test_chapter_at() {
        let chapters = chapters();

        assert_eq!(chapter_at(&chapters, 0.0).map(|c| c.id.as_str()), Some("0"));
        assert_eq!(chapter_at(&chapters, 599.9).map(|c| c.id.as_str()), Some("0"));
        assert_eq!(chapter_at(&chapters, 600.0).map(|c| c.id.as_str()), Some("1"));
        assert!(chapter_at(&chapters, 1200.0).is_none());
        assert!(chapter_at(&[], 10.0).is_none());
    }

    #[test]
    fn test_chapter_at_gap() {
        let chapters = vec![
            Chapter::new("a", "A", 0.0, 100.0),
            Chapter::new("b", "B", 150.0, 200.0),
        ];
        assert!(chapter_at(&chapters, 120.0).is_none());
    }

    #[test]
    fn test_seconds_to_chapter_end() {
        let chapters = chapters();

        assert_eq!(seconds_to_chapter_end(&chapters, 900.0), Some(300));
        assert_eq!(seconds_to_chapter_end(&chapters, 1199.2), Some(1));
        assert_eq!(seconds_to_chapter_end(&chapters, 1500.0), None);
    }
}
