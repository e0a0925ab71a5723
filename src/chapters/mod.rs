/// Chapter timeline synthesis for transcript navigation.
///
/// Candidate markers arrive from independent sources (model-proposed JSON,
/// structured page objects, free-text description lines). Each source reduces
/// its input to plain `(seconds, title)` pairs before the shared merge step in
/// [`timeline`] turns them into a contiguous chapter sequence.
pub mod candidates;
pub mod description;
pub mod fallback;
pub mod timeline;

pub use candidates::{extract_json_array, parse_chapter_candidates};
pub use description::{extract_short_description, parse_description_markers};
pub use fallback::fallback_chapters;
pub use timeline::{choose_marker_source, finalize_markers};

use serde::{Deserialize, Serialize};

/// An unmerged candidate chapter start proposed by some source.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterMarker {
    /// Start offset in seconds, clamped non-negative by the producing parser
    pub seconds: f64,
    /// Proposed chapter title
    pub title: String,
}

impl ChapterMarker {
    pub fn new(seconds: f64, title: impl Into<String>) -> Self {
        Self {
            seconds,
            title: title.into(),
        }
    }
}

/// Which pipeline produced a finalized chapter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChapterSource {
    /// Synthesized from chunk sampling or model proposals
    Generated,
    /// Parsed from the watch-page description
    Youtube,
    /// Proposed by the model and accepted after finalization
    Model,
}

/// A named, contiguous, non-overlapping timeline interval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chapter {
    /// 1-based id, contiguous across the chapter sequence
    pub chapter_id: u32,
    /// Display title, at most 120 characters
    pub title: String,
    pub start_seconds: f64,
    /// Always strictly greater than `start_seconds`
    pub end_seconds: f64,
    pub start_label: String,
    pub end_label: String,
    pub source: ChapterSource,
}
