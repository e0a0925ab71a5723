/// Transcript assembly: segment preparation, chunking, and the cacheable
/// payload handed to storage and UI collaborators.
use serde::{Deserialize, Serialize};

use crate::chapters::Chapter;
use crate::chunking::{chunk_segments, TranscriptChunk, TranscriptSegment};
use crate::text::normalize_text;

/// Word window used when synthesizing segments from a plain transcript file.
const PLAIN_TEXT_WINDOW_WORDS: usize = 26;

/// Nominal duration assigned to each synthesized plain-text segment.
const PLAIN_TEXT_SEGMENT_SECONDS: f64 = 12.0;

/// Everything derived from one transcript load, persisted verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptPayload {
    pub transcript_id: String,
    pub source: String,
    pub source_label: String,
    pub source_url: Option<String>,
    pub languages: String,
    pub chunk_words: usize,
    pub segments: Vec<TranscriptSegment>,
    pub chunks: Vec<TranscriptChunk>,
    pub chapters: Vec<Chapter>,
    pub total_words: usize,
}

impl TranscriptPayload {
    /// Assemble the payload from prepared segments and chapters.
    pub fn build(
        transcript_id: String,
        source: String,
        source_label: String,
        source_url: Option<String>,
        languages: String,
        chunk_words: usize,
        segments: Vec<TranscriptSegment>,
        chapters: Vec<Chapter>,
    ) -> Self {
        let chunks = chunk_segments(&segments, chunk_words);
        let total_words = chunks
            .iter()
            .map(|chunk| chunk.text.split_whitespace().count())
            .sum();

        Self {
            transcript_id,
            source,
            source_label,
            source_url,
            languages,
            chunk_words,
            segments,
            chunks,
            chapters,
            total_words,
        }
    }
}

/// Build a stable 16-hex-character id for a transcript source.
pub fn build_transcript_id(source: &str) -> String {
    let digest = md5::compute(source.as_bytes());
    format!("{:x}", digest)[..16].to_string()
}

/// Window a plain transcript file into timestampless pseudo-segments.
///
/// Local files carry no timing, so fixed-duration windows give downstream
/// chunking and chapter math something consistent to work with.
pub fn segments_from_plain_text(text: &str) -> Vec<TranscriptSegment> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    words
        .chunks(PLAIN_TEXT_WINDOW_WORDS)
        .enumerate()
        .map(|(idx, window)| {
            TranscriptSegment::new(
                window.join(" "),
                idx as f64 * PLAIN_TEXT_SEGMENT_SECONDS,
                PLAIN_TEXT_SEGMENT_SECONDS,
            )
        })
        .collect()
}

/// Normalize fetched caption rows, dropping any that normalize to nothing.
pub fn normalize_segments(rows: Vec<TranscriptSegment>) -> Vec<TranscriptSegment> {
    rows.into_iter()
        .filter_map(|row| {
            let text = normalize_text(&row.text);
            if text.is_empty() {
                None
            } else {
                Some(TranscriptSegment::new(
                    text,
                    row.start_seconds.max(0.0),
                    row.duration_seconds.max(0.0),
                ))
            }
        })
        .collect()
}

/// Latest end time across all segments; zero for an empty transcript.
pub fn transcript_end(segments: &[TranscriptSegment]) -> f64 {
    segments
        .iter()
        .map(TranscriptSegment::end_seconds)
        .fold(0.0, f64::max)
}
