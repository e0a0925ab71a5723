/// Chunk construction with timestamp metadata for citation-ready retrieval.
use serde::{Deserialize, Serialize};

use crate::text::format_timestamp;

/// Minimum word budget per chunk. Guards against degenerate configs.
const MIN_WORDS_PER_CHUNK: usize = 80;

/// A normalized transcript segment as produced by a caption fetcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptSegment {
    /// Caption text, already normalized
    pub text: String,
    /// Start offset in seconds from the beginning of the recording
    pub start_seconds: f64,
    /// Duration of the segment in seconds
    pub duration_seconds: f64,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>, start_seconds: f64, duration_seconds: f64) -> Self {
        Self {
            text: text.into(),
            start_seconds,
            duration_seconds,
        }
    }

    /// End offset of the segment in seconds.
    pub fn end_seconds(&self) -> f64 {
        self.start_seconds + self.duration_seconds
    }
}

/// A retrieval chunk with timestamp boundaries and display labels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptChunk {
    /// 1-based id, contiguous across the chunk sequence
    pub chunk_id: u32,
    /// Concatenated segment text
    pub text: String,
    /// Start of the first contributing segment
    pub start_seconds: f64,
    /// Latest end time among contributing segments
    pub end_seconds: f64,
    /// Formatted start timestamp for display
    pub start_label: String,
    /// Formatted end timestamp for display
    pub end_label: String,
}

/// Group timestamped segments into fixed word-budget chunks.
///
/// The chunk's start is fixed when accumulation begins; its end tracks the
/// maximum segment end seen while accumulating. A trailing partial chunk is
/// always emitted. Empty or whitespace-only input yields no chunks.
pub fn chunk_segments(
    segments: &[TranscriptSegment],
    words_per_chunk: usize,
) -> Vec<TranscriptChunk> {
    let word_budget = words_per_chunk.max(MIN_WORDS_PER_CHUNK);

    let mut chunks: Vec<TranscriptChunk> = Vec::new();
    let mut acc_words: Vec<&str> = Vec::new();
    let mut chunk_start = 0.0_f64;
    let mut chunk_end = 0.0_f64;
    let mut chunk_id: u32 = 1;

    let mut flush = |acc: &mut Vec<&str>, start: f64, end: f64, next_id: u32| -> u32 {
        if acc.is_empty() {
            return next_id;
        }

        let text = acc.join(" ").trim().to_string();
        acc.clear();
        if text.is_empty() {
            return next_id;
        }

        let end = end.max(start);
        chunks.push(TranscriptChunk {
            chunk_id: next_id,
            text,
            start_seconds: start,
            end_seconds: end,
            start_label: format_timestamp(start),
            end_label: format_timestamp(end),
        });
        next_id + 1
    };

    for segment in segments {
        let words: Vec<&str> = segment.text.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }

        if acc_words.is_empty() {
            chunk_start = segment.start_seconds.max(0.0);
            chunk_end = chunk_start;
        }

        acc_words.extend(words);
        chunk_end = chunk_end.max(segment.end_seconds());

        if acc_words.len() >= word_budget {
            chunk_id = flush(&mut acc_words, chunk_start, chunk_end, chunk_id);
        }
    }

    flush(&mut acc_words, chunk_start, chunk_end, chunk_id);
    chunks
}
