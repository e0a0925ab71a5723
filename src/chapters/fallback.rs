/// Evenly spaced chapter synthesis for recordings with no usable markers.
use crate::chunking::TranscriptChunk;

use super::timeline::build_contiguous;
use super::{Chapter, ChapterSource};

/// Hard ceiling on fallback chapter count regardless of configuration.
const FALLBACK_CHAPTER_CEILING: usize = 8;

/// Produce an evenly spaced timeline by sampling chunk start times.
///
/// Used only when every marker source came back empty. Titles follow a fixed
/// policy ("Introduction", then "Section {n}") and the interval rule matches
/// the marker-driven path, so consumers cannot tell the two apart shape-wise.
pub fn fallback_chapters(
    chunks: &[TranscriptChunk],
    transcript_end: f64,
    max_chapters: usize,
) -> Vec<Chapter> {
    if chunks.is_empty() {
        return Vec::new();
    }

    let chapter_count = max_chapters.min(FALLBACK_CHAPTER_CEILING).max(1);
    let stride = (chunks.len() / chapter_count).max(1);

    let mut starts: Vec<i64> = chunks
        .iter()
        .step_by(stride)
        .map(|chunk| chunk.start_seconds.max(0.0).round() as i64)
        .collect();
    starts.sort_unstable();
    starts.dedup();

    if starts.first().map(|s| *s > 0).unwrap_or(true) {
        starts.insert(0, 0);
    }
    starts.truncate(max_chapters.max(1));

    let ordered: Vec<(i64, String)> = starts
        .iter()
        .enumerate()
        .map(|(idx, start)| {
            let title = if idx == 0 {
                "Introduction".to_string()
            } else {
                format!("Section {}", idx + 1)
            };
            (*start, title)
        })
        .collect();

    build_contiguous(&ordered, transcript_end, ChapterSource::Generated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::{chunk_segments, TranscriptSegment};

    fn make_chunks(count: usize, spacing: f64) -> Vec<TranscriptChunk> {
        let words = "alpha beta gamma delta ".repeat(20);
        let segments: Vec<TranscriptSegment> = (0..count)
            .map(|i| TranscriptSegment::new(words.trim(), i as f64 * spacing, spacing))
            .collect();
        chunk_segments(&segments, 80)
    }

    #[test]
    fn test_fallback_produces_contiguous_sections() {
        let chunks = make_chunks(16, 60.0);
        let chapters = fallback_chapters(&chunks, 960.0, 10);

        assert!(chapters.len() >= 2);
        assert!(chapters.len() <= 8);
        assert_eq!(chapters[0].title, "Introduction");
        assert_eq!(chapters[0].start_seconds, 0.0);
        assert_eq!(chapters[1].title, "Section 2");
        for pair in chapters.windows(2) {
            assert_eq!(pair[0].end_seconds, pair[1].start_seconds);
        }
        assert_eq!(chapters.last().unwrap().end_seconds, 960.0);
        for chapter in &chapters {
            assert_eq!(chapter.source, ChapterSource::Generated);
        }
    }

    #[test]
    fn test_fallback_respects_max_chapters_below_ceiling() {
        let chunks = make_chunks(40, 30.0);
        let chapters = fallback_chapters(&chunks, 1200.0, 3);
        assert!(chapters.len() <= 3);
    }

    #[test]
    fn test_fallback_empty_chunks_is_empty() {
        assert!(fallback_chapters(&[], 100.0, 8).is_empty());
    }
}
