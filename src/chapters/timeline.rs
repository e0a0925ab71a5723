/// Marker merge and contiguous-interval synthesis shared by every chapter
/// source.
use std::collections::BTreeMap;

use crate::text::format_timestamp;

use super::{Chapter, ChapterMarker, ChapterSource};

/// Merge candidate markers into a deduplicated, gap-free chapter timeline.
///
/// Markers are deduplicated by rounded second (first-seen title wins), sorted,
/// and given a synthetic leading "Introduction" when the earliest marker
/// starts after zero. `max_chapters` caps the marker count on the
/// model-proposed path; description markers pass `None`.
///
/// Fails soft: fewer than two distinct markers after dedup yields an empty
/// sequence so the caller can fall through to its next tier.
pub fn finalize_markers(
    markers: &[ChapterMarker],
    transcript_end: f64,
    max_chapters: Option<usize>,
    source: ChapterSource,
) -> Vec<Chapter> {
    if markers.is_empty() {
        return Vec::new();
    }

    // BTreeMap keeps keys sorted; entry() keeps the first-seen title.
    let mut dedup: BTreeMap<i64, &str> = BTreeMap::new();
    for marker in markers {
        let key = marker.seconds.max(0.0).round() as i64;
        dedup.entry(key).or_insert(marker.title.as_str());
    }

    let mut ordered: Vec<(i64, String)> = dedup
        .into_iter()
        .map(|(sec, title)| (sec, title.to_string()))
        .collect();

    if ordered.first().map(|(sec, _)| *sec > 0).unwrap_or(false) {
        ordered.insert(0, (0, "Introduction".to_string()));
    }

    if let Some(cap) = max_chapters {
        ordered.truncate(cap);
    }

    if ordered.len() < 2 {
        return Vec::new();
    }

    build_contiguous(&ordered, transcript_end, source)
}

/// Pick between two independent marker sources for the same recording.
///
/// A structured source with at least two usable markers wins outright; only
/// otherwise does the free-text source apply. The two are never merged since
/// partial structured data is more trustworthy than a blended set.
pub fn choose_marker_source(
    structured: Vec<ChapterMarker>,
    free_text: Vec<ChapterMarker>,
) -> Vec<ChapterMarker> {
    if structured.len() >= 2 {
        structured
    } else {
        free_text
    }
}

/// Turn ordered `(second, title)` rows into contiguous chapters.
///
/// Every chapter ends where the next begins; the last chapter extends to the
/// transcript end (or one second past its own start, whichever is later), so
/// durations stay strictly positive even for back-to-back markers.
pub(crate) fn build_contiguous(
    ordered: &[(i64, String)],
    transcript_end: f64,
    source: ChapterSource,
) -> Vec<Chapter> {
    let last_start = ordered.last().map(|(sec, _)| *sec as f64).unwrap_or(0.0);
    let end_limit = transcript_end.max(last_start + 1.0);

    ordered
        .iter()
        .enumerate()
        .map(|(idx, (start_sec, title))| {
            let start = *start_sec as f64;
            let next_start = ordered
                .get(idx + 1)
                .map(|(sec, _)| *sec as f64)
                .unwrap_or(end_limit);
            let end = (start + 1.0).max(next_start);

            Chapter {
                chapter_id: (idx + 1) as u32,
                title: truncate_title(title),
                start_seconds: start,
                end_seconds: end,
                start_label: format_timestamp(start),
                end_label: format_timestamp(end),
                source,
            }
        })
        .collect()
}

fn truncate_title(title: &str) -> String {
    title.chars().take(120).collect::<String>().trim().to_string()
}
