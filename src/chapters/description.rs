/// Chapter marker extraction from watch-page descriptions.
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use super::ChapterMarker;

fn short_description_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""shortDescription":"((?:\\.|[^"\\])*)""#).unwrap())
}

fn chapter_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*((?:\d{1,2}:)?\d{1,2}:\d{2})\s+(.+?)\s*$").unwrap())
}

/// Pull the JSON-escaped `shortDescription` string out of raw watch-page HTML.
///
/// The description lives inside the embedded player-response blob as a JSON
/// string literal; decoding it through serde_json handles the escapes. Any
/// failure is soft-empty since description markers are best-effort.
pub fn extract_short_description(watch_html: &str) -> String {
    let encoded = match short_description_regex().captures(watch_html) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(""),
        None => return String::new(),
    };

    match serde_json::from_str::<String>(&format!("\"{}\"", encoded)) {
        Ok(decoded) => decoded,
        Err(err) => {
            debug!("Failed to decode shortDescription literal: {}", err);
            String::new()
        }
    }
}

/// Parse `[H:]MM:SS Title` chapter lines from a video description.
///
/// Lines without a leading timestamp or with an empty title after trimming
/// decorative separators are skipped. Fewer than two markers is soft-empty.
/// Surviving markers are deduplicated by rounded second (first-seen title
/// wins) and returned in ascending time order.
pub fn parse_description_markers(description: &str) -> Vec<ChapterMarker> {
    let mut markers: Vec<ChapterMarker> = Vec::new();

    for line in description.lines() {
        let caps = match chapter_line_regex().captures(line) {
            Some(caps) => caps,
            None => continue,
        };

        let seconds = parse_timestamp_to_seconds(&caps[1]);
        let title = caps[2]
            .trim()
            .trim_start_matches(['-', '|', ':', '–', '—', ' '])
            .trim();
        if title.is_empty() {
            continue;
        }

        markers.push(ChapterMarker::new(seconds, title));
    }

    if markers.len() < 2 {
        return Vec::new();
    }

    let mut unique: Vec<ChapterMarker> = Vec::new();
    for marker in markers {
        let key = marker.seconds.max(0.0).round() as i64;
        if !unique
            .iter()
            .any(|seen| seen.seconds.max(0.0).round() as i64 == key)
        {
            unique.push(ChapterMarker::new(key as f64, marker.title));
        }
    }
    unique.sort_by(|a, b| a.seconds.partial_cmp(&b.seconds).unwrap_or(std::cmp::Ordering::Equal));
    unique
}

/// Convert `MM:SS` or `HH:MM:SS` into seconds. Unrecognized shapes yield 0.
pub fn parse_timestamp_to_seconds(value: &str) -> f64 {
    let parts: Vec<Option<i64>> = value
        .trim()
        .split(':')
        .map(|piece| piece.parse::<i64>().ok())
        .collect();

    match parts.as_slice() {
        [Some(minutes), Some(seconds)] => (minutes * 60 + seconds) as f64,
        [Some(hours), Some(minutes), Some(seconds)] => {
            (hours * 3600 + minutes * 60 + seconds) as f64
        }
        _ => 0.0,
    }
}
