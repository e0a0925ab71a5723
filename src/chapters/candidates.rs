/// Lenient parsing of chapter proposals from model output and structured
/// page objects.
use serde_json::Value;
use tracing::debug;

use super::ChapterMarker;

/// Extract the first bracketed array span from free-form text.
///
/// Model output frequently wraps the requested JSON array in prose or code
/// fences; the span between the first `[` and the last `]` is the best
/// candidate for a parse attempt.
pub fn extract_json_array(raw: &str) -> Option<&str> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Parse model-proposed chapter candidates from raw response text.
///
/// Returns an empty list when no array can be extracted or parsed; malformed
/// rows (missing title, non-numeric start) are skipped individually rather
/// than failing the batch. Negative starts clamp to zero.
pub fn parse_chapter_candidates(raw: &str) -> Vec<ChapterMarker> {
    let span = match extract_json_array(raw) {
        Some(span) => span,
        None => {
            debug!("No JSON array found in model chapter response");
            return Vec::new();
        }
    };

    let payload: Value = match serde_json::from_str(span) {
        Ok(value) => value,
        Err(err) => {
            debug!("Model chapter response failed to parse: {}", err);
            return Vec::new();
        }
    };

    let items = match payload.as_array() {
        Some(items) => items,
        None => return Vec::new(),
    };

    markers_from_objects(items)
}

/// Reduce structured chapter objects to `(seconds, title)` markers.
///
/// Accepts `start_seconds` as either a JSON number or a numeric string and
/// skips any row without a usable title or timestamp.
pub fn markers_from_objects(items: &[Value]) -> Vec<ChapterMarker> {
    let mut markers = Vec::new();

    for item in items {
        let obj = match item.as_object() {
            Some(obj) => obj,
            None => continue,
        };

        let title = obj
            .get("title")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or("");
        if title.is_empty() {
            continue;
        }

        let start = match obj.get("start_seconds") {
            Some(Value::Number(num)) => num.as_f64(),
            Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
            _ => None,
        };
        let start = match start {
            Some(value) if value.is_finite() => value.max(0.0),
            _ => continue,
        };

        markers.push(ChapterMarker::new(start, title));
    }

    markers
}
