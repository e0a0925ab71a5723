/// Source identifier parsing for recordings.
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;
use url::Url;

/// Hard validation failure for unusable source identifiers.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(
        "could not parse a valid YouTube video ID from '{0}'; \
         use a full URL or 11-character ID"
    )]
    InvalidVideoId(String),
}

fn video_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap())
}

/// Extract the 11-character video id from a URL or raw id string.
///
/// Accepts raw ids, `youtu.be/<id>`, `youtube.com/watch?v=<id>`, and the
/// `shorts`/`embed`/`live` path forms. Anything else is a typed error, not a
/// soft-empty: callers surface it to the user directly.
pub fn parse_video_id(url_or_id: &str) -> Result<String, SourceError> {
    if video_id_regex().is_match(url_or_id) {
        return Ok(url_or_id.to_string());
    }

    let invalid = || SourceError::InvalidVideoId(url_or_id.to_string());
    let parsed = Url::parse(url_or_id).map_err(|_| invalid())?;
    let host = parsed.host_str().unwrap_or("");

    if host == "youtu.be" || host == "www.youtu.be" {
        let candidate = parsed
            .path_segments()
            .and_then(|mut segments| segments.next())
            .unwrap_or("");
        if video_id_regex().is_match(candidate) {
            return Ok(candidate.to_string());
        }
    }

    if host.ends_with("youtube.com") {
        if let Some((_, value)) = parsed.query_pairs().find(|(key, _)| key == "v") {
            if video_id_regex().is_match(&value) {
                return Ok(value.to_string());
            }
        }

        let parts: Vec<&str> = parsed
            .path_segments()
            .map(|segments| segments.filter(|piece| !piece.is_empty()).collect())
            .unwrap_or_default();
        if parts.len() >= 2 && matches!(parts[0], "shorts" | "embed" | "live") {
            let candidate = parts[1];
            if video_id_regex().is_match(candidate) {
                return Ok(candidate.to_string());
            }
        }
    }

    Err(invalid())
}

/// Build the canonical watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}
