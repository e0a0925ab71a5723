/// Best-effort watch-page fetching for description chapter markers.
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use crate::chapters::{parse_description_markers, ChapterMarker};
use crate::chapters::description::extract_short_description;
use crate::source::watch_url;

const DESKTOP_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// HTTP client used for watch-page requests.
pub fn build_client(timeout_seconds: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(DESKTOP_USER_AGENT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Fetch raw watch-page HTML for a video. Transport and HTTP failures are
/// soft-empty; chapter markers are never worth failing a load over.
pub async fn fetch_watch_html(client: &Client, video_id: &str) -> Option<String> {
    let url = watch_url(video_id);

    let response = match client.get(&url).send().await {
        Ok(response) => response,
        Err(err) => {
            warn!("Watch page request failed for {}: {}", video_id, err);
            return None;
        }
    };

    if !response.status().is_success() {
        warn!(
            "Watch page returned {} for {}",
            response.status(),
            video_id
        );
        return None;
    }

    response.text().await.ok()
}

/// Fetch and parse description chapter markers for a video.
pub async fn fetch_description_markers(client: &Client, video_id: &str) -> Vec<ChapterMarker> {
    let html = match fetch_watch_html(client, video_id).await {
        Some(html) => html,
        None => return Vec::new(),
    };

    let description = extract_short_description(&html);
    if description.is_empty() {
        debug!("No shortDescription found for {}", video_id);
        return Vec::new();
    }

    parse_description_markers(&description)
}
