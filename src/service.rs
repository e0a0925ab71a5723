/// Transcript loading and cache refresh logic.
use anyhow::{anyhow, Context, Result};
use std::path::Path;
use tracing::{info, warn};

use crate::chapters::{finalize_markers, Chapter, ChapterSource};
use crate::config::Config;
use crate::fetch::{build_client, fetch_description_markers};
use crate::source::{parse_video_id, watch_url};
use crate::storage::LocalStore;
use crate::transcript::{
    build_transcript_id, normalize_segments, segments_from_plain_text, transcript_end,
    TranscriptPayload,
};
use crate::chunking::TranscriptSegment;

/// Loads transcript data from local files, attaches YouTube chapter markers
/// when a video association exists, and keeps the local cache fresh.
pub struct TranscriptService {
    config: Config,
    store: LocalStore,
}

impl TranscriptService {
    pub fn new(config: Config, store: LocalStore) -> Self {
        Self { config, store }
    }

    /// Load a transcript by source, preferring the cache.
    ///
    /// `source` must be a local transcript file: plain text (windowed into
    /// pseudo-segments) or a JSON array of timestamped segments produced by
    /// any caption fetcher. `video` optionally associates the recording with
    /// a YouTube URL/id so description chapter markers can be attached.
    pub async fn load_or_create(
        &self,
        source: &str,
        video: Option<&str>,
    ) -> Result<TranscriptPayload> {
        let transcript_id = build_transcript_id(source);

        if let Some(cached) = self.store.load_transcript(&transcript_id).await? {
            info!("📁 Using cached transcript {}", transcript_id);
            return Ok(cached);
        }

        let path = Path::new(source);
        if !path.is_file() {
            return Err(anyhow!(
                "Transcript source '{}' is not a readable file. \
                 Provide a plain-text transcript or a JSON segments file.",
                source
            ));
        }

        let segments = self.load_file_segments(path).await?;
        if segments.is_empty() {
            return Err(anyhow!(
                "Transcript '{}' was empty after preprocessing; nothing to work with.",
                source
            ));
        }

        let (source_url, chapters) = match video {
            Some(video) => {
                // A bad video reference is a hard error; missing markers are not.
                let video_id = parse_video_id(video)?;
                let chapters = self.fetch_youtube_chapters(&video_id, &segments).await;
                (Some(watch_url(&video_id)), chapters)
            }
            None => (None, Vec::new()),
        };

        let payload = TranscriptPayload::build(
            transcript_id,
            source.to_string(),
            format!("file:{}", path.display()),
            source_url,
            self.config.chunking.languages.clone(),
            self.config.chunking.words_per_chunk,
            segments,
            chapters,
        );

        self.store.save_transcript(&payload).await?;
        Ok(payload)
    }

    /// Load a cached transcript payload by id.
    pub async fn load_by_id(&self, transcript_id: &str) -> Result<Option<TranscriptPayload>> {
        self.store.load_transcript(transcript_id).await
    }

    async fn load_file_segments(&self, path: &Path) -> Result<Vec<TranscriptSegment>> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;

        if path.extension().map_or(false, |ext| ext == "json") {
            let rows: Vec<TranscriptSegment> = serde_json::from_str(&text)
                .with_context(|| format!("parsing segments from {}", path.display()))?;
            return Ok(normalize_segments(rows));
        }

        Ok(segments_from_plain_text(&text))
    }

    async fn fetch_youtube_chapters(
        &self,
        video_id: &str,
        segments: &[TranscriptSegment],
    ) -> Vec<Chapter> {
        let client = build_client(self.config.chapters.request_timeout_seconds);
        let markers = fetch_description_markers(&client, video_id).await;
        if markers.is_empty() {
            warn!("No description chapter markers found for {}", video_id);
            return Vec::new();
        }

        let end = transcript_end(segments);
        finalize_markers(&markers, end, None, ChapterSource::Youtube)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn service(temp: &TempDir) -> TranscriptService {
        let mut config = Config::default();
        config.storage.data_dir = temp.path().to_path_buf();
        let store = LocalStore::new(temp.path()).await.unwrap();
        TranscriptService::new(config, store)
    }

    #[tokio::test]
    async fn test_plain_text_file_load_and_cache_hit() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp).await;

        let transcript_path = temp.path().join("talk.txt");
        let words = (0..120).map(|i| format!("word{}", i)).collect::<Vec<_>>().join(" ");
        tokio::fs::write(&transcript_path, &words).await.unwrap();

        let source = transcript_path.to_string_lossy().to_string();
        let payload = service.load_or_create(&source, None).await.unwrap();
        assert!(!payload.chunks.is_empty());
        assert!(payload.source_url.is_none());

        // Second load hits the cache and returns the identical payload.
        let cached = service.load_or_create(&source, None).await.unwrap();
        assert_eq!(cached.transcript_id, payload.transcript_id);
        assert_eq!(cached.chunks, payload.chunks);
    }

    #[tokio::test]
    async fn test_json_segments_file_load() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp).await;

        let segments_path = temp.path().join("talk.json");
        let rows = serde_json::json!([
            {"text": "[Music] hello there", "start_seconds": 0.0, "duration_seconds": 4.0},
            {"text": "welcome to the deep dive", "start_seconds": 4.0, "duration_seconds": 5.0}
        ]);
        tokio::fs::write(&segments_path, rows.to_string()).await.unwrap();

        let source = segments_path.to_string_lossy().to_string();
        let payload = service.load_or_create(&source, None).await.unwrap();
        assert_eq!(payload.segments.len(), 2);
        assert_eq!(payload.segments[0].text, "hello there");
    }

    #[tokio::test]
    async fn test_missing_file_is_a_hard_error() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp).await;
        assert!(service
            .load_or_create("/nonexistent/transcript.txt", None)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_bad_video_reference_is_a_hard_error() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp).await;

        let transcript_path = temp.path().join("talk.txt");
        tokio::fs::write(&transcript_path, "enough words to build a tiny transcript here")
            .await
            .unwrap();

        let source = transcript_path.to_string_lossy().to_string();
        let result = service.load_or_create(&source, Some("not-a-video")).await;
        assert!(result.is_err());
    }
}
