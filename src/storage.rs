/// Persistent local JSON cache for transcript payloads.
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::transcript::TranscriptPayload;

/// A cached payload wrapped with storage metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTranscript {
    pub saved_at: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: TranscriptPayload,
}

/// Simple JSON file persistence under a local data directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    transcripts_dir: PathBuf,
}

impl LocalStore {
    /// Open (and create if needed) the store under `data_dir`.
    pub async fn new(data_dir: &Path) -> Result<Self> {
        let transcripts_dir = data_dir.join("transcripts");
        tokio::fs::create_dir_all(&transcripts_dir)
            .await
            .with_context(|| format!("creating {}", transcripts_dir.display()))?;

        debug!("Transcript store at {}", transcripts_dir.display());
        Ok(Self { transcripts_dir })
    }

    /// Resolve the cache file path for a transcript id.
    pub fn transcript_path(&self, transcript_id: &str) -> PathBuf {
        self.transcripts_dir.join(format!("{}.json", transcript_id))
    }

    /// Persist a payload, replacing any previous version for the same id.
    pub async fn save_transcript(&self, payload: &TranscriptPayload) -> Result<()> {
        let stored = StoredTranscript {
            saved_at: Utc::now(),
            payload: payload.clone(),
        };
        let path = self.transcript_path(&payload.transcript_id);
        let encoded = serde_json::to_string_pretty(&stored)?;
        tokio::fs::write(&path, encoded)
            .await
            .with_context(|| format!("writing {}", path.display()))?;

        info!("Saved transcript {} to cache", payload.transcript_id);
        Ok(())
    }

    /// Load a cached payload by id. Missing ids are `Ok(None)`; a corrupt
    /// cache file is a hard error rather than silently refetched data.
    pub async fn load_transcript(&self, transcript_id: &str) -> Result<Option<TranscriptPayload>> {
        let path = self.transcript_path(transcript_id);
        if !path.exists() {
            return Ok(None);
        }

        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let stored: StoredTranscript = serde_json::from_str(&raw)
            .with_context(|| format!("parsing cached transcript {}", transcript_id))?;
        Ok(Some(stored.payload))
    }
}
