/// Lexical retrieval over timestamped transcript chunks.
use serde::{Deserialize, Serialize};

use crate::chunking::TranscriptChunk;
use crate::text::content_terms;

/// Score assigned to every chunk when the query has no content terms.
const EMPTY_QUERY_SCORE: f64 = 0.01;

/// A selected chunk paired with its retrieval score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedChunk {
    pub chunk_id: u32,
    pub text: String,
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub start_label: String,
    pub end_label: String,
    pub score: f64,
}

impl RankedChunk {
    fn from_chunk(chunk: &TranscriptChunk, score: f64) -> Self {
        Self {
            chunk_id: chunk.chunk_id,
            text: chunk.text.clone(),
            start_seconds: chunk.start_seconds,
            end_seconds: chunk.end_seconds,
            start_label: chunk.start_label.clone(),
            end_label: chunk.end_label.clone(),
            score,
        }
    }
}

/// Rank chunks against a query by term overlap and select the top-k subset.
///
/// The blended score rewards absolute overlap plus proportional relevance in
/// both directions, so neither very long nor very short chunks dominate.
/// Ranking determines selection only; the returned chunks are re-sorted into
/// transcript order for downstream prompt assembly.
pub fn select_relevant_chunks(
    chunks: &[TranscriptChunk],
    query: &str,
    top_k: usize,
) -> Vec<RankedChunk> {
    let desired = top_k.max(1);

    if chunks.is_empty() {
        return Vec::new();
    }

    let query_terms = content_terms(query);
    if query_terms.is_empty() {
        // All-stopword queries get a defined fallback, not a failure.
        return chunks
            .iter()
            .take(desired)
            .map(|chunk| RankedChunk::from_chunk(chunk, EMPTY_QUERY_SCORE))
            .collect();
    }

    let mut scored: Vec<RankedChunk> = chunks
        .iter()
        .map(|chunk| {
            let chunk_terms = content_terms(&chunk.text);
            let (overlap, density) = if chunk_terms.is_empty() {
                (0usize, 0.0_f64)
            } else {
                let overlap = query_terms.intersection(&chunk_terms).count();
                (overlap, overlap as f64 / chunk_terms.len() as f64)
            };
            let coverage = overlap as f64 / query_terms.len().max(1) as f64;
            let score = overlap as f64 + density + coverage;
            RankedChunk::from_chunk(chunk, round_score(score))
        })
        .collect();

    // Score descending; on ties the later chunk wins so the tie-break is
    // reproducible regardless of input ordering quirks.
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.chunk_id.cmp(&a.chunk_id))
    });

    let positive_count = scored.iter().filter(|row| row.score > 0.0).count();
    let mut selected: Vec<RankedChunk> = if positive_count >= desired {
        scored.into_iter().filter(|row| row.score > 0.0).take(desired).collect()
    } else {
        scored.into_iter().take(desired).collect()
    };

    selected.sort_by_key(|row| row.chunk_id);
    selected
}

fn round_score(score: f64) -> f64 {
    (score * 100_000.0).round() / 100_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::{chunk_segments, TranscriptSegment};

    fn chunk(chunk_id: u32, text: &str) -> TranscriptChunk {
        TranscriptChunk {
            chunk_id,
            text: text.to_string(),
            start_seconds: (chunk_id as f64 - 1.0) * 10.0,
            end_seconds: chunk_id as f64 * 10.0,
            start_label: String::new(),
            end_label: String::new(),
        }
    }

    #[test]
    fn test_empty_chunks_yield_empty_result() {
        assert!(select_relevant_chunks(&[], "anything", 5).is_empty());
    }

    #[test]
    fn test_empty_query_falls_back_to_leading_chunks() {
        let chunks = vec![
            chunk(1, "guard passing details"),
            chunk(2, "mount escapes overview"),
            chunk(3, "closing thoughts"),
        ];
        let selected = select_relevant_chunks(&chunks, "the and of", 2);

        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].chunk_id, 1);
        assert_eq!(selected[1].chunk_id, 2);
        for row in &selected {
            assert_eq!(row.score, 0.01);
        }
    }

    #[test]
    fn test_relevant_chunk_ranks_first_but_output_is_chronological() {
        let chunks = vec![
            chunk(1, "cooking pasta with tomato sauce"),
            chunk(2, "guard retention drills and frames"),
            chunk(3, "more guard retention concepts for sparring"),
        ];
        let selected = select_relevant_chunks(&chunks, "guard retention", 2);

        assert_eq!(selected.len(), 2);
        // Selection picked the two matching chunks; presentation is by id.
        assert_eq!(selected[0].chunk_id, 2);
        assert_eq!(selected[1].chunk_id, 3);
        assert!(selected[0].score > 0.0);
    }

    #[test]
    fn test_no_positive_scores_still_returns_top_k() {
        let chunks = vec![
            chunk(1, "alpha bravo charlie"),
            chunk(2, "delta echo foxtrot"),
            chunk(3, "golf hotel india"),
        ];
        let selected = select_relevant_chunks(&chunks, "zebra quokka", 2);

        assert_eq!(selected.len(), 2);
        for row in &selected {
            assert_eq!(row.score, 0.0);
        }
    }

    #[test]
    fn test_determinism() {
        let segments: Vec<TranscriptSegment> = (0..40)
            .map(|i| {
                TranscriptSegment::new(
                    "the armbar finish depends on hip position and grip control",
                    (i * 6) as f64,
                    6.0,
                )
            })
            .collect();
        let chunks = chunk_segments(&segments, 90);

        let first = select_relevant_chunks(&chunks, "armbar grip", 3);
        let second = select_relevant_chunks(&chunks, "armbar grip", 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_tie_break_prefers_later_chunk() {
        let chunks = vec![
            chunk(1, "identical guard text"),
            chunk(2, "identical guard text"),
            chunk(3, "identical guard text"),
        ];
        let selected = select_relevant_chunks(&chunks, "guard", 2);

        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].chunk_id, 2);
        assert_eq!(selected[1].chunk_id, 3);
    }

    #[test]
    fn test_top_k_clamped_to_one() {
        let chunks = vec![chunk(1, "guard"), chunk(2, "mount")];
        let selected = select_relevant_chunks(&chunks, "guard", 0);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].chunk_id, 1);
    }
}
