/// Question answering and model-driven chapter generation over cached chunks.
use anyhow::Result;
use tracing::{debug, info, warn};

use crate::answer::{clean_answer, extract_citations};
use crate::chapters::{
    fallback_chapters, finalize_markers, parse_chapter_candidates, Chapter, ChapterSource,
};
use crate::chunking::TranscriptChunk;
use crate::llm::{ChatMessage, Llm, SYSTEM_PROMPT};
use crate::retrieval::{select_relevant_chunks, RankedChunk};

/// Most chunks included in the chapter-generation context.
const CHAPTER_CONTEXT_CHUNKS: usize = 160;

/// Per-chunk character budget in the chapter-generation context.
const CHAPTER_CONTEXT_CHARS: usize = 240;

/// A finished answer with its supporting evidence.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    /// Cleaned, display-ready answer text
    pub answer: String,
    /// Chunks the answer actually cited (or a best-guess default)
    pub citations: Vec<RankedChunk>,
    /// Full retrieval selection, useful for UI context panes
    pub selected: Vec<RankedChunk>,
}

/// Retrieval and history knobs for one question.
#[derive(Debug, Clone)]
pub struct QaOptions {
    pub top_k: usize,
    /// How many previous question/answer turns to replay
    pub history_turns: usize,
}

impl Default for QaOptions {
    fn default() -> Self {
        Self {
            top_k: 6,
            history_turns: 3,
        }
    }
}

/// Answer one question grounded in transcript chunks.
///
/// Retrieval, prompt assembly, the model call, answer cleanup and citation
/// extraction run as one pipeline. Model/transport failures propagate;
/// retrieval never fails.
pub async fn answer_question(
    llm: &dyn Llm,
    chunks: &[TranscriptChunk],
    question: &str,
    history: &[ChatMessage],
    options: &QaOptions,
) -> Result<AnswerOutcome> {
    let selected = select_relevant_chunks(chunks, question, options.top_k);
    debug!("Retrieved {} chunks for question", selected.len());

    let prompt = build_answer_prompt(&selected, question);

    let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT)];
    if options.history_turns > 0 && !history.is_empty() {
        let keep = history.len().min(2 * options.history_turns);
        messages.extend(history[history.len() - keep..].iter().cloned());
    }
    messages.push(ChatMessage::user(prompt));

    let raw_answer = llm.chat(messages).await?;

    let citations = extract_citations(&raw_answer, &selected);
    let answer = clean_answer(&raw_answer);

    Ok(AnswerOutcome {
        answer,
        citations,
        selected,
    })
}

/// Build the answer prompt with retrieval context and timeline metadata.
pub fn build_answer_prompt(selected: &[RankedChunk], question: &str) -> String {
    let context = if selected.is_empty() {
        "No transcript chunks were retrieved.".to_string()
    } else {
        selected
            .iter()
            .map(|chunk| {
                format!(
                    "[chunk-{}] [{}-{}] {}",
                    chunk.chunk_id, chunk.start_label, chunk.end_label, chunk.text
                )
            })
            .collect::<Vec<String>>()
            .join("\n\n")
    };

    format!(
        "Transcript excerpts:\n{}\n\n\
         User question:\n{}\n\n\
         Answer clearly and ground claims in transcript evidence.",
        context, question
    )
}

/// Generate coarse chapters from transcript chunks using the model.
///
/// Proposals are parsed leniently and finalized under the configured cap; if
/// nothing usable survives, the evenly spaced fallback timeline applies.
pub async fn generate_chapters(
    llm: &dyn Llm,
    chunks: &[TranscriptChunk],
    max_chapters: usize,
) -> Result<Vec<Chapter>> {
    if chunks.is_empty() {
        return Ok(Vec::new());
    }

    let end = chunks
        .iter()
        .map(|chunk| chunk.end_seconds)
        .fold(0.0, f64::max);
    let capped_max = max_chapters.clamp(3, 24);

    let messages = vec![
        ChatMessage::system(
            "You create chapter timelines for transcript navigation. \
             Return only valid JSON.",
        ),
        ChatMessage::user(build_chapter_prompt(chunks, capped_max)),
    ];

    let raw = llm.chat(messages).await?;
    let candidates = parse_chapter_candidates(&raw);
    debug!("Parsed {} chapter candidates from model output", candidates.len());

    let chapters = finalize_markers(&candidates, end, Some(capped_max), ChapterSource::Generated);
    if !chapters.is_empty() {
        info!("Generated {} chapters from model proposals", chapters.len());
        return Ok(chapters);
    }

    warn!("Model chapter proposals unusable, generating evenly spaced fallback");
    Ok(fallback_chapters(chunks, end, capped_max))
}

fn build_chapter_prompt(chunks: &[TranscriptChunk], capped_max: usize) -> String {
    let context = chunks
        .iter()
        .take(CHAPTER_CONTEXT_CHUNKS)
        .map(|chunk| {
            let text: String = chunk
                .text
                .replace('\n', " ")
                .chars()
                .take(CHAPTER_CONTEXT_CHARS)
                .collect();
            format!("[chunk-{}] [{}] {}", chunk.chunk_id, chunk.start_label, text.trim())
        })
        .collect::<Vec<String>>()
        .join("\n");

    format!(
        "Create readable chapter titles for this transcript.\n\
         Target 6-{} chapters.\n\
         Output JSON array only, each object with keys: title, start_seconds.\n\
         Rules:\n\
         - start_seconds must be numeric and ascending.\n\
         - first chapter should start at 0.\n\
         - concise title (2-8 words).\n\
         - no markdown, no extra text.\n\n\
         Transcript context:\n{}",
        capped_max, context
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use crate::chunking::{chunk_segments, TranscriptSegment};
    use crate::llm::LlmProvider;

    /// Canned-response double standing in for a network provider.
    struct ScriptedLlm {
        response: String,
        fail: bool,
    }

    impl ScriptedLlm {
        fn replying(response: &str) -> Self {
            Self {
                response: response.to_string(),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                response: String::new(),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl Llm for ScriptedLlm {
        async fn chat(&self, _messages: Vec<ChatMessage>) -> Result<String> {
            if self.fail {
                Err(anyhow!("connection refused"))
            } else {
                Ok(self.response.clone())
            }
        }

        async fn is_available(&self) -> bool {
            !self.fail
        }

        fn provider_type(&self) -> LlmProvider {
            LlmProvider::OpenAiCompat
        }
    }

    fn sample_chunks() -> Vec<TranscriptChunk> {
        // First segment carries the retrieval target; the rest are filler so
        // ranking has something to discriminate against.
        let mut segments = vec![TranscriptSegment::new(
            "the guard retention system relies on frames and hip movement "
                .repeat(10)
                .trim(),
            0.0,
            30.0,
        )];
        for i in 1..12 {
            segments.push(TranscriptSegment::new(
                "unrelated cooking segment about pasta sauce and fresh basil "
                    .repeat(10)
                    .trim(),
                (i * 30) as f64,
                30.0,
            ));
        }
        chunk_segments(&segments, 90)
    }

    #[tokio::test]
    async fn test_answer_pipeline_cleans_and_cites() {
        let chunks = sample_chunks();
        let llm = ScriptedLlm::replying("**Frames matter.** See [chunk-1] for the setup.");
        let outcome = answer_question(&llm, &chunks, "how does guard retention work?", &[], &QaOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.answer, "Frames matter. See for the setup.");
        assert_eq!(outcome.citations.len(), 1);
        assert_eq!(outcome.citations[0].chunk_id, 1);
        assert!(!outcome.selected.is_empty());
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let chunks = sample_chunks();
        let llm = ScriptedLlm::failing();
        let result =
            answer_question(&llm, &chunks, "anything", &[], &QaOptions::default()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_generate_chapters_accepts_model_proposals() {
        let chunks = sample_chunks();
        let llm = ScriptedLlm::replying(
            r#"Here you go: [
                {"title": "Intro", "start_seconds": 0},
                {"title": "Frames", "start_seconds": 90},
                {"title": "Hips", "start_seconds": 240}
            ]"#,
        );
        let chapters = generate_chapters(&llm, &chunks, 10).await.unwrap();

        assert_eq!(chapters.len(), 3);
        assert_eq!(chapters[0].start_seconds, 0.0);
        for pair in chapters.windows(2) {
            assert_eq!(pair[0].end_seconds, pair[1].start_seconds);
        }
    }

    #[tokio::test]
    async fn test_generate_chapters_falls_back_on_garbage() {
        let chunks = sample_chunks();
        let llm = ScriptedLlm::replying("I cannot produce JSON today, sorry.");
        let chapters = generate_chapters(&llm, &chunks, 10).await.unwrap();

        assert!(chapters.len() >= 2);
        assert_eq!(chapters[0].title, "Introduction");
        assert_eq!(chapters[0].source, ChapterSource::Generated);
    }

    #[test]
    fn test_prompt_contains_timeline_metadata() {
        let chunks = sample_chunks();
        let selected = select_relevant_chunks(&chunks, "guard retention", 2);
        let prompt = build_answer_prompt(&selected, "how do frames help?");

        assert!(prompt.contains("[chunk-"));
        assert!(prompt.contains("how do frames help?"));
        assert!(prompt.contains("Transcript excerpts:"));
    }
}
