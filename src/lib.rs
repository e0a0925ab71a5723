/// Transcript QA - Rust Implementation
///
/// Answers natural-language questions about spoken-word recordings grounded
/// in timestamped transcript evidence, and synthesizes navigable chapter
/// timelines from model proposals, description markers, or chunk sampling.
pub mod answer;
pub mod chapters;
pub mod chunking;
pub mod config;
pub mod fetch;
pub mod llm;
pub mod qa;
pub mod retrieval;
pub mod service;
pub mod source;
pub mod storage;
pub mod text;
pub mod transcript;

// Re-export main types for easy access
pub use crate::answer::{clean_answer, extract_citations};
pub use crate::chapters::{
    fallback_chapters, finalize_markers, Chapter, ChapterMarker, ChapterSource,
};
pub use crate::chunking::{chunk_segments, TranscriptChunk, TranscriptSegment};
pub use crate::config::Config;
pub use crate::llm::{create_llm, ChatMessage, Llm, LlmConfig, LlmProvider};
pub use crate::qa::{answer_question, generate_chapters, AnswerOutcome, QaOptions};
pub use crate::retrieval::{select_relevant_chunks, RankedChunk};
pub use crate::service::TranscriptService;
pub use crate::source::{parse_video_id, SourceError};
pub use crate::storage::LocalStore;
pub use crate::transcript::TranscriptPayload;
