/// Text processing helpers shared by chunking, retrieval and chapter parsing.
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Common English function words excluded from overlap scoring.
const STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "before", "between", "both", "but", "by", "can", "could", "did", "do", "does", "for", "from",
    "had", "has", "have", "he", "her", "here", "him", "his", "how", "i", "if", "in", "into", "is",
    "it", "its", "just", "me", "more", "most", "my", "no", "not", "of", "on", "one", "only", "or",
    "our", "out", "over", "same", "she", "should", "so", "some", "such", "than", "that", "the",
    "their", "them", "then", "there", "these", "they", "this", "to", "too", "up", "very", "was",
    "we", "were", "what", "when", "where", "which", "who", "why", "will", "with", "you", "your",
];

fn stopwords() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOPWORDS.iter().copied().collect())
}

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z][A-Za-z0-9'-]*").unwrap())
}

/// Normalize raw caption text from transcript snippets.
///
/// Strips bracketed annotations like `[Music]`, tag-like markup like `<i>`,
/// and collapses whitespace runs. Returns an empty string for all-noise input.
pub fn normalize_text(raw: &str) -> String {
    static BRACKET_RE: OnceLock<Regex> = OnceLock::new();
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    static SPACE_RE: OnceLock<Regex> = OnceLock::new();

    let bracket = BRACKET_RE.get_or_init(|| Regex::new(r"\[[^\]]+\]").unwrap());
    let tag = TAG_RE.get_or_init(|| Regex::new(r"<[^>]+>").unwrap());
    let space = SPACE_RE.get_or_init(|| Regex::new(r"\s+").unwrap());

    let text = bracket.replace_all(raw, "");
    let text = tag.replace_all(&text, "");
    space.replace_all(&text, " ").trim().to_string()
}

/// Tokenize text for lexical retrieval scoring.
///
/// Lowercases and extracts alphabetic-leading tokens, allowing internal
/// digits, apostrophes and hyphens. Order and duplicates are preserved.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    token_regex()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Return filtered content terms for overlap scoring.
///
/// Drops stopwords, tokens shorter than three characters, and purely numeric
/// tokens. The result is a set; only membership matters downstream.
pub fn content_terms(text: &str) -> HashSet<String> {
    tokenize(text)
        .into_iter()
        .filter(|token| {
            token.len() >= 3
                && !stopwords().contains(token.as_str())
                && !token.chars().all(|c| c.is_ascii_digit())
        })
        .collect()
}

/// Format seconds into a timeline label: `MM:SS` under one hour, `HH:MM:SS`
/// otherwise. Negative inputs clamp to zero.
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}
