/// Answer cleanup and citation extraction for chat display.
///
/// Model output arrives as free-form markdown-ish text; chat consumers want
/// short plain-text paragraphs. Citation extraction runs against the raw
/// answer before any tags are stripped.
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::retrieval::RankedChunk;

/// Maximum words shown in a chat answer before truncation.
const MAX_ANSWER_WORDS: usize = 110;

/// Maximum citations attached to one answer.
const MAX_CITATIONS: usize = 3;

/// Appended when an answer was cut down to the word limit.
const TRUNCATION_NOTICE: &str = "Showing a shortened answer.";

/// Shown when cleanup leaves nothing usable.
const NO_ANSWER_MESSAGE: &str =
    "I could not find a clear answer to that in the transcript.";

fn chunk_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[chunk-(\d+)\]").unwrap())
}

/// Clean free-form model text into a bounded, markup-free, paragraph-spaced
/// answer.
pub fn clean_answer(raw: &str) -> String {
    let text = strip_code_fences(raw);
    let text = unwrap_emphasis(&text);
    let text = strip_line_prefixes(&text);
    let text = strip_chunk_tags(&text);

    let flattened = reflow_paragraphs(&text);
    let capped = cap_words(&flattened);

    let spaced = space_sentences(&capped);
    if spaced.is_empty() {
        NO_ANSWER_MESSAGE.to_string()
    } else {
        spaced
    }
}

/// Identify which selected chunks the answer actually cited.
///
/// `[chunk-N]` tags in the raw answer are matched against the selected set;
/// when none match, the leading selected chunks serve as a best-guess default
/// so grounded answers never go uncited. Output order follows `selected`.
pub fn extract_citations(raw_answer: &str, selected: &[RankedChunk]) -> Vec<RankedChunk> {
    if selected.is_empty() {
        return Vec::new();
    }

    let cited_ids: HashSet<u32> = chunk_tag_regex()
        .captures_iter(raw_answer)
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .collect();

    let matched: Vec<RankedChunk> = selected
        .iter()
        .filter(|chunk| cited_ids.contains(&chunk.chunk_id))
        .take(MAX_CITATIONS)
        .cloned()
        .collect();

    if !matched.is_empty() {
        return matched;
    }

    selected.iter().take(MAX_CITATIONS).cloned().collect()
}

fn strip_code_fences(text: &str) -> String {
    static FENCE_RE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE_RE.get_or_init(|| Regex::new(r"(?s)```.*?```").unwrap());
    let stripped = fence.replace_all(text, " ");
    // An unterminated fence swallows everything after it.
    match stripped.find("```") {
        Some(pos) => stripped[..pos].to_string(),
        None => stripped.into_owned(),
    }
}

fn unwrap_emphasis(text: &str) -> String {
    static BOLD_RE: OnceLock<Regex> = OnceLock::new();
    static ITALIC_RE: OnceLock<Regex> = OnceLock::new();
    static UNDERSCORE_RE: OnceLock<Regex> = OnceLock::new();
    static CODE_RE: OnceLock<Regex> = OnceLock::new();

    let bold = BOLD_RE.get_or_init(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
    let italic = ITALIC_RE.get_or_init(|| Regex::new(r"\*([^*]+)\*").unwrap());
    let underscore = UNDERSCORE_RE.get_or_init(|| Regex::new(r"_([^_]+)_").unwrap());
    let code = CODE_RE.get_or_init(|| Regex::new(r"`([^`]+)`").unwrap());

    let text = bold.replace_all(text, "$1");
    let text = italic.replace_all(&text, "$1");
    let text = underscore.replace_all(&text, "$1");
    code.replace_all(&text, "$1").into_owned()
}

fn strip_line_prefixes(text: &str) -> String {
    static PREFIX_RE: OnceLock<Regex> = OnceLock::new();
    static SOURCES_RE: OnceLock<Regex> = OnceLock::new();

    let prefix =
        PREFIX_RE.get_or_init(|| Regex::new(r"^\s*(#+\s+|[-*+]\s+|\d+[.)]\s+)").unwrap());
    let sources = SOURCES_RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(sources?|evidence):\s*(\[chunk-\d+\][\s,;]*)+$").unwrap()
    });

    text.lines()
        .filter(|line| !sources.is_match(line))
        .map(|line| prefix.replace(line, "").into_owned())
        .collect::<Vec<String>>()
        .join("\n")
}

fn strip_chunk_tags(text: &str) -> String {
    chunk_tag_regex().replace_all(text, " ").into_owned()
}

/// Join each blank-line-separated paragraph into a single line, then join the
/// paragraphs into one flat text ready for word capping.
fn reflow_paragraphs(text: &str) -> String {
    static BLANK_RE: OnceLock<Regex> = OnceLock::new();
    let blank = BLANK_RE.get_or_init(|| Regex::new(r"\n\s*\n").unwrap());

    blank
        .split(text)
        .map(|para| {
            para.split_whitespace()
                .collect::<Vec<&str>>()
                .join(" ")
        })
        .filter(|para| !para.is_empty())
        .collect::<Vec<String>>()
        .join(" ")
}

/// Cap the answer at the word limit; a no-op for answers already under it.
fn cap_words(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= MAX_ANSWER_WORDS {
        return text.to_string();
    }

    let mut truncated = words[..MAX_ANSWER_WORDS].join(" ");
    truncated = truncated
        .trim_end_matches([',', ';', ':', '-', ' '])
        .to_string();
    if !truncated.ends_with(['.', '!', '?']) {
        truncated.push('.');
    }
    format!("{} {}", truncated, TRUNCATION_NOTICE)
}

/// Insert a blank line after every second sentence to keep chat answers
/// scannable. The final sentence never gets a trailing break.
fn space_sentences(text: &str) -> String {
    let sentences = split_sentences(text);
    let mut out = String::new();

    for (idx, sentence) in sentences.iter().enumerate() {
        out.push_str(sentence);
        if idx + 1 < sentences.len() {
            if (idx + 1) % 2 == 0 {
                out.push_str("\n\n");
            } else {
                out.push(' ');
            }
        }
    }

    out.trim().to_string()
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().map(|n| *n == ' ').unwrap_or(false) {
            chars.next();
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed.to_string());
            }
            current.clear();
        }
    }

    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(chunk_id: u32) -> RankedChunk {
        RankedChunk {
            chunk_id,
            text: format!("chunk {} text", chunk_id),
            start_seconds: 0.0,
            end_seconds: 10.0,
            start_label: "00:00".to_string(),
            end_label: "00:10".to_string(),
            score: 1.0,
        }
    }

    #[test]
    fn test_markup_and_tags_stripped() {
        let raw = "**Key point.** See [chunk-2] for details.";
        assert_eq!(clean_answer(raw), "Key point. See for details.");
    }

    #[test]
    fn test_code_fences_removed() {
        let raw = "Before.\n```python\nprint('hi')\n```\nAfter text here.";
        let cleaned = clean_answer(raw);
        assert!(!cleaned.contains("print"));
        assert!(cleaned.contains("Before."));
        assert!(cleaned.contains("After text here."));
    }

    #[test]
    fn test_list_and_heading_prefixes_stripped() {
        let raw = "# Summary\n- first point\n2. second point";
        let cleaned = clean_answer(raw);
        assert!(cleaned.contains("Summary"));
        assert!(cleaned.contains("first point"));
        assert!(cleaned.contains("second point"));
        assert!(!cleaned.contains('#'));
        assert!(!cleaned.contains("- "));
    }

    #[test]
    fn test_sources_line_dropped() {
        let raw = "The move works from half guard.\n\nSources: [chunk-1] [chunk-4]";
        let cleaned = clean_answer(raw);
        assert!(!cleaned.to_lowercase().contains("sources"));
        assert!(cleaned.contains("half guard"));
    }

    #[test]
    fn test_truncation_applies_notice_and_is_idempotent_for_short_input() {
        let long: String = std::iter::repeat("word")
            .take(200)
            .collect::<Vec<&str>>()
            .join(" ");
        let cleaned = clean_answer(&long);
        assert!(cleaned.contains(TRUNCATION_NOTICE));
        let body = cleaned.replace(TRUNCATION_NOTICE, "");
        assert!(body.split_whitespace().count() <= MAX_ANSWER_WORDS);

        let short = "A short answer.";
        assert_eq!(clean_answer(short), short);
    }

    #[test]
    fn test_sentence_spacing_every_second_sentence() {
        let raw = "One here. Two here. Three here. Four here. Five here.";
        let cleaned = clean_answer(raw);
        let paragraphs: Vec<&str> = cleaned.split("\n\n").collect();
        assert_eq!(paragraphs.len(), 3);
        assert_eq!(paragraphs[0], "One here. Two here.");
        assert_eq!(paragraphs[1], "Three here. Four here.");
        assert_eq!(paragraphs[2], "Five here.");
    }

    #[test]
    fn test_empty_input_yields_fixed_message() {
        assert_eq!(clean_answer(""), NO_ANSWER_MESSAGE);
        assert_eq!(clean_answer("```\nonly code\n```"), NO_ANSWER_MESSAGE);
    }

    #[test]
    fn test_citations_follow_explicit_tags() {
        let selected = vec![ranked(1), ranked(2), ranked(3)];
        let citations = extract_citations("As shown in [chunk-2].", &selected);
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].chunk_id, 2);
    }

    #[test]
    fn test_citations_default_to_leading_selection() {
        let selected = vec![ranked(1), ranked(2), ranked(3), ranked(4)];
        let citations = extract_citations("No tags at all.", &selected);
        assert_eq!(citations.len(), 3);
        assert_eq!(citations[0].chunk_id, 1);
    }

    #[test]
    fn test_citation_cap_of_three() {
        let selected: Vec<RankedChunk> = (1..=6).map(ranked).collect();
        let raw = "[chunk-1] [chunk-2] [chunk-3] [chunk-4] [chunk-5] [chunk-6]";
        let citations = extract_citations(raw, &selected);
        assert_eq!(citations.len(), 3);
    }

    #[test]
    fn test_tags_outside_selection_fall_back() {
        let selected = vec![ranked(1), ranked(2)];
        let citations = extract_citations("See [chunk-9].", &selected);
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].chunk_id, 1);
    }

    #[test]
    fn test_no_selection_means_no_citations() {
        assert!(extract_citations("[chunk-1]", &[]).is_empty());
    }
}
