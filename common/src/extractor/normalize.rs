//! Line normalization shared by every extraction rule

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref LEADING_MARKERS: Regex = Regex::new(r"^[-*>•\s]+").unwrap();
    static ref LEADING_HEADING: Regex = Regex::new(r"^#+\s*").unwrap();
    static ref BOLD_MARKERS: Regex = Regex::new(r"\*\*|__").unwrap();
    static ref WRAPPING_EMPHASIS: Regex = Regex::new(r"^[*_]+|[*_]+$").unwrap();
    static ref LEADING_BULLET: Regex = Regex::new(r"^\s*[-*•]\s*").unwrap();
    static ref PARAGRAPH_BREAK: Regex = Regex::new(r"\n\s*\n").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Strip bullet/heading/emphasis markers from one extracted item.
///
/// Returns an empty string when what is left is a bare section heading
/// (one of `heading_synonyms`, with or without a trailing colon).
pub fn clean_item(raw: &str, heading_synonyms: &[String]) -> String {
    let text = LEADING_MARKERS.replace(raw, "");
    let text = LEADING_HEADING.replace(&text, "");
    let text = BOLD_MARKERS.replace_all(&text, "");
    let text = WRAPPING_EMPHASIS.replace_all(&text, "");
    let text = text.trim();

    if is_heading(text, heading_synonyms) {
        return String::new();
    }
    text.to_string()
}

/// `Summary`, `summary:`, `Report  Details:` ...
pub fn is_heading(text: &str, heading_synonyms: &[String]) -> bool {
    let key = canonical(text.trim_end_matches(':'));
    !key.is_empty() && heading_synonyms.iter().any(|h| canonical(h) == key)
}

fn canonical(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").to_lowercase()
}

/// Remove a leading `- `, `* ` or `• ` marker only
pub fn strip_bullet(text: &str) -> &str {
    match LEADING_BULLET.find(text) {
        Some(m) => text[m.end()..].trim(),
        None => text.trim(),
    }
}

/// Upper-case the first character, leave the rest untouched
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Text up to the first blank line
pub fn first_paragraph(text: &str) -> &str {
    PARAGRAPH_BREAK.split(text).next().unwrap_or(text).trim()
}

/// Split after `.`, `!` or `?` when followed by whitespace
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if matches!(ch, '.' | '!' | '?') {
            if let Some(&(next_idx, next)) = chars.peek() {
                if next.is_whitespace() {
                    let sentence = text[start..idx + ch.len_utf8()].trim();
                    if !sentence.is_empty() {
                        sentences.push(sentence);
                    }
                    start = next_idx;
                }
            }
        }
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

/// First paragraph, cut to its first `max_sentences` sentences
pub fn summarize(text: &str, max_sentences: usize) -> String {
    let paragraph = first_paragraph(text);
    let sentences = split_sentences(paragraph);
    if sentences.len() <= 1 {
        return paragraph.to_string();
    }
    sentences
        .into_iter()
        .take(max_sentences.max(1))
        .collect::<Vec<_>>()
        .join(" ")
}
