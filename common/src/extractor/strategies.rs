//! One function per extraction strategy.
//!
//! Every function is total: any input, including the empty string,
//! produces a (possibly empty) list and never an error.

use super::normalize::{capitalize_first, clean_item, strip_bullet};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref BULLET_LINE: Regex = Regex::new(r"(?m)^[ \t]*[-*•][ \t]+(.+)$").unwrap();
    static ref LEADING_CONJUNCTION: Regex = Regex::new(r"(?i)^(?:and|or)\s+").unwrap();
    static ref BLANK_LINE: Regex = Regex::new(r"\r?\n[ \t]*\r?\n").unwrap();
    static ref LABEL_LINE: Regex =
        Regex::new(r"^[ \t]*(?:#+[ \t]*|\*\*)?[A-Za-z][A-Za-z ]{0,40}:(?:\*\*)?[ \t]*").unwrap();
}

fn collect_clean<'a>(pieces: impl Iterator<Item = &'a str>, synonyms: &[String]) -> Vec<String> {
    pieces
        .map(|piece| clean_item(strip_bullet(piece), synonyms))
        .filter(|item| !item.is_empty())
        .collect()
}

/// Lines starting with `- `, `* ` or `• `
pub fn bullet_lines(text: &str, synonyms: &[String]) -> Vec<String> {
    let lines = BULLET_LINE.captures_iter(text).filter_map(|cap| cap.get(1)).map(|m| m.as_str());
    collect_clean(lines, synonyms)
}

/// Comma list following a phrase such as "such as", up to the end of the sentence
pub fn phrase_list(text: &str, phrase: &Regex, synonyms: &[String]) -> Vec<String> {
    let Some(found) = phrase.find(text) else {
        return Vec::new();
    };

    let after = &text[found.end()..];
    let sentence = after.split(['.', '!', '\n']).next().unwrap_or("");

    sentence
        .split(',')
        .map(|piece| LEADING_CONJUNCTION.replace(piece.trim(), "").to_string())
        .map(|piece| clean_item(&piece, synonyms))
        .filter(|item| !item.is_empty())
        .map(|item| capitalize_first(&item))
        .collect()
}

/// Block after a `Header:` label, split by `separators`.
///
/// The block ends at a blank line or the end of the text. With
/// `stop_at_labels` it also ends at the next line that opens with its own
/// `Label:` (a following section whose heading shares no blank line).
pub fn header_block(
    text: &str,
    header: &Regex,
    separators: &Regex,
    stop_at_labels: bool,
    synonyms: &[String],
) -> Vec<String> {
    let Some(found) = header.find(text) else {
        return Vec::new();
    };

    let rest = &text[found.end()..];
    let mut block = match BLANK_LINE.find(rest) {
        Some(m) => &rest[..m.start()],
        None => rest,
    };

    if stop_at_labels {
        // the first line continues the header itself and is never a stop
        let mut offset = block.find('\n').map(|i| i + 1).unwrap_or(block.len());
        while offset < block.len() {
            let line_end = block[offset..].find('\n').map(|i| offset + i + 1).unwrap_or(block.len());
            let line = &block[offset..line_end];
            if LABEL_LINE.is_match(line) && !line.trim().is_empty() {
                block = &block[..offset];
                break;
            }
            offset = line_end;
        }
    }

    collect_clean(separators.split(block), synonyms)
}

/// First sentence matching `sentence`, split into items.
///
/// `lead_in` removes an introduction such as "Common symptoms include"
/// from the first item.
pub fn sentence_containing(
    text: &str,
    sentence: &Regex,
    separators: &Regex,
    lead_in: Option<&Regex>,
    synonyms: &[String],
) -> Vec<String> {
    let Some(found) = sentence.find(text) else {
        return Vec::new();
    };

    let pieces = separators.split(found.as_str()).map(|piece| match lead_in {
        Some(re) => re.replace(piece.trim(), "").to_string(),
        None => piece.trim().to_string(),
    });

    pieces
        .map(|piece| clean_item(&piece, synonyms))
        .filter(|item| !item.is_empty())
        .collect()
}

/// Up to `limit` non-blank lines matching `keywords`
pub fn keyword_lines(text: &str, keywords: &Regex, limit: usize, synonyms: &[String]) -> Vec<String> {
    let lines = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| keywords.is_match(line))
        .take(limit);
    collect_clean(lines, synonyms)
}
