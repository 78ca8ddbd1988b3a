//! Repair of OCR-split credit scores.
//!
//! Scanned reports often print the score as spaced glyphs ("6 5 4") or with
//! look-alike letters ("6S4"). Only the slot next to a score label is
//! touched; everything else in the text is returned unchanged.

use tracing::trace;

use super::{RuleSet, strip_separators};
use crate::models::config::ScoreRange;

/// Trimmed lines below a score label at most this long may hold the score alone.
const MAX_SCORE_LINE: usize = 10;

/// Longest run of glyphs between spaces inside a split score.
const MAX_TOKEN_CHARS: usize = 3;

/// Rewrite OCR-split scores next to score labels into plain digits.
///
/// Applying it twice gives the same text as applying it once.
pub fn normalize(text: &str, rules: &RuleSet) -> String {
    let mut edits: Vec<(usize, usize, String)> = Vec::new();

    for (_, label_end) in rules.table.score.label_spans(text) {
        let Some(slot_start) = score_slot(text, label_end, rules) else {
            continue;
        };
        let slot = line_rest(&text[slot_start..]);
        if let Some((digits, len)) = collapse_run(slot, rules.score_range) {
            if slot[..len] != digits {
                trace!("Normalized score {:?} -> {}", &slot[..len], digits);
                edits.push((slot_start, slot_start + len, digits));
            }
        }
    }

    if edits.is_empty() {
        return text.to_string();
    }

    edits.sort_by_key(|e| e.0);
    edits.dedup_by_key(|e| e.0);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (start, end, digits) in edits {
        if start < cursor {
            continue;
        }
        out.push_str(&text[cursor..start]);
        out.push_str(&digits);
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Byte offset where a score may start for the label ending at `label_end`.
fn score_slot(text: &str, label_end: usize, rules: &RuleSet) -> Option<usize> {
    let line = line_rest(&text[label_end..]);
    let slot = strip_separators(line);
    if slot.starts_with(|c: char| c.is_ascii_digit()) {
        return Some(label_end + (line.len() - slot.len()));
    }

    let breaks = &rules.table.score.section_breaks;
    let mut cursor = label_end + line.len();
    let mut seen = 0;
    while seen < rules.lookahead_lines && cursor < text.len() {
        // Step over the newline ending the previous line
        cursor += 1;
        let line_start = cursor;
        let next = line_rest(&text[cursor..]);
        cursor += next.len();

        let trimmed = next.trim();
        if trimmed.is_empty() {
            continue;
        }
        seen += 1;
        if breaks.iter().any(|re| re.is_match(next)) {
            return None;
        }
        if trimmed.chars().count() <= MAX_SCORE_LINE && trimmed.starts_with(|c: char| c.is_ascii_digit()) {
            return Some(line_start + (next.len() - next.trim_start().len()));
        }
    }
    None
}

/// Collapse a run of short digit-like tokens at the start of `slot` into a
/// three-digit score. Returns the digits and the bytes of `slot` they replace.
fn collapse_run(slot: &str, range: ScoreRange) -> Option<(String, usize)> {
    if !slot.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let mut digits = String::new();
    let mut end = 0;
    let mut token_start = 0;
    loop {
        let rest = &slot[token_start..];
        let token_len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '|'))
            .unwrap_or(rest.len());
        let token = &rest[..token_len];
        if token.is_empty() {
            break;
        }

        if digits.len() == 3 {
            // "6 5 4 1" is not a score with a stray digit after it
            if token.starts_with(|c: char| c.is_ascii_digit()) {
                return None;
            }
            break;
        }

        if token.chars().count() > MAX_TOKEN_CHARS {
            return None;
        }
        let mapped: String = token.chars().map(ocr_digit).collect::<Option<_>>()?;
        if digits.len() + mapped.len() > 3 {
            return None;
        }
        digits.push_str(&mapped);
        end = token_start + token_len;

        let after = &slot[end..];
        let gap = after.len() - after.trim_start_matches([' ', '\t']).len();
        if gap == 0 {
            break;
        }
        token_start = end + gap;
    }

    if digits.len() != 3 {
        return None;
    }
    let value: u16 = digits.parse().ok()?;
    range.contains(value).then_some((digits, end))
}

/// Digit a glyph is commonly misread for.
fn ocr_digit(c: char) -> Option<char> {
    match c {
        '0'..='9' => Some(c),
        'O' | 'o' | 'D' | 'Q' => Some('0'),
        'I' | 'l' | 'i' | '|' => Some('1'),
        'Z' | 'z' => Some('2'),
        'A' => Some('4'),
        'S' | 's' => Some('5'),
        'G' | 'b' => Some('6'),
        'T' => Some('7'),
        'B' => Some('8'),
        'g' | 'q' => Some('9'),
        _ => None,
    }
}

fn line_rest(s: &str) -> &str {
    match s.find('\n') {
        Some(i) => &s[..i],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn norm(text: &str) -> String {
        normalize(text, &RuleSet::default())
    }

    #[test]
    fn test_spaced_digits_collapsed() {
        assert_eq!(norm("Score: 6 5 4 as of 12/01/2024"), "Score: 654 as of 12/01/2024");
    }

    #[test]
    fn test_lookalike_letters_mapped() {
        assert_eq!(norm("CIBIL Score 7S0\n"), "CIBIL Score 750\n");
        assert_eq!(norm("CIBIL Score: 8 O I"), "CIBIL Score: 801");
    }

    #[test]
    fn test_score_on_line_below_label() {
        let text = "CIBIL Score\n\n  7 4 2\nPersonal Information";
        assert_eq!(norm(text), "CIBIL Score\n\n  742\nPersonal Information");
    }

    #[test]
    fn test_clean_text_unchanged() {
        let text = "CIBIL Score: 742\nTotal Accounts 6 5 4";
        assert_eq!(norm(text), text);
    }

    #[test]
    fn test_out_of_range_left_alone() {
        assert_eq!(norm("Score: 1 2 3"), "Score: 1 2 3");
    }

    #[test]
    fn test_longer_digit_runs_left_alone() {
        assert_eq!(norm("Score: 6 5 4 1"), "Score: 6 5 4 1");
        assert_eq!(norm("Score: 65 43"), "Score: 65 43");
    }

    #[test]
    fn test_excluded_label_left_alone() {
        let text = "Score Control Number: 4 5 6";
        assert_eq!(norm(text), text);
    }

    #[test]
    fn test_idempotent() {
        let once = norm("CIBIL Score\n6 S 4\nScore: 7 0 1 as on 01/02/2023");
        assert_eq!(norm(&once), once);
        assert_eq!(once, "CIBIL Score\n654\nScore: 701 as on 01/02/2023");
    }

    #[test]
    fn test_collapse_run() {
        let range = ScoreRange::default();
        assert_eq!(collapse_run("6 5 4, good", range), Some(("654".to_string(), 5)));
        assert_eq!(collapse_run("S 5 4", range), None);
        assert_eq!(collapse_run("7 l", range), None);
    }
}
