//! Splits raw chapter text into alternating narration/dialogue segments.
//!
//! Runs a small per-paragraph state machine over chars (not bytes, so
//! multi-byte quote glyphs never land mid-codepoint) that flips between
//! `Narration` and `Dialogue` at quote boundaries, then merges adjacent
//! narration spans back together so short interjections like "he said"
//! don't fragment the prose into tiny segments.

use crate::models::{Segment, SegmentKind};

const OPEN_QUOTES: &[char] = &['\u{201C}', '\u{00AB}']; // “ «
const CLOSE_QUOTES: &[char] = &['\u{201D}', '\u{00BB}']; // ” »
const STRAIGHT_DOUBLE: char = '"';
const CLOSING_CONTEXT: &[char] = &['.', ',', '!', '?', ';', '\u{2026}', '\u{2019}', '\''];

#[derive(Debug, Clone)]
pub struct Stage1Config {
    /// Maximum combined length, in chars, for merging adjacent narration
    /// spans into a single segment.
    pub merge_max_chars: usize,
}

impl Default for Stage1Config {
    fn default() -> Self {
        Self { merge_max_chars: 800 }
    }
}

#[derive(Debug, Clone)]
pub struct Stage1Result {
    pub segments: Vec<Segment>,
    pub paragraphs_seen: usize,
    pub merges_applied: usize,
}

pub fn execute_stage1(text: &str, config: &Stage1Config) -> Stage1Result {
    let mut raw_segments: Vec<Segment> = Vec::new();
    let mut paragraphs_seen = 0usize;
    let mut global_offset = 0usize;
    let mut next_id = 1u32;

    for (paragraph_index, paragraph) in text.split('\n').enumerate() {
        let chars: Vec<char> = paragraph.chars().collect();
        let paragraph_len = chars.len();

        if !chars.is_empty() {
            paragraphs_seen += 1;
            for (kind, start, end, raw_text) in split_paragraph(&chars) {
                let trimmed = raw_text.trim();
                if !trimmed.is_empty() {
                    raw_segments.push(Segment::new(
                        next_id,
                        kind,
                        trimmed.to_string(),
                        paragraph_index,
                        global_offset + start,
                        global_offset + end,
                    ));
                    next_id += 1;
                }
            }
        }

        // +1 for the '\n' consumed by split(), except there is no
        // trailing newline after the final paragraph.
        global_offset += paragraph_len + 1;
    }

    let merges_applied = merge_narration(&mut raw_segments, config.merge_max_chars);
    renumber(&mut raw_segments);

    Stage1Result {
        segments: raw_segments,
        paragraphs_seen,
        merges_applied,
    }
}

/// Splits one paragraph's chars into (kind, start, end, text) spans, where
/// `start`/`end` are char offsets relative to the paragraph and `text` is
/// already stripped of its bounding quote characters for dialogue.
fn split_paragraph(chars: &[char]) -> Vec<(SegmentKind, usize, usize, String)> {
    let mut spans = Vec::new();
    let mut state = SegmentKind::Narration;
    let mut span_start = 0usize;
    let n = chars.len();
    let mut i = 0usize;

    while i < n {
        let c = chars[i];

        if is_apostrophe(chars, i) {
            i += 1;
            continue;
        }

        match state {
            SegmentKind::Narration => {
                if is_open_quote(chars, i) {
                    if i > span_start {
                        spans.push((
                            SegmentKind::Narration,
                            span_start,
                            i,
                            chars[span_start..i].iter().collect(),
                        ));
                    }
                    state = SegmentKind::Dialogue;
                    span_start = i;
                }
            }
            SegmentKind::Dialogue => {
                if is_close_quote(chars, i) {
                    let end = i + 1;
                    let inner: String = chars[span_start + 1..end - 1].iter().collect();
                    spans.push((SegmentKind::Dialogue, span_start, end, inner));
                    state = SegmentKind::Narration;
                    span_start = end;
                }
            }
        }
        i += 1;
    }

    if span_start < n {
        match state {
            SegmentKind::Narration => {
                spans.push((
                    SegmentKind::Narration,
                    span_start,
                    n,
                    chars[span_start..n].iter().collect(),
                ));
            }
            SegmentKind::Dialogue => {
                // Unclosed quote: the remainder of the paragraph becomes one
                // dialogue segment, minus the opening quote character.
                let inner: String = chars[span_start + 1..n].iter().collect();
                spans.push((SegmentKind::Dialogue, span_start, n, inner));
            }
        }
    }

    spans
}

fn is_apostrophe(chars: &[char], i: usize) -> bool {
    let c = chars[i];
    if c != '\'' && c != '\u{2019}' {
        return false;
    }
    let prev_letter = i > 0 && chars[i - 1].is_alphabetic();
    let next_letter = i + 1 < chars.len() && chars[i + 1].is_alphabetic();
    prev_letter && next_letter
}

fn is_open_quote(chars: &[char], i: usize) -> bool {
    let c = chars[i];
    if OPEN_QUOTES.contains(&c) {
        return true;
    }
    c == STRAIGHT_DOUBLE && !is_closing_straight_quote(chars, i)
}

fn is_close_quote(chars: &[char], i: usize) -> bool {
    let c = chars[i];
    if CLOSE_QUOTES.contains(&c) {
        return true;
    }
    c == STRAIGHT_DOUBLE && is_closing_straight_quote(chars, i)
}

fn is_closing_straight_quote(chars: &[char], i: usize) -> bool {
    if i == 0 {
        return false;
    }
    let prev = chars[i - 1];
    prev.is_alphanumeric() || CLOSING_CONTEXT.contains(&prev)
}

/// Merges consecutive narration segments, joined by `\n`, while the
/// combined length stays within `max_chars`. Keeps the lower
/// `paragraph_index` of the two and extends the offset range.
fn merge_narration(segments: &mut Vec<Segment>, max_chars: usize) -> usize {
    let mut merged = Vec::with_capacity(segments.len());
    let mut merges_applied = 0usize;

    for segment in segments.drain(..) {
        if let (SegmentKind::Narration, Some(last)) = (segment.kind, merged.last_mut()) {
            if matches!(last_kind(last), SegmentKind::Narration)
                && last_len(last) + 1 + segment.original_text.chars().count() <= max_chars
            {
                extend_narration(last, segment);
                merges_applied += 1;
                continue;
            }
        }
        merged.push(segment);
    }

    *segments = merged;
    merges_applied
}

fn last_kind(segment: &Segment) -> SegmentKind {
    segment.kind
}

fn last_len(segment: &Segment) -> usize {
    segment.original_text.chars().count()
}

fn extend_narration(target: &mut Segment, next: Segment) {
    target.original_text.push('\n');
    target.original_text.push_str(&next.original_text);
    target.char_offset_end = next.char_offset_end;
}

fn renumber(segments: &mut [Segment]) {
    for (index, segment) in segments.iter_mut().enumerate() {
        segment.id = (index + 1) as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Speaker;

    #[test]
    fn plain_narration_has_no_dialogue() {
        let result = execute_stage1("Once upon a time there was a quiet house.", &Stage1Config::default());
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].kind, SegmentKind::Narration);
        assert_eq!(result.segments[0].speaker, Speaker::Narrator);
    }

    #[test]
    fn explicit_attribution_pattern_splits_correctly() {
        let result = execute_stage1(
            "\"Hello,\" said Elena. Marcus nodded.",
            &Stage1Config::default(),
        );
        assert_eq!(result.segments.len(), 2);
        assert_eq!(result.segments[0].kind, SegmentKind::Dialogue);
        assert_eq!(result.segments[0].original_text, "Hello,");
        assert_eq!(result.segments[1].kind, SegmentKind::Narration);
        assert_eq!(result.segments[1].original_text, "said Elena. Marcus nodded.");
    }

    #[test]
    fn split_dialogue_around_a_tag() {
        let result = execute_stage1(
            "\"I won't,\" she whispered, \"do it.\"",
            &Stage1Config::default(),
        );
        assert_eq!(result.segments.len(), 3);
        assert_eq!(result.segments[0].original_text, "I won't,");
        assert_eq!(result.segments[0].kind, SegmentKind::Dialogue);
        assert_eq!(result.segments[1].original_text, ", she whispered,");
        assert_eq!(result.segments[1].kind, SegmentKind::Narration);
        assert_eq!(result.segments[2].original_text, "do it.");
        assert_eq!(result.segments[2].kind, SegmentKind::Dialogue);
    }

    #[test]
    fn empty_input_yields_no_segments() {
        let result = execute_stage1("", &Stage1Config::default());
        assert!(result.segments.is_empty());
    }

    #[test]
    fn adjacent_narration_paragraphs_merge() {
        let result = execute_stage1("First line.\nSecond line.", &Stage1Config::default());
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].original_text, "First line.\nSecond line.");
        assert_eq!(result.segments[0].paragraph_index, 0);
    }

    #[test]
    fn ids_are_sequential_from_one() {
        let result = execute_stage1(
            "\"Hi,\" said Anna.\n\n\"Hi yourself,\" said Ben.",
            &Stage1Config::default(),
        );
        for (i, segment) in result.segments.iter().enumerate() {
            assert_eq!(segment.id, (i + 1) as u32);
        }
    }
}
