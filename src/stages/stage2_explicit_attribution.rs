//! Resolves unknown dialogue speakers by matching speech-verb patterns
//! ("said Elena", "Marcus asked", "she whispered") in the narration
//! immediately before and after a line of dialogue.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::{AttributionSource, Segment, SegmentKind, Speaker};

const SPEECH_VERBS_RAW: &str = include_str!("../../data/speech_verbs.txt");

const NON_NAMES: &[&str] = &[
    "The", "They", "But", "Then", "When", "Where", "What", "Who", "Why", "How", "If", "This",
    "That", "These", "Those", "There", "Here", "His", "Her", "Their", "Its", "It", "And", "Or",
    "So", "Yet", "For", "Nor", "Because", "Although", "While", "After", "Before", "Since",
    "Until", "As", "Now", "Today", "Tomorrow", "Yesterday", "Chapter", "Part", "Book", "Suddenly",
    "He", "She", "I", "We", "You",
];

fn speech_verbs() -> &'static Vec<String> {
    static VERBS: OnceLock<Vec<String>> = OnceLock::new();
    VERBS.get_or_init(|| {
        let mut verbs: Vec<String> = SPEECH_VERBS_RAW
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|s| s.to_string())
            .collect();
        verbs.sort_by_key(|v| std::cmp::Reverse(v.len()));
        verbs
    })
}

fn verb_alternation() -> String {
    speech_verbs()
        .iter()
        .map(|v| regex::escape(v))
        .collect::<Vec<_>>()
        .join("|")
}

const NAME_GROUP: &str = r"(?:[Tt]he\s+)?[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*";

struct Patterns {
    verb_name: Regex,
    name_verb: Regex,
    pronoun_verb: Regex,
    verb_pronoun: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let verbs = verb_alternation();
        Patterns {
            verb_name: Regex::new(&format!(r"(?i:{verbs})\s+(?P<name>{NAME_GROUP})")).unwrap(),
            name_verb: Regex::new(&format!(r"(?P<name>{NAME_GROUP})\s+(?i:{verbs})")).unwrap(),
            pronoun_verb: Regex::new(&format!(r"(?i:(?P<pronoun>he|she)\s+(?:{verbs}))")).unwrap(),
            verb_pronoun: Regex::new(&format!(r"(?i:(?:{verbs})\s+(?P<pronoun>he|she))")).unwrap(),
        }
    })
}

#[derive(Debug, Clone, Default)]
pub struct Stage2Result {
    pub attributed: usize,
    pub pronoun_only: usize,
}

pub fn execute_stage2(segments: &mut [Segment]) -> Stage2Result {
    let mut result = Stage2Result::default();
    let len = segments.len();

    for i in 0..len {
        if !segments[i].is_dialogue() || !segments[i].speaker.is_unknown() {
            continue;
        }

        let prev_text = prev_narration_text(segments, i);
        let next_text = next_narration_text(segments, i);
        let context = match (&prev_text, &next_text) {
            (Some(p), Some(n)) => format!("{p} {n}"),
            (Some(p), None) => p.clone(),
            (None, Some(n)) => n.clone(),
            (None, None) => continue,
        };

        if let Some(name) = try_named_match(&context) {
            segments[i].speaker = Speaker::Named(name);
            segments[i].attribution_source = AttributionSource::Explicit;
            result.attributed += 1;
        } else if let Some(source) = try_pronoun_match(&context) {
            segments[i].attribution_source = source;
            result.pronoun_only += 1;
        }
    }

    result
}

fn prev_narration_text(segments: &[Segment], i: usize) -> Option<String> {
    if i == 0 {
        return None;
    }
    let prev = &segments[i - 1];
    (prev.kind == SegmentKind::Narration).then(|| prev.original_text.clone())
}

fn next_narration_text(segments: &[Segment], i: usize) -> Option<String> {
    let next = segments.get(i + 1)?;
    (next.kind == SegmentKind::Narration).then(|| next.original_text.clone())
}

fn try_named_match(context: &str) -> Option<String> {
    let p = patterns();
    for re in [&p.verb_name, &p.name_verb] {
        for caps in re.captures_iter(context) {
            if let Some(name) = clean_name(&caps["name"]) {
                return Some(name);
            }
        }
    }
    None
}

fn try_pronoun_match(context: &str) -> Option<AttributionSource> {
    let p = patterns();
    for re in [&p.pronoun_verb, &p.verb_pronoun] {
        if let Some(caps) = re.captures(context) {
            let pronoun = caps["pronoun"].to_ascii_lowercase();
            return Some(if pronoun == "he" {
                AttributionSource::PronounMale
            } else {
                AttributionSource::PronounFemale
            });
        }
    }
    None
}

fn clean_name(raw: &str) -> Option<String> {
    let stripped = raw
        .strip_prefix("The ")
        .or_else(|| raw.strip_prefix("the "))
        .unwrap_or(raw);
    let stripped = stripped.trim();
    if stripped.len() < 2 {
        return None;
    }
    let first_word = stripped.split_whitespace().next().unwrap_or("");
    if NON_NAMES.contains(&first_word) {
        return None;
    }
    Some(stripped.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::stage1_segment_splitter::{execute_stage1, Stage1Config};

    #[test]
    fn verb_name_pattern_attributes_speaker() {
        let mut result = execute_stage1("\"Hello,\" said Elena. Marcus nodded.", &Stage1Config::default());
        execute_stage2(&mut result.segments);
        assert_eq!(result.segments[0].speaker.name(), Some("Elena"));
        assert_eq!(result.segments[0].attribution_source, AttributionSource::Explicit);
    }

    #[test]
    fn name_verb_pattern_attributes_speaker() {
        let mut result = execute_stage1("\"Hello.\" Marcus said quietly.", &Stage1Config::default());
        execute_stage2(&mut result.segments);
        assert_eq!(result.segments[0].speaker.name(), Some("Marcus"));
    }

    #[test]
    fn pronoun_only_leaves_speaker_unknown() {
        let mut result = execute_stage1("\"Hello.\" She said nothing else.", &Stage1Config::default());
        execute_stage2(&mut result.segments);
        assert!(result.segments[0].speaker.is_unknown());
        assert_eq!(result.segments[0].attribution_source, AttributionSource::PronounFemale);
    }

    #[test]
    fn stop_listed_word_is_rejected_as_a_name() {
        let mut result = execute_stage1("\"Hello.\" The man said it twice.", &Stage1Config::default());
        execute_stage2(&mut result.segments);
        assert!(result.segments[0].speaker.is_unknown());
    }

    #[test]
    fn named_match_skips_a_leading_stop_listed_candidate() {
        let context = "said The man and asked Marcus";
        assert_eq!(try_named_match(context), Some("Marcus".to_string()));
    }
}
