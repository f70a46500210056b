//! Resolves remaining unknown speakers two ways: (a) collapsing a pronoun
//! attribution down to a name when exactly one known speaker has that
//! gender, and (b) assuming two speakers are alternating within a
//! conversational block and picking "whoever didn't speak most recently".

use std::collections::HashMap;

use crate::models::{AttributionSource, Gender, Segment, SegmentKind, Speaker};
use crate::pronoun::last_gender_in_text;

const NARRATION_GAP_RESET: usize = 2;

#[derive(Debug, Clone, Default)]
pub struct Stage3Result {
    pub resolved_by_pronoun: usize,
    pub resolved_by_alternation: usize,
}

pub fn execute_stage3(segments: &mut [Segment]) -> Stage3Result {
    let mut result = Stage3Result::default();
    resolve_pronouns(segments, &mut result);
    alternate_speakers(segments, &mut result);
    result
}

fn resolve_pronouns(segments: &mut [Segment], result: &mut Stage3Result) {
    let mut known_speakers: HashMap<String, Gender> = HashMap::new();

    for i in 0..segments.len() {
        if let Some(name) = segments[i].speaker.name() {
            if let Some(gender) = adjacent_gender(segments, i) {
                known_speakers.insert(name.to_string(), gender);
            }
        }
    }

    for i in 0..segments.len() {
        let Some(wanted) = segments[i].attribution_source.gender() else {
            continue;
        };
        if !segments[i].speaker.is_unknown() {
            continue;
        }
        let matches: Vec<&String> = known_speakers
            .iter()
            .filter(|(_, gender)| **gender == wanted)
            .map(|(name, _)| name)
            .collect();
        if matches.len() == 1 {
            segments[i].speaker = Speaker::Named(matches[0].clone());
            segments[i].attribution_source = AttributionSource::TurnTaking;
            result.resolved_by_pronoun += 1;
        }
    }
}

fn adjacent_gender(segments: &[Segment], i: usize) -> Option<Gender> {
    let mut found = None;
    if i > 0 && segments[i - 1].kind == SegmentKind::Narration {
        found = last_gender_in_text(&segments[i - 1].original_text).or(found);
    }
    if let Some(next) = segments.get(i + 1) {
        if next.kind == SegmentKind::Narration {
            found = last_gender_in_text(&next.original_text).or(found);
        }
    }
    found
}

fn alternate_speakers(segments: &mut [Segment], result: &mut Stage3Result) {
    let mut recent: Vec<String> = Vec::new();
    let mut narration_run = 0usize;

    for i in 0..segments.len() {
        match segments[i].kind {
            SegmentKind::Narration => {
                narration_run += 1;
                if narration_run >= NARRATION_GAP_RESET {
                    recent.clear();
                }
                continue;
            }
            SegmentKind::Dialogue => {
                narration_run = 0;
            }
        }

        if segments[i].speaker.is_unknown() {
            if recent.len() >= 2 {
                let other = recent[recent.len() - 2].clone();
                segments[i].speaker = Speaker::Named(other);
                segments[i].attribution_source = AttributionSource::TurnTaking;
                result.resolved_by_alternation += 1;
            }
        }

        if let Some(name) = segments[i].speaker.name() {
            recent.retain(|s| s != name);
            recent.push(name.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Segment, SegmentKind};

    fn dialogue(id: u32, text: &str, paragraph_index: usize) -> Segment {
        Segment::new(id, SegmentKind::Dialogue, text.to_string(), paragraph_index, 0, 0)
    }

    fn narration(id: u32, text: &str, paragraph_index: usize) -> Segment {
        let mut s = Segment::new(id, SegmentKind::Narration, text.to_string(), paragraph_index, 0, 0);
        s.speaker = Speaker::Narrator;
        s
    }

    #[test]
    fn alternation_fills_in_unattributed_lines() {
        let mut segments = vec![
            dialogue(1, "Hi there.", 0),
            narration(2, "said Anna.", 1),
            dialogue(3, "Hello yourself.", 2),
            narration(4, "replied Ben.", 3),
            dialogue(5, "How are you?", 4),
            dialogue(6, "Fine, thanks.", 5),
            dialogue(7, "Good to hear.", 6),
        ];
        segments[0].speaker = Speaker::Named("Anna".to_string());
        segments[0].attribution_source = AttributionSource::Explicit;
        segments[2].speaker = Speaker::Named("Ben".to_string());
        segments[2].attribution_source = AttributionSource::Explicit;

        execute_stage3(&mut segments);

        assert_eq!(segments[4].speaker.name(), Some("Anna"));
        assert_eq!(segments[5].speaker.name(), Some("Ben"));
        assert_eq!(segments[6].speaker.name(), Some("Anna"));
    }

    #[test]
    fn scene_break_clears_alternation_history() {
        let mut segments = vec![
            dialogue(1, "Hi there.", 0),
            dialogue(2, "Hello yourself.", 1),
            narration(3, "Two paragraphs passed in silence.", 2),
            narration(4, "The house grew quiet.", 3),
            dialogue(5, "Who's there?", 4),
        ];
        segments[0].speaker = Speaker::Named("Anna".to_string());
        segments[1].speaker = Speaker::Named("Ben".to_string());

        execute_stage3(&mut segments);

        assert!(segments[4].speaker.is_unknown());
    }

    #[test]
    fn single_known_gender_resolves_pronoun_only_attribution() {
        let mut segments = vec![
            dialogue(1, "Hi there.", 0),
            narration(2, "Anna said, her voice trembling.", 1),
            dialogue(3, "Hello.", 2),
        ];
        segments[0].speaker = Speaker::Named("Anna".to_string());
        segments[0].attribution_source = AttributionSource::Explicit;
        segments[2].attribution_source = AttributionSource::PronounFemale;

        execute_stage3(&mut segments);

        assert_eq!(segments[2].speaker.name(), Some("Anna"));
    }
}
