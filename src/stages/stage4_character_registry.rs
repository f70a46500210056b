//! Builds the roster of characters that appear in the chapter, with a vote
//! over adjacent gendered pronouns used to describe each one.

use std::collections::HashMap;

use crate::models::{Character, Gender, Segment, SegmentKind};
use crate::pronoun::genders_in_text;

struct Tally {
    count: usize,
    male_votes: usize,
    female_votes: usize,
}

pub fn execute_stage4(segments: &[Segment]) -> Vec<Character> {
    let mut tallies: HashMap<String, Tally> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for (i, segment) in segments.iter().enumerate() {
        if segment.kind != SegmentKind::Dialogue {
            continue;
        }
        let Some(name) = segment.speaker.name() else {
            continue;
        };

        let entry = tallies.entry(name.to_string()).or_insert_with(|| {
            order.push(name.to_string());
            Tally { count: 0, male_votes: 0, female_votes: 0 }
        });
        entry.count += 1;

        for gender in adjacent_genders(segments, i) {
            match gender {
                Gender::Male => entry.male_votes += 1,
                Gender::Female => entry.female_votes += 1,
            }
        }
    }

    let mut characters = vec![Character {
        name: "narrator".to_string(),
        description: "the narrative voice".to_string(),
    }];

    for name in order {
        let tally = &tallies[&name];
        let gender_label = if tally.male_votes > tally.female_votes {
            Some("male")
        } else if tally.female_votes > tally.male_votes {
            Some("female")
        } else {
            None
        };
        let description = match gender_label {
            Some(label) => format!(
                "{label}, {} dialogue segment{}",
                tally.count,
                if tally.count == 1 { "" } else { "s" }
            ),
            None => format!(
                "{} dialogue segment{}",
                tally.count,
                if tally.count == 1 { "" } else { "s" }
            ),
        };
        characters.push(Character { name, description });
    }

    characters
}

fn adjacent_genders(segments: &[Segment], i: usize) -> Vec<Gender> {
    let mut genders = Vec::new();
    if i > 0 && segments[i - 1].kind == SegmentKind::Narration {
        genders.extend(genders_in_text(&segments[i - 1].original_text));
    }
    if let Some(next) = segments.get(i + 1) {
        if next.kind == SegmentKind::Narration {
            genders.extend(genders_in_text(&next.original_text));
        }
    }
    genders
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Segment, SegmentKind, Speaker};

    #[test]
    fn narrator_always_listed_first() {
        let segments = vec![];
        let characters = execute_stage4(&segments);
        assert_eq!(characters.len(), 1);
        assert_eq!(characters[0].name, "narrator");
    }

    #[test]
    fn dialogue_speaker_is_counted_and_gendered() {
        let mut dialogue = Segment::new(1, SegmentKind::Dialogue, "Hi.".to_string(), 0, 0, 0);
        dialogue.speaker = Speaker::Named("Elena".to_string());
        let mut narration = Segment::new(2, SegmentKind::Narration, "Elena said, her eyes narrowing.".to_string(), 1, 0, 0);
        narration.speaker = Speaker::Narrator;

        let characters = execute_stage4(&[dialogue, narration]);
        assert_eq!(characters.len(), 2);
        assert_eq!(characters[1].name, "Elena");
        assert!(characters[1].description.contains("female"));
        assert!(characters[1].description.contains("1 dialogue segment"));
    }
}
