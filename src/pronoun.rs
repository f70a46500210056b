//! Shared gendered-pronoun detection used by turn-taking and the character
//! registry to infer a speaker's gender from surrounding narration.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::Gender;

fn male_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(he|him|his)\b").unwrap())
}

fn female_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(she|her|hers)\b").unwrap())
}

/// All genders whose pronoun appears in `text`, in no particular order.
pub fn genders_in_text(text: &str) -> Vec<Gender> {
    let mut found = Vec::new();
    if male_pattern().is_match(text) {
        found.push(Gender::Male);
    }
    if female_pattern().is_match(text) {
        found.push(Gender::Female);
    }
    found
}

/// The gender of whichever pronoun's last occurrence in `text` sits
/// furthest along (last write wins, matching the source's single-pass scan).
pub fn last_gender_in_text(text: &str) -> Option<Gender> {
    let male_last = male_pattern().find_iter(text).last().map(|m| m.start());
    let female_last = female_pattern().find_iter(text).last().map(|m| m.start());
    match (male_last, female_last) {
        (Some(m), Some(f)) => Some(if f > m { Gender::Female } else { Gender::Male }),
        (Some(_), None) => Some(Gender::Male),
        (None, Some(_)) => Some(Gender::Female),
        (None, None) => None,
    }
}
