//! Checks that the segments produced by Stage 1 still reproduce the
//! original text, modulo quotes and whitespace. Never fatal: a mismatch is
//! reported for the caller to log, but the pipeline proceeds regardless.

const STRIP_CHARS: &[char] = &['"', '\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'];

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub passed: bool,
    pub missing_words: Vec<String>,
    pub extra_words: Vec<String>,
    pub first_mismatch: Option<PositionalMismatch>,
    pub word_count_delta: i64,
}

#[derive(Debug, Clone)]
pub struct PositionalMismatch {
    pub position: usize,
    pub expected: String,
    pub actual: Option<String>,
    pub context_before: Vec<String>,
    pub context_after: Vec<String>,
}

pub fn execute_stage6(original_text: &str, segment_texts: &[&str]) -> ValidationReport {
    let reconstructed = segment_texts.join(" ");
    let original_words = normalize_and_split(original_text);
    let reconstructed_words = normalize_and_split(&reconstructed);

    if original_words == reconstructed_words {
        return ValidationReport {
            passed: true,
            missing_words: Vec::new(),
            extra_words: Vec::new(),
            first_mismatch: None,
            word_count_delta: 0,
        };
    }

    let missing_words = words_not_in(&original_words, &reconstructed_words, 10);
    let extra_words = words_not_in(&reconstructed_words, &original_words, 10);
    let first_mismatch = first_positional_mismatch(&original_words, &reconstructed_words);
    let word_count_delta = reconstructed_words.len() as i64 - original_words.len() as i64;

    ValidationReport {
        passed: false,
        missing_words,
        extra_words,
        first_mismatch,
        word_count_delta,
    }
}

fn normalize_and_split(text: &str) -> Vec<String> {
    let stripped: String = text.chars().filter(|c| !STRIP_CHARS.contains(c)).collect();
    let collapsed = stripped.replace('\n', " ");
    collapsed.split_whitespace().map(str::to_string).collect()
}

fn words_not_in(haystack_owner: &[String], other: &[String], limit: usize) -> Vec<String> {
    let other_counts = counts(other);
    let mut seen = std::collections::HashMap::new();
    let mut missing = Vec::new();
    for word in haystack_owner {
        let used = seen.entry(word.clone()).or_insert(0usize);
        let available = other_counts.get(word).copied().unwrap_or(0);
        if *used >= available {
            if missing.len() < limit {
                missing.push(word.clone());
            }
        }
        *used += 1;
    }
    missing
}

fn counts(words: &[String]) -> std::collections::HashMap<String, usize> {
    let mut map = std::collections::HashMap::new();
    for word in words {
        *map.entry(word.clone()).or_insert(0) += 1;
    }
    map
}

fn first_positional_mismatch(original: &[String], reconstructed: &[String]) -> Option<PositionalMismatch> {
    let len = original.len().max(reconstructed.len());
    for i in 0..len {
        let expected = original.get(i);
        let actual = reconstructed.get(i);
        if expected != actual {
            let Some(expected) = expected else { return None };
            let context = |words: &[String], around: usize| -> Vec<String> {
                let start = around.saturating_sub(3);
                words[start..around].to_vec()
            };
            return Some(PositionalMismatch {
                position: i,
                expected: expected.clone(),
                actual: actual.cloned(),
                context_before: context(original, i),
                context_after: original.get(i + 1..(i + 4).min(original.len())).unwrap_or(&[]).to_vec(),
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_passes() {
        let report = execute_stage6("Hello world.", &["Hello world."]);
        assert!(report.passed);
    }

    #[test]
    fn quote_and_whitespace_differences_are_ignored() {
        let report = execute_stage6("\"Hello\nworld.\"", &["Hello world."]);
        assert!(report.passed);
    }

    #[test]
    fn dropped_word_is_reported_as_missing() {
        let report = execute_stage6("Hello brave new world.", &["Hello new world."]);
        assert!(!report.passed);
        assert!(report.missing_words.contains(&"brave".to_string()));
        assert_eq!(report.word_count_delta, -1);
    }

    #[test]
    fn comparison_is_case_sensitive() {
        let report = execute_stage6("Hello World.", &["hello world."]);
        assert!(!report.passed);
    }
}
