//! Last resort for dialogue segments no local heuristic could attribute:
//! ask the LLM, batching requests and giving it a window of surrounding
//! segments for context. Whatever is still unknown afterward falls back to
//! "last speaker seen so far".

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use crate::llm::{ai_attribution_system_prompt, ai_attribution_user_prompt, LlmClient};
use crate::models::{AttributionSource, Character, Segment, SegmentKind, Speaker};

const CANDIDATE_STOP_WORDS: &[&str] = &[
    "The", "They", "But", "Then", "When", "Where", "What", "Who", "Why", "How", "If", "This",
    "That", "These", "Those", "There", "Here", "And", "Or", "So", "Yet", "For", "Nor", "As",
    "Now", "Today", "Tomorrow", "Yesterday", "Chapter", "Part", "Book", "Suddenly", "Yes", "No",
];

#[derive(Debug, Clone)]
pub struct Stage7Config {
    pub batch_size: usize,
    pub context_window: usize,
    pub context_truncate_chars: usize,
    pub candidate_limit: usize,
}

impl Default for Stage7Config {
    fn default() -> Self {
        Self {
            batch_size: 20,
            context_window: 3,
            context_truncate_chars: 200,
            candidate_limit: 10,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Stage7Result {
    pub resolved_by_ai: usize,
    pub resolved_by_default: usize,
    pub batches_failed: usize,
}

#[derive(Deserialize)]
struct AttributionResponse {
    attributions: Vec<Attribution>,
}

#[derive(Deserialize)]
struct Attribution {
    segment_id: u32,
    speaker: String,
}

pub async fn execute_stage7(
    segments: &mut [Segment],
    characters: &[Character],
    client: &dyn LlmClient,
    config: &Stage7Config,
) -> Stage7Result {
    let mut result = Stage7Result::default();

    let unknown_indices: Vec<usize> = segments
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_dialogue() && s.speaker.is_unknown())
        .map(|(i, _)| i)
        .collect();

    if unknown_indices.is_empty() {
        return result;
    }

    let candidates = candidate_names(segments, characters, config.candidate_limit);

    if !candidates.is_empty() {
        for batch in unknown_indices.chunks(config.batch_size) {
            match request_batch(segments, batch, &candidates, client, config).await {
                Ok(attributions) => {
                    for (segment_id, speaker) in attributions {
                        if let Some(segment) = segments.iter_mut().find(|s| s.id == segment_id) {
                            if segment.speaker.is_unknown() && speaker != "unknown" {
                                segment.speaker = Speaker::Named(speaker);
                                segment.attribution_source = AttributionSource::Ai;
                                result.resolved_by_ai += 1;
                            }
                        }
                    }
                }
                Err(err) => {
                    warn!("AI attribution batch failed, leaving segments unresolved: {err}");
                    result.batches_failed += 1;
                }
            }
        }
    }

    apply_last_speaker_fallback(segments, &mut result);
    result
}

async fn request_batch(
    segments: &[Segment],
    batch: &[usize],
    candidates: &[String],
    client: &dyn LlmClient,
    config: &Stage7Config,
) -> Result<Vec<(u32, String)>, crate::error::LlmError> {
    let mut block = String::new();
    for &i in batch {
        block.push_str(&format_segment_with_context(segments, i, config));
        block.push('\n');
    }

    let system = ai_attribution_system_prompt();
    let user = ai_attribution_user_prompt(candidates, &block);
    let value = client.generate(system, &user).await?;
    let parsed: AttributionResponse = serde_json::from_value(value)?;
    Ok(parsed
        .attributions
        .into_iter()
        .map(|a| (a.segment_id, a.speaker))
        .collect())
}

fn format_segment_with_context(segments: &[Segment], i: usize, config: &Stage7Config) -> String {
    let start = i.saturating_sub(config.context_window);
    let end = (i + config.context_window + 1).min(segments.len());
    let mut out = String::new();
    for j in start..end {
        let s = &segments[j];
        let marker = if j == i { ">>" } else { "  " };
        let text = truncate(&s.original_text, config.context_truncate_chars);
        out.push_str(&format!(
            "{marker} [{}] {} ({}): {}\n",
            s.id,
            match s.kind {
                SegmentKind::Dialogue => "dialogue",
                SegmentKind::Narration => "narration",
            },
            s.speaker,
            text
        ));
    }
    out
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}

fn candidate_names(segments: &[Segment], characters: &[Character], limit: usize) -> Vec<String> {
    let registry_names: Vec<String> = characters
        .iter()
        .map(|c| c.name.clone())
        .filter(|name| name != "narrator")
        .collect();

    if !registry_names.is_empty() {
        return registry_names;
    }

    inferred_candidates(segments, limit)
}

fn sentence_initial_word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Z][a-z]{2,}\b").unwrap())
}

/// Capitalized, non-stop-listed words that appear at least twice in
/// narration and are not merely capitalized because they open a sentence.
fn inferred_candidates(segments: &[Segment], limit: usize) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    for segment in segments.iter().filter(|s| s.kind == SegmentKind::Narration) {
        let text = &segment.original_text;
        for m in sentence_initial_word_regex().find_iter(text) {
            if is_sentence_initial(text, m.start()) {
                continue;
            }
            let word = m.as_str();
            if CANDIDATE_STOP_WORDS.contains(&word) {
                continue;
            }
            *counts.entry(word.to_string()).or_insert(0) += 1;
        }
    }

    let mut candidates: Vec<(String, usize)> = counts.into_iter().filter(|(_, n)| *n >= 2).collect();
    candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    candidates.into_iter().take(limit).map(|(name, _)| name).collect()
}

fn is_sentence_initial(text: &str, match_start: usize) -> bool {
    let preceding = text[..match_start].trim_end();
    match preceding.chars().last() {
        None => true,
        Some(c) => !c.is_ascii_lowercase(),
    }
}

fn apply_last_speaker_fallback(segments: &mut [Segment], result: &mut Stage7Result) {
    let mut last_speaker: Option<String> = None;
    for segment in segments.iter_mut() {
        if segment.kind == SegmentKind::Dialogue {
            if let Some(name) = segment.speaker.name() {
                last_speaker = Some(name.to_string());
                continue;
            }
            if segment.speaker.is_unknown() {
                if let Some(name) = &last_speaker {
                    segment.speaker = Speaker::Named(name.clone());
                    segment.attribution_source = AttributionSource::Default;
                    result.resolved_by_default += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use crate::models::Speaker;

    fn dialogue(id: u32, text: &str) -> Segment {
        Segment::new(id, SegmentKind::Dialogue, text.to_string(), 0, 0, 0)
    }

    #[tokio::test]
    async fn resolves_unknown_via_llm_response() {
        let mut segments = vec![dialogue(1, "Hello.")];
        let characters = vec![Character { name: "Elena".to_string(), description: String::new() }];
        let client = MockLlmClient::new(vec![serde_json::json!({
            "attributions": [{"segment_id": 1, "speaker": "Elena"}]
        })]);

        let result = execute_stage7(&mut segments, &characters, &client, &Stage7Config::default()).await;

        assert_eq!(result.resolved_by_ai, 1);
        assert_eq!(segments[0].speaker.name(), Some("Elena"));
        assert_eq!(segments[0].attribution_source, AttributionSource::Ai);
    }

    #[tokio::test]
    async fn falls_back_to_last_known_speaker() {
        let mut segments = vec![dialogue(1, "Hi."), dialogue(2, "Still unknown.")];
        segments[0].speaker = Speaker::Named("Elena".to_string());
        let characters = vec![Character { name: "Elena".to_string(), description: String::new() }];
        let client = MockLlmClient::new(vec![serde_json::json!({"attributions": []})]);

        let result = execute_stage7(&mut segments, &characters, &client, &Stage7Config::default()).await;

        assert_eq!(result.resolved_by_default, 1);
        assert_eq!(segments[1].speaker.name(), Some("Elena"));
        assert_eq!(segments[1].attribution_source, AttributionSource::Default);
    }

    #[tokio::test]
    async fn stays_unknown_with_no_prior_speaker_and_no_llm_progress() {
        let mut segments = vec![dialogue(1, "Hi.")];
        let characters = vec![];
        let client = MockLlmClient::new(vec![serde_json::json!({"attributions": []})]);

        execute_stage7(&mut segments, &characters, &client, &Stage7Config::default()).await;

        assert!(segments[0].speaker.is_unknown());
    }
}
