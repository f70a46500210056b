//! Tags each dialogue segment with an emotion and intensity via the LLM.
//! Narration is left at the default (neutral, 0.5); batch failures leave
//! their segments at the default too.

use serde::Deserialize;
use tracing::warn;

use crate::llm::{emotion_system_prompt, emotion_user_prompt, LlmClient};
use crate::models::{is_allowed_emotion, Segment, SegmentKind};

#[derive(Debug, Clone)]
pub struct Stage8Config {
    pub batch_size: usize,
    pub text_truncate_chars: usize,
}

impl Default for Stage8Config {
    fn default() -> Self {
        Self {
            batch_size: 30,
            text_truncate_chars: 300,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Stage8Result {
    pub classified: usize,
    pub batches_failed: usize,
}

#[derive(Deserialize)]
struct EmotionResponse {
    emotions: Vec<EmotionEntry>,
}

#[derive(Deserialize)]
struct EmotionEntry {
    id: u32,
    emotion: String,
    intensity: f64,
}

pub async fn execute_stage8(
    segments: &mut [Segment],
    client: &dyn LlmClient,
    config: &Stage8Config,
) -> Stage8Result {
    let mut result = Stage8Result::default();

    let dialogue_ids: Vec<u32> = segments
        .iter()
        .filter(|s| s.kind == SegmentKind::Dialogue)
        .map(|s| s.id)
        .collect();

    for batch in dialogue_ids.chunks(config.batch_size) {
        match request_batch(segments, batch, client, config).await {
            Ok(entries) => {
                for entry in entries {
                    if let Some(segment) = segments.iter_mut().find(|s| s.id == entry.id) {
                        if is_allowed_emotion(&entry.emotion) {
                            segment.emotion = entry.emotion;
                            segment.intensity = entry.intensity.clamp(0.0, 1.0);
                            result.classified += 1;
                        } else {
                            warn!(
                                "emotion classifier returned disallowed emotion '{}' for segment {}",
                                entry.emotion, entry.id
                            );
                        }
                    }
                }
            }
            Err(err) => {
                warn!("emotion classifier batch failed, leaving defaults: {err}");
                result.batches_failed += 1;
            }
        }
    }

    result
}

async fn request_batch(
    segments: &[Segment],
    batch: &[u32],
    client: &dyn LlmClient,
    config: &Stage8Config,
) -> Result<Vec<EmotionEntry>, crate::error::LlmError> {
    let mut block = String::new();
    for &id in batch {
        if let Some(segment) = segments.iter().find(|s| s.id == id) {
            let text = truncate(&segment.original_text, config.text_truncate_chars);
            block.push_str(&format!("{}: {} says \"{}\"\n", segment.id, segment.speaker, text));
        }
    }

    let system = emotion_system_prompt();
    let user = emotion_user_prompt(&block);
    let value = client.generate(system, &user).await?;
    let parsed: EmotionResponse = serde_json::from_value(value)?;
    Ok(parsed.emotions)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}
