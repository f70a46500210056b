//! Orchestrates the eight pipeline stages in order, under a single metrics
//! scope, and assembles the final [`PipelineResult`].

use tracing::info;

use crate::llm::LlmClient;
use crate::metrics::{run_llm_stage, run_local_stage, with_metrics_scope};
use crate::models::{NodeType, PipelineResult, Report, Segment, SegmentKind, Speaker};
use crate::stages::{
    execute_stage1, execute_stage2, execute_stage3, execute_stage4, execute_stage5,
    execute_stage6, execute_stage7, execute_stage8, Stage1Config, Stage7Config, Stage8Config,
};

#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub stage1: Stage1Config,
    pub stage7: Stage7Config,
    pub stage8: Stage8Config,
    /// Skip Stages 7 and 8 entirely (local-only / offline run).
    pub no_llm: bool,
}

pub async fn run_pipeline(
    text: &str,
    title: String,
    client: &dyn LlmClient,
    config: &PipelineConfig,
) -> PipelineResult {
    let (segments, metrics) = with_metrics_scope(|| async {
        let mut stage1 = run_local_stage("segment_splitter", || execute_stage1(text, &config.stage1));
        info!(
            "segment splitter produced {} segments from {} paragraphs ({} merges)",
            stage1.segments.len(),
            stage1.paragraphs_seen,
            stage1.merges_applied
        );

        let stage2_result =
            run_local_stage("explicit_attribution", || execute_stage2(&mut stage1.segments));
        info!(
            "explicit attribution resolved {} segments ({} pronoun-only)",
            stage2_result.attributed, stage2_result.pronoun_only
        );

        let stage3_result =
            run_local_stage("turn_taking", || execute_stage3(&mut stage1.segments));
        info!(
            "turn-taking resolved {} by pronoun, {} by alternation",
            stage3_result.resolved_by_pronoun, stage3_result.resolved_by_alternation
        );

        let characters =
            run_local_stage("character_registry", || execute_stage4(&stage1.segments));
        info!("character registry has {} entries", characters.len());

        run_local_stage("pause_timing", || execute_stage5(&mut stage1.segments));

        let original_texts: Vec<&str> =
            stage1.segments.iter().map(|s| s.original_text.as_str()).collect();
        let validation = run_local_stage("validation", || execute_stage6(text, &original_texts));
        if !validation.passed {
            tracing::warn!(
                "verbatim coverage check failed: {} missing words, {} extra words, count delta {}",
                validation.missing_words.len(),
                validation.extra_words.len(),
                validation.word_count_delta
            );
        }

        if !config.no_llm {
            let stage7_result = run_llm_stage(
                "ai_attribution",
                execute_stage7(&mut stage1.segments, &characters, client, &config.stage7),
            )
            .await;
            info!(
                "AI attribution resolved {} segments ({} defaulted, {} batches failed)",
                stage7_result.resolved_by_ai, stage7_result.resolved_by_default, stage7_result.batches_failed
            );

            let stage8_result = run_llm_stage(
                "emotion_classifier",
                execute_stage8(&mut stage1.segments, client, &config.stage8),
            )
            .await;
            info!(
                "emotion classifier tagged {} segments ({} batches failed)",
                stage8_result.classified, stage8_result.batches_failed
            );
        } else {
            info!("skipping AI attribution and emotion classification (no_llm)");
        }

        (stage1.segments, characters)
    })
    .await;

    let (mut segments, characters) = segments;
    finalize(&mut segments);

    let local_duration_ms: u64 = metrics
        .iter()
        .filter(|m| matches!(m.node_type, NodeType::Local))
        .map(|m| m.duration_ms)
        .sum();
    let llm_duration_ms: u64 = metrics
        .iter()
        .filter(|m| matches!(m.node_type, NodeType::Llm))
        .map(|m| m.duration_ms)
        .sum();

    PipelineResult {
        title,
        characters,
        segments,
        report: Report {
            total_duration_ms: local_duration_ms + llm_duration_ms,
            local_duration_ms,
            llm_duration_ms,
            nodes: metrics,
        },
    }
}

/// Rounds intensity to two decimals and forces narration speaker back to
/// `narrator`, guarding against any stage that might otherwise disturb it.
fn finalize(segments: &mut [Segment]) {
    for segment in segments.iter_mut() {
        segment.intensity = (segment.intensity * 100.0).round() / 100.0;
        if segment.kind == SegmentKind::Narration {
            segment.speaker = Speaker::Narrator;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    #[tokio::test]
    async fn empty_input_yields_empty_result() {
        let client = MockLlmClient::new(vec![]);
        let result = run_pipeline("", "Untitled Chapter".to_string(), &client, &PipelineConfig::default()).await;
        assert!(result.segments.is_empty());
        assert_eq!(result.characters.len(), 1);
        assert_eq!(result.characters[0].name, "narrator");
    }

    #[tokio::test]
    async fn no_llm_mode_skips_stages_seven_and_eight() {
        let client = MockLlmClient::new(vec![]);
        let config = PipelineConfig { no_llm: true, ..Default::default() };
        let result = run_pipeline(
            "\"Hello there.\" A stranger waved.",
            "Chapter One".to_string(),
            &client,
            &config,
        )
        .await;
        assert!(result.report.llm_duration_ms == 0);
        assert!(result.segments.iter().all(|s| s.emotion == "neutral"));
    }

    #[tokio::test]
    async fn full_pipeline_attributes_and_classifies() {
        let client = MockLlmClient::new(vec![serde_json::json!({
            "emotions": [{"id": 1, "emotion": "happy", "intensity": 0.6}]
        })]);
        let text = "\"Hello,\" said Elena. Marcus nodded.";
        let result = run_pipeline(text, "Chapter One".to_string(), &client, &PipelineConfig::default()).await;

        assert_eq!(result.segments[0].speaker.as_str(), "Elena");
        for segment in &result.segments {
            assert!(segment.intensity >= 0.0 && segment.intensity <= 1.0);
        }
        assert_eq!(result.segments[0].pause_before_ms, 0);
    }
}
