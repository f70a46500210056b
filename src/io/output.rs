use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::models::{Character, PipelineResult, Report};

/// The wire shape of a segment in the output JSON — a flattened view of
/// the internal [`crate::models::Segment`] that drops pipeline-internal
/// bookkeeping fields (`attribution_source`, offsets, paragraph index).
#[derive(Debug, Clone, Serialize)]
pub struct OutputSegment {
    pub id: u32,
    pub speaker: String,
    pub original_text: String,
    pub emotion: String,
    pub intensity: f64,
    pub pause_before_ms: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputResult {
    pub title: String,
    pub characters: Vec<Character>,
    pub segments: Vec<OutputSegment>,
    pub report: Report,
}

impl From<&PipelineResult> for OutputResult {
    fn from(result: &PipelineResult) -> Self {
        Self {
            title: result.title.clone(),
            characters: result.characters.clone(),
            segments: result
                .segments
                .iter()
                .map(|s| OutputSegment {
                    id: s.id,
                    speaker: s.speaker.as_str().to_string(),
                    original_text: s.original_text.clone(),
                    emotion: s.emotion.clone(),
                    intensity: s.intensity,
                    pause_before_ms: s.pause_before_ms,
                })
                .collect(),
            report: result.report.clone(),
        }
    }
}

pub fn write_result_json(result: &PipelineResult, path: &Path) -> Result<()> {
    let output = OutputResult::from(result);
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create output file: {:?}", path))?;
    serde_json::to_writer_pretty(file, &output).context("Failed to write pipeline result JSON")?;
    Ok(())
}

pub fn result_to_json_string(result: &PipelineResult) -> Result<String> {
    let output = OutputResult::from(result);
    serde_json::to_string_pretty(&output).context("Failed to serialize pipeline result")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NodeMetrics, NodeType};

    #[test]
    fn output_json_contains_expected_fields() {
        let result = PipelineResult {
            title: "Chapter One".to_string(),
            characters: vec![Character { name: "narrator".to_string(), description: "the narrative voice".to_string() }],
            segments: vec![],
            report: Report {
                total_duration_ms: 10,
                local_duration_ms: 10,
                llm_duration_ms: 0,
                nodes: vec![NodeMetrics { node_name: "segment_splitter".to_string(), node_type: NodeType::Local, duration_ms: 10 }],
            },
        };

        let json = result_to_json_string(&result).unwrap();
        assert!(json.contains("\"title\": \"Chapter One\""));
        assert!(json.contains("\"narrator\""));
        assert!(json.contains("\"total_duration_ms\""));
    }

    #[test]
    fn write_result_json_round_trips_through_a_file() {
        let result = PipelineResult {
            title: "Chapter Two".to_string(),
            characters: vec![],
            segments: vec![],
            report: Report {
                total_duration_ms: 5,
                local_duration_ms: 5,
                llm_duration_ms: 0,
                nodes: vec![],
            },
        };

        let file = tempfile::NamedTempFile::new().unwrap();
        write_result_json(&result, file.path()).unwrap();

        let written = std::fs::read_to_string(file.path()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed["title"], "Chapter Two");
    }
}
