use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

fn default_title() -> String {
    "Untitled Chapter".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChapterInput {
    pub text: String,
    #[serde(default = "default_title")]
    pub title: String,
}

pub fn parse_chapter_json(json: &str) -> Result<ChapterInput> {
    serde_json::from_str(json).context("Failed to parse chapter input JSON")
}

pub fn parse_chapter_file(path: &Path) -> Result<ChapterInput> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {:?}", path))?;
    parse_chapter_json(&contents)
}
