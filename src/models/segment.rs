use serde::{Deserialize, Serialize};

/// The eight emotions the emotion classifier is allowed to assign. Narration
/// is always `Neutral`; dialogue may be any of these.
pub const ALLOWED_EMOTIONS: &[&str] = &[
    "neutral",
    "happy",
    "sad",
    "angry",
    "fearful",
    "excited",
    "tense",
    "contemplative",
];

pub fn is_allowed_emotion(value: &str) -> bool {
    ALLOWED_EMOTIONS.contains(&value)
}

/// Whether a segment is narrative prose or a line of dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Narration,
    Dialogue,
}

/// Who is speaking a segment. Kept as a tagged variant internally rather
/// than a raw string so the narrator/unknown sentinels can't collide with a
/// real character name; converted to its wire string only when the result
/// is serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Speaker {
    Narrator,
    Unknown,
    Named(String),
}

impl Speaker {
    pub fn as_str(&self) -> &str {
        match self {
            Speaker::Narrator => "narrator",
            Speaker::Unknown => "unknown",
            Speaker::Named(name) => name.as_str(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Speaker::Unknown)
    }

    pub fn is_narrator(&self) -> bool {
        matches!(self, Speaker::Narrator)
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Speaker::Named(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a segment's speaker was determined. Recorded for debugging and for
/// the reports that downstream tooling builds from a run; never shown to
/// the end listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributionSource {
    None,
    Explicit,
    TurnTaking,
    PronounMale,
    PronounFemale,
    Ai,
    Default,
}

impl AttributionSource {
    pub fn is_pronoun(&self) -> bool {
        matches!(self, AttributionSource::PronounMale | AttributionSource::PronounFemale)
    }

    pub fn gender(&self) -> Option<Gender> {
        match self {
            AttributionSource::PronounMale => Some(Gender::Male),
            AttributionSource::PronounFemale => Some(Gender::Female),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

/// One unit of text flowing through the pipeline. Stage 1 creates the full
/// list; every later stage mutates fields in place but never adds, removes,
/// or reorders segments.
#[derive(Debug, Clone)]
pub struct Segment {
    pub id: u32,
    pub kind: SegmentKind,
    pub original_text: String,
    pub speaker: Speaker,
    pub attribution_source: AttributionSource,
    pub emotion: String,
    pub intensity: f64,
    pub pause_before_ms: u32,
    pub paragraph_index: usize,
    pub char_offset_start: usize,
    pub char_offset_end: usize,
}

impl Segment {
    pub fn new(
        id: u32,
        kind: SegmentKind,
        original_text: String,
        paragraph_index: usize,
        char_offset_start: usize,
        char_offset_end: usize,
    ) -> Self {
        let speaker = match kind {
            SegmentKind::Narration => Speaker::Narrator,
            SegmentKind::Dialogue => Speaker::Unknown,
        };
        Self {
            id,
            kind,
            original_text,
            speaker,
            attribution_source: AttributionSource::None,
            emotion: "neutral".to_string(),
            intensity: 0.5,
            pause_before_ms: 0,
            paragraph_index,
            char_offset_start,
            char_offset_end,
        }
    }

    pub fn is_dialogue(&self) -> bool {
        matches!(self.kind, SegmentKind::Dialogue)
    }
}

/// A character in the registry, including the narrator itself.
#[derive(Debug, Clone, Serialize)]
pub struct Character {
    pub name: String,
    pub description: String,
}

/// Duration of one pipeline stage, attached to the ambient metrics scope
/// while the stage runs.
#[derive(Debug, Clone, Serialize)]
pub struct NodeMetrics {
    #[serde(rename = "name")]
    pub node_name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Local,
    Llm,
}

/// Complete output of a pipeline run, in the internal (pre-serialization)
/// representation.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub title: String,
    pub characters: Vec<Character>,
    pub segments: Vec<Segment>,
    pub report: Report,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub total_duration_ms: u64,
    pub local_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub nodes: Vec<NodeMetrics>,
}
