use thiserror::Error;

/// Errors surfaced by the LLM-backed stages (AI attribution, emotion
/// classification). A batch failing with one of these is caught by its
/// caller and logged; it never aborts the pipeline.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request to LLM backend failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("LLM backend returned status {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("LLM response was not valid JSON: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    #[error("LLM response JSON did not match the expected shape: {0}")]
    UnexpectedShape(String),
}

/// Errors the pipeline's own infrastructure can raise. Nominal inputs never
/// produce one of these; they exist for programmer error and for forward
/// compatibility with loading external configuration.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("LLM stage failed: {0}")]
    Llm(#[from] LlmError),

    #[error("invalid pipeline configuration: {0}")]
    Config(String),
}
