pub mod error;
pub mod io;
pub mod llm;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod pronoun;
pub mod stages;

pub use error::{LlmError, PipelineError};
pub use io::{parse_chapter_file, parse_chapter_json, result_to_json_string, write_result_json, ChapterInput};
pub use llm::{LlmClient, OllamaClient, OllamaConfig};
pub use models::{Character, PipelineResult, Segment, Speaker};
pub use pipeline::{run_pipeline, PipelineConfig};
pub use stages::{Stage1Config, Stage7Config, Stage8Config};
