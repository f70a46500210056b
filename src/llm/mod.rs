pub mod client;
pub mod prompts;

pub use client::{LlmClient, MockLlmClient, OllamaClient, OllamaConfig};
pub use prompts::*;
