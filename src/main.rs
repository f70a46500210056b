use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use text_analyzer::{
    parse_chapter_file, run_pipeline, write_result_json, LlmClient, OllamaClient, OllamaConfig,
    PipelineConfig,
};

#[derive(Parser)]
#[command(name = "text-analyzer")]
#[command(author, version, about = "Hybrid audiobook text-analysis pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline over a chapter and write the segmented, attributed result
    Process {
        /// Input file. A `.json` file is parsed as `{text, title}`; any
        /// other extension is read as plain text and paired with --title.
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the pipeline result (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Chapter title, used when the input file is plain text
        #[arg(long, default_value = "Untitled Chapter")]
        title: String,

        /// Skip the AI attribution and emotion classifier stages
        #[arg(long)]
        no_llm: bool,

        /// Verbose (debug-level) logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run the local stages only and print summary statistics, without
    /// writing output or contacting an LLM
    Analyze {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long, default_value = "Untitled Chapter")]
        title: String,

        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process { input, output, title, no_llm, verbose } => {
            setup_logging(verbose);
            process_chapter(input, output, title, no_llm).await
        }
        Commands::Analyze { input, title, verbose } => {
            setup_logging(verbose);
            analyze_chapter(input, title).await
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load_text_and_title(input: &PathBuf, title: &str) -> Result<(String, String)> {
    if input.extension().and_then(|e| e.to_str()) == Some("json") {
        let chapter = parse_chapter_file(input)?;
        Ok((chapter.text, chapter.title))
    } else {
        let text = std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read input file: {:?}", input))?;
        Ok((text, title.to_string()))
    }
}

async fn process_chapter(input: PathBuf, output: PathBuf, title: String, no_llm: bool) -> Result<()> {
    let (text, title) = load_text_and_title(&input, &title)?;
    info!("Loaded chapter \"{}\" ({} chars)", title, text.chars().count());

    let config = PipelineConfig { no_llm, ..Default::default() };
    let client: Box<dyn LlmClient> = Box::new(OllamaClient::new(OllamaConfig::from_env()));

    let result = run_pipeline(&text, title, client.as_ref(), &config).await;

    info!(
        "Pipeline complete: {} segments, {} characters, {}ms total ({}ms local, {}ms llm)",
        result.segments.len(),
        result.characters.len(),
        result.report.total_duration_ms,
        result.report.local_duration_ms,
        result.report.llm_duration_ms
    );

    write_result_json(&result, &output)?;
    info!("Output written to {:?}", output);

    Ok(())
}

async fn analyze_chapter(input: PathBuf, title: String) -> Result<()> {
    let (text, title) = load_text_and_title(&input, &title)?;

    let config = PipelineConfig { no_llm: true, ..Default::default() };
    // A dry-run client that is never called since no_llm skips stages 7-8.
    struct Unreachable;
    #[async_trait::async_trait]
    impl LlmClient for Unreachable {
        async fn generate(&self, _: &str, _: &str) -> Result<serde_json::Value, text_analyzer::LlmError> {
            unreachable!("analyze never calls the LLM")
        }
    }

    let result = run_pipeline(&text, title, &Unreachable, &config).await;

    println!("Chapter Analysis");
    println!("================");
    println!("Segments: {}", result.segments.len());
    let dialogue_count = result.segments.iter().filter(|s| s.speaker.as_str() != "narrator").count();
    println!("Dialogue segments: {}", dialogue_count);
    println!("Characters: {}", result.characters.len());
    for character in &result.characters {
        println!("  - {}: {}", character.name, character.description);
    }
    let unknown = result.segments.iter().filter(|s| s.speaker.as_str() == "unknown").count();
    println!("Unresolved (unknown) speakers: {}", unknown);
    println!(
        "Local stage time: {}ms across {} nodes",
        result.report.local_duration_ms,
        result.report.nodes.len()
    );

    Ok(())
}
