use anyhow::{Context, Result};
use chapterize::config::{Config, OutputFormat, Provider};
use chapterize::pipeline::{
    generate_chapters_with_cancel, print_summary, PipelineConfig,
};
use chapterize::segment::SegmentationParams;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "chapterize")]
#[command(version, about = "Automatic chapter generation for video transcripts")]
#[command(
    long_about = "Partition a timestamped transcript into topic-coherent chapters using \
                  semantic embeddings with adaptive threshold search."
)]
struct Cli {
    /// Input transcript JSON file (omit to run the interactive wizard)
    input: Option<PathBuf>,

    /// Output chapter file (defaults to <input>.chapters.<ext>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format: json, text, markdown
    #[arg(short, long, default_value = "json")]
    format: String,

    /// Embedding provider: openai, gemini
    #[arg(short, long, default_value = "openai")]
    provider: String,

    /// Window width in seconds (derived from duration when omitted)
    #[arg(short, long)]
    window_seconds: Option<f64>,

    /// Minimum chapter duration in seconds
    #[arg(long, default_value = "15")]
    min_duration: f64,

    /// Initial similarity threshold for the drift detector
    #[arg(long, default_value = "0.75")]
    threshold: f64,

    /// Iteration budget for the threshold search
    #[arg(long, default_value = "6")]
    max_iterations: usize,

    /// Number of concurrent embedding requests
    #[arg(short, long, default_value = "4")]
    concurrency: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn derive_output_path(input: &Path, format: &OutputFormat) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    let mut output = input.to_path_buf();
    output.set_file_name(format!(
        "{}.chapters.{}",
        stem.to_string_lossy(),
        format.extension()
    ));
    output
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let (input, output, config, pipeline_config) = match cli.input {
        Some(ref input) => {
            // Validate input file exists
            if !input.exists() {
                anyhow::bail!("Input file not found: {}", input.display());
            }

            let format: OutputFormat = cli.format.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            let provider: Provider = cli
                .provider
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;

            let output = cli
                .output
                .clone()
                .unwrap_or_else(|| derive_output_path(input, &format));

            let config = Config::load().context("Failed to load configuration")?;
            config
                .validate(provider)
                .context("Configuration validation failed")?;

            let pipeline_config = PipelineConfig {
                provider,
                format,
                window_seconds: cli.window_seconds,
                segmentation: SegmentationParams {
                    start_threshold: cli.threshold,
                    max_iterations: cli.max_iterations,
                    min_chapter_duration: cli.min_duration,
                    ..SegmentationParams::default()
                },
                concurrency: cli.concurrency,
                show_progress: true,
            };

            (input.clone(), output, config, pipeline_config)
        }
        None => {
            // No input argument: run the interactive wizard
            let result = chapterize::interactive::run_interactive_wizard()?;
            (
                result.input,
                result.output,
                result.config,
                result.pipeline_config,
            )
        }
    };

    info!("Input:    {}", input.display());
    info!("Output:   {}", output.display());
    info!("Format:   {}", pipeline_config.format);
    info!("Provider: {}", pipeline_config.provider);

    // Flip a shared flag on Ctrl+C so the pipeline stops between stages
    let cancelled = Arc::new(AtomicBool::new(false));
    let cancel_flag = cancelled.clone();
    ctrlc::set_handler(move || {
        warn!("Interrupt received, cancelling...");
        cancel_flag.store(true, Ordering::Relaxed);
    })
    .context("Failed to install Ctrl+C handler")?;

    let result =
        generate_chapters_with_cancel(&input, &output, &config, pipeline_config, cancelled)
            .await
            .context("Chapter generation failed")?;

    print_summary(&result);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_output_path() {
        let input = PathBuf::from("/path/to/talk_en_transcript.json");

        let json = derive_output_path(&input, &OutputFormat::Json);
        assert_eq!(
            json,
            PathBuf::from("/path/to/talk_en_transcript.chapters.json")
        );

        let text = derive_output_path(&input, &OutputFormat::Text);
        assert_eq!(
            text,
            PathBuf::from("/path/to/talk_en_transcript.chapters.txt")
        );

        let md = derive_output_path(&input, &OutputFormat::Markdown);
        assert_eq!(
            md,
            PathBuf::from("/path/to/talk_en_transcript.chapters.md")
        );
    }
}
