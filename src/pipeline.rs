use crate::chapter::{build_chapters, create_formatter, Chapter, ChapterFormatter};
use crate::config::{Config, OutputFormat, Provider};
use crate::embed::{Embedder, EmbeddingBatcher, GeminiEmbedder, OpenAiEmbedder};
use crate::error::{ChapterizeError, Result};
use crate::segment::{
    build_windows, select_segmentation, target_chapter_range, window_seconds_for,
    SegmentationParams,
};
use crate::transcript::TranscriptDocument;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Configuration for the chapter generation pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Embedding provider to use.
    pub provider: Provider,
    /// Output chapter format.
    pub format: OutputFormat,
    /// Window width override in seconds; derived from the total duration
    /// when unset.
    pub window_seconds: Option<f64>,
    /// Threshold-search tunables.
    pub segmentation: SegmentationParams,
    /// Number of concurrent embedding requests.
    pub concurrency: usize,
    /// Show progress bars.
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            format: OutputFormat::default(),
            window_seconds: None,
            segmentation: SegmentationParams::default(),
            concurrency: 4,
            show_progress: true,
        }
    }
}

/// Statistics from the chapter generation process.
#[derive(Debug, Clone)]
pub struct PipelineStats {
    /// Total time taken for the entire pipeline.
    pub total_time: Duration,
    /// Time spent computing embeddings.
    pub embedding_time: Duration,
    /// Time spent in the threshold search.
    pub search_time: Duration,
    /// Number of windows analyzed.
    pub window_count: usize,
    /// Number of chapters emitted.
    pub chapter_count: usize,
    /// Detection passes performed by the threshold search.
    pub iterations: usize,
    /// Similarity threshold that produced the accepted segmentation.
    pub final_threshold: f64,
    /// Whether the chapter count landed inside the target range.
    pub converged: bool,
    /// Provider used for embeddings.
    pub provider: String,
}

/// Result of the chapter generation pipeline.
#[derive(Debug)]
pub struct PipelineResult {
    /// Path to the output chapter file.
    pub output_path: PathBuf,
    /// Generated chapters.
    pub chapters: Vec<Chapter>,
    /// Pipeline statistics.
    pub stats: PipelineStats,
}

/// Generate chapters from a transcript file.
///
/// This is the main entry point for the chapterize pipeline. It:
/// 1. Loads and normalizes the transcript
/// 2. Groups cues into fixed-duration windows
/// 3. Embeds every window text once
/// 4. Searches for a similarity threshold hitting the target chapter count
/// 5. Builds chapter records and writes the output file
pub async fn generate_chapters(
    input: &Path,
    output: &Path,
    config: &Config,
    pipeline_config: PipelineConfig,
) -> Result<PipelineResult> {
    let cancelled = Arc::new(AtomicBool::new(false));
    generate_chapters_with_cancel(input, output, config, pipeline_config, cancelled).await
}

/// Generate chapters with cancellation support.
pub async fn generate_chapters_with_cancel(
    input: &Path,
    output: &Path,
    config: &Config,
    pipeline_config: PipelineConfig,
    cancelled: Arc<AtomicBool>,
) -> Result<PipelineResult> {
    let embedder = create_embedder(config, pipeline_config.provider)?;
    generate_chapters_with_embedder(input, output, embedder, pipeline_config, cancelled).await
}

/// Generate chapters with a caller-supplied embedding capability.
///
/// The pipeline has no dependency on any specific embedding technology;
/// anything implementing [`Embedder`] works, which is also the seam tests
/// use to run the full pipeline without network access.
pub async fn generate_chapters_with_embedder(
    input: &Path,
    output: &Path,
    embedder: Box<dyn Embedder>,
    pipeline_config: PipelineConfig,
    cancelled: Arc<AtomicBool>,
) -> Result<PipelineResult> {
    let start_time = Instant::now();
    let provider_name = embedder.name().to_string();

    let multi_progress = if pipeline_config.show_progress {
        Some(MultiProgress::new())
    } else {
        None
    };

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 1: Transcript Loading
    // ═══════════════════════════════════════════════════════════════════════
    info!("Stage 1/4: Loading transcript from {:?}", input);

    let document = TranscriptDocument::load(input)?;
    let video_id = document.video_id().to_string();
    let total_duration = document.total_duration();

    if document.is_empty() {
        // "No transcript" is an expected real-world case: degrade to an
        // empty chapter list instead of failing the run.
        warn!("Transcript is empty, writing an empty chapter list");
        return finish_run(
            output,
            Vec::new(),
            &video_id,
            &pipeline_config,
            empty_stats(start_time, &pipeline_config, &provider_name),
        );
    }

    info!(
        "Loaded {} cues ({:.1}s of content)",
        document.cues.len(),
        total_duration
    );

    if cancelled.load(Ordering::Relaxed) {
        return Err(ChapterizeError::Cancelled);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 2: Window Building
    // ═══════════════════════════════════════════════════════════════════════
    let window_seconds = pipeline_config
        .window_seconds
        .unwrap_or_else(|| window_seconds_for(total_duration));

    info!("Stage 2/4: Building {}s windows", window_seconds);

    let windows = build_windows(&document.cues, window_seconds);

    if windows.is_empty() {
        warn!("No windows produced, writing an empty chapter list");
        return finish_run(
            output,
            Vec::new(),
            &video_id,
            &pipeline_config,
            empty_stats(start_time, &pipeline_config, &provider_name),
        );
    }

    info!("Built {} windows", windows.len());

    if cancelled.load(Ordering::Relaxed) {
        return Err(ChapterizeError::Cancelled);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 3: Embedding
    // ═══════════════════════════════════════════════════════════════════════
    info!(
        "Stage 3/4: Embedding window texts with {} (concurrency: {})",
        provider_name, pipeline_config.concurrency
    );
    let embedding_start = Instant::now();

    let batcher = EmbeddingBatcher::new(embedder, pipeline_config.concurrency)
        .with_progress(pipeline_config.show_progress);

    // Embeddings are computed exactly once per run; the threshold loop
    // below only repeats cheap vector math over them.
    let texts: Vec<String> = windows.iter().map(|w| w.text.clone()).collect();
    let (embeddings, embedding_stats) = batcher.embed_all(&texts).await?;

    if embeddings.is_empty() {
        return Err(ChapterizeError::Embedding(
            "Provider returned no vectors".to_string(),
        ));
    }

    let embedding_time = embedding_start.elapsed();
    info!(
        "Embedded {} windows ({}-dimension) in {:.2}s",
        embedding_stats.total_texts,
        embedding_stats.dimension,
        embedding_time.as_secs_f64()
    );

    if cancelled.load(Ordering::Relaxed) {
        return Err(ChapterizeError::Cancelled);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 4: Segmentation
    // ═══════════════════════════════════════════════════════════════════════
    let target = target_chapter_range(total_duration);
    info!(
        "Stage 4/4: Searching for a segmentation with {} chapters",
        target
    );
    let search_start = Instant::now();

    let search_pb = multi_progress.as_ref().map(|mp| {
        let pb = mp.add(ProgressBar::new_spinner());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Adjusting similarity threshold...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    let outcome = select_segmentation(
        &windows,
        &embeddings,
        target,
        &pipeline_config.segmentation,
    );
    let search_time = search_start.elapsed();

    if let Some(pb) = search_pb {
        pb.finish_with_message(format!(
            "✓ Selected {} chapters at threshold {:.3}",
            outcome.ranges.len(),
            outcome.threshold
        ));
    }

    if outcome.converged {
        info!(
            "Converged after {} iteration(s): threshold={:.3}, {} chapters",
            outcome.iterations,
            outcome.threshold,
            outcome.ranges.len()
        );
    } else {
        info!(
            "Target range {} missed after {} iterations, keeping the closest result: \
             threshold={:.3}, {} chapters",
            target,
            outcome.iterations,
            outcome.threshold,
            outcome.ranges.len()
        );
    }

    let chapters = build_chapters(&windows, &outcome.ranges, &video_id);
    for chapter in &chapters {
        debug!(
            "Chapter: {} ({:.1}s - {:.1}s)",
            chapter.title, chapter.start_time, chapter.end_time
        );
    }

    let stats = PipelineStats {
        total_time: start_time.elapsed(),
        embedding_time,
        search_time,
        window_count: windows.len(),
        chapter_count: chapters.len(),
        iterations: outcome.iterations,
        final_threshold: outcome.threshold,
        converged: outcome.converged,
        provider: provider_name,
    };

    finish_run(output, chapters, &video_id, &pipeline_config, stats)
}

/// Build the embedder for the selected provider, checking its API key.
fn create_embedder(config: &Config, provider: Provider) -> Result<Box<dyn Embedder>> {
    match provider {
        Provider::OpenAi => {
            let api_key = config.openai_api_key.as_ref().ok_or_else(|| {
                ChapterizeError::Config(
                    "OpenAI API key not set. Set OPENAI_API_KEY environment variable.".to_string(),
                )
            })?;
            Ok(Box::new(OpenAiEmbedder::new(api_key.clone())))
        }
        Provider::Gemini => {
            let api_key = config.gemini_api_key.as_ref().ok_or_else(|| {
                ChapterizeError::Config(
                    "Gemini API key not set. Set GEMINI_API_KEY environment variable.".to_string(),
                )
            })?;
            Ok(Box::new(GeminiEmbedder::new(api_key.clone())))
        }
    }
}

/// Format the chapters, write the output file, and assemble the result.
fn finish_run(
    output: &Path,
    chapters: Vec<Chapter>,
    video_id: &str,
    pipeline_config: &PipelineConfig,
    mut stats: PipelineStats,
) -> Result<PipelineResult> {
    let formatter: Box<dyn ChapterFormatter> = match pipeline_config.format {
        OutputFormat::Json => Box::new(crate::chapter::json::JsonFormatter {
            video_id: Some(video_id.to_string()),
            provider: Some(stats.provider.clone()),
        }),
        other => create_formatter(other),
    };

    let content = formatter.format(&chapters);
    fs::write(output, &content)?;

    info!("Wrote {} chapters to {:?}", chapters.len(), output);

    stats.chapter_count = chapters.len();

    Ok(PipelineResult {
        output_path: output.to_path_buf(),
        chapters,
        stats,
    })
}

fn empty_stats(
    start_time: Instant,
    pipeline_config: &PipelineConfig,
    provider: &str,
) -> PipelineStats {
    PipelineStats {
        total_time: start_time.elapsed(),
        embedding_time: Duration::ZERO,
        search_time: Duration::ZERO,
        window_count: 0,
        chapter_count: 0,
        iterations: 0,
        final_threshold: pipeline_config.segmentation.start_threshold,
        converged: false,
        provider: provider.to_string(),
    }
}

/// Print a summary of the pipeline results.
pub fn print_summary(result: &PipelineResult) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                   Chapter Generation Complete                  ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("  Output:     {}", result.output_path.display());
    println!("  Chapters:   {}", result.stats.chapter_count);
    println!("  Provider:   {}", result.stats.provider);
    println!(
        "  Windows:    {} analyzed over {} search iteration(s)",
        result.stats.window_count, result.stats.iterations
    );
    println!(
        "  Threshold:  {:.3}{}",
        result.stats.final_threshold,
        if result.stats.converged {
            ""
        } else {
            " (best effort, target range missed)"
        }
    );
    println!();
    println!("  Timing:");
    println!(
        "    Embed:    {:.2}s",
        result.stats.embedding_time.as_secs_f64()
    );
    println!(
        "    Search:   {:.2}s",
        result.stats.search_time.as_secs_f64()
    );
    println!(
        "    Total:    {:.2}s",
        result.stats.total_time.as_secs_f64()
    );
    println!();
    println!("═══════════════════════════════════════════════════════════════");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_config_default() {
        let config = PipelineConfig::default();
        assert_eq!(config.provider, Provider::OpenAi);
        assert_eq!(config.format, OutputFormat::Json);
        assert!(config.window_seconds.is_none());
        assert_eq!(config.concurrency, 4);
        assert!(config.show_progress);
    }

    #[test]
    fn test_create_embedder_requires_key() {
        let config = Config {
            openai_api_key: None,
            gemini_api_key: None,
            ..Config::default()
        };

        assert!(create_embedder(&config, Provider::OpenAi).is_err());
        assert!(create_embedder(&config, Provider::Gemini).is_err());
    }

    #[test]
    fn test_create_embedder_with_key() {
        let config = Config {
            openai_api_key: Some("sk-test".to_string()),
            gemini_api_key: Some("g-test".to_string()),
            ..Config::default()
        };

        assert!(create_embedder(&config, Provider::OpenAi).is_ok());
        assert!(create_embedder(&config, Provider::Gemini).is_ok());
    }
}
