pub mod build;
pub mod json;
pub mod markdown;
pub mod text;

pub use build::{build_chapters, derive_title};

use crate::config::OutputFormat;
use serde::{Deserialize, Serialize};

/// Placeholder for the classification fields a downstream stage overwrites.
pub const PLACEHOLDER_LEVEL: &str = "Unknown";

/// One topic-coherent span of the source content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub video_id: String,
    pub title: String,
    pub start_time: f64,
    pub end_time: f64,
    pub subtitles: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub summary: String,
    pub cognitive_level: String,
    pub dok_level: String,
}

impl Chapter {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

pub trait ChapterFormatter {
    fn format(&self, chapters: &[Chapter]) -> String;
    fn extension(&self) -> &'static str;
}

pub fn create_formatter(format: OutputFormat) -> Box<dyn ChapterFormatter> {
    match format {
        OutputFormat::Json => Box::new(json::JsonFormatter::default()),
        OutputFormat::Text => Box::new(text::TextFormatter),
        OutputFormat::Markdown => Box::new(markdown::MarkdownFormatter),
    }
}

/// Render seconds as `MM:SS`, or `H:MM:SS` past the hour mark, the compact
/// style video descriptions use.
pub(crate) fn format_timestamp(secs: f64) -> String {
    let total_secs = secs.max(0.0) as u64;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}
