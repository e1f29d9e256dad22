pub mod chapter;
pub mod config;
pub mod embed;
pub mod error;
pub mod interactive;
pub mod pipeline;
pub mod segment;
pub mod transcript;

pub use config::Config;
pub use error::{ChapterizeError, Result};
pub use pipeline::{
    generate_chapters, print_summary, PipelineConfig, PipelineResult, PipelineStats,
};
