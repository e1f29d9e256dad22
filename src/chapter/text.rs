// Plain-text chapter list, one "MM:SS Title" line per chapter, the
// convention video descriptions use for clickable chapter markers.
use super::{format_timestamp, Chapter, ChapterFormatter};

pub struct TextFormatter;

impl ChapterFormatter for TextFormatter {
    fn format(&self, chapters: &[Chapter]) -> String {
        let mut out = chapters
            .iter()
            .map(|c| format!("{} {}", format_timestamp(c.start_time), c.title))
            .collect::<Vec<_>>()
            .join("\n");

        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    fn extension(&self) -> &'static str {
        "txt"
    }
}
