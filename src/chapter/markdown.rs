// Markdown chapter list with timestamps and summaries
use super::{format_timestamp, Chapter, ChapterFormatter};

pub struct MarkdownFormatter;

impl ChapterFormatter for MarkdownFormatter {
    fn format(&self, chapters: &[Chapter]) -> String {
        let mut out = String::from("# Chapters\n");

        for chapter in chapters {
            out.push_str(&format!(
                "\n## {} ({} - {})\n",
                chapter.title,
                format_timestamp(chapter.start_time),
                format_timestamp(chapter.end_time)
            ));

            if !chapter.summary.is_empty() {
                out.push_str(&format!("\n{}\n", chapter.summary));
            }
        }

        out
    }

    fn extension(&self) -> &'static str {
        "md"
    }
}
