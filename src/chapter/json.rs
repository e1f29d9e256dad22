// JSON chapter format
use super::{Chapter, ChapterFormatter};
use serde::Serialize;

#[derive(Default)]
pub struct JsonFormatter {
    pub video_id: Option<String>,
    pub provider: Option<String>,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    metadata: JsonMetadata,
    chapters: &'a [Chapter],
}

#[derive(Serialize)]
struct JsonMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<String>,
    chapter_count: usize,
}

impl ChapterFormatter for JsonFormatter {
    fn format(&self, chapters: &[Chapter]) -> String {
        let output = JsonOutput {
            metadata: JsonMetadata {
                video_id: self.video_id.clone(),
                provider: self.provider.clone(),
                chapter_count: chapters.len(),
            },
            chapters,
        };

        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}
