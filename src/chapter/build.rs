use super::{Chapter, PLACEHOLDER_LEVEL};
use crate::segment::{SegmentRange, TimeWindow};

/// Longest title emitted, in characters.
const TITLE_MAX_CHARS: usize = 50;

/// Longest summary emitted, in characters.
const SUMMARY_MAX_CHARS: usize = 200;

/// Title used when a range carries no text at all.
const FALLBACK_TITLE: &str = "Chapter";

/// Turn accepted ranges into chapter records.
///
/// Each chapter takes its start from its first window and its end from its
/// last, concatenates the window texts, and derives a title and a short
/// summary from the combined text. Ids are `{video_id}_seg_{ordinal}`.
pub fn build_chapters(
    windows: &[TimeWindow],
    ranges: &[SegmentRange],
    video_id: &str,
) -> Vec<Chapter> {
    ranges
        .iter()
        .enumerate()
        .map(|(ordinal, range)| {
            let combined = windows[range.start..=range.end]
                .iter()
                .map(|w| w.text.as_str())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");

            let title = derive_title(&combined, TITLE_MAX_CHARS);
            let summary = truncate_chars(&combined, SUMMARY_MAX_CHARS);

            Chapter {
                id: format!("{}_seg_{}", video_id, ordinal),
                video_id: video_id.to_string(),
                title,
                start_time: windows[range.start].start,
                end_time: windows[range.end].end,
                subtitles: combined,
                tags: Vec::new(),
                keywords: Vec::new(),
                summary,
                cognitive_level: PLACEHOLDER_LEVEL.to_string(),
                dok_level: PLACEHOLDER_LEVEL.to_string(),
            }
        })
        .collect()
}

/// Derive a chapter title from the first sentence of `text`.
///
/// Splits on `.`; an over-long sentence is cut at the last space under the
/// limit with a trailing ellipsis. Text with no sentence boundary is
/// truncated the same way; empty text yields the fallback literal.
pub fn derive_title(text: &str, max_chars: usize) -> String {
    let cleaned = text.trim();
    if cleaned.is_empty() {
        return FALLBACK_TITLE.to_string();
    }

    if let Some(sentence) = cleaned.split('.').map(str::trim).find(|s| !s.is_empty()) {
        return shorten_at_word(sentence, max_chars);
    }

    shorten_at_word(cleaned, max_chars)
}

/// Cut `text` to at most `max_chars` characters at a word boundary,
/// appending an ellipsis when anything was dropped.
fn shorten_at_word(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let truncated: String = text.chars().take(max_chars).collect();
    let cut = match truncated.rfind(' ') {
        Some(idx) => &truncated[..idx],
        None => truncated.as_str(),
    };

    format!("{}...", cut)
}

/// Plain character-count truncation with a trailing ellipsis.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let head: String = text.chars().take(max_chars).collect();
    format!("{}...", head)
}
