use crate::error::{ChapterizeError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A single timestamped caption cue from a transcript.
///
/// Cues are ordered by `start` and may have gaps or overlaps; `duration`
/// is taken as-is from the source (negative values are tolerated).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptCue {
    pub start: f64,
    pub duration: f64,
    pub text: String,
}

impl TranscriptCue {
    /// End time of this cue in seconds.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// A transcript document as saved by caption extractors: either a wrapper
/// object with metadata or a bare array of cues.
#[derive(Debug, Clone, Default)]
pub struct TranscriptDocument {
    pub video_id: Option<String>,
    pub language_code: Option<String>,
    pub video_duration: Option<f64>,
    pub cues: Vec<TranscriptCue>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTranscript {
    Document {
        video_id: Option<String>,
        language_code: Option<String>,
        video_duration: Option<f64>,
        segments: Vec<TranscriptCue>,
    },
    Cues(Vec<TranscriptCue>),
}

impl TranscriptDocument {
    /// Load a transcript from a JSON file.
    ///
    /// Cue text is normalized on load: bracketed caption annotations like
    /// `[Music]` are stripped and runs of whitespace are collapsed. A cue
    /// whose text becomes empty stays in the list (its timing still counts)
    /// but contributes nothing downstream.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ChapterizeError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse a transcript from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawTranscript = serde_json::from_str(json).map_err(|e| {
            ChapterizeError::Transcript(format!("not a recognized transcript document: {}", e))
        })?;

        let mut doc = match raw {
            RawTranscript::Document {
                video_id,
                language_code,
                video_duration,
                segments,
            } => Self {
                video_id,
                language_code,
                video_duration,
                cues: segments,
            },
            RawTranscript::Cues(cues) => Self {
                cues,
                ..Self::default()
            },
        };

        for cue in &mut doc.cues {
            cue.text = normalize_cue_text(&cue.text);
        }

        Ok(doc)
    }

    /// Total duration in seconds: the explicit metadata field when present,
    /// otherwise the latest cue end time.
    pub fn total_duration(&self) -> f64 {
        if let Some(duration) = self.video_duration {
            if duration > 0.0 {
                return duration;
            }
        }

        self.cues.iter().map(|c| c.end()).fold(0.0, f64::max)
    }

    /// Identifier used for chapter ids; falls back to "video" when the
    /// document carries no id.
    pub fn video_id(&self) -> &str {
        self.video_id.as_deref().unwrap_or("video")
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}

/// Strip bracketed caption annotations (`[Music]`, `[Applause]`, sound tags
/// in any language) and collapse whitespace runs to single spaces.
pub fn normalize_cue_text(text: &str) -> String {
    let tag_re = Regex::new(r"\[[^\]]*\]").expect("Invalid regex");
    let ws_re = Regex::new(r"\s+").expect("Invalid regex");

    let stripped = tag_re.replace_all(text, " ");
    ws_re.replace_all(&stripped, " ").trim().to_string()
}
