use crate::transcript::TranscriptCue;

/// Default window width when the total duration is unknown.
pub const DEFAULT_WINDOW_SECONDS: f64 = 60.0;

/// A fixed-duration aggregation of transcript text, the atomic unit of
/// topic analysis.
#[derive(Debug, Clone)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TimeWindow {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Group consecutive cues into windows of roughly `window_seconds` width.
///
/// A window opens at the first uncommitted cue's start and tracks its end as
/// the max of the cue end times seen so far, so overlapping cues never
/// shrink it. It closes once it spans at least `window_seconds`, or at the
/// last cue, so the final window is always flushed even if short. Cue text
/// is space-joined; empty-text cues contribute only their timing.
pub fn build_windows(cues: &[TranscriptCue], window_seconds: f64) -> Vec<TimeWindow> {
    let mut windows = Vec::new();

    let mut window_start: Option<f64> = None;
    let mut window_end = 0.0_f64;
    let mut texts: Vec<&str> = Vec::new();

    for (idx, cue) in cues.iter().enumerate() {
        if window_start.is_none() {
            window_start = Some(cue.start);
            window_end = cue.end();
        }

        texts.push(cue.text.trim());
        window_end = window_end.max(cue.end());

        let start = window_start.unwrap();
        let is_last = idx == cues.len() - 1;

        if window_end - start >= window_seconds || is_last {
            let text = texts
                .iter()
                .filter(|t| !t.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join(" ");

            windows.push(TimeWindow {
                start,
                end: window_end,
                text,
            });

            window_start = None;
            texts.clear();
        }
    }

    windows
}

/// Derive a window width from the total duration, aiming for chunks in the
/// 15-30s neighborhood: `approx_chunks = trunc(clamp(duration/20, 10, 120))`,
/// `width = max(5, trunc(duration / approx_chunks))`. Unknown or nonsense
/// durations fall back to the 60s default.
pub fn window_seconds_for(total_duration: f64) -> f64 {
    if !total_duration.is_finite() || total_duration <= 0.0 {
        return DEFAULT_WINDOW_SECONDS;
    }

    let approx_chunks = (total_duration / 20.0).clamp(10.0, 120.0).trunc();
    (total_duration / approx_chunks).trunc().max(5.0)
}
