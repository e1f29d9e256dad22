pub mod drift;
pub mod merge;
pub mod threshold;
pub mod window;

pub use drift::{cosine_similarity, detect_change_points};
pub use merge::merge_short_ranges;
pub use threshold::{
    select_segmentation, target_chapter_range, SegmentationOutcome, SegmentationParams,
    TargetRange,
};
pub use window::{build_windows, window_seconds_for, TimeWindow};

/// An inclusive range of window indices treated as a single topic.
///
/// Ranges from one detection run are contiguous, ordered, and jointly cover
/// every window index exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentRange {
    pub start: usize,
    pub end: usize,
}

impl SegmentRange {
    /// Wall-clock duration of this range given the windows it references.
    pub fn duration(&self, windows: &[TimeWindow]) -> f64 {
        windows[self.end].end - windows[self.start].start
    }
}
