use super::{detect_change_points, merge_short_ranges, SegmentRange, TimeWindow};
use crate::embed::Embedding;
use tracing::debug;

/// Lower search bound for the similarity threshold.
const LO_THRESHOLD: f64 = 0.55;
/// Upper search bound for the similarity threshold.
const HI_THRESHOLD: f64 = 0.92;

/// Bounds on the acceptable chapter count for one run, derived from the
/// total duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetRange {
    pub min: usize,
    pub max: usize,
}

impl TargetRange {
    pub fn contains(&self, count: usize) -> bool {
        self.min <= count && count <= self.max
    }

    /// Distance from `count` to the nearest bound; 0 inside the range.
    fn distance(&self, count: usize) -> usize {
        if self.contains(count) {
            0
        } else {
            count.abs_diff(self.min).min(count.abs_diff(self.max))
        }
    }
}

impl std::fmt::Display for TargetRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// Recommended chapter-count range for a given total duration in seconds.
pub fn target_chapter_range(duration_secs: f64) -> TargetRange {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return TargetRange { min: 5, max: 20 };
    }

    let minutes = duration_secs / 60.0;

    let (min, max) = if minutes <= 1.0 {
        (1, 3)
    } else if minutes <= 3.0 {
        (3, 6)
    } else if minutes <= 7.0 {
        (5, 10)
    } else if minutes <= 12.0 {
        (8, 18)
    } else if minutes <= 30.0 {
        (12, 30)
    } else if minutes <= 60.0 {
        (20, 50)
    } else {
        (30, 80)
    };

    TargetRange { min, max }
}

/// Tunables for one threshold search.
#[derive(Debug, Clone)]
pub struct SegmentationParams {
    /// Similarity threshold tried on the first iteration.
    pub start_threshold: f64,
    /// Iteration budget for the bisection search.
    pub max_iterations: usize,
    /// Minimum chapter duration handed to the range merger.
    pub min_chapter_duration: f64,
    /// Minimum run length before the drift detector may break a segment.
    pub min_run_length: usize,
}

impl Default for SegmentationParams {
    fn default() -> Self {
        Self {
            start_threshold: 0.75,
            max_iterations: 6,
            min_chapter_duration: 15.0,
            min_run_length: 1,
        }
    }
}

/// Result of a threshold search: the segmentation actually selected.
#[derive(Debug, Clone)]
pub struct SegmentationOutcome {
    /// Threshold that produced `ranges`.
    pub threshold: f64,
    pub ranges: Vec<SegmentRange>,
    /// Detection passes performed.
    pub iterations: usize,
    /// Whether the segment count landed inside the target range.
    pub converged: bool,
}

/// Bisection search over the similarity threshold until the segment count
/// lands inside `target`, bounded by `params.max_iterations`.
///
/// The threshold-to-count relationship is assumed monotonic but is not
/// guaranteed to be (pathological embeddings can fold it), so every
/// iteration also records the candidate closest to the target range and
/// exhaustion returns that best candidate instead of trusting convergence.
/// Never fails: some segmentation is always returned.
pub fn select_segmentation(
    windows: &[TimeWindow],
    embeddings: &[Embedding],
    target: TargetRange,
    params: &SegmentationParams,
) -> SegmentationOutcome {
    let mut lo = LO_THRESHOLD;
    let mut hi = HI_THRESHOLD;
    let mut threshold = params.start_threshold;

    let mut best: Option<(usize, f64, Vec<SegmentRange>)> = None;

    for iteration in 1..=params.max_iterations {
        let change_points = detect_change_points(embeddings, threshold, params.min_run_length);
        let ranges = merge_short_ranges(windows, &change_points, params.min_chapter_duration);
        let count = ranges.len();

        debug!(
            "iteration {}: threshold={:.3} -> {} segments (target {})",
            iteration, threshold, count, target
        );

        if target.contains(count) {
            return SegmentationOutcome {
                threshold,
                ranges,
                iterations: iteration,
                converged: true,
            };
        }

        let distance = target.distance(count);
        if best.as_ref().map_or(true, |(d, _, _)| distance < *d) {
            best = Some((distance, threshold, ranges));
        }

        if count > target.max {
            // Over-segmented: lower the similarity bar so fewer breaks fire
            hi = threshold;
            threshold = (threshold + lo) / 2.0;
        } else {
            // Under-segmented: raise the bar to force more breaks
            lo = threshold;
            threshold = (threshold + hi) / 2.0;
        }
    }

    match best {
        Some((_, threshold, ranges)) => SegmentationOutcome {
            threshold,
            ranges,
            iterations: params.max_iterations,
            converged: false,
        },
        None => {
            // Zero-iteration budget: still hand back a usable segmentation
            let change_points =
                detect_change_points(embeddings, params.start_threshold, params.min_run_length);
            let ranges =
                merge_short_ranges(windows, &change_points, params.min_chapter_duration);
            SegmentationOutcome {
                threshold: params.start_threshold,
                ranges,
                iterations: 0,
                converged: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minute_windows(n: usize) -> Vec<TimeWindow> {
        (0..n)
            .map(|i| TimeWindow {
                start: i as f64 * 60.0,
                end: (i + 1) as f64 * 60.0,
                text: format!("window {}", i),
            })
            .collect()
    }

    /// Orthogonal unit vectors per topic id: similarity is 1.0 within a
    /// topic and 0.0 across topics, making segment counts predictable.
    fn topic_embeddings(topics: &[usize]) -> Vec<Embedding> {
        let dims = topics.iter().max().map(|m| m + 1).unwrap_or(1);
        topics
            .iter()
            .map(|&t| {
                let mut v = vec![0.0_f32; dims];
                v[t] = 1.0;
                v
            })
            .collect()
    }

    #[test]
    fn test_target_range_brackets() {
        assert_eq!(target_chapter_range(0.0), TargetRange { min: 5, max: 20 });
        assert_eq!(target_chapter_range(-10.0), TargetRange { min: 5, max: 20 });
        assert_eq!(target_chapter_range(45.0), TargetRange { min: 1, max: 3 });
        assert_eq!(target_chapter_range(150.0), TargetRange { min: 3, max: 6 });
        assert_eq!(target_chapter_range(400.0), TargetRange { min: 5, max: 10 });
        assert_eq!(target_chapter_range(600.0), TargetRange { min: 8, max: 18 });
        assert_eq!(target_chapter_range(1500.0), TargetRange { min: 12, max: 30 });
        assert_eq!(target_chapter_range(3000.0), TargetRange { min: 20, max: 50 });
        assert_eq!(target_chapter_range(7200.0), TargetRange { min: 30, max: 80 });
    }

    #[test]
    fn test_accepts_first_iteration_inside_target() {
        let windows = minute_windows(6);
        let embeddings = topic_embeddings(&[0, 0, 1, 1, 2, 2]);

        let outcome = select_segmentation(
            &windows,
            &embeddings,
            TargetRange { min: 2, max: 4 },
            &SegmentationParams::default(),
        );

        assert!(outcome.converged);
        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.ranges.len(), 3);
        assert!((outcome.threshold - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_exhaustion_returns_best_candidate() {
        // Two topics only: the count can never reach a 5-chapter minimum,
        // so the search exhausts and reports the closest result.
        let windows = minute_windows(6);
        let embeddings = topic_embeddings(&[0, 0, 0, 1, 1, 1]);
        let params = SegmentationParams::default();

        let outcome = select_segmentation(
            &windows,
            &embeddings,
            TargetRange { min: 5, max: 8 },
            &params,
        );

        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, params.max_iterations);
        assert_eq!(outcome.ranges.len(), 2);
    }

    #[test]
    fn test_outcome_is_deterministic() {
        let windows = minute_windows(8);
        let embeddings = topic_embeddings(&[0, 0, 1, 1, 2, 2, 3, 3]);
        let target = TargetRange { min: 1, max: 2 };
        let params = SegmentationParams::default();

        let first = select_segmentation(&windows, &embeddings, target, &params);
        let second = select_segmentation(&windows, &embeddings, target, &params);

        assert_eq!(first.threshold, second.threshold);
        assert_eq!(first.ranges, second.ranges);
        assert_eq!(first.converged, second.converged);
    }

    #[test]
    fn test_zero_iteration_budget_still_segments() {
        let windows = minute_windows(4);
        let embeddings = topic_embeddings(&[0, 0, 1, 1]);
        let params = SegmentationParams {
            max_iterations: 0,
            ..SegmentationParams::default()
        };

        let outcome = select_segmentation(
            &windows,
            &embeddings,
            TargetRange { min: 1, max: 10 },
            &params,
        );

        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, 0);
        assert!(!outcome.ranges.is_empty());
    }

    #[test]
    fn test_partition_holds_for_selected_ranges() {
        let windows = minute_windows(10);
        let embeddings = topic_embeddings(&[0, 0, 0, 1, 1, 2, 2, 2, 3, 3]);

        let outcome = select_segmentation(
            &windows,
            &embeddings,
            TargetRange { min: 2, max: 6 },
            &SegmentationParams::default(),
        );

        assert_eq!(outcome.ranges.first().map(|r| r.start), Some(0));
        assert_eq!(outcome.ranges.last().map(|r| r.end), Some(9));
        for pair in outcome.ranges.windows(2) {
            assert_eq!(pair[0].end + 1, pair[1].start);
        }
    }
}
