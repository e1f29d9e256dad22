use super::{SegmentRange, TimeWindow};

/// Collapse ranges shorter than `min_duration` into their neighbors.
///
/// Change points become consecutive inclusive ranges partitioning the
/// window indices: each non-final change-point pair `(a, b)` yields
/// `[a, b-1]` (the window at `b` opens the next topic), and the final pair
/// is taken inclusive since its right edge is the end marker, not a break.
///
/// A left-to-right rescan then absorbs short ranges: the first range
/// extends its successor's start backward; last and interior ranges extend
/// the predecessor's end forward. Interior ties always merge backward,
/// keeping boundaries deterministic. The rescan stops when nothing is short
/// or a single range remains, so at least one range survives even when
/// every range is short.
pub fn merge_short_ranges(
    windows: &[TimeWindow],
    change_points: &[usize],
    min_duration: f64,
) -> Vec<SegmentRange> {
    if windows.is_empty() || change_points.is_empty() {
        return Vec::new();
    }

    let pair_count = change_points.len().saturating_sub(1);
    let mut ranges: Vec<SegmentRange> = change_points
        .windows(2)
        .enumerate()
        .map(|(idx, pair)| SegmentRange {
            start: pair[0],
            end: if idx + 1 == pair_count {
                pair[1]
            } else {
                pair[1] - 1
            },
        })
        .collect();

    let mut i = 0;
    while i < ranges.len() {
        if ranges.len() == 1 {
            break;
        }

        if ranges[i].duration(windows) < min_duration {
            if i == 0 {
                ranges[1].start = ranges[0].start;
                ranges.remove(0);
            } else {
                ranges[i - 1].end = ranges[i].end;
                ranges.remove(i);
                i -= 1;
            }
        } else {
            i += 1;
        }
    }

    if ranges.is_empty() {
        return vec![SegmentRange {
            start: 0,
            end: windows.len() - 1,
        }];
    }

    ranges
}
