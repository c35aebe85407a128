/// A time range in the source media slated for censoring.
#[derive(Debug, Clone, PartialEq)]
pub struct OffendingInterval {
    pub start: f64,
    pub end: f64,
    /// The transcript word that triggered this interval, kept for audit.
    pub source_word: String,
    pub confidence: f32,
}

impl OffendingInterval {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Sort intervals by start and merge any that overlap or sit closer than
/// `gap_tolerance` seconds apart.
///
/// A merged interval spans `[min(start), max(end)]`, keeps the maximum
/// confidence among its members, and the source word of the earliest
/// member. The result satisfies `intervals[i].end <= intervals[i+1].start`
/// for all `i`, which the censor stage depends on.
pub fn merge_intervals(
    mut intervals: Vec<OffendingInterval>,
    gap_tolerance: f64,
) -> Vec<OffendingInterval> {
    if intervals.is_empty() {
        return intervals;
    }

    intervals.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut merged: Vec<OffendingInterval> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        match merged.last_mut() {
            Some(last) if interval.start - last.end <= gap_tolerance => {
                last.end = last.end.max(interval.end);
                last.confidence = last.confidence.max(interval.confidence);
            }
            _ => merged.push(interval),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn interval(start: f64, end: f64, word: &str, confidence: f32) -> OffendingInterval {
        OffendingInterval {
            start,
            end,
            source_word: word.to_string(),
            confidence,
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(merge_intervals(vec![], 0.0).is_empty());
    }

    #[test]
    fn test_disjoint_intervals_unchanged() {
        let merged = merge_intervals(
            vec![interval(0.0, 1.0, "a", 0.9), interval(2.0, 3.0, "b", 0.8)],
            0.0,
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let merged = merge_intervals(
            vec![interval(5.0, 6.0, "b", 0.8), interval(1.0, 2.0, "a", 0.9)],
            0.0,
        );
        assert_relative_eq!(merged[0].start, 1.0);
        assert_relative_eq!(merged[1].start, 5.0);
    }

    #[test]
    fn test_overlapping_intervals_merge() {
        let merged = merge_intervals(
            vec![interval(1.0, 2.5, "a", 0.7), interval(2.0, 3.0, "b", 0.95)],
            0.0,
        );
        assert_eq!(merged.len(), 1);
        assert_relative_eq!(merged[0].start, 1.0);
        assert_relative_eq!(merged[0].end, 3.0);
        assert_relative_eq!(merged[0].confidence, 0.95);
        assert_eq!(merged[0].source_word, "a");
    }

    #[test]
    fn test_adjacent_intervals_merge_at_zero_tolerance() {
        let merged = merge_intervals(
            vec![interval(1.0, 2.0, "a", 0.9), interval(2.0, 3.0, "b", 0.9)],
            0.0,
        );
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_gap_tolerance_bridges_small_gaps() {
        let merged = merge_intervals(
            vec![interval(1.0, 2.0, "a", 0.9), interval(2.1, 3.0, "b", 0.9)],
            0.2,
        );
        assert_eq!(merged.len(), 1);
        assert_relative_eq!(merged[0].end, 3.0);
    }

    #[test]
    fn test_gap_beyond_tolerance_stays_split() {
        let merged = merge_intervals(
            vec![interval(1.0, 2.0, "a", 0.9), interval(2.5, 3.0, "b", 0.9)],
            0.2,
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_contained_interval_absorbed() {
        let merged = merge_intervals(
            vec![interval(1.0, 5.0, "a", 0.6), interval(2.0, 3.0, "b", 0.9)],
            0.0,
        );
        assert_eq!(merged.len(), 1);
        assert_relative_eq!(merged[0].end, 5.0);
        assert_relative_eq!(merged[0].confidence, 0.9);
    }

    #[test]
    fn test_output_ordering_invariant_holds() {
        let merged = merge_intervals(
            vec![
                interval(4.0, 4.5, "c", 0.9),
                interval(0.5, 1.5, "a", 0.9),
                interval(1.4, 2.0, "b", 0.9),
                interval(9.0, 9.2, "d", 0.9),
            ],
            0.0,
        );
        for pair in merged.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }
}
