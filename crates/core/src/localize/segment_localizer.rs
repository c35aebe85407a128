use crate::detection::domain::text_normalizer::strip_token;
use crate::reconcile::verdict::ReconciledVerdict;
use crate::shared::constants::{DEFAULT_CENSOR_PADDING, DEFAULT_MERGE_GAP};
use crate::transcription::domain::transcript::TranscriptSegment;

use super::offending_interval::{merge_intervals, OffendingInterval};

/// Projects reconciled abuse decisions onto word-level time intervals.
///
/// Words carry their own timestamps where the transcriber produced them.
/// Segments without word timestamps fall back to splitting the segment
/// duration evenly across whitespace tokens — an approximation that drifts
/// when spoken words have unequal durations, accepted as such.
#[derive(Debug, Clone, Copy)]
pub struct SegmentLocalizer {
    /// Seconds added on each side of an offending word before merging.
    padding: f64,
    /// Intervals closer than this merge into one.
    gap_tolerance: f64,
}

impl SegmentLocalizer {
    pub fn new(padding: f64, gap_tolerance: f64) -> Self {
        Self {
            padding: padding.max(0.0),
            gap_tolerance: gap_tolerance.max(0.0),
        }
    }

    /// Run every word through `reconcile_fn` and emit a padded interval per
    /// abusive verdict, then sort and merge. The output is ordered and
    /// non-overlapping.
    pub fn localize<F>(
        &self,
        segments: &[TranscriptSegment],
        mut reconcile_fn: F,
    ) -> Vec<OffendingInterval>
    where
        F: FnMut(&str) -> ReconciledVerdict,
    {
        let mut intervals = Vec::new();

        for segment in segments {
            if segment.has_word_timestamps() {
                for word in &segment.words {
                    let token = strip_token(&word.word);
                    if token.is_empty() {
                        continue;
                    }
                    let verdict = reconcile_fn(token);
                    if verdict.is_abusive {
                        self.push_interval(&mut intervals, token, word.start, word.end, &verdict);
                    }
                }
            } else {
                self.localize_proportional(segment, &mut reconcile_fn, &mut intervals);
            }
        }

        merge_intervals(intervals, self.gap_tolerance)
    }

    /// Slide windows of 2..=`max_window` consecutive words through each
    /// segment and emit a padded interval spanning every window
    /// `phrase_fn` flags. Used for multi-word terms, which single-token
    /// scans can never match. The output is ordered and non-overlapping.
    pub fn localize_phrases<F>(
        &self,
        segments: &[TranscriptSegment],
        max_window: usize,
        mut phrase_fn: F,
    ) -> Vec<OffendingInterval>
    where
        F: FnMut(&str) -> ReconciledVerdict,
    {
        let mut intervals = Vec::new();
        if max_window < 2 {
            return intervals;
        }

        for segment in segments {
            let tokens = timed_tokens(segment);
            for size in 2..=max_window.min(tokens.len()) {
                for window in tokens.windows(size) {
                    let text = window
                        .iter()
                        .map(|(t, _, _)| t.as_str())
                        .collect::<Vec<_>>()
                        .join(" ");
                    let verdict = phrase_fn(&text);
                    if verdict.is_abusive {
                        let (_, start, _) = window[0];
                        let (_, _, end) = window[window.len() - 1];
                        self.push_interval(&mut intervals, &text, start, end, &verdict);
                    }
                }
            }
        }

        merge_intervals(intervals, self.gap_tolerance)
    }

    /// Estimate per-token timing by distributing the segment duration
    /// evenly over its whitespace tokens.
    fn localize_proportional<F>(
        &self,
        segment: &TranscriptSegment,
        reconcile_fn: &mut F,
        intervals: &mut Vec<OffendingInterval>,
    ) where
        F: FnMut(&str) -> ReconciledVerdict,
    {
        let tokens: Vec<&str> = segment.text.split_whitespace().collect();
        if tokens.is_empty() {
            return;
        }
        let width = segment.duration() / tokens.len() as f64;

        for (i, raw) in tokens.iter().enumerate() {
            let token = strip_token(raw);
            if token.is_empty() {
                continue;
            }
            let verdict = reconcile_fn(token);
            if verdict.is_abusive {
                let start = segment.start + i as f64 * width;
                self.push_interval(intervals, token, start, start + width, &verdict);
            }
        }
    }

    /// Transcribers emit zero-width timings for clipped tokens; with no
    /// padding those would become degenerate intervals, so they are dropped
    /// here rather than handed to the censor plan.
    fn push_interval(
        &self,
        intervals: &mut Vec<OffendingInterval>,
        token: &str,
        start: f64,
        end: f64,
        verdict: &ReconciledVerdict,
    ) {
        let interval = OffendingInterval {
            start: (start - self.padding).max(0.0),
            end: end + self.padding,
            source_word: token.to_string(),
            confidence: verdict.confidence,
        };
        if interval.end > interval.start {
            intervals.push(interval);
        }
    }
}

impl Default for SegmentLocalizer {
    fn default() -> Self {
        Self::new(DEFAULT_CENSOR_PADDING, DEFAULT_MERGE_GAP)
    }
}

/// Stripped tokens with their start/end times, using word timestamps when
/// present and the even proportional split otherwise.
fn timed_tokens(segment: &TranscriptSegment) -> Vec<(String, f64, f64)> {
    if segment.has_word_timestamps() {
        segment
            .words
            .iter()
            .filter_map(|w| {
                let token = strip_token(&w.word);
                (!token.is_empty()).then(|| (token.to_string(), w.start, w.end))
            })
            .collect()
    } else {
        let tokens: Vec<&str> = segment.text.split_whitespace().collect();
        if tokens.is_empty() {
            return Vec::new();
        }
        let width = segment.duration() / tokens.len() as f64;
        tokens
            .iter()
            .enumerate()
            .filter_map(|(i, raw)| {
                let token = strip_token(raw);
                let start = segment.start + i as f64 * width;
                (!token.is_empty()).then(|| (token.to_string(), start, start + width))
            })
            .collect()
    }
}
