/// A single spoken token with its timing inside a segment.
///
/// `word` is the raw token as spoken and may carry punctuation; detection
/// strips it before matching. Timestamps are seconds from the start of the
/// audio, non-decreasing across a segment's word sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct WordTiming {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

impl WordTiming {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// One contiguous speech span produced by the transcriber.
///
/// `words` may be empty: short utterances and some models yield no
/// word-level timestamps, in which case consumers fall back to the
/// segment-level `start`/`end` (see the segment localizer).
#[derive(Clone, Debug, PartialEq)]
pub struct TranscriptSegment {
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub words: Vec<WordTiming>,
}

impl TranscriptSegment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn has_word_timestamps(&self) -> bool {
        !self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_word_timing_duration() {
        let w = WordTiming {
            word: "test".to_string(),
            start: 2.0,
            end: 2.8,
        };
        assert_relative_eq!(w.duration(), 0.8, epsilon = 0.001);
    }

    #[test]
    fn test_segment_duration() {
        let seg = TranscriptSegment {
            text: "hello world".to_string(),
            start: 1.0,
            end: 3.5,
            words: vec![],
        };
        assert_relative_eq!(seg.duration(), 2.5, epsilon = 0.001);
    }

    #[test]
    fn test_segment_without_words_reports_no_timestamps() {
        let seg = TranscriptSegment {
            text: "hi".to_string(),
            start: 0.0,
            end: 0.4,
            words: vec![],
        };
        assert!(!seg.has_word_timestamps());
    }

    #[test]
    fn test_segment_with_words_reports_timestamps() {
        let seg = TranscriptSegment {
            text: "hi".to_string(),
            start: 0.0,
            end: 0.4,
            words: vec![WordTiming {
                word: "hi".to_string(),
                start: 0.0,
                end: 0.4,
            }],
        };
        assert!(seg.has_word_timestamps());
    }
}
