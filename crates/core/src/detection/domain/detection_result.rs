use std::collections::BTreeSet;

/// Which detector produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMethod {
    Transformer,
    Keyword,
}

/// Verdict of a single detector on one text span.
///
/// `detected_terms` is empty for the transformer method; only the keyword
/// matcher produces term-level evidence.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    pub is_abusive: bool,
    pub confidence: f32,
    pub detected_terms: BTreeSet<String>,
    pub method: DetectionMethod,
}

impl DetectionResult {
    pub fn clean(method: DetectionMethod, confidence: f32) -> Self {
        Self {
            is_abusive: false,
            confidence,
            detected_terms: BTreeSet::new(),
            method,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_result_has_no_terms() {
        let r = DetectionResult::clean(DetectionMethod::Transformer, 0.2);
        assert!(!r.is_abusive);
        assert!(r.detected_terms.is_empty());
        assert_eq!(r.method, DetectionMethod::Transformer);
    }
}
