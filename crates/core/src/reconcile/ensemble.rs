use crate::detection::domain::detection_result::DetectionResult;

use super::verdict::{ReconciledVerdict, Resolution};

/// Policy governing how the two detectors' verdicts are combined.
///
/// A closed enum rather than a string tag so every policy handler is
/// checked exhaustively at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsembleMode {
    /// Combine both detectors; disagreements resolved by confidence.
    Hybrid,
    /// Ignore the transformer even when present.
    KeywordOnly,
    /// Trust the transformer when its confidence clears the threshold,
    /// otherwise fall back to the keyword matcher.
    TransformerFirst,
    /// A keyword hit wins outright; clean keyword spans defer to the
    /// transformer.
    KeywordFirst,
}

impl std::str::FromStr for EnsembleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hybrid" => Ok(EnsembleMode::Hybrid),
            "keyword_only" => Ok(EnsembleMode::KeywordOnly),
            "transformer_first" => Ok(EnsembleMode::TransformerFirst),
            "keyword_first" => Ok(EnsembleMode::KeywordFirst),
            other => Err(format!("unknown ensemble mode: {other}")),
        }
    }
}

/// Combines transformer and keyword verdicts into one abuse decision.
#[derive(Debug, Clone, Copy)]
pub struct HybridReconciler {
    mode: EnsembleMode,
    /// Confidence the transformer must clear in `TransformerFirst` mode.
    threshold: f32,
}

impl HybridReconciler {
    pub fn new(mode: EnsembleMode, threshold: f32) -> Self {
        Self { mode, threshold }
    }

    pub fn mode(&self) -> EnsembleMode {
        self.mode
    }

    /// `transformer` is `None` when the classifier failed to initialize or
    /// was disabled; the keyword verdict is then adopted verbatim no matter
    /// the configured mode.
    pub fn reconcile(
        &self,
        transformer: Option<&DetectionResult>,
        keyword: &DetectionResult,
    ) -> ReconciledVerdict {
        let Some(transformer) = transformer else {
            return adopt_keyword(keyword, Resolution::KeywordOnly);
        };

        match self.mode {
            EnsembleMode::KeywordOnly => adopt_keyword(keyword, Resolution::KeywordOnly),
            EnsembleMode::Hybrid => self.reconcile_hybrid(transformer, keyword),
            EnsembleMode::TransformerFirst => {
                if transformer.confidence >= self.threshold {
                    adopt_transformer(transformer, keyword, Resolution::TransformerOnly)
                } else {
                    adopt_keyword(keyword, Resolution::KeywordOnly)
                }
            }
            EnsembleMode::KeywordFirst => {
                if keyword.is_abusive {
                    ReconciledVerdict {
                        is_abusive: true,
                        confidence: keyword.confidence.max(transformer.confidence),
                        detected_terms: keyword.detected_terms.clone(),
                        resolution: Resolution::KeywordWins,
                    }
                } else {
                    adopt_transformer(transformer, keyword, Resolution::TransformerOnly)
                }
            }
        }
    }

    fn reconcile_hybrid(
        &self,
        transformer: &DetectionResult,
        keyword: &DetectionResult,
    ) -> ReconciledVerdict {
        if transformer.is_abusive == keyword.is_abusive {
            return ReconciledVerdict {
                is_abusive: transformer.is_abusive,
                confidence: transformer.confidence.max(keyword.confidence),
                detected_terms: keyword.detected_terms.clone(),
                resolution: Resolution::Agreement,
            };
        }

        // Disagreement: higher confidence wins. On an exact tie the
        // transformer wins — its confidence is graded while the keyword
        // matcher's is fixed, so it is the better-informed source.
        if transformer.confidence >= keyword.confidence {
            adopt_transformer(transformer, keyword, Resolution::TransformerWins)
        } else {
            adopt_keyword(keyword, Resolution::KeywordWins)
        }
    }
}

fn adopt_keyword(keyword: &DetectionResult, resolution: Resolution) -> ReconciledVerdict {
    ReconciledVerdict {
        is_abusive: keyword.is_abusive,
        confidence: keyword.confidence,
        detected_terms: keyword.detected_terms.clone(),
        resolution,
    }
}

fn adopt_transformer(
    transformer: &DetectionResult,
    keyword: &DetectionResult,
    resolution: Resolution,
) -> ReconciledVerdict {
    ReconciledVerdict {
        is_abusive: transformer.is_abusive,
        confidence: transformer.confidence,
        // Keyword evidence survives even when the transformer's verdict is
        // adopted: it is the only term-level evidence the system has.
        detected_terms: keyword.detected_terms.clone(),
        resolution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detection_result::DetectionMethod;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use std::collections::BTreeSet;

    fn transformer(is_abusive: bool, confidence: f32) -> DetectionResult {
        DetectionResult {
            is_abusive,
            confidence,
            detected_terms: BTreeSet::new(),
            method: DetectionMethod::Transformer,
        }
    }

    fn keyword(is_abusive: bool, confidence: f32, terms: &[&str]) -> DetectionResult {
        DetectionResult {
            is_abusive,
            confidence,
            detected_terms: terms.iter().map(|t| t.to_string()).collect(),
            method: DetectionMethod::Keyword,
        }
    }

    fn hybrid() -> HybridReconciler {
        HybridReconciler::new(EnsembleMode::Hybrid, 0.75)
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn test_agreement_adopts_shared_bool_and_max_confidence(#[case] abusive: bool) {
        let t = transformer(abusive, 0.7);
        let k = keyword(abusive, 0.9, if abusive { &["chutiya"] } else { &[] });
        let v = hybrid().reconcile(Some(&t), &k);
        assert_eq!(v.is_abusive, abusive);
        assert_relative_eq!(v.confidence, 0.9);
        assert_eq!(v.resolution, Resolution::Agreement);
    }

    #[test]
    fn test_disagreement_transformer_higher_confidence_wins() {
        let t = transformer(true, 0.95);
        let k = keyword(false, 0.1, &[]);
        let v = hybrid().reconcile(Some(&t), &k);
        assert!(v.is_abusive);
        assert_relative_eq!(v.confidence, 0.95);
        assert_eq!(v.resolution, Resolution::TransformerWins);
    }

    #[test]
    fn test_disagreement_keyword_higher_confidence_wins() {
        let t = transformer(false, 0.6);
        let k = keyword(true, 0.9, &["chutiya"]);
        let v = hybrid().reconcile(Some(&t), &k);
        assert!(v.is_abusive);
        assert_relative_eq!(v.confidence, 0.9);
        assert_eq!(v.resolution, Resolution::KeywordWins);
    }

    #[test]
    fn test_exact_confidence_tie_prefers_transformer() {
        let t = transformer(false, 0.9);
        let k = keyword(true, 0.9, &["chutiya"]);
        let v = hybrid().reconcile(Some(&t), &k);
        assert!(!v.is_abusive);
        assert_eq!(v.resolution, Resolution::TransformerWins);
    }

    #[test]
    fn test_absent_transformer_is_keyword_only() {
        let k = keyword(true, 0.9, &["chutiya"]);
        let v = hybrid().reconcile(None, &k);
        assert!(v.is_abusive);
        assert_relative_eq!(v.confidence, 0.9);
        assert_eq!(v.resolution, Resolution::KeywordOnly);
        assert!(v.detected_terms.contains("chutiya"));
    }

    #[test]
    fn test_keyword_only_mode_ignores_transformer() {
        let reconciler = HybridReconciler::new(EnsembleMode::KeywordOnly, 0.75);
        let t = transformer(true, 0.99);
        let k = keyword(false, 0.1, &[]);
        let v = reconciler.reconcile(Some(&t), &k);
        assert!(!v.is_abusive);
        assert_eq!(v.resolution, Resolution::KeywordOnly);
    }

    #[test]
    fn test_transformer_first_trusts_confident_transformer() {
        let reconciler = HybridReconciler::new(EnsembleMode::TransformerFirst, 0.75);
        let t = transformer(true, 0.8);
        let k = keyword(false, 0.1, &[]);
        let v = reconciler.reconcile(Some(&t), &k);
        assert!(v.is_abusive);
        assert_eq!(v.resolution, Resolution::TransformerOnly);
    }

    #[test]
    fn test_transformer_first_falls_back_below_threshold() {
        let reconciler = HybridReconciler::new(EnsembleMode::TransformerFirst, 0.75);
        let t = transformer(true, 0.5);
        let k = keyword(true, 0.9, &["chutiya"]);
        let v = reconciler.reconcile(Some(&t), &k);
        assert!(v.is_abusive);
        assert_relative_eq!(v.confidence, 0.9);
        assert_eq!(v.resolution, Resolution::KeywordOnly);
    }

    #[test]
    fn test_keyword_first_hit_wins_with_max_confidence() {
        let reconciler = HybridReconciler::new(EnsembleMode::KeywordFirst, 0.75);
        let t = transformer(false, 0.95);
        let k = keyword(true, 0.9, &["chutiya"]);
        let v = reconciler.reconcile(Some(&t), &k);
        assert!(v.is_abusive);
        assert_relative_eq!(v.confidence, 0.95);
        assert_eq!(v.resolution, Resolution::KeywordWins);
    }

    #[test]
    fn test_keyword_first_clean_defers_to_transformer() {
        let reconciler = HybridReconciler::new(EnsembleMode::KeywordFirst, 0.75);
        let t = transformer(true, 0.85);
        let k = keyword(false, 0.1, &[]);
        let v = reconciler.reconcile(Some(&t), &k);
        assert!(v.is_abusive);
        assert_eq!(v.resolution, Resolution::TransformerOnly);
    }

    #[test]
    fn test_keyword_evidence_survives_transformer_win() {
        let t = transformer(true, 0.95);
        let k = keyword(true, 0.9, &["chutiya"]);
        let v = hybrid().reconcile(Some(&t), &k);
        assert!(v.detected_terms.contains("chutiya"));
    }

    #[rstest]
    #[case("hybrid", EnsembleMode::Hybrid)]
    #[case("KEYWORD_ONLY", EnsembleMode::KeywordOnly)]
    #[case("transformer_first", EnsembleMode::TransformerFirst)]
    #[case("keyword_first", EnsembleMode::KeywordFirst)]
    fn test_mode_from_str(#[case] input: &str, #[case] expected: EnsembleMode) {
        assert_eq!(input.parse::<EnsembleMode>().unwrap(), expected);
    }

    #[test]
    fn test_mode_from_str_rejects_unknown() {
        assert!("majority_vote".parse::<EnsembleMode>().is_err());
    }
}
