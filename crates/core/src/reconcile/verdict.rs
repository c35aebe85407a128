use std::collections::BTreeSet;

/// How a reconciled verdict was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Both detectors agreed on the boolean.
    Agreement,
    /// Detectors disagreed; the transformer's higher confidence won.
    TransformerWins,
    /// Detectors disagreed; the keyword matcher's higher confidence won.
    KeywordWins,
    /// No transformer was available; keyword verdict adopted verbatim.
    KeywordOnly,
    /// Keyword verdict deferred to the transformer (transformer-first and
    /// keyword-first policies).
    TransformerOnly,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Agreement => "agreement",
            Resolution::TransformerWins => "transformer_wins",
            Resolution::KeywordWins => "keyword_wins",
            Resolution::KeywordOnly => "keyword_only",
            Resolution::TransformerOnly => "transformer_only",
        }
    }
}

/// The single abuse decision for one text span after combining both
/// detectors.
///
/// `confidence` is the confidence of whichever source's verdict was
/// adopted; on agreement it is the larger of the two. `detected_terms`
/// always carries the keyword matcher's evidence even when the
/// transformer's verdict won — the transformer produces no term-level
/// evidence and the terms are what audit/UI layers display.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledVerdict {
    pub is_abusive: bool,
    pub confidence: f32,
    pub detected_terms: BTreeSet<String>,
    pub resolution: Resolution,
}
