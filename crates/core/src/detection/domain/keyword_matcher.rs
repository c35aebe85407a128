use std::collections::BTreeSet;

use super::detection_result::{DetectionMethod, DetectionResult};
use super::text_normalizer::{is_obfuscation_char, normalize, obfuscations_of};
use crate::shared::constants::{KEYWORD_CLEAN_CONFIDENCE, KEYWORD_MATCH_CONFIDENCE};

/// English profanity, kept to commonly flagged terms.
const ENGLISH_TERMS: &[&str] = &[
    "fuck", "fucking", "fucker", "motherfucker", "shit", "bullshit", "bitch", "bastard", "asshole",
    "ass", "dick", "cock", "pussy", "cunt", "slut", "whore", "retard", "nigger", "nigga", "wanker",
    "prick", "douchebag", "jackass", "dumbass",
];

/// Hindi profanity in Devanagari script.
const HINDI_TERMS: &[&str] = &[
    "चूतिया", "भोसड़ी", "भोसड़ीके", "मादरचोद", "बहनचोद", "हरामी", "हरामखोर", "कमीना", "कुतिया",
    "रंडी", "गांडू", "लौड़ा", "साला", "कमीने",
];

/// Hindi/Urdu profanity as commonly romanized (Hinglish).
const HINGLISH_TERMS: &[&str] = &[
    "chutiya", "chutiye", "bhosdike", "bhosadike", "madarchod", "behenchod", "bhenchod", "harami",
    "haramkhor", "kamina", "kaminey", "kutiya", "kutta", "randi", "gandu", "gaandu", "lauda",
    "lavda", "saala", "chodu", "jhant",
];

/// Last-resort term list used when every detector failed to initialize.
/// Deliberately tiny: censoring with this list beats censoring nothing,
/// and failing the whole job is worse still.
pub const MINIMAL_FALLBACK_TERMS: &[&str] = &[
    "fuck", "shit", "bitch", "asshole", "cunt", "madarchod", "behenchod", "chutiya", "bhosdike",
];

/// Terms at or below this length never use obfuscation matching; the
/// tolerant pattern on short terms flags too many unrelated words.
const OBFUSCATION_MIN_LEN: usize = 5;

/// Multilingual profanity matcher with obfuscation tolerance.
///
/// Matching is word-boundary exact on normalized text, so "assess" never
/// matches "ass". Terms longer than four characters additionally get a
/// per-character tolerant comparison that catches spellings like "a$$hole".
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    terms: Vec<String>,
}

impl KeywordMatcher {
    /// Matcher over the built-in English/Hindi/Hinglish term set.
    pub fn new() -> Self {
        let terms = ENGLISH_TERMS
            .iter()
            .chain(HINDI_TERMS)
            .chain(HINGLISH_TERMS)
            .map(|t| normalize(t))
            .collect();
        Self { terms }
    }

    /// Matcher over a caller-supplied term list (e.g. loaded from a
    /// configured keyword file). Terms are normalized on construction.
    pub fn with_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .map(|t| normalize(t.as_ref()))
            .filter(|t| !t.is_empty())
            .collect();
        Self { terms }
    }

    /// The minimal hardcoded matcher for total-failure degradation.
    pub fn minimal() -> Self {
        Self::with_terms(MINIMAL_FALLBACK_TERMS.iter().copied())
    }

    /// Whether any configured term spans multiple words. Such terms only
    /// match when the caller runs [`detect_phrases`](Self::detect_phrases)
    /// over word windows; single-token scans never see them.
    pub fn has_phrase_terms(&self) -> bool {
        self.terms.iter().any(|t| t.contains(' '))
    }

    /// Word count of the longest configured term.
    pub fn max_phrase_words(&self) -> usize {
        self.terms
            .iter()
            .map(|t| t.split(' ').count())
            .max()
            .unwrap_or(1)
    }

    /// Scan `text` for multi-word terms only. Single-word terms are
    /// ignored so a window spanning one profane word plus its clean
    /// neighbours is not flagged wholesale.
    pub fn detect_phrases(&self, text: &str) -> DetectionResult {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return DetectionResult::clean(DetectionMethod::Keyword, KEYWORD_CLEAN_CONFIDENCE);
        }

        let tokens: Vec<&str> = normalized.split(' ').collect();
        let mut matched: BTreeSet<String> = BTreeSet::new();
        for term in self.terms.iter().filter(|t| t.contains(' ')) {
            if phrase_matches(&tokens, term) {
                matched.insert(term.clone());
            }
        }

        let is_abusive = !matched.is_empty();
        DetectionResult {
            is_abusive,
            confidence: if is_abusive {
                KEYWORD_MATCH_CONFIDENCE
            } else {
                KEYWORD_CLEAN_CONFIDENCE
            },
            detected_terms: matched,
            method: DetectionMethod::Keyword,
        }
    }

    /// Scan `text` for profane terms. Never fails; empty or whitespace-only
    /// input is clean.
    pub fn detect(&self, text: &str) -> DetectionResult {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return DetectionResult::clean(DetectionMethod::Keyword, KEYWORD_CLEAN_CONFIDENCE);
        }

        let tokens: Vec<&str> = normalized.split(' ').collect();

        // The full normalization removes masking characters, so the
        // obfuscation pass runs on lowercased tokens that keep them.
        let lowered = text.to_lowercase();
        let raw_tokens: Vec<&str> = lowered
            .split_whitespace()
            .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && !is_obfuscation_char(c)))
            .filter(|t| !t.is_empty())
            .collect();

        let mut matched: BTreeSet<String> = BTreeSet::new();

        for term in &self.terms {
            if term.contains(' ') {
                if phrase_matches(&tokens, term) {
                    matched.insert(term.clone());
                }
                continue;
            }
            let exact = tokens.iter().any(|t| *t == term.as_str());
            let obfuscated = raw_tokens.iter().any(|t| obfuscated_matches(t, term));
            if exact || obfuscated {
                matched.insert(term.clone());
            }
        }

        let is_abusive = !matched.is_empty();
        DetectionResult {
            is_abusive,
            confidence: if is_abusive {
                KEYWORD_MATCH_CONFIDENCE
            } else {
                KEYWORD_CLEAN_CONFIDENCE
            },
            detected_terms: matched,
            method: DetectionMethod::Keyword,
        }
    }
}

impl Default for KeywordMatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Multi-word terms match as a consecutive token run.
fn phrase_matches(tokens: &[&str], phrase: &str) -> bool {
    let parts: Vec<&str> = phrase.split(' ').collect();
    tokens.windows(parts.len()).any(|w| w == parts.as_slice())
}

/// Per-character tolerant comparison for intentionally obscured spellings.
///
/// Each character of `token` must equal the corresponding term character
/// or one of its known obfuscated stand-ins. Applies only to terms longer
/// than four characters.
fn obfuscated_matches(token: &str, term: &str) -> bool {
    let term_chars: Vec<char> = term.chars().collect();
    if term_chars.len() < OBFUSCATION_MIN_LEN {
        return false;
    }
    let token_chars: Vec<char> = token.chars().collect();
    if token_chars.len() != term_chars.len() {
        return false;
    }
    token_chars.iter().zip(&term_chars).all(|(&got, &want)| {
        got == want || obfuscations_of(want).contains(&got)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_clean_text_is_not_flagged() {
        let matcher = KeywordMatcher::new();
        let result = matcher.detect("this is a nice day");
        assert!(!result.is_abusive);
        assert_eq!(result.confidence, KEYWORD_CLEAN_CONFIDENCE);
        assert!(result.detected_terms.is_empty());
    }

    #[test]
    fn test_english_term_flagged_with_fixed_confidence() {
        let matcher = KeywordMatcher::new();
        let result = matcher.detect("what the fuck");
        assert!(result.is_abusive);
        assert_eq!(result.confidence, KEYWORD_MATCH_CONFIDENCE);
        assert!(result.detected_terms.contains("fuck"));
    }

    #[test]
    fn test_hinglish_term_flagged() {
        let matcher = KeywordMatcher::new();
        let result = matcher.detect("tu chutiya hai");
        assert!(result.is_abusive);
        assert!(result.detected_terms.contains("chutiya"));
    }

    #[test]
    fn test_devanagari_term_flagged() {
        let matcher = KeywordMatcher::new();
        let result = matcher.detect("तू चूतिया है");
        assert!(result.is_abusive);
    }

    #[rstest]
    #[case::substring_of_class("first class results")]
    #[case::assess("we will assess the damage")]
    #[case::cocktail("a cocktail party")]
    fn test_word_boundary_no_partial_match(#[case] text: &str) {
        let matcher = KeywordMatcher::new();
        assert!(!matcher.detect(text).is_abusive, "false positive on: {text}");
    }

    #[test]
    fn test_leetspeak_normalized_before_matching() {
        let matcher = KeywordMatcher::new();
        assert!(matcher.detect("sh1t happens").is_abusive);
        assert!(matcher.detect("b1tch").is_abusive);
    }

    #[test]
    fn test_masking_characters_stripped() {
        let matcher = KeywordMatcher::new();
        // "f*ck" normalizes to "fck" which is not a term, but "fu*ck"
        // collapses to the exact term
        assert!(matcher.detect("fu*ck you").is_abusive);
    }

    #[test]
    fn test_obfuscated_spelling_caught_for_long_terms() {
        let matcher = KeywordMatcher::new();
        // '$' is not folded by the normalizer; only the obfuscation path
        // can catch it, and "bitch" is long enough to qualify
        assert!(matcher.detect("you b!tch").is_abusive);
        assert!(matcher.detect("a$$hole behaviour").is_abusive);
    }

    #[test]
    fn test_short_terms_never_use_obfuscation_path() {
        let matcher = KeywordMatcher::new();
        // "a$$" would tolerant-match "ass" but the term is too short
        assert!(!matcher.detect("a$$").is_abusive);
    }

    #[test]
    fn test_detect_is_idempotent() {
        let matcher = KeywordMatcher::new();
        let a = matcher.detect("tu chutiya hai");
        let b = matcher.detect("tu chutiya hai");
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        let matcher = KeywordMatcher::new();
        assert!(!matcher.detect("").is_abusive);
        assert!(!matcher.detect("   \t\n").is_abusive);
    }

    #[test]
    fn test_multiple_terms_all_reported() {
        let matcher = KeywordMatcher::new();
        let result = matcher.detect("shit man what the fuck");
        assert!(result.detected_terms.contains("shit"));
        assert!(result.detected_terms.contains("fuck"));
        assert_eq!(result.detected_terms.len(), 2);
    }

    #[test]
    fn test_custom_term_list() {
        let matcher = KeywordMatcher::with_terms(["Foobar"]);
        assert!(matcher.detect("total foobar").is_abusive);
        assert!(!matcher.detect("what the fuck").is_abusive);
    }

    #[test]
    fn test_minimal_matcher_covers_fallback_terms() {
        let matcher = KeywordMatcher::minimal();
        assert!(matcher.detect("madarchod").is_abusive);
        assert!(!matcher.detect("hello there").is_abusive);
    }

    #[test]
    fn test_phrase_term_matches_consecutive_tokens() {
        let matcher = KeywordMatcher::with_terms(["teri maa ki", "chutiya"]);
        assert!(matcher.has_phrase_terms());
        assert_eq!(matcher.max_phrase_words(), 3);

        let result = matcher.detect_phrases("teri maa ki");
        assert!(result.is_abusive);
        assert!(result.detected_terms.contains("teri maa ki"));
        assert!(!matcher.detect_phrases("teri ki maa").is_abusive);
    }

    #[test]
    fn test_detect_phrases_ignores_single_word_terms() {
        let matcher = KeywordMatcher::with_terms(["chutiya"]);
        assert!(!matcher.has_phrase_terms());
        assert_eq!(matcher.max_phrase_words(), 1);
        // "chutiya" would match detect(); the phrase scan must not flag
        // the surrounding clean words along with it.
        assert!(!matcher.detect_phrases("tu chutiya hai").is_abusive);
    }

    #[test]
    fn test_method_tag_is_keyword() {
        let matcher = KeywordMatcher::new();
        assert_eq!(matcher.detect("anything").method, DetectionMethod::Keyword);
    }
}
