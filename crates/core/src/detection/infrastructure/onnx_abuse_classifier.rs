use std::path::Path;
use std::sync::Mutex;

use ndarray::Array2;
use tokenizers::Tokenizer;

use crate::detection::domain::abuse_classifier::{AbuseClassifier, ClassifierUnavailableError};
use crate::detection::domain::detection_result::{DetectionMethod, DetectionResult};
use crate::detection::domain::text_normalizer::normalize;
use crate::shared::constants::SCORE_CACHE_CAPACITY;

use super::score_cache::ScoreCache;

/// Token budget per span. Detection units are single words or short
/// windows, so this is generous.
const MAX_SEQUENCE_LEN: usize = 64;

/// Logit index of the abusive class in the fine-tuned head.
const ABUSIVE_CLASS: usize = 1;

/// Transformer abuse classifier backed by an ONNX Runtime session and a
/// HuggingFace tokenizer.
///
/// Scores are cached per normalized text span; the mutex-guarded session
/// and cache make one instance shareable across concurrently processed
/// jobs within a worker.
pub struct OnnxAbuseClassifier {
    session: Mutex<ort::session::Session>,
    tokenizer: Tokenizer,
    threshold: Mutex<f32>,
    cache: Mutex<ScoreCache>,
}

impl OnnxAbuseClassifier {
    pub fn new(
        model_path: &Path,
        tokenizer_path: &Path,
        threshold: f32,
    ) -> Result<Self, ClassifierUnavailableError> {
        if !model_path.exists() {
            return Err(ClassifierUnavailableError::MissingArtifact(
                model_path.display().to_string(),
            ));
        }
        if !tokenizer_path.exists() {
            return Err(ClassifierUnavailableError::MissingArtifact(
                tokenizer_path.display().to_string(),
            ));
        }

        let session = ort::session::Session::builder()
            .and_then(|mut b| b.commit_from_file(model_path))
            .map_err(|e| ClassifierUnavailableError::Runtime(e.to_string()))?;

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| ClassifierUnavailableError::Tokenizer(e.to_string()))?;

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            threshold: Mutex::new(threshold),
            cache: Mutex::new(ScoreCache::new(SCORE_CACHE_CAPACITY)),
        })
    }

    /// Run the model over spans that missed the cache, returning one
    /// abusive probability per input.
    fn infer(&self, texts: &[&str]) -> Result<Vec<f32>, ClassifierUnavailableError> {
        let encodings: Vec<_> = texts
            .iter()
            .map(|t| self.tokenizer.encode(*t, true))
            .collect::<Result<_, _>>()
            .map_err(|e| ClassifierUnavailableError::Tokenizer(e.to_string()))?;

        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(1)
            .clamp(1, MAX_SEQUENCE_LEN);

        let batch = encodings.len();
        let mut input_ids = Array2::<i64>::zeros((batch, seq_len));
        let mut attention_mask = Array2::<i64>::zeros((batch, seq_len));
        for (row, enc) in encodings.iter().enumerate() {
            for (col, &id) in enc.get_ids().iter().take(seq_len).enumerate() {
                input_ids[[row, col]] = id as i64;
                attention_mask[[row, col]] = 1;
            }
        }

        let ids_value = ort::value::Tensor::from_array(input_ids)
            .map_err(|e| ClassifierUnavailableError::Runtime(e.to_string()))?;
        let mask_value = ort::value::Tensor::from_array(attention_mask)
            .map_err(|e| ClassifierUnavailableError::Runtime(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let outputs = session
            .run(ort::inputs![
                "input_ids" => ids_value,
                "attention_mask" => mask_value,
            ])
            .map_err(|e| ClassifierUnavailableError::Runtime(e.to_string()))?;

        let logits = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| ClassifierUnavailableError::Runtime(e.to_string()))?;
        let shape = logits.shape();
        if shape.len() != 2 || shape[0] != batch || shape[1] < 2 {
            return Err(ClassifierUnavailableError::Runtime(format!(
                "unexpected classifier output shape: {shape:?}"
            )));
        }

        let data = logits
            .as_slice()
            .ok_or_else(|| ClassifierUnavailableError::Runtime("non-contiguous logits".into()))?;
        let classes = shape[1];
        Ok((0..batch)
            .map(|i| abusive_probability(&data[i * classes..(i + 1) * classes]))
            .collect())
    }
}

impl AbuseClassifier for OnnxAbuseClassifier {
    fn predict(&self, text: &str) -> Result<DetectionResult, ClassifierUnavailableError> {
        Ok(self.predict_batch(&[text])?.remove(0))
    }

    fn predict_batch(
        &self,
        texts: &[&str],
    ) -> Result<Vec<DetectionResult>, ClassifierUnavailableError> {
        let normalized: Vec<String> = texts.iter().map(|t| normalize(t)).collect();

        let mut probs: Vec<Option<f32>> = Vec::with_capacity(normalized.len());
        {
            let mut cache = self
                .cache
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            for text in &normalized {
                probs.push(cache.get(text));
            }
        }

        let miss_indices: Vec<usize> = probs
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_none())
            .map(|(i, _)| i)
            .collect();

        if !miss_indices.is_empty() {
            let miss_texts: Vec<&str> = miss_indices.iter().map(|&i| normalized[i].as_str()).collect();
            let scores = self.infer(&miss_texts)?;
            let mut cache = self
                .cache
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            for (&idx, &score) in miss_indices.iter().zip(&scores) {
                cache.insert(normalized[idx].clone(), score);
                probs[idx] = Some(score);
            }
        }

        let threshold = *self
            .threshold
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(probs
            .into_iter()
            .map(|p| verdict_from_probability(p.unwrap_or(0.0), threshold))
            .collect())
    }

    fn set_threshold(&self, threshold: f32) {
        let mut current = self
            .threshold
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if (*current - threshold).abs() > f32::EPSILON {
            *current = threshold;
            // Cached scores were raw, but verdicts handed out under the old
            // cutoff may still be in flight; drop everything to keep the
            // cache's contents trivially consistent with the new cutoff.
            self.cache
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clear();
        }
    }
}

/// Softmax over the class logits, returning the abusive-class probability.
fn abusive_probability(logits: &[f32]) -> f32 {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps[ABUSIVE_CLASS] / sum
}

/// Derive the detector verdict from a raw abusive probability.
///
/// Abusive only when the abusive class wins the softmax AND its probability
/// clears the configured cutoff. Confidence is the probability of whichever
/// label was predicted, so clean spans report high confidence too.
fn verdict_from_probability(prob: f32, threshold: f32) -> DetectionResult {
    let label_abusive = prob >= 0.5;
    let is_abusive = label_abusive && prob >= threshold;
    DetectionResult {
        is_abusive,
        confidence: if label_abusive { prob } else { 1.0 - prob },
        detected_terms: Default::default(),
        method: DetectionMethod::Transformer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_missing_model_artifact_is_unavailable() {
        let result = OnnxAbuseClassifier::new(
            Path::new("/nonexistent/model.onnx"),
            Path::new("/nonexistent/tokenizer.json"),
            0.75,
        );
        assert!(matches!(
            result,
            Err(ClassifierUnavailableError::MissingArtifact(_))
        ));
    }

    #[test]
    fn test_abusive_probability_sums_with_complement() {
        let p = abusive_probability(&[1.0, 3.0]);
        let q = abusive_probability(&[3.0, 1.0]);
        assert_relative_eq!(p + q, 1.0, epsilon = 1e-6);
        assert!(p > 0.5);
        assert!(q < 0.5);
    }

    #[test]
    fn test_abusive_probability_stable_for_large_logits() {
        let p = abusive_probability(&[500.0, 520.0]);
        assert!(p.is_finite());
        assert!(p > 0.99);
    }

    #[rstest]
    #[case::clear_abuse(0.95, 0.75, true)]
    #[case::below_threshold(0.6, 0.75, false)]
    #[case::clean(0.1, 0.75, false)]
    #[case::exactly_at_threshold(0.75, 0.75, true)]
    fn test_verdict_thresholding(
        #[case] prob: f32,
        #[case] threshold: f32,
        #[case] expected: bool,
    ) {
        assert_eq!(verdict_from_probability(prob, threshold).is_abusive, expected);
    }

    #[test]
    fn test_verdict_confidence_reflects_predicted_label() {
        let abusive = verdict_from_probability(0.9, 0.75);
        assert_relative_eq!(abusive.confidence, 0.9);

        let clean = verdict_from_probability(0.1, 0.75);
        assert_relative_eq!(clean.confidence, 0.9);
        assert!(!clean.is_abusive);
    }

    #[test]
    fn test_verdict_has_no_term_evidence() {
        let v = verdict_from_probability(0.9, 0.75);
        assert!(v.detected_terms.is_empty());
        assert_eq!(v.method, DetectionMethod::Transformer);
    }
}
