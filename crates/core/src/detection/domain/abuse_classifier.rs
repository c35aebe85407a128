use thiserror::Error;

use super::detection_result::DetectionResult;

/// Raised when the transformer classifier cannot be built or has become
/// unusable. Non-fatal by policy: the pipeline catches it and downgrades
/// the job to keyword-only detection instead of failing.
#[derive(Error, Debug)]
pub enum ClassifierUnavailableError {
    #[error("classifier model artifact missing: {0}")]
    MissingArtifact(String),
    #[error("classifier runtime initialization failed: {0}")]
    Runtime(String),
    #[error("tokenizer load failed: {0}")]
    Tokenizer(String),
}

/// Domain interface for the transformer abuse classifier.
///
/// Implementations score a text span for abusive content with a graded
/// probability. Inference must be safe for concurrent use from multiple
/// jobs within one worker.
pub trait AbuseClassifier: Send + Sync {
    fn predict(&self, text: &str) -> Result<DetectionResult, ClassifierUnavailableError>;

    /// Batch inference. Callers should prefer this over per-word `predict`
    /// loops so model overhead amortizes across a whole transcript.
    fn predict_batch(
        &self,
        texts: &[&str],
    ) -> Result<Vec<DetectionResult>, ClassifierUnavailableError>;

    /// Adjust the abusive-probability cutoff at runtime. Implementations
    /// holding cached scores must drop them, since cached verdicts were
    /// derived against the old cutoff.
    fn set_threshold(&self, threshold: f32);
}
