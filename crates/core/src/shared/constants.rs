/// Whisper ggml model files, one per supported size.
pub const WHISPER_MODEL_BASE_URL: &str =
    "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

pub const CLASSIFIER_MODEL_NAME: &str = "abuse-classifier.onnx";
pub const CLASSIFIER_MODEL_URL: &str =
    "https://github.com/speechguard/speechguard/releases/download/v0.1.0/abuse-classifier.onnx";

pub const CLASSIFIER_TOKENIZER_NAME: &str = "abuse-tokenizer.json";
pub const CLASSIFIER_TOKENIZER_URL: &str =
    "https://github.com/speechguard/speechguard/releases/download/v0.1.0/abuse-tokenizer.json";

/// All audio is decoded to mono at this rate before transcription.
pub const WHISPER_SAMPLE_RATE: u32 = 16000;

/// Default cutoff applied to the classifier's abusive probability.
pub const DEFAULT_PROFANITY_THRESHOLD: f32 = 0.75;

/// Fixed confidence the keyword matcher reports when it finds a match.
/// The keyword method is not calibrated; callers must not read this as a
/// probability.
pub const KEYWORD_MATCH_CONFIDENCE: f32 = 0.9;

/// Fixed confidence the keyword matcher reports for a clean span.
pub const KEYWORD_CLEAN_CONFIDENCE: f32 = 0.1;

/// Seconds added on each side of a censored word before merging.
pub const DEFAULT_CENSOR_PADDING: f64 = 0.05;

/// Beep tone parameters.
pub const DEFAULT_BEEP_FREQUENCY: f64 = 1000.0;
pub const BEEP_AMPLITUDE: f32 = 0.3;

/// Intervals closer than this many seconds are merged into one.
pub const DEFAULT_MERGE_GAP: f64 = 0.0;

/// Bounded size of the classifier's normalized-text score cache.
pub const SCORE_CACHE_CAPACITY: usize = 4096;
