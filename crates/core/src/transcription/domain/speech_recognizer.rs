use thiserror::Error;

use super::transcript::TranscriptSegment;
use crate::audio::domain::audio_segment::AudioSegment;

#[derive(Error, Debug)]
pub enum TranscriptionError {
    #[error("audio unusable for transcription: {0}")]
    UnreadableAudio(String),
    #[error("failed to load speech model {model}: {message}")]
    ModelLoad { model: String, message: String },
    #[error("speech inference failed: {0}")]
    Inference(String),
}

/// Whisper model size the caller selects per job.
///
/// Which size to use is caller policy (detected language, subscription
/// tier); the recognizer only maps the size onto a model artifact. Hindi
/// content should prefer `Medium` or larger for usable word timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSize {
    Tiny,
    Base,
    Small,
    Medium,
    Large,
}

impl ModelSize {
    /// ggml artifact file name for this size.
    pub fn model_file(&self) -> &'static str {
        match self {
            ModelSize::Tiny => "ggml-tiny.bin",
            ModelSize::Base => "ggml-base.bin",
            ModelSize::Small => "ggml-small.bin",
            ModelSize::Medium => "ggml-medium.bin",
            ModelSize::Large => "ggml-large-v3.bin",
        }
    }

    /// The next smaller size, for retry-on-load-failure policies.
    pub fn smaller(&self) -> Option<ModelSize> {
        match self {
            ModelSize::Tiny => None,
            ModelSize::Base => Some(ModelSize::Tiny),
            ModelSize::Small => Some(ModelSize::Base),
            ModelSize::Medium => Some(ModelSize::Small),
            ModelSize::Large => Some(ModelSize::Medium),
        }
    }
}

impl std::str::FromStr for ModelSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tiny" => Ok(ModelSize::Tiny),
            "base" => Ok(ModelSize::Base),
            "small" => Ok(ModelSize::Small),
            "medium" => Ok(ModelSize::Medium),
            "large" => Ok(ModelSize::Large),
            other => Err(format!("unknown model size: {other}")),
        }
    }
}

/// Domain interface for speech-to-text transcription.
///
/// Implementations produce time-stamped segments with word-level timings
/// where the model provides them. Loading a model into memory is the only
/// permitted side effect and should be cached across calls.
pub trait SpeechRecognizer: Send {
    fn transcribe(
        &self,
        audio: &AudioSegment,
        model_size: ModelSize,
    ) -> Result<Vec<TranscriptSegment>, TranscriptionError>;
}
