use std::path::PathBuf;
use std::sync::Mutex;

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio::domain::audio_segment::AudioSegment;
use crate::shared::constants::WHISPER_MODEL_BASE_URL;
use crate::shared::model_resolver;
use crate::transcription::domain::speech_recognizer::{
    ModelSize, SpeechRecognizer, TranscriptionError,
};
use crate::transcription::domain::transcript::{TranscriptSegment, WordTiming};

/// Speech recognizer backed by whisper.cpp via whisper-rs.
///
/// The loaded model context is cached and reused until a call asks for a
/// different size, so repeated jobs on one worker don't pay the load cost.
pub struct WhisperRecognizer {
    model_dir: Option<PathBuf>,
    language: Option<String>,
    context: Mutex<Option<(ModelSize, WhisperContext)>>,
}

impl WhisperRecognizer {
    /// `model_dir` is checked for bundled ggml files before the resolver
    /// falls back to its cache/download chain. `language` is an ISO 639-1
    /// hint; `None` lets whisper auto-detect.
    pub fn new(model_dir: Option<PathBuf>, language: Option<String>) -> Self {
        Self {
            model_dir,
            language,
            context: Mutex::new(None),
        }
    }

    fn resolve_model(&self, size: ModelSize) -> Result<PathBuf, TranscriptionError> {
        let file = size.model_file();
        let url = format!("{WHISPER_MODEL_BASE_URL}/{file}");
        model_resolver::resolve(file, &url, self.model_dir.as_deref(), None).map_err(|e| {
            TranscriptionError::ModelLoad {
                model: file.to_string(),
                message: e.to_string(),
            }
        })
    }

    fn load_context(&self, size: ModelSize) -> Result<WhisperContext, TranscriptionError> {
        let path = self.resolve_model(size)?;
        let path_str = path.to_str().ok_or_else(|| TranscriptionError::ModelLoad {
            model: size.model_file().to_string(),
            message: "model path is not valid UTF-8".to_string(),
        })?;
        WhisperContext::new_with_params(path_str, WhisperContextParameters::default()).map_err(
            |e| TranscriptionError::ModelLoad {
                model: size.model_file().to_string(),
                message: e.to_string(),
            },
        )
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn transcribe(
        &self,
        audio: &AudioSegment,
        model_size: ModelSize,
    ) -> Result<Vec<TranscriptSegment>, TranscriptionError> {
        if audio.samples().is_empty() {
            return Err(TranscriptionError::UnreadableAudio(
                "empty sample buffer".to_string(),
            ));
        }

        let mut cached = self
            .context
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match *cached {
            Some((size, _)) if size == model_size => {}
            _ => {
                log::info!("Loading whisper model {}", model_size.model_file());
                *cached = Some((model_size, self.load_context(model_size)?));
            }
        }
        let ctx = &cached.as_ref().unwrap().1;

        let mut state = ctx
            .create_state()
            .map_err(|e| TranscriptionError::Inference(format!("state creation failed: {e}")))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 0 });
        params.set_language(self.language.as_deref());
        params.set_translate(false);
        params.set_token_timestamps(true);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_n_threads(num_cpus().min(4) as i32);

        state
            .full(params, audio.samples())
            .map_err(|e| TranscriptionError::Inference(e.to_string()))?;

        let mut segments = Vec::new();
        let num_segments = state.full_n_segments();

        for seg_idx in 0..num_segments {
            let segment = match state.get_segment(seg_idx) {
                Some(s) => s,
                None => continue,
            };

            // Segment timestamps are in centiseconds (10ms units)
            let seg_start = segment.start_timestamp() as f64 / 100.0;
            let seg_end = segment.end_timestamp() as f64 / 100.0;
            let text = segment.to_str().map(|t| t.trim().to_string()).unwrap_or_default();
            if text.is_empty() || seg_end <= seg_start {
                continue;
            }

            let words = collect_words(&segment);
            segments.push(TranscriptSegment {
                text,
                start: seg_start,
                end: seg_end,
                words,
            });
        }

        Ok(segments)
    }
}

/// Group whisper's sub-word tokens into whole words with timings.
///
/// A token whose text begins with whitespace starts a new word; other
/// tokens extend the current one. Special tokens and tokens with invalid
/// timestamps are dropped, which can leave a segment with an empty word
/// list — downstream code handles that case.
fn collect_words(segment: &whisper_rs::WhisperSegment) -> Vec<WordTiming> {
    let mut words: Vec<WordTiming> = Vec::new();
    let mut current: Option<WordTiming> = None;

    for tok_idx in 0..segment.n_tokens() {
        let token = match segment.get_token(tok_idx) {
            Some(t) => t,
            None => continue,
        };
        let text = match token.to_str() {
            Ok(t) => t,
            Err(_) => continue,
        };
        // Special tokens look like [_BEG_] or <|endoftext|>
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.starts_with('[') || trimmed.starts_with('<') {
            continue;
        }

        let data = token.token_data();
        let start = data.t0 as f64 / 100.0;
        let end = data.t1 as f64 / 100.0;
        if end <= start {
            continue;
        }

        let starts_new_word = text.starts_with(char::is_whitespace) || current.is_none();
        if starts_new_word {
            if let Some(word) = current.take() {
                words.push(word);
            }
            current = Some(WordTiming {
                word: trimmed.to_string(),
                start,
                end,
            });
        } else if let Some(ref mut word) = current {
            word.word.push_str(trimmed);
            word.end = end;
        }
    }

    if let Some(word) = current {
        words.push(word);
    }
    words
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
