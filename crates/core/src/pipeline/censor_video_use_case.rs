use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::censor::audio_censor::AudioCensor;
use crate::censor::censor_plan::{CensorMode, CensorPlan, InvalidPlanError};
use crate::detection::domain::abuse_classifier::AbuseClassifier;
use crate::detection::domain::detection_result::DetectionResult;
use crate::detection::domain::keyword_matcher::KeywordMatcher;
use crate::detection::domain::text_normalizer::strip_token;
use crate::localize::offending_interval::merge_intervals;
use crate::localize::segment_localizer::SegmentLocalizer;
use crate::reconcile::ensemble::{EnsembleMode, HybridReconciler};
use crate::shared::constants::{
    DEFAULT_CENSOR_PADDING, DEFAULT_MERGE_GAP, DEFAULT_PROFANITY_THRESHOLD, WHISPER_SAMPLE_RATE,
};
use crate::transcription::domain::speech_recognizer::{
    ModelSize, SpeechRecognizer, TranscriptionError,
};
use crate::transcription::domain::transcript::TranscriptSegment;
use crate::video::domain::audio_reader::AudioReader;
use crate::video::domain::audio_writer::AudioWriter;
use crate::video::domain::media_error::MediaProcessingError;
use crate::video::domain::video_cutter::VideoCutter;

use super::manifest::JobManifest;
use super::pipeline_logger::PipelineLogger;

/// Everything a single censoring job needs to know. The caller builds
/// this from its own configuration sources; the core treats the values
/// as opaque.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub mode: CensorMode,
    pub model_size: ModelSize,
    pub ensemble: EnsembleMode,
    /// Cutoff the transformer classifier must clear to flag a span.
    pub threshold: f32,
    /// Replaces the built-in multilingual term list when non-empty.
    pub custom_terms: Vec<String>,
    /// Seconds added on each side of an offending word.
    pub padding: f64,
    /// Intervals closer than this merge into one.
    pub gap_tolerance: f64,
    /// Wall-clock budget for the whole job, checked between stages.
    pub deadline: Option<Duration>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            mode: CensorMode::Beep,
            model_size: ModelSize::Base,
            ensemble: EnsembleMode::Hybrid,
            threshold: DEFAULT_PROFANITY_THRESHOLD,
            custom_terms: Vec::new(),
            padding: DEFAULT_CENSOR_PADDING,
            gap_tolerance: DEFAULT_MERGE_GAP,
            deadline: None,
        }
    }
}

/// Job-level error. Every variant carries a stable code for callers
/// that persist job status.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Transcription(#[from] TranscriptionError),
    #[error(transparent)]
    Media(#[from] MediaProcessingError),
    #[error(transparent)]
    InvalidPlan(#[from] InvalidPlanError),
    #[error("job deadline exceeded before the {stage} stage")]
    DeadlineExceeded { stage: &'static str },
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

impl JobError {
    pub fn code(&self) -> &'static str {
        match self {
            JobError::Transcription(_) => "transcription_error",
            JobError::Media(_) => "media_error",
            JobError::InvalidPlan(_) => "invalid_plan",
            JobError::DeadlineExceeded { .. } => "deadline_exceeded",
            JobError::Io(_) => "io_error",
        }
    }
}

/// Ordered detection tiers: the transformer classifier on top when
/// available, the configured keyword list beneath it, and the minimal
/// hardcoded list as last resort. A job never runs with zero detectors.
pub struct DetectorStack {
    classifier: Option<Arc<dyn AbuseClassifier>>,
    keywords: KeywordMatcher,
    degraded: bool,
}

impl DetectorStack {
    pub fn build(
        classifier: Option<Arc<dyn AbuseClassifier>>,
        custom_terms: &[String],
        ensemble: EnsembleMode,
    ) -> Self {
        let keywords = if custom_terms.is_empty() {
            KeywordMatcher::new()
        } else {
            let cleaned: Vec<String> = custom_terms
                .iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            if cleaned.is_empty() {
                log::warn!("configured keyword list is empty; using minimal fallback terms");
                KeywordMatcher::minimal()
            } else {
                KeywordMatcher::with_terms(cleaned)
            }
        };

        // A missing classifier only counts as degradation when the caller
        // expected one; keyword_only mode never uses it.
        let degraded = classifier.is_none() && ensemble != EnsembleMode::KeywordOnly;

        Self {
            classifier,
            keywords,
            degraded,
        }
    }

    pub fn keywords(&self) -> &KeywordMatcher {
        &self.keywords
    }

    pub fn degraded(&self) -> bool {
        self.degraded
    }

    /// Batch-score `texts` with the transformer tier. A runtime failure
    /// drops the tier and downgrades the job to keyword-only instead of
    /// failing it.
    pub fn transformer_scores(
        &mut self,
        texts: &[&str],
        threshold: f32,
    ) -> Option<Vec<DetectionResult>> {
        let classifier = self.classifier.as_ref()?;
        classifier.set_threshold(threshold);
        match classifier.predict_batch(texts) {
            Ok(results) => Some(results),
            Err(e) => {
                log::warn!("transformer classifier unavailable ({e}); continuing keyword-only");
                self.degraded = true;
                None
            }
        }
    }
}

/// Orchestrates one censoring job: extract audio, transcribe, detect,
/// localize, then rewrite the media. Infrastructure comes in through
/// the domain traits so tests can run the whole pipeline on stubs.
pub struct CensorVideoUseCase {
    audio_reader: Box<dyn AudioReader>,
    audio_writer: Box<dyn AudioWriter>,
    video_cutter: Box<dyn VideoCutter>,
    recognizer: Box<dyn SpeechRecognizer>,
    classifier: Option<Arc<dyn AbuseClassifier>>,
}

impl CensorVideoUseCase {
    pub fn new(
        audio_reader: Box<dyn AudioReader>,
        audio_writer: Box<dyn AudioWriter>,
        video_cutter: Box<dyn VideoCutter>,
        recognizer: Box<dyn SpeechRecognizer>,
        classifier: Option<Arc<dyn AbuseClassifier>>,
    ) -> Self {
        Self {
            audio_reader,
            audio_writer,
            video_cutter,
            recognizer,
            classifier,
        }
    }

    /// Runs the full pipeline, writing the censored media to
    /// `output_path`. Partial output is removed on any failure.
    pub fn run(
        &self,
        input_path: &Path,
        output_path: &Path,
        config: &JobConfig,
        logger: &mut dyn PipelineLogger,
    ) -> Result<JobManifest, JobError> {
        let result = self.run_inner(input_path, output_path, config, logger);
        if result.is_err() {
            cleanup_partial_output(output_path);
        }
        result
    }

    fn run_inner(
        &self,
        input_path: &Path,
        output_path: &Path,
        config: &JobConfig,
        logger: &mut dyn PipelineLogger,
    ) -> Result<JobManifest, JobError> {
        let started = Instant::now();
        let check_deadline = |stage: &'static str| match config.deadline {
            Some(limit) if started.elapsed() > limit => Err(JobError::DeadlineExceeded { stage }),
            _ => Ok(()),
        };

        check_deadline("transcribe")?;

        // 1. Extract the audio track. No audio means nothing to censor.
        let stage_start = Instant::now();
        let Some(mut audio) = self
            .audio_reader
            .read_audio(input_path, WHISPER_SAMPLE_RATE)?
        else {
            logger.info("no audio track; copying input through unchanged");
            std::fs::copy(input_path, output_path)?;
            return Ok(JobManifest::new(0, &[], config.mode, false));
        };

        // 2. Transcribe to word-timed segments.
        let segments = self.recognizer.transcribe(&audio, config.model_size)?;
        logger.timing("transcribe", stage_start.elapsed().as_secs_f64() * 1000.0);
        logger.info(&format!("transcribed {} segments", segments.len()));

        check_deadline("detect")?;

        // 3. Score every distinct token once, batched, then reconcile.
        let stage_start = Instant::now();
        let mut stack =
            DetectorStack::build(self.classifier.clone(), &config.custom_terms, config.ensemble);
        let tokens = collect_tokens(&segments, logger);
        let token_refs: Vec<&str> = tokens.iter().map(String::as_str).collect();

        let transformer_map: Option<HashMap<&str, DetectionResult>> = stack
            .transformer_scores(&token_refs, config.threshold)
            .map(|results| token_refs.iter().copied().zip(results).collect());

        let reconciler = HybridReconciler::new(config.ensemble, config.threshold);
        logger.timing("detect", stage_start.elapsed().as_secs_f64() * 1000.0);

        check_deadline("localize")?;

        // 4. Project verdicts onto time intervals.
        let stage_start = Instant::now();
        let localizer = SegmentLocalizer::new(config.padding, config.gap_tolerance);
        let mut intervals = localizer.localize(&segments, |token| {
            let keyword = stack.keywords().detect(token);
            let transformer = transformer_map.as_ref().and_then(|m| m.get(token));
            reconciler.reconcile(transformer, &keyword)
        });

        // Multi-word terms only match across consecutive words, so they get
        // their own windowed pass. The transformer scores single tokens and
        // has nothing to say about a window.
        if stack.keywords().has_phrase_terms() {
            let phrase_intervals = localizer.localize_phrases(
                &segments,
                stack.keywords().max_phrase_words(),
                |text| reconciler.reconcile(None, &stack.keywords().detect_phrases(text)),
            );
            if !phrase_intervals.is_empty() {
                intervals.extend(phrase_intervals);
                intervals = merge_intervals(intervals, config.gap_tolerance);
            }
        }
        logger.timing("localize", stage_start.elapsed().as_secs_f64() * 1000.0);
        logger.metric("offending_intervals", intervals.len() as f64);

        let plan = CensorPlan::new(config.mode, intervals.clone())?;

        check_deadline("censor")?;

        // 5. Rewrite the media.
        let stage_start = Instant::now();
        if plan.is_empty() {
            std::fs::copy(input_path, output_path)?;
        } else {
            match plan.mode() {
                CensorMode::Beep | CensorMode::Mute => {
                    // Video untouched; only the audio track is rewritten.
                    std::fs::copy(input_path, output_path)?;
                    AudioCensor::apply(&mut audio, &plan);
                    self.audio_writer.write_audio(output_path, &audio)?;
                }
                CensorMode::Cut => {
                    let ranges: Vec<(f64, f64)> =
                        plan.intervals().iter().map(|i| (i.start, i.end)).collect();
                    self.video_cutter
                        .cut_video(input_path, output_path, &ranges)?;
                    audio.remove_ranges(&ranges);
                    self.audio_writer.write_audio(output_path, &audio)?;
                }
            }
        }
        logger.timing("censor", stage_start.elapsed().as_secs_f64() * 1000.0);
        logger.summary();

        Ok(JobManifest::new(
            segments.len(),
            plan.intervals(),
            config.mode,
            stack.degraded(),
        ))
    }
}

/// Collects the distinct stripped tokens across all segments, in first
/// encounter order, so the classifier scores each one exactly once.
fn collect_tokens(segments: &[TranscriptSegment], logger: &mut dyn PipelineLogger) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut tokens = Vec::new();
    let total = segments.len();

    for (i, segment) in segments.iter().enumerate() {
        let raw_tokens: Vec<&str> = if segment.has_word_timestamps() {
            segment.words.iter().map(|w| w.word.as_str()).collect()
        } else {
            segment.text.split_whitespace().collect()
        };
        for raw in raw_tokens {
            let token = strip_token(raw);
            if !token.is_empty() && seen.insert(token.to_string()) {
                tokens.push(token.to_string());
            }
        }
        logger.progress(i + 1, total);
    }
    tokens
}

fn cleanup_partial_output(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            log::warn!("failed to remove partial output {}: {e}", path.display());
        }
    }
}
