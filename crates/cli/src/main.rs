use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use speechguard_core::censor::censor_plan::CensorMode;
use speechguard_core::detection::domain::abuse_classifier::AbuseClassifier;
use speechguard_core::detection::infrastructure::onnx_abuse_classifier::OnnxAbuseClassifier;
use speechguard_core::pipeline::censor_video_use_case::{CensorVideoUseCase, JobConfig};
use speechguard_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use speechguard_core::reconcile::ensemble::EnsembleMode;
use speechguard_core::shared::constants::{
    CLASSIFIER_MODEL_NAME, CLASSIFIER_MODEL_URL, CLASSIFIER_TOKENIZER_NAME,
    CLASSIFIER_TOKENIZER_URL, DEFAULT_CENSOR_PADDING, DEFAULT_MERGE_GAP,
    DEFAULT_PROFANITY_THRESHOLD,
};
use speechguard_core::shared::model_resolver;
use speechguard_core::transcription::domain::speech_recognizer::ModelSize;
use speechguard_core::transcription::infrastructure::whisper_recognizer::WhisperRecognizer;
use speechguard_core::video::infrastructure::ffmpeg_audio_reader::FfmpegAudioReader;
use speechguard_core::video::infrastructure::ffmpeg_audio_writer::FfmpegAudioWriter;
use speechguard_core::video::infrastructure::ffmpeg_video_cutter::FfmpegVideoCutter;

/// Profanity detection and word-level censoring for videos.
#[derive(Parser)]
#[command(name = "speechguard")]
struct Cli {
    /// Input video file.
    input: PathBuf,

    /// Output video file.
    output: PathBuf,

    /// Censor mode: beep, mute, or cut.
    #[arg(long, default_value = "beep")]
    mode: String,

    /// Ensemble policy: hybrid, keyword_only, transformer_first,
    /// keyword_first. Falls back to $SPEECHGUARD_ENSEMBLE, then hybrid.
    #[arg(long)]
    ensemble: Option<String>,

    /// Abuse probability the classifier must clear (0.0-1.0).
    /// Falls back to $SPEECHGUARD_THRESHOLD.
    #[arg(long)]
    threshold: Option<f32>,

    /// Whisper model size: tiny, base, small, medium, large.
    /// Hindi-heavy content transcribes noticeably better with medium+.
    #[arg(long, default_value = "base")]
    model_size: String,

    /// Transcription language hint (e.g. "hi"); auto-detect when unset.
    #[arg(long)]
    language: Option<String>,

    /// File with one custom profanity term per line; replaces the
    /// built-in list. Falls back to $SPEECHGUARD_KEYWORDS.
    #[arg(long)]
    keywords_file: Option<PathBuf>,

    /// Write the job manifest as JSON to this path ("-" for stdout).
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Seconds added on each side of a censored word.
    #[arg(long, default_value_t = DEFAULT_CENSOR_PADDING)]
    padding: f64,

    /// Merge intervals separated by less than this many seconds.
    #[arg(long, default_value_t = DEFAULT_MERGE_GAP)]
    merge_gap: f64,

    /// Abort the job after this many seconds.
    #[arg(long)]
    deadline_secs: Option<u64>,

    /// Directory containing model artifacts (checked before the download
    /// cache). Falls back to $SPEECHGUARD_MODEL_DIR.
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Skip the transformer classifier even when its artifacts resolve.
    #[arg(long)]
    no_classifier: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let mode: CensorMode = cli.mode.parse()?;
    let model_size: ModelSize = cli.model_size.parse()?;
    let ensemble: EnsembleMode = cli
        .ensemble
        .clone()
        .or_else(|| std::env::var("SPEECHGUARD_ENSEMBLE").ok())
        .as_deref()
        .unwrap_or("hybrid")
        .parse()?;
    let threshold = match cli.threshold {
        Some(t) => t,
        None => match std::env::var("SPEECHGUARD_THRESHOLD") {
            Ok(raw) => raw
                .parse::<f32>()
                .map_err(|_| format!("invalid SPEECHGUARD_THRESHOLD: {raw}"))?,
            Err(_) => DEFAULT_PROFANITY_THRESHOLD,
        },
    };
    if !(0.0..=1.0).contains(&threshold) {
        return Err(format!("Threshold must be between 0.0 and 1.0, got {threshold}").into());
    }

    let model_dir = cli
        .model_dir
        .clone()
        .or_else(|| std::env::var("SPEECHGUARD_MODEL_DIR").ok().map(PathBuf::from));

    let custom_terms = load_keywords(&cli)?;

    let classifier = if cli.no_classifier || ensemble == EnsembleMode::KeywordOnly {
        None
    } else {
        build_classifier(model_dir.clone(), threshold)
    };

    let recognizer = WhisperRecognizer::new(model_dir.clone(), cli.language.clone());

    let config = JobConfig {
        mode,
        model_size,
        ensemble,
        threshold,
        custom_terms,
        padding: cli.padding,
        gap_tolerance: cli.merge_gap,
        deadline: cli.deadline_secs.map(Duration::from_secs),
    };

    let use_case = CensorVideoUseCase::new(
        Box::new(FfmpegAudioReader),
        Box::new(FfmpegAudioWriter),
        Box::new(FfmpegVideoCutter),
        Box::new(recognizer),
        classifier,
    );

    let mut logger = StdoutPipelineLogger::default();
    let manifest = use_case
        .run(&cli.input, &cli.output, &config, &mut logger)
        .map_err(|e| format!("job failed ({}): {e}", e.code()))?;

    log::info!(
        "Censored {} intervals ({} mode) -> {}",
        manifest.offending_intervals_count,
        manifest.mode,
        cli.output.display()
    );
    if manifest.degraded {
        log::warn!("classifier was unavailable; detection ran on keywords only");
    }

    if let Some(manifest_path) = &cli.manifest {
        let json = serde_json::to_string_pretty(&manifest)?;
        if manifest_path.as_os_str() == "-" {
            println!("{json}");
        } else {
            std::fs::write(manifest_path, json)?;
            log::info!("Manifest written to {}", manifest_path.display());
        }
    }

    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if let Some(t) = cli.threshold {
        if !(0.0..=1.0).contains(&t) {
            return Err(format!("Threshold must be between 0.0 and 1.0, got {t}").into());
        }
    }
    if cli.padding < 0.0 {
        return Err(format!("Padding must be non-negative, got {}", cli.padding).into());
    }
    if cli.merge_gap < 0.0 {
        return Err(format!("Merge gap must be non-negative, got {}", cli.merge_gap).into());
    }
    Ok(())
}

/// Reads one term per line, skipping blanks and `#` comments.
fn load_keywords(cli: &Cli) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let path = match cli
        .keywords_file
        .clone()
        .or_else(|| std::env::var("SPEECHGUARD_KEYWORDS").ok().map(PathBuf::from))
    {
        Some(p) => p,
        None => return Ok(Vec::new()),
    };

    let contents = std::fs::read_to_string(&path)
        .map_err(|e| format!("could not read keywords file {}: {e}", path.display()))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
        .collect())
}

/// Resolves the ONNX model and tokenizer, then loads the classifier.
/// Any failure downgrades the run to keyword-only instead of aborting.
fn build_classifier(
    bundled_dir: Option<PathBuf>,
    threshold: f32,
) -> Option<Arc<dyn AbuseClassifier>> {
    let model_path = match model_resolver::resolve(
        CLASSIFIER_MODEL_NAME,
        CLASSIFIER_MODEL_URL,
        bundled_dir.as_deref(),
        Some(Box::new(download_progress)),
    ) {
        Ok(p) => p,
        Err(e) => {
            log::warn!("could not resolve classifier model: {e}");
            return None;
        }
    };
    let tokenizer_path = match model_resolver::resolve(
        CLASSIFIER_TOKENIZER_NAME,
        CLASSIFIER_TOKENIZER_URL,
        bundled_dir.as_deref(),
        Some(Box::new(download_progress)),
    ) {
        Ok(p) => p,
        Err(e) => {
            log::warn!("could not resolve classifier tokenizer: {e}");
            return None;
        }
    };
    eprintln!();

    match OnnxAbuseClassifier::new(&model_path, &tokenizer_path, threshold) {
        Ok(classifier) => Some(Arc::new(classifier)),
        Err(e) => {
            log::warn!("classifier unavailable ({e}); continuing keyword-only");
            None
        }
    }
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading classifier artifacts... {pct}%");
    } else {
        eprint!("\rDownloading classifier artifacts... {downloaded} bytes");
    }
}
