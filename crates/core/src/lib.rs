//! Hybrid profanity detection and word-level media censoring.
//!
//! The pipeline extracts a video's audio track, transcribes it with
//! word-level timestamps, runs every token through a keyword matcher
//! and an optional transformer classifier, reconciles the two verdicts,
//! projects abusive words onto time intervals, and rewrites the media
//! with those intervals beeped, muted, or cut out.

pub mod audio;
pub mod censor;
pub mod detection;
pub mod localize;
pub mod pipeline;
pub mod reconcile;
pub mod shared;
pub mod transcription;
pub mod video;
