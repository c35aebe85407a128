use serde::Serialize;

use crate::censor::censor_plan::CensorMode;
use crate::localize::offending_interval::OffendingInterval;

/// One censored time range as reported back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ManifestInterval {
    pub start: f64,
    pub end: f64,
    pub confidence: f32,
    pub matched_term: String,
}

/// Summary of one completed censoring job, persisted and displayed by
/// the caller. When `degraded` is set the transformer classifier was
/// unavailable and detection ran on keywords alone.
#[derive(Debug, Clone, Serialize)]
pub struct JobManifest {
    pub segments_count: usize,
    pub offending_intervals_count: usize,
    pub intervals: Vec<ManifestInterval>,
    pub mode: String,
    pub degraded: bool,
}

impl JobManifest {
    pub fn new(
        segments_count: usize,
        intervals: &[OffendingInterval],
        mode: CensorMode,
        degraded: bool,
    ) -> Self {
        Self {
            segments_count,
            offending_intervals_count: intervals.len(),
            intervals: intervals
                .iter()
                .map(|i| ManifestInterval {
                    start: i.start,
                    end: i.end,
                    confidence: i.confidence,
                    matched_term: i.source_word.clone(),
                })
                .collect(),
            mode: mode.as_str().to_string(),
            degraded,
        }
    }
}
