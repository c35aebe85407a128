use thiserror::Error;

use crate::localize::offending_interval::OffendingInterval;

/// Overlapping or out-of-order intervals reaching the censor stage mean an
/// upstream bug (the localizer's merge guarantees ordering). Treated as
/// fatal rather than silently reordered.
#[derive(Error, Debug)]
pub enum InvalidPlanError {
    #[error("interval {index} is out of order: starts at {start:.3}s before previous end {previous_end:.3}s")]
    OutOfOrder {
        index: usize,
        start: f64,
        previous_end: f64,
    },
    #[error("interval {index} is degenerate: start {start:.3}s >= end {end:.3}s")]
    Degenerate { index: usize, start: f64, end: f64 },
    #[error("interval {index} has negative start {start:.3}s")]
    NegativeStart { index: usize, start: f64 },
}

/// The transformation applied to each offending interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CensorMode {
    /// Replace interval audio with a fixed tone; duration preserved.
    Beep,
    /// Replace interval audio with silence; duration preserved.
    Mute,
    /// Remove the interval from both tracks; duration shrinks.
    Cut,
}

impl CensorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CensorMode::Beep => "beep",
            CensorMode::Mute => "mute",
            CensorMode::Cut => "cut",
        }
    }
}

impl std::str::FromStr for CensorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "beep" => Ok(CensorMode::Beep),
            "mute" => Ok(CensorMode::Mute),
            "cut" => Ok(CensorMode::Cut),
            other => Err(format!("unknown censor mode: {other}")),
        }
    }
}

/// Validated set of intervals plus the mode to apply to them.
///
/// Built once per job and consumed exactly once by the media censor, which
/// may assume the intervals are strictly ordered and non-overlapping.
#[derive(Debug, Clone)]
pub struct CensorPlan {
    mode: CensorMode,
    intervals: Vec<OffendingInterval>,
}

impl CensorPlan {
    pub fn new(
        mode: CensorMode,
        intervals: Vec<OffendingInterval>,
    ) -> Result<Self, InvalidPlanError> {
        let mut previous_end = 0.0f64;
        for (index, interval) in intervals.iter().enumerate() {
            if interval.start < 0.0 {
                return Err(InvalidPlanError::NegativeStart {
                    index,
                    start: interval.start,
                });
            }
            if interval.end <= interval.start {
                return Err(InvalidPlanError::Degenerate {
                    index,
                    start: interval.start,
                    end: interval.end,
                });
            }
            if index > 0 && interval.start < previous_end {
                return Err(InvalidPlanError::OutOfOrder {
                    index,
                    start: interval.start,
                    previous_end,
                });
            }
            previous_end = interval.end;
        }
        Ok(Self { mode, intervals })
    }

    pub fn mode(&self) -> CensorMode {
        self.mode
    }

    pub fn intervals(&self) -> &[OffendingInterval] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Total seconds covered by all intervals.
    pub fn censored_duration(&self) -> f64 {
        self.intervals.iter().map(|i| i.duration()).sum()
    }
}
