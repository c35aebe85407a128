use crate::audio::domain::audio_segment::AudioSegment;
use crate::shared::constants::{BEEP_AMPLITUDE, DEFAULT_BEEP_FREQUENCY};

use super::censor_plan::{CensorMode, CensorPlan};

/// Rewrites plan intervals inside a decoded audio buffer.
///
/// Beep and mute overwrite samples in place; cut removes the sample ranges
/// entirely, shrinking the buffer. Samples outside the intervals are never
/// touched.
pub struct AudioCensor;

impl AudioCensor {
    pub fn apply(audio: &mut AudioSegment, plan: &CensorPlan) {
        match plan.mode() {
            CensorMode::Beep => Self::overwrite(audio, plan, Fill::Tone(DEFAULT_BEEP_FREQUENCY)),
            CensorMode::Mute => Self::overwrite(audio, plan, Fill::Silence),
            CensorMode::Cut => {
                let ranges: Vec<(f64, f64)> =
                    plan.intervals().iter().map(|i| (i.start, i.end)).collect();
                audio.remove_ranges(&ranges);
            }
        }
    }

    fn overwrite(audio: &mut AudioSegment, plan: &CensorPlan, fill: Fill) {
        let sample_rate = audio.sample_rate() as f64;
        let channels = audio.channels() as usize;

        for interval in plan.intervals() {
            let start = audio.sample_index_at_time(interval.start);
            let end = audio
                .sample_index_at_time(interval.end)
                .min(audio.samples().len());
            if start >= end {
                continue;
            }

            let samples = &mut audio.samples_mut()[start..end];
            match fill {
                Fill::Tone(frequency) => {
                    for (offset, sample) in samples.iter_mut().enumerate() {
                        let t = offset as f64 / (sample_rate * channels as f64);
                        *sample =
                            (2.0 * std::f64::consts::PI * frequency * t).sin() as f32 * BEEP_AMPLITUDE;
                    }
                }
                Fill::Silence => {
                    for sample in samples.iter_mut() {
                        *sample = 0.0;
                    }
                }
            }
        }
    }
}

enum Fill {
    Tone(f64),
    Silence,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::localize::offending_interval::OffendingInterval;
    use approx::assert_relative_eq;

    fn plan(mode: CensorMode, ranges: &[(f64, f64)]) -> CensorPlan {
        let intervals = ranges
            .iter()
            .map(|&(start, end)| OffendingInterval {
                start,
                end,
                source_word: "x".to_string(),
                confidence: 0.9,
            })
            .collect();
        CensorPlan::new(mode, intervals).unwrap()
    }

    fn constant_audio(duration_secs: f64, value: f32) -> AudioSegment {
        let len = (duration_secs * 16000.0) as usize;
        AudioSegment::new(vec![value; len], 16000, 1)
    }

    fn energy(samples: &[f32]) -> f64 {
        samples.iter().map(|s| (*s as f64).powi(2)).sum()
    }

    #[test]
    fn test_beep_fills_interval_with_tone() {
        let mut audio = constant_audio(2.0, 0.0);
        AudioCensor::apply(&mut audio, &plan(CensorMode::Beep, &[(0.5, 1.0)]));

        let start = audio.sample_index_at_time(0.5);
        let end = audio.sample_index_at_time(1.0);
        assert!(energy(&audio.samples()[start..end]) > 0.0);
    }

    #[test]
    fn test_beep_preserves_duration() {
        let mut audio = constant_audio(2.0, 0.0);
        AudioCensor::apply(&mut audio, &plan(CensorMode::Beep, &[(0.5, 1.0)]));
        assert_relative_eq!(audio.duration(), 2.0);
    }

    #[test]
    fn test_beep_leaves_outside_untouched() {
        let mut audio = constant_audio(2.0, 0.0);
        AudioCensor::apply(&mut audio, &plan(CensorMode::Beep, &[(0.5, 1.0)]));

        let before = audio.sample_index_at_time(0.5);
        assert_relative_eq!(energy(&audio.samples()[..before]), 0.0);
        let after = audio.sample_index_at_time(1.0);
        assert_relative_eq!(energy(&audio.samples()[after..]), 0.0);
    }

    #[test]
    fn test_beep_amplitude_bounded() {
        let mut audio = constant_audio(1.0, 0.0);
        AudioCensor::apply(&mut audio, &plan(CensorMode::Beep, &[(0.0, 1.0)]));
        for s in audio.samples() {
            assert!(s.abs() <= BEEP_AMPLITUDE + f32::EPSILON);
        }
    }

    #[test]
    fn test_mute_zeroes_interval_only() {
        let mut audio = constant_audio(2.0, 0.5);
        AudioCensor::apply(&mut audio, &plan(CensorMode::Mute, &[(0.5, 1.0)]));

        let start = audio.sample_index_at_time(0.5);
        let end = audio.sample_index_at_time(1.0);
        assert_relative_eq!(energy(&audio.samples()[start..end]), 0.0);
        assert!(audio.samples()[0].abs() > 0.0);
        assert!(audio.samples()[end + 1].abs() > 0.0);
    }

    #[test]
    fn test_mute_preserves_duration() {
        let mut audio = constant_audio(2.0, 0.5);
        AudioCensor::apply(&mut audio, &plan(CensorMode::Mute, &[(0.5, 1.0)]));
        assert_relative_eq!(audio.duration(), 2.0);
    }

    #[test]
    fn test_cut_shrinks_duration_by_interval_sum() {
        let mut audio = constant_audio(10.0, 0.5);
        AudioCensor::apply(
            &mut audio,
            &plan(CensorMode::Cut, &[(1.0, 2.0), (4.0, 4.5)]),
        );
        assert_relative_eq!(audio.duration(), 8.5, epsilon = 1e-6);
    }

    #[test]
    fn test_empty_plan_changes_nothing() {
        let mut audio = constant_audio(1.0, 0.25);
        let original = audio.samples().to_vec();
        AudioCensor::apply(&mut audio, &plan(CensorMode::Beep, &[]));
        assert_eq!(audio.samples(), &original[..]);
    }

    #[test]
    fn test_interval_past_end_clamped() {
        let mut audio = constant_audio(1.0, 0.5);
        AudioCensor::apply(&mut audio, &plan(CensorMode::Mute, &[(0.5, 5.0)]));
        let start = audio.sample_index_at_time(0.5);
        assert_relative_eq!(energy(&audio.samples()[start..]), 0.0);
    }
}
