/// Decoded audio: interleaved PCM samples normalized to [-1.0, 1.0].
#[derive(Clone, Debug)]
pub struct AudioSegment {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl AudioSegment {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    pub fn sample_index_at_time(&self, time: f64) -> usize {
        (time * self.sample_rate as f64 * self.channels as f64) as usize
    }

    /// Remove the given `(start, end)` second ranges from the sample buffer,
    /// shifting later audio earlier. Ranges must be sorted by start and
    /// non-overlapping; out-of-range ends are clamped to the buffer.
    pub fn remove_ranges(&mut self, ranges: &[(f64, f64)]) {
        if ranges.is_empty() {
            return;
        }

        let mut kept = Vec::with_capacity(self.samples.len());
        let mut cursor = 0usize;
        for &(start, end) in ranges {
            let start_idx = self.sample_index_at_time(start).min(self.samples.len());
            let end_idx = self.sample_index_at_time(end).min(self.samples.len());
            if start_idx > cursor {
                kept.extend_from_slice(&self.samples[cursor..start_idx]);
            }
            cursor = cursor.max(end_idx);
        }
        if cursor < self.samples.len() {
            kept.extend_from_slice(&self.samples[cursor..]);
        }
        self.samples = kept;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_creates_segment_with_correct_fields() {
        let samples = vec![0.0f32; 16000];
        let seg = AudioSegment::new(samples.clone(), 16000, 1);
        assert_eq!(seg.samples(), &samples[..]);
        assert_eq!(seg.sample_rate(), 16000);
        assert_eq!(seg.channels(), 1);
    }

    #[test]
    fn test_duration_mono() {
        let seg = AudioSegment::new(vec![0.0; 48000], 16000, 1);
        assert_eq!(seg.duration(), 3.0);
    }

    #[test]
    fn test_duration_stereo() {
        let seg = AudioSegment::new(vec![0.0; 96000], 48000, 2);
        assert_eq!(seg.duration(), 1.0);
    }

    #[test]
    fn test_sample_index_at_time() {
        let seg = AudioSegment::new(vec![0.0; 16000], 16000, 1);
        assert_eq!(seg.sample_index_at_time(0.5), 8000);
    }

    #[test]
    fn test_remove_ranges_shrinks_duration() {
        let mut seg = AudioSegment::new(vec![0.0; 160000], 16000, 1);
        seg.remove_ranges(&[(4.0, 5.0)]);
        assert_relative_eq!(seg.duration(), 9.0, epsilon = 1e-9);
    }

    #[test]
    fn test_remove_ranges_joins_surrounding_audio() {
        let mut samples = vec![0.0f32; 16000];
        // Mark the sample just after the removed range
        samples[8000] = 1.0;
        let mut seg = AudioSegment::new(samples, 16000, 1);
        seg.remove_ranges(&[(0.25, 0.5)]);
        // The marked sample moved earlier by the removed duration
        assert_eq!(seg.samples()[4000], 1.0);
    }

    #[test]
    fn test_remove_ranges_multiple() {
        let mut seg = AudioSegment::new(vec![0.0; 160000], 16000, 1);
        seg.remove_ranges(&[(1.0, 2.0), (5.0, 5.5)]);
        assert_relative_eq!(seg.duration(), 8.5, epsilon = 1e-9);
    }

    #[test]
    fn test_remove_ranges_empty_is_noop() {
        let mut seg = AudioSegment::new(vec![0.5; 1000], 16000, 1);
        seg.remove_ranges(&[]);
        assert_eq!(seg.samples().len(), 1000);
    }

    #[test]
    fn test_remove_ranges_clamps_past_end() {
        let mut seg = AudioSegment::new(vec![0.0; 16000], 16000, 1);
        seg.remove_ranges(&[(0.5, 99.0)]);
        assert_eq!(seg.samples().len(), 8000);
    }
}
