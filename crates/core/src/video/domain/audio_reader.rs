use std::path::Path;

use super::media_error::MediaProcessingError;
use crate::audio::domain::audio_segment::AudioSegment;

/// Domain interface for decoding the audio track of a video file.
pub trait AudioReader: Send {
    /// Decode the audio track to a mono PCM AudioSegment at the given
    /// sample rate. Returns None if the video has no audio track.
    fn read_audio(
        &self,
        path: &Path,
        target_sample_rate: u32,
    ) -> Result<Option<AudioSegment>, MediaProcessingError>;
}
