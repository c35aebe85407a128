use std::path::Path;

use super::media_error::MediaProcessingError;
use crate::audio::domain::audio_segment::AudioSegment;

/// Domain interface for encoding audio and muxing it into a video file.
pub trait AudioWriter: Send {
    /// Encode the AudioSegment and mux it into an existing video file,
    /// replacing any existing audio track. The video stream is copied
    /// untouched, so timing outside the rewritten audio is unchanged.
    fn write_audio(
        &self,
        video_path: &Path,
        audio: &AudioSegment,
    ) -> Result<(), MediaProcessingError>;
}
