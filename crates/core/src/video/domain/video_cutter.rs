use std::path::Path;

use super::media_error::MediaProcessingError;

/// Domain interface for removing time ranges from a video stream.
///
/// Writes a video-only output file containing the frames outside the
/// given `(start, end)` second ranges, with later content shifted
/// earlier. Ranges must be sorted and non-overlapping (guaranteed by the
/// censor plan). Audio is handled separately by the `AudioWriter`.
pub trait VideoCutter: Send {
    fn cut_video(
        &self,
        source: &Path,
        output: &Path,
        ranges: &[(f64, f64)],
    ) -> Result<(), MediaProcessingError>;
}
