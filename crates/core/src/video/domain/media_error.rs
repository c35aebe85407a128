use std::path::PathBuf;

use thiserror::Error;

/// Codec/tool failures while reading or rewriting media. Fatal for the
/// job; the pipeline cleans up partial output files before reporting it.
#[derive(Error, Debug)]
pub enum MediaProcessingError {
    #[error("cannot open media file {path}: {message}")]
    Open { path: PathBuf, message: String },
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("muxing failed: {0}")]
    Mux(String),
    #[error("media file operation failed: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaProcessingError {
    pub fn open(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::Open {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}
