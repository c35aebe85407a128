pub mod audio_reader;
pub mod audio_writer;
pub mod media_error;
pub mod video_cutter;
