pub mod audio_segment;
