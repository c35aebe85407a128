pub mod ffmpeg_audio_reader;
pub mod ffmpeg_audio_writer;
pub mod ffmpeg_video_cutter;
