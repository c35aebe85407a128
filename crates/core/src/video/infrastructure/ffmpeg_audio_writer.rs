use std::path::Path;

use crate::audio::domain::audio_segment::AudioSegment;
use crate::video::domain::audio_writer::AudioWriter;
use crate::video::domain::media_error::MediaProcessingError;

/// Muxes censored audio back into a video file using ffmpeg-next.
///
/// Opens the existing file, writes a temp output carrying the original
/// video stream (packet copy, no re-encode) plus newly encoded AAC audio,
/// then atomically replaces the original. Because the video packets are
/// copied untouched, beep/mute runs leave all video timing unchanged.
pub struct FfmpegAudioWriter;

impl AudioWriter for FfmpegAudioWriter {
    fn write_audio(
        &self,
        video_path: &Path,
        audio: &AudioSegment,
    ) -> Result<(), MediaProcessingError> {
        let temp_path = video_path.with_extension("tmp.mp4");
        let result = remux_with_audio(video_path, &temp_path, audio);
        if result.is_err() {
            // The temp file may exist half-written; never leave it behind.
            let _ = std::fs::remove_file(&temp_path);
        }
        result
    }
}

fn remux_with_audio(
    video_path: &Path,
    temp_path: &Path,
    audio: &AudioSegment,
) -> Result<(), MediaProcessingError> {
    ffmpeg_next::init().map_err(|e| MediaProcessingError::Mux(e.to_string()))?;

    let mux_err = |e: ffmpeg_next::Error| MediaProcessingError::Mux(e.to_string());

    let mut ictx = ffmpeg_next::format::input(video_path)
        .map_err(|e| MediaProcessingError::open(video_path, e))?;
    let mut octx = ffmpeg_next::format::output(&temp_path).map_err(mux_err)?;

    // Copy video stream parameters
    let video_stream = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .ok_or_else(|| MediaProcessingError::Mux("no video stream in source".to_string()))?;
    let video_src_idx = video_stream.index();
    let video_in_tb = video_stream.time_base();

    let mut ost_video = octx
        .add_stream(ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::None))
        .map_err(mux_err)?;
    ost_video.set_parameters(video_stream.parameters());
    unsafe {
        (*ost_video.parameters().as_mut_ptr()).codec_tag = 0;
    }
    let video_ost_idx = ost_video.index();

    // AAC audio encoder for the censored track
    let aac_codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::AAC)
        .ok_or_else(|| MediaProcessingError::Encode("AAC encoder not found".to_string()))?;
    let mut ost_audio = octx.add_stream(Some(aac_codec)).map_err(mux_err)?;
    let audio_ost_idx = ost_audio.index();

    let mut audio_encoder = ffmpeg_next::codec::context::Context::new_with_codec(aac_codec)
        .encoder()
        .audio()
        .map_err(|e| MediaProcessingError::Encode(e.to_string()))?;

    audio_encoder.set_rate(audio.sample_rate() as i32);
    audio_encoder.set_channel_layout(ffmpeg_next::ChannelLayout::MONO);
    audio_encoder.set_format(ffmpeg_next::format::Sample::F32(
        ffmpeg_next::format::sample::Type::Planar,
    ));

    let mut audio_encoder = audio_encoder
        .open_as(aac_codec)
        .map_err(|e| MediaProcessingError::Encode(e.to_string()))?;
    ost_audio.set_parameters(&audio_encoder);

    let audio_time_base = audio_encoder.time_base();
    let frame_size = audio_encoder.frame_size() as usize;

    octx.write_header().map_err(mux_err)?;

    let ost_video_tb = octx.stream(video_ost_idx).unwrap().time_base();
    let ost_audio_tb = octx.stream(audio_ost_idx).unwrap().time_base();

    // Copy video packets untouched
    for (stream, mut packet) in ictx.packets() {
        if stream.index() != video_src_idx {
            continue;
        }
        packet.rescale_ts(video_in_tb, ost_video_tb);
        packet.set_position(-1);
        packet.set_stream(video_ost_idx);
        packet.write_interleaved(&mut octx).map_err(mux_err)?;
    }

    encode_audio_segment(
        &mut audio_encoder,
        audio,
        &mut octx,
        audio_ost_idx,
        audio_time_base,
        ost_audio_tb,
        frame_size,
    )?;

    octx.write_trailer().map_err(mux_err)?;

    // Release contexts before touching the files
    drop(octx);
    drop(ictx);

    std::fs::rename(temp_path, video_path)?;
    Ok(())
}

/// Encode an AudioSegment into AAC packets and write them interleaved.
fn encode_audio_segment(
    encoder: &mut ffmpeg_next::codec::encoder::audio::Encoder,
    audio: &AudioSegment,
    octx: &mut ffmpeg_next::format::context::Output,
    stream_idx: usize,
    enc_time_base: ffmpeg_next::Rational,
    ost_time_base: ffmpeg_next::Rational,
    frame_size: usize,
) -> Result<(), MediaProcessingError> {
    let samples = audio.samples();
    let sample_rate = audio.sample_rate();
    let effective_frame_size = if frame_size == 0 { 1024 } else { frame_size };

    let encode_err = |e: ffmpeg_next::Error| MediaProcessingError::Encode(e.to_string());
    let mut pts: i64 = 0;

    for chunk in samples.chunks(effective_frame_size) {
        let mut frame = ffmpeg_next::util::frame::audio::Audio::new(
            ffmpeg_next::format::Sample::F32(ffmpeg_next::format::sample::Type::Planar),
            chunk.len(),
            ffmpeg_next::ChannelLayout::MONO,
        );
        frame.set_rate(sample_rate);
        frame.set_pts(Some(pts));

        let dst = frame.data_mut(0);
        let src_bytes =
            unsafe { std::slice::from_raw_parts(chunk.as_ptr() as *const u8, chunk.len() * 4) };
        dst[..src_bytes.len()].copy_from_slice(src_bytes);

        encoder.send_frame(&frame).map_err(encode_err)?;
        flush_audio_packets(encoder, octx, stream_idx, enc_time_base, ost_time_base)?;

        pts += chunk.len() as i64;
    }

    encoder.send_eof().map_err(encode_err)?;
    flush_audio_packets(encoder, octx, stream_idx, enc_time_base, ost_time_base)?;

    Ok(())
}

fn flush_audio_packets(
    encoder: &mut ffmpeg_next::codec::encoder::audio::Encoder,
    octx: &mut ffmpeg_next::format::context::Output,
    stream_idx: usize,
    enc_time_base: ffmpeg_next::Rational,
    ost_time_base: ffmpeg_next::Rational,
) -> Result<(), MediaProcessingError> {
    let mut encoded = ffmpeg_next::Packet::empty();
    while encoder.receive_packet(&mut encoded).is_ok() {
        encoded.set_stream(stream_idx);
        encoded.rescale_ts(enc_time_base, ost_time_base);
        encoded
            .write_interleaved(octx)
            .map_err(|e| MediaProcessingError::Mux(e.to_string()))?;
    }
    Ok(())
}
