use std::path::Path;

use crate::video::domain::media_error::MediaProcessingError;
use crate::video::domain::video_cutter::VideoCutter;

/// Removes time ranges from a video track by decoding and re-encoding.
///
/// Frames whose presentation time falls inside a removal range are
/// dropped; the survivors are re-encoded with sequential timestamps so
/// the output plays back gapless. Audio is not handled here — the use
/// case shortens the audio track separately and muxes it afterwards.
pub struct FfmpegVideoCutter;

// Safety: FfmpegVideoCutter holds no ffmpeg state between calls.
unsafe impl Send for FfmpegVideoCutter {}

impl VideoCutter for FfmpegVideoCutter {
    fn cut_video(
        &self,
        source: &Path,
        output: &Path,
        ranges: &[(f64, f64)],
    ) -> Result<(), MediaProcessingError> {
        ffmpeg_next::init().map_err(|e| MediaProcessingError::Decode(e.to_string()))?;

        let decode_err = |e: ffmpeg_next::Error| MediaProcessingError::Decode(e.to_string());
        let encode_err = |e: ffmpeg_next::Error| MediaProcessingError::Encode(e.to_string());
        let mux_err = |e: ffmpeg_next::Error| MediaProcessingError::Mux(e.to_string());

        let mut ictx = ffmpeg_next::format::input(source)
            .map_err(|e| MediaProcessingError::open(source, e))?;

        let in_stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| MediaProcessingError::Decode("no video stream found".to_string()))?;
        let video_stream_index = in_stream.index();

        let codec_ctx =
            ffmpeg_next::codec::context::Context::from_parameters(in_stream.parameters())
                .map_err(decode_err)?;
        let mut decoder = codec_ctx.decoder().video().map_err(decode_err)?;

        let in_time_base = in_stream.time_base();
        let rate = in_stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };
        let fps_i = fps.round() as i32;
        let fps_i = if fps_i <= 0 { 30 } else { fps_i };
        let fps_f = if fps > 0.0 { fps } else { fps_i as f64 };

        let width = decoder.width();
        let height = decoder.height();

        let mut octx = ffmpeg_next::format::output(output).map_err(mux_err)?;

        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        // MPEG4 as a widely compatible encoder
        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4)
            .ok_or_else(|| MediaProcessingError::Encode("MPEG4 encoder not found".to_string()))?;

        let mut ost = octx.add_stream(Some(codec)).map_err(mux_err)?;

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(encode_err)?;

        encoder_ctx.set_width(width);
        encoder_ctx.set_height(height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(ffmpeg_next::Rational(1, fps_i));
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps_i, 1)));

        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let mut encoder = encoder_ctx
            .open_with(ffmpeg_next::Dictionary::new())
            .map_err(encode_err)?;
        ost.set_parameters(&encoder);

        octx.write_header().map_err(mux_err)?;

        let ost_time_base = octx.stream(0).unwrap().time_base();
        let enc_time_base = ffmpeg_next::Rational(1, fps_i);

        let mut scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::YUV420P,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(decode_err)?;

        let mut source_index: usize = 0;
        let mut output_index: i64 = 0;

        let mut process_decoded = |decoder: &mut ffmpeg_next::decoder::Video,
                                   encoder: &mut ffmpeg_next::codec::encoder::video::Encoder,
                                   octx: &mut ffmpeg_next::format::context::Output|
         -> Result<(), MediaProcessingError> {
            let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
            while decoder.receive_frame(&mut decoded).is_ok() {
                let time = frame_time(decoded.timestamp(), in_time_base, source_index, fps_f);
                source_index += 1;

                if in_removed_range(time, ranges) {
                    continue;
                }

                let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
                scaler.run(&decoded, &mut yuv_frame).map_err(decode_err)?;
                yuv_frame.set_pts(Some(output_index));
                output_index += 1;

                encoder.send_frame(&yuv_frame).map_err(encode_err)?;

                let mut encoded = ffmpeg_next::Packet::empty();
                while encoder.receive_packet(&mut encoded).is_ok() {
                    encoded.set_stream(0);
                    encoded.rescale_ts(enc_time_base, ost_time_base);
                    encoded.write_interleaved(octx).map_err(mux_err)?;
                }
            }
            Ok(())
        };

        for (stream, packet) in ictx.packets() {
            if stream.index() != video_stream_index {
                continue;
            }
            if decoder.send_packet(&packet).is_err() {
                continue;
            }
            process_decoded(&mut decoder, &mut encoder, &mut octx)?;
        }

        decoder.send_eof().map_err(decode_err)?;
        process_decoded(&mut decoder, &mut encoder, &mut octx)?;

        // Flush encoder
        encoder.send_eof().map_err(encode_err)?;
        let mut encoded = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(0);
            encoded.rescale_ts(enc_time_base, ost_time_base);
            encoded.write_interleaved(&mut octx).map_err(mux_err)?;
        }

        octx.write_trailer().map_err(mux_err)?;

        Ok(())
    }
}

/// Presentation time of a decoded frame in seconds.
///
/// The stream timestamp keeps the video in step with the sample-accurate
/// audio cut even for non-integer frame rates like 29.97; the frame-index
/// estimate is only for streams that carry no timestamps at all.
fn frame_time(
    timestamp: Option<i64>,
    time_base: ffmpeg_next::Rational,
    frame_index: usize,
    fps: f64,
) -> f64 {
    match timestamp {
        Some(ts) => ts as f64 * f64::from(time_base),
        None => frame_index as f64 / fps,
    }
}

/// Whether `time` falls inside any removal range. Ranges are half-open
/// [start, end) so a frame landing exactly on a range end survives.
fn in_removed_range(time: f64, ranges: &[(f64, f64)]) -> bool {
    ranges.iter().any(|&(start, end)| time >= start && time < end)
}
