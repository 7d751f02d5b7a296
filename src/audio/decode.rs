use std::path::Path;
use symphonia::core::audio::SampleBuffer as DecodedChunk;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::SampleBuffer;
use crate::error::EngineError;

/// Decode an audio file into a mono [`SampleBuffer`]. Multi-channel input is
/// downmixed; only the resulting single channel feeds the analyzer.
pub fn decode_file(path: &Path) -> Result<SampleBuffer, EngineError> {
    let file = std::fs::File::open(path)
        .map_err(|e| EngineError::DecodeFailure(format!("open {}: {}", path.display(), e)))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| EngineError::DecodeFailure(format!("probe failed: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| EngineError::DecodeFailure("no audio tracks found".into()))?;

    let track_id = track.id;
    let channels = track.codec_params.channels.map_or(1, |c| c.count());
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| EngineError::DecodeFailure("unknown sample rate".into()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| EngineError::DecodeFailure(format!("decoder init failed: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(EngineError::DecodeFailure(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(EngineError::DecodeFailure(e.to_string())),
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();

        let mut chunk = DecodedChunk::<f32>::new(num_frames as u64, spec);
        chunk.copy_interleaved_ref(decoded);

        let interleaved = chunk.samples();

        if channels == 1 {
            samples.extend_from_slice(interleaved);
        } else {
            for frame in interleaved.chunks(channels) {
                let mono: f32 = frame.iter().sum::<f32>() / channels as f32;
                samples.push(mono);
            }
        }
    }

    log::info!(
        "Decoded audio: {} samples, {}Hz, {:.1}s",
        samples.len(),
        sample_rate,
        samples.len() as f32 / sample_rate as f32
    );

    Ok(SampleBuffer::new(samples, sample_rate))
}
