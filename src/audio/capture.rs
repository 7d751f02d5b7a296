use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::SampleBuffer;
use crate::error::EngineError;

/// Record a fixed-length clip from the default input device. Only the first
/// channel is kept; the buffer is fully materialized before this returns.
pub fn record_clip(seconds: f32) -> Result<SampleBuffer, EngineError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| EngineError::DeviceUnavailable("no input device found".into()))?;

    let config = device
        .default_input_config()
        .map_err(|e| EngineError::DeviceUnavailable(e.to_string()))?;

    let sample_rate = config.sample_rate().0;
    let channels = config.channels() as usize;
    let target = (seconds.max(0.0) as f64 * sample_rate as f64) as usize;

    log::info!(
        "Recording {:.1}s from {} @ {}Hz",
        seconds,
        device.name().unwrap_or_else(|_| "unknown".into()),
        sample_rate
    );

    let captured = Arc::new(Mutex::new(Vec::<f32>::with_capacity(target)));
    let captured_cb = Arc::clone(&captured);

    let stream = device
        .build_input_stream(
            &config.into(),
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let mut buf = captured_cb.lock().unwrap();
                for frame in data.chunks(channels) {
                    if buf.len() < target {
                        buf.push(frame[0]);
                    }
                }
            },
            |err| log::error!("Capture stream error: {}", err),
            None,
        )
        .map_err(|e| EngineError::Stream(e.to_string()))?;

    stream
        .play()
        .map_err(|e| EngineError::Stream(e.to_string()))?;

    // Block until the callback has filled the clip, with a grace period in
    // case the device delivers slower than real time.
    let deadline = std::time::Instant::now() + Duration::from_secs_f32(seconds * 2.0 + 2.0);
    loop {
        std::thread::sleep(Duration::from_millis(50));
        if captured.lock().unwrap().len() >= target {
            break;
        }
        if std::time::Instant::now() > deadline {
            log::warn!("Capture timed out before reaching {} samples", target);
            break;
        }
    }
    drop(stream);

    let samples = captured.lock().unwrap().clone();

    log::info!("Captured {} samples", samples.len());

    if samples.is_empty() {
        return Err(EngineError::NoAudioData);
    }

    Ok(SampleBuffer::new(samples, sample_rate))
}
