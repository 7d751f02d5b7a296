use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::SampleBuffer;
use crate::error::EngineError;

/// A running sound. The single capability is `stop`; stopping an
/// already-stopped handle is a no-op.
pub trait Playback {
    fn stop(&mut self);
}

/// Handle over a live cpal output stream (kept alive by the handle).
pub struct StreamHandle {
    stream: Option<cpal::Stream>,
    finished: Arc<AtomicBool>,
}

impl StreamHandle {
    /// True once the stream has played past the end of its buffer. Tones
    /// loop forever and only finish when stopped.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }

    /// Block until the stream reports completion.
    pub fn wait(&self) {
        while !self.is_finished() {
            std::thread::sleep(Duration::from_millis(50));
        }
    }
}

impl Playback for StreamHandle {
    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            self.finished.store(true, Ordering::Relaxed);
        }
    }
}

/// Default output device wrapper. Synthesis takes its native sample rate.
pub struct OutputDevice {
    device: cpal::Device,
    config: cpal::SupportedStreamConfig,
}

impl OutputDevice {
    pub fn open() -> Result<Self, EngineError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| EngineError::DeviceUnavailable("no output device found".into()))?;

        let config = device
            .default_output_config()
            .map_err(|e| EngineError::DeviceUnavailable(e.to_string()))?;

        log::info!(
            "Output: {} @ {}Hz",
            device.name().unwrap_or_else(|_| "unknown".into()),
            config.sample_rate().0
        );

        Ok(Self { device, config })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate().0
    }

    /// Play a mono buffer at unity gain, duplicated across the device's
    /// channels. A rate mismatch between buffer and device is bridged by
    /// linear interpolation.
    pub fn play_buffer(&self, buffer: &SampleBuffer) -> Result<StreamHandle, EngineError> {
        let samples: Arc<Vec<f32>> = Arc::new(buffer.samples.clone());
        let step = buffer.sample_rate as f64 / self.sample_rate() as f64;
        let channels = self.config.channels() as usize;
        let finished = Arc::new(AtomicBool::new(false));
        let finished_cb = Arc::clone(&finished);
        let mut pos = 0.0f64;

        let stream = self
            .device
            .build_output_stream(
                &self.config.clone().into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for frame in data.chunks_mut(channels) {
                        let idx = pos as usize;
                        let value = if idx + 1 < samples.len() {
                            let frac = (pos - idx as f64) as f32;
                            samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
                        } else {
                            finished_cb.store(true, Ordering::Relaxed);
                            0.0
                        };
                        for out in frame.iter_mut() {
                            *out = value;
                        }
                        pos += step;
                    }
                },
                |err| log::error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| EngineError::Stream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| EngineError::Stream(e.to_string()))?;

        Ok(StreamHandle {
            stream: Some(stream),
            finished,
        })
    }

    /// Play a continuous sinusoid `gain · sin(2π·frequency·t + phase)` until
    /// the returned handle is stopped.
    pub fn play_tone(
        &self,
        frequency: f64,
        gain: f64,
        phase: f64,
    ) -> Result<StreamHandle, EngineError> {
        let channels = self.config.channels() as usize;
        let rate = self.sample_rate() as f64;
        let finished = Arc::new(AtomicBool::new(false));
        let mut n: u64 = 0;

        log::debug!(
            "Starting tone: {:.2} Hz, gain {:.6}, phase {:.3} rad",
            frequency,
            gain,
            phase
        );

        let stream = self
            .device
            .build_output_stream(
                &self.config.clone().into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for frame in data.chunks_mut(channels) {
                        let t = n as f64 / rate;
                        let value = (gain * (2.0 * PI * frequency * t + phase).sin()) as f32;
                        for out in frame.iter_mut() {
                            *out = value;
                        }
                        n += 1;
                    }
                },
                |err| log::error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| EngineError::Stream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| EngineError::Stream(e.to_string()))?;

        Ok(StreamHandle {
            stream: Some(stream),
            finished,
        })
    }
}
