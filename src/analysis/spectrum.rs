use indicatif::{ProgressBar, ProgressStyle};
use std::f64::consts::PI;

use super::window::HammingWindow;
use crate::audio::SampleBuffer;

/// One discrete frequency sample of the transform.
#[derive(Clone, Debug, PartialEq)]
pub struct FrequencyBin {
    pub index: usize,
    /// Center frequency in Hz: `index · (sample_rate/2) / (transform_size/2)`.
    pub frequency: f64,
    pub real: f64,
    pub imag: f64,
    pub magnitude: f64,
    /// Radians in (−π, π].
    pub phase: f64,
    /// Window-normalized linear amplitude, the value all ranking and gain
    /// math runs on.
    pub amplitude: f64,
}

/// Direct phase-preserving transform over the first `window.len()` samples.
///
/// Deliberately O(N·W): this is the correctness-first reference
/// implementation, not a fast transform. Returns one bin per index in
/// [0, transform_size/2) together with the run's peak amplitude.
pub fn transform(
    buffer: &SampleBuffer,
    window: &HammingWindow,
    transform_size: usize,
) -> (Vec<FrequencyBin>, f64) {
    let bin_count = transform_size / 2;
    let window_size = window.len().min(buffer.samples.len());
    let nyquist = buffer.sample_rate as f64 / 2.0;

    // Window the samples once up front; the bin loop re-reads them N/2 times.
    let windowed: Vec<f64> = buffer.samples[..window_size]
        .iter()
        .zip(window.weights.iter())
        .map(|(&s, &w)| s as f64 * w)
        .collect();

    let pb = ProgressBar::new(bin_count as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} bins ({eta} remaining)")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut bins = Vec::with_capacity(bin_count);
    let mut peak_amplitude = 0.0f64;

    for k in 0..bin_count {
        let mut real = 0.0f64;
        let mut imag = 0.0f64;

        for (n, &sample) in windowed.iter().enumerate() {
            let angle = -2.0 * PI * (k as f64) * (n as f64) / transform_size as f64;
            real += sample * angle.cos();
            imag += sample * angle.sin();
        }

        let magnitude = (real * real + imag * imag).sqrt();
        let mut phase = imag.atan2(real);
        if phase <= -PI {
            phase = PI;
        }
        let amplitude = magnitude * window.normalization / transform_size as f64;

        if amplitude > peak_amplitude {
            peak_amplitude = amplitude;
        }

        bins.push(FrequencyBin {
            index: k,
            frequency: k as f64 * nyquist / bin_count as f64,
            real,
            imag,
            magnitude,
            phase,
            amplitude,
        });

        pb.inc(1);
    }

    pb.finish_and_clear();

    log::info!(
        "Transform complete: {} bins, peak amplitude {:.3e}",
        bins.len(),
        peak_amplitude
    );

    (bins, peak_amplitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 440 Hz lands exactly on bin 44 with this rate and size.
    const SAMPLE_RATE: u32 = 8000;
    const TRANSFORM_SIZE: usize = 800;

    fn tone(freq: f64, phase: f64, amp: f64, len: usize) -> SampleBuffer {
        let samples: Vec<f32> = (0..len)
            .map(|n| {
                let t = n as f64 / SAMPLE_RATE as f64;
                (amp * (2.0 * PI * freq * t + phase).cos()) as f32
            })
            .collect();
        SampleBuffer::new(samples, SAMPLE_RATE)
    }

    #[test]
    fn test_bin_count_and_frequencies() {
        let buf = tone(440.0, 0.0, 0.5, TRANSFORM_SIZE);
        let window = HammingWindow::new(TRANSFORM_SIZE.min(buf.samples.len()));
        let (bins, _) = transform(&buf, &window, TRANSFORM_SIZE);

        assert_eq!(bins.len(), TRANSFORM_SIZE / 2);
        assert_eq!(bins[0].frequency, 0.0);
        // bin width = sample_rate / transform_size = 10 Hz
        assert!((bins[44].frequency - 440.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_tone_recovery() {
        let phi = 0.7;
        let buf = tone(440.0, phi, 0.5, TRANSFORM_SIZE);
        let window = HammingWindow::new(TRANSFORM_SIZE.min(buf.samples.len()));
        let (bins, peak) = transform(&buf, &window, TRANSFORM_SIZE);

        let top = bins
            .iter()
            .max_by(|a, b| a.amplitude.partial_cmp(&b.amplitude).unwrap())
            .unwrap();

        let bin_width = SAMPLE_RATE as f64 / TRANSFORM_SIZE as f64;
        assert!((top.frequency - 440.0).abs() <= bin_width);
        assert!((top.phase - phi).abs() < 0.05);
        assert_eq!(top.amplitude, peak);
    }

    #[test]
    fn test_peak_tracks_maximum() {
        let buf = tone(1200.0, 0.3, 0.8, TRANSFORM_SIZE);
        let window = HammingWindow::new(TRANSFORM_SIZE.min(buf.samples.len()));
        let (bins, peak) = transform(&buf, &window, TRANSFORM_SIZE);

        let max = bins.iter().map(|b| b.amplitude).fold(0.0f64, f64::max);
        assert_eq!(peak, max);
    }

    #[test]
    fn test_deterministic() {
        let buf = tone(440.0, 0.2, 0.5, TRANSFORM_SIZE);
        let window = HammingWindow::new(TRANSFORM_SIZE.min(buf.samples.len()));
        let (a, peak_a) = transform(&buf, &window, TRANSFORM_SIZE);
        let (b, peak_b) = transform(&buf, &window, TRANSFORM_SIZE);

        assert_eq!(a, b);
        assert_eq!(peak_a, peak_b);
    }

    #[test]
    fn test_short_buffer_zero_pads() {
        // Fewer samples than the transform size: the summation simply stops
        // at the window, bins beyond stay consistent.
        let buf = tone(440.0, 0.0, 0.5, 600);
        let window = HammingWindow::new(TRANSFORM_SIZE.min(buf.samples.len()));
        assert_eq!(window.len(), 600);
        let (bins, _) = transform(&buf, &window, TRANSFORM_SIZE);
        assert_eq!(bins.len(), TRANSFORM_SIZE / 2);
    }

    #[test]
    fn test_phase_range() {
        let buf = tone(440.0, 2.5, 0.5, TRANSFORM_SIZE);
        let window = HammingWindow::new(TRANSFORM_SIZE);
        let (bins, _) = transform(&buf, &window, TRANSFORM_SIZE);
        for bin in &bins {
            assert!(bin.phase > -PI && bin.phase <= PI);
        }
    }
}
