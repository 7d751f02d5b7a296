pub mod select;
pub mod session;
pub mod spectrum;
pub mod window;

use crate::audio::SampleBuffer;
use crate::error::EngineError;
use session::AnalysisSession;
use window::HammingWindow;

/// Run the full analysis pipeline on a captured buffer: Hamming window over
/// the first `min(transform_size, len)` samples, direct transform, dynamic
/// thresholding and ranking. Produces a fresh [`AnalysisSession`] that fully
/// replaces any prior run before callers may synthesize against it.
pub fn analyze(buffer: &SampleBuffer, transform_size: usize) -> Result<AnalysisSession, EngineError> {
    if buffer.samples.is_empty() {
        return Err(EngineError::NoAudioData);
    }

    let window_size = transform_size.min(buffer.samples.len());
    let window = HammingWindow::new(window_size);

    log::info!(
        "Analyzing {} samples @ {}Hz (window {}, transform {})",
        buffer.samples.len(),
        buffer.sample_rate,
        window_size,
        transform_size
    );

    let (bins, peak_amplitude) = spectrum::transform(buffer, &window, transform_size);
    let components = select::rank_components(&bins, peak_amplitude);

    Ok(AnalysisSession::new(
        buffer.sample_rate,
        peak_amplitude,
        components,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_empty_buffer_is_no_audio_data() {
        let buf = SampleBuffer::new(Vec::new(), 44100);
        let err = analyze(&buf, 512).unwrap_err();
        assert!(matches!(err, EngineError::NoAudioData));
    }

    #[test]
    fn test_single_tone_top_component() {
        let rate = 8000u32;
        let size = 800usize;
        let phi = 1.1;
        let samples: Vec<f32> = (0..size)
            .map(|n| {
                let t = n as f64 / rate as f64;
                (0.4 * (2.0 * PI * 440.0 * t + phi).cos()) as f32
            })
            .collect();
        let buf = SampleBuffer::new(samples, rate);

        let session = analyze(&buf, size).unwrap();
        assert!(!session.components.is_empty());

        let top = &session.components[0];
        let bin_width = rate as f64 / size as f64;
        assert!((top.frequency - 440.0).abs() <= bin_width);
        assert!((top.phase - phi).abs() < 0.05);
        assert!((top.raw_amplitude - session.peak_amplitude).abs() < 1e-12);

        for c in &session.components {
            assert!(c.raw_amplitude <= session.peak_amplitude);
            assert!(c.amplitude_db.is_finite());
        }
    }

    #[test]
    fn test_rerun_replaces_session() {
        let rate = 8000u32;
        let size = 400usize;
        let make = |freq: f64| {
            let samples: Vec<f32> = (0..size)
                .map(|n| {
                    let t = n as f64 / rate as f64;
                    (0.4 * (2.0 * PI * freq * t).cos()) as f32
                })
                .collect();
            SampleBuffer::new(samples, rate)
        };

        let first = analyze(&make(440.0), size).unwrap();
        let second = analyze(&make(880.0), size).unwrap();

        let bin_width = rate as f64 / size as f64;
        assert!((first.components[0].frequency - 440.0).abs() <= bin_width);
        assert!((second.components[0].frequency - 880.0).abs() <= bin_width);
    }
}
