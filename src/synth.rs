use std::collections::BTreeSet;
use std::f64::consts::PI;

use crate::analysis::select::FrequencyComponent;
use crate::audio::SampleBuffer;
use crate::error::EngineError;

/// Length of the synthesized clip, matching the original recording window.
pub const SYNTHESIS_DURATION_SECS: f64 = 2.0;

const TARGET_RMS: f64 = 0.1;
const CLIP_THRESHOLD: f64 = 0.8;
const MAX_BOOST: f64 = 5.0;
const GAIN_MIN: f64 = 0.002;
const GAIN_MAX: f64 = 0.6;

/// Coarse gain tier for a component's relative amplitude: dominant
/// components sit at 0.4, significant ones at 0.3, the rest at 0.2.
fn tier_gain(relative: f64) -> f64 {
    if relative > 0.5 {
        0.4
    } else if relative > 0.1 {
        0.3
    } else {
        0.2
    }
}

/// Final per-component gain: relative amplitude scaled by its tier, clamped
/// to [0.002, 0.6]. Non-finite values collapse to the floor instead of
/// propagating into the buffer.
pub fn component_gain(raw_amplitude: f64, peak_amplitude: f64) -> f64 {
    let relative = if peak_amplitude > 0.0 {
        raw_amplitude / peak_amplitude
    } else {
        0.0
    };
    let gain = relative * tier_gain(relative);
    if !gain.is_finite() {
        return GAIN_MIN;
    }
    gain.clamp(GAIN_MIN, GAIN_MAX)
}

/// Post-synthesis scale factor. Clip avoidance always wins: a buffer over
/// the clip threshold is scaled down and never receives the loudness boost
/// afterwards, even when its RMS is also under the quiet cutoff. A silent
/// buffer (RMS 0) is left alone.
pub fn normalization_factor(peak: f64, trough: f64, rms: f64) -> f64 {
    if rms <= 0.0 {
        return 1.0;
    }
    if peak > CLIP_THRESHOLD {
        CLIP_THRESHOLD / peak.abs().max(trough.abs())
    } else if rms < TARGET_RMS * 0.1 {
        (TARGET_RMS / rms).min(MAX_BOOST)
    } else {
        1.0
    }
}

/// Reconstruct a clip by superposing the selected components:
/// `gain · sin(2π·frequency·t + phase)` summed into a zeroed buffer of
/// `duration · sample_rate` samples, then adaptively normalized.
pub fn synthesize(
    components: &[FrequencyComponent],
    peak_amplitude: f64,
    selection: &BTreeSet<usize>,
    duration_secs: f64,
    sample_rate: u32,
) -> Result<SampleBuffer, EngineError> {
    if selection.is_empty() {
        return Err(EngineError::NoSelection);
    }
    if let Some(&index) = selection.iter().find(|&&i| i >= components.len()) {
        return Err(EngineError::UnknownComponent {
            index,
            len: components.len(),
        });
    }

    let len = (duration_secs * sample_rate as f64) as usize;
    let mut data = vec![0.0f64; len];

    log::info!(
        "Synthesizing {} components into {:.1}s @ {}Hz",
        selection.len(),
        duration_secs,
        sample_rate
    );

    for &index in selection {
        let c = &components[index];
        let gain = component_gain(c.raw_amplitude, peak_amplitude);

        log::debug!(
            "  [{}] {:.1} Hz, gain {:.6}, phase {:.3} rad",
            index,
            c.frequency,
            gain,
            c.phase
        );

        for (n, sample) in data.iter_mut().enumerate() {
            let t = n as f64 / sample_rate as f64;
            *sample += gain * (2.0 * PI * c.frequency * t + c.phase).sin();
        }
    }

    let mut peak = 0.0f64;
    let mut trough = 0.0f64;
    let mut square_sum = 0.0f64;
    for &s in &data {
        if s > peak {
            peak = s;
        }
        if s < trough {
            trough = s;
        }
        square_sum += s * s;
    }
    let rms = if len > 0 {
        (square_sum / len as f64).sqrt()
    } else {
        0.0
    };

    let factor = normalization_factor(peak, trough, rms);
    if factor != 1.0 {
        log::info!(
            "Normalizing: peak {:.4}, rms {:.4}, factor {:.4}",
            peak,
            rms,
            factor
        );
        for s in &mut data {
            *s *= factor;
        }
    }

    let samples: Vec<f32> = data.into_iter().map(|s| s as f32).collect();
    Ok(SampleBuffer::new(samples, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(frequency: f64, raw_amplitude: f64, phase: f64) -> FrequencyComponent {
        FrequencyComponent {
            frequency,
            amplitude_db: 0.0,
            raw_amplitude,
            phase,
        }
    }

    #[test]
    fn test_empty_selection_fails() {
        let components = vec![component(440.0, 0.5, 0.0)];
        let err = synthesize(&components, 0.5, &BTreeSet::new(), 1.0, 8000).unwrap_err();
        assert!(matches!(err, EngineError::NoSelection));
    }

    #[test]
    fn test_out_of_range_index_fails() {
        let components = vec![component(440.0, 0.5, 0.0)];
        let selection: BTreeSet<usize> = [3].into_iter().collect();
        let err = synthesize(&components, 0.5, &selection, 1.0, 8000).unwrap_err();
        assert!(matches!(
            err,
            EngineError::UnknownComponent { index: 3, len: 1 }
        ));
    }

    #[test]
    fn test_gain_tiers() {
        // dominant: relative 1.0 → 1.0 · 0.4
        assert!((component_gain(0.5, 0.5) - 0.4).abs() < 1e-12);
        // significant: relative 0.3 → 0.3 · 0.3
        assert!((component_gain(0.15, 0.5) - 0.09).abs() < 1e-12);
        // minor: relative 0.05 → 0.05 · 0.2
        assert!((component_gain(0.025, 0.5) - 0.01).abs() < 1e-12);
        // floor
        assert!((component_gain(1e-9, 0.5) - GAIN_MIN).abs() < 1e-15);
        // zero peak never divides
        assert!((component_gain(0.5, 0.0) - GAIN_MIN).abs() < 1e-15);
    }

    #[test]
    fn test_non_finite_gain_clamps_to_floor() {
        assert_eq!(component_gain(f64::NAN, 0.5), GAIN_MIN);
        assert_eq!(component_gain(f64::INFINITY, 0.5), GAIN_MIN);
    }

    #[test]
    fn test_clip_correction_beats_loudness_boost() {
        // Both branches apply on paper; the clip check wins.
        let factor = normalization_factor(0.9, -1.2, 0.005);
        assert!((factor - 0.8 / 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_loudness_boost_capped() {
        let factor = normalization_factor(0.02, -0.02, 0.001);
        assert!((factor - MAX_BOOST).abs() < 1e-12);
    }

    #[test]
    fn test_quiet_but_not_too_quiet_left_alone() {
        assert_eq!(normalization_factor(0.5, -0.5, 0.05), 1.0);
    }

    #[test]
    fn test_silent_buffer_left_alone() {
        assert_eq!(normalization_factor(0.0, 0.0, 0.0), 1.0);
    }

    #[test]
    fn test_clip_priority_end_to_end() {
        // Three in-phase dominant components sum past the clip threshold.
        let components = vec![
            component(440.0, 0.5, 0.0),
            component(440.0, 0.5, 0.0),
            component(440.0, 0.5, 0.0),
        ];
        let selection: BTreeSet<usize> = [0, 1, 2].into_iter().collect();
        let buf = synthesize(&components, 0.5, &selection, 0.5, 8000).unwrap();

        let peak = buf.samples.iter().fold(0.0f32, |m, &s| m.max(s.abs()));
        assert!(peak <= 0.8 + 1e-4);
        assert!(peak > 0.7); // scaled down, not silenced
    }

    #[test]
    fn test_components_superpose() {
        let components = vec![component(300.0, 0.5, 0.3), component(700.0, 0.4, 1.2)];
        let both: BTreeSet<usize> = [0, 1].into_iter().collect();
        let only_a: BTreeSet<usize> = [0].into_iter().collect();
        let only_b: BTreeSet<usize> = [1].into_iter().collect();

        // Gains here keep every variant inside the no-normalization band.
        let ab = synthesize(&components, 0.5, &both, 0.25, 8000).unwrap();
        let a = synthesize(&components, 0.5, &only_a, 0.25, 8000).unwrap();
        let b = synthesize(&components, 0.5, &only_b, 0.25, 8000).unwrap();

        for i in 0..ab.samples.len() {
            let sum = a.samples[i] + b.samples[i];
            assert!((ab.samples[i] - sum).abs() < 1e-5);
        }
    }

    #[test]
    fn test_buffer_length_and_rate() {
        let components = vec![component(440.0, 0.5, 0.0)];
        let selection: BTreeSet<usize> = [0].into_iter().collect();
        let buf = synthesize(&components, 0.5, &selection, 2.0, 44100).unwrap();
        assert_eq!(buf.samples.len(), 88200);
        assert_eq!(buf.sample_rate, 44100);
    }
}
