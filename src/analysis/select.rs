use std::f64::consts::PI;

use super::spectrum::FrequencyBin;

/// At most this many components survive ranking.
pub const COMPONENT_CAP: usize = 100;

/// Dynamic threshold coefficients: (share of mean non-zero amplitude,
/// share of peak amplitude, absolute floor).
const THRESHOLD_MEAN_COEFF: f64 = 0.02;
const THRESHOLD_PEAK_COEFF: f64 = 0.001;
const THRESHOLD_FLOOR: f64 = 1e-8;

/// A bin that passed the threshold test, ready for audition and synthesis.
#[derive(Clone, Debug)]
pub struct FrequencyComponent {
    pub frequency: f64,
    /// Decibels relative to the run's peak amplitude; display only, always
    /// finite (zero-magnitude bins never get here).
    pub amplitude_db: f64,
    /// Linear amplitude; all ranking, threshold and gain math uses this.
    pub raw_amplitude: f64,
    pub phase: f64,
}

/// Data-dependent cutoff below which bins are discarded as noise. Bin 0 (DC)
/// is excluded from the mean.
pub fn dynamic_threshold(bins: &[FrequencyBin], peak_amplitude: f64) -> f64 {
    let mut sum = 0.0f64;
    let mut count = 0usize;
    for bin in bins.iter().skip(1) {
        if bin.amplitude > 0.0 {
            sum += bin.amplitude;
            count += 1;
        }
    }
    let avg = if count > 0 { sum / count as f64 } else { 0.0 };

    (avg * THRESHOLD_MEAN_COEFF)
        .max(peak_amplitude * THRESHOLD_PEAK_COEFF)
        .max(THRESHOLD_FLOOR)
}

/// Filter bins against the dynamic threshold and rank the survivors by raw
/// amplitude, strongest first. Ties keep ascending bin order (the sort is
/// stable), and the list is capped at [`COMPONENT_CAP`] entries.
///
/// An empty result is not an error; callers fall back to [`probe_tones`].
pub fn rank_components(bins: &[FrequencyBin], peak_amplitude: f64) -> Vec<FrequencyComponent> {
    let threshold = dynamic_threshold(bins, peak_amplitude);
    log::info!("Dynamic threshold: {:.3e}", threshold);

    let mut components: Vec<FrequencyComponent> = bins
        .iter()
        .skip(1) // DC carries no tone
        .filter_map(|bin| {
            if bin.amplitude <= threshold {
                return None;
            }
            let amplitude_db = 20.0 * (bin.amplitude / peak_amplitude).log10();
            if !amplitude_db.is_finite() {
                return None;
            }
            Some(FrequencyComponent {
                frequency: bin.frequency,
                amplitude_db,
                raw_amplitude: bin.amplitude,
                phase: bin.phase,
            })
        })
        .collect();

    components.sort_by(|a, b| b.raw_amplitude.partial_cmp(&a.raw_amplitude).unwrap());
    components.truncate(COMPONENT_CAP);

    log::info!("Selected {} components", components.len());
    components
}

/// Fixed diagnostic set for runs where nothing passed the threshold: three
/// probe tones at 440/880/1320 Hz with staggered phases.
pub fn probe_tones(peak_amplitude: f64) -> Vec<FrequencyComponent> {
    let base = if peak_amplitude > 0.0 {
        peak_amplitude
    } else {
        0.1
    };
    [
        (440.0, base, 0.0),
        (880.0, base * 0.5, PI / 4.0),
        (1320.0, base * 0.25, PI / 2.0),
    ]
    .into_iter()
    .map(|(frequency, raw_amplitude, phase)| FrequencyComponent {
        frequency,
        amplitude_db: 20.0 * (raw_amplitude / base).log10(),
        raw_amplitude,
        phase,
    })
    .collect()
}
