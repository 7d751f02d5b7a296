use std::f64::consts::PI;

/// Hamming taper over `len` samples plus the normalization factor
/// (`len / Σ weight`). Immutable once built; pure function of the length.
#[derive(Clone, Debug)]
pub struct HammingWindow {
    pub weights: Vec<f64>,
    pub normalization: f64,
}

impl HammingWindow {
    pub fn new(len: usize) -> Self {
        let weights: Vec<f64> = (0..len)
            .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (len as f64 - 1.0)).cos())
            .collect();
        let sum: f64 = weights.iter().sum();
        let normalization = if sum > 0.0 { len as f64 / sum } else { 1.0 };
        Self {
            weights,
            normalization,
        }
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }
}
