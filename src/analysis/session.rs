use std::collections::BTreeSet;

use super::select::FrequencyComponent;
use crate::audio::SampleBuffer;
use crate::error::EngineError;
use crate::synth;

/// State of one completed analysis run: the ranked component list and the
/// peak amplitude every relative-level computation normalizes against.
///
/// A new run replaces the whole session; the list is never mutated in place,
/// so component indices stay stable for selection.
#[derive(Clone, Debug)]
pub struct AnalysisSession {
    pub sample_rate: u32,
    pub peak_amplitude: f64,
    pub components: Vec<FrequencyComponent>,
    synthesized: Option<SampleBuffer>,
}

impl AnalysisSession {
    pub fn new(
        sample_rate: u32,
        peak_amplitude: f64,
        components: Vec<FrequencyComponent>,
    ) -> Self {
        Self {
            sample_rate,
            peak_amplitude,
            components,
            synthesized: None,
        }
    }

    pub fn component(&self, index: usize) -> Option<&FrequencyComponent> {
        self.components.get(index)
    }

    /// Relative level of one component against the run peak, in [0, 1].
    pub fn relative_amplitude(&self, component: &FrequencyComponent) -> f64 {
        if self.peak_amplitude > 0.0 {
            component.raw_amplitude / self.peak_amplitude
        } else {
            0.0
        }
    }

    /// Synthesize the selected components and replace the session's
    /// synthesized buffer. On failure the previous buffer stays untouched.
    pub fn render_selection(
        &mut self,
        selection: &BTreeSet<usize>,
        duration_secs: f64,
        sample_rate: u32,
    ) -> Result<&SampleBuffer, EngineError> {
        let buffer = synth::synthesize(
            &self.components,
            self.peak_amplitude,
            selection,
            duration_secs,
            sample_rate,
        )?;
        Ok(self.synthesized.insert(buffer))
    }

    pub fn synthesized(&self) -> Option<&SampleBuffer> {
        self.synthesized.as_ref()
    }
}
