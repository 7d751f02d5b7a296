use std::collections::{BTreeSet, HashMap};

use crate::audio::playback::Playback;
use crate::error::EngineError;

const AUDITION_GAIN_COEFF: f64 = 0.15;
const AUDITION_GAIN_MIN: f64 = 0.001;
const AUDITION_GAIN_MAX: f64 = 0.3;
const AUDITION_FALLBACK_GAIN: f64 = 0.05;

/// Tone gain for auditioning one component on its own. A lower-headroom
/// tier than synthesis, since only a single tone plays at a time. Falls back
/// to a fixed quiet gain when the run peak or the component amplitude is
/// zero.
pub fn audition_gain(raw_amplitude: f64, peak_amplitude: f64) -> f64 {
    if peak_amplitude > 0.0 && raw_amplitude > 0.0 {
        let gain = (raw_amplitude / peak_amplitude) * AUDITION_GAIN_COEFF;
        if !gain.is_finite() {
            return AUDITION_GAIN_MIN;
        }
        gain.clamp(AUDITION_GAIN_MIN, AUDITION_GAIN_MAX)
    } else {
        AUDITION_FALLBACK_GAIN
    }
}

/// Which components of the current list are selected, tracked as an index
/// set external to any UI, plus the audition handle playing for each toggled
/// component. Handles for different components never interfere.
pub struct SelectionState {
    len: usize,
    selected: BTreeSet<usize>,
    playing: HashMap<usize, Box<dyn Playback>>,
}

impl SelectionState {
    /// Fresh, empty selection over a component list of `len` entries.
    pub fn new(len: usize) -> Self {
        Self {
            len,
            selected: BTreeSet::new(),
            playing: HashMap::new(),
        }
    }

    pub fn selected(&self) -> &BTreeSet<usize> {
        &self.selected
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    /// Toggle one component. Turning it on starts an audition tone via
    /// `start`; a failed start leaves the toggle unset and is only logged.
    /// Turning it off stops exactly that component's handle. Returns the new
    /// toggle state.
    pub fn toggle<F>(&mut self, index: usize, start: F) -> bool
    where
        F: FnOnce() -> Result<Box<dyn Playback>, EngineError>,
    {
        if index >= self.len {
            log::warn!("Toggle ignored: index {} out of range ({})", index, self.len);
            return false;
        }

        if self.selected.remove(&index) {
            if let Some(mut handle) = self.playing.remove(&index) {
                handle.stop();
            }
            false
        } else {
            match start() {
                Ok(handle) => {
                    self.selected.insert(index);
                    self.playing.insert(index, handle);
                    true
                }
                Err(e) => {
                    log::warn!("Audition failed for component {}: {}", index, e);
                    false
                }
            }
        }
    }

    /// Mark one index without starting playback. Out-of-range indices are
    /// ignored. Returns whether the index is now selected.
    pub fn mark(&mut self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        self.selected.insert(index);
        true
    }

    /// Mark every index. Starts no playback.
    pub fn select_all(&mut self) {
        for index in 0..self.len {
            self.selected.insert(index);
        }
    }

    /// Clear the selection and stop every playing audition handle. Returns
    /// how many handles were stopped.
    pub fn deselect_all(&mut self) -> usize {
        let stopped = self.playing.len();
        for (_, mut handle) in self.playing.drain() {
            handle.stop();
        }
        self.selected.clear();
        stopped
    }
}
