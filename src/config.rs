use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_transform_size")]
    pub transform_size: usize,
}

#[derive(Debug, Deserialize)]
pub struct SynthesisConfig {
    #[serde(default = "default_duration")]
    pub duration: f64,
    /// Sample rate used when no output device is available to ask.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            transform_size: default_transform_size(),
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            duration: default_duration(),
            sample_rate: default_sample_rate(),
        }
    }
}

fn default_transform_size() -> usize { 16384 }
fn default_duration() -> f64 { crate::synth::SYNTHESIS_DURATION_SECS }
fn default_sample_rate() -> u32 { 44100 }

pub fn load_config(path: &PathBuf) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}
