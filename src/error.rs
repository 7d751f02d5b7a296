use thiserror::Error;

/// Failures the analysis/synthesis engine can report. All of them are
/// recoverable by retrying the triggering action; none aborts the process.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no captured audio available; record a clip or pass an input file")]
    NoAudioData,

    #[error("failed to decode audio: {0}")]
    DecodeFailure(String),

    #[error("no components selected; pick at least one before synthesizing")]
    NoSelection,

    #[error("component index {index} is out of range ({len} components)")]
    UnknownComponent { index: usize, len: usize },

    #[error("no audio device available: {0}")]
    DeviceUnavailable(String),

    #[error("audio stream error: {0}")]
    Stream(String),
}
