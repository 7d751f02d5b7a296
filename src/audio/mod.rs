pub mod capture;
pub mod decode;
pub mod playback;

/// A single-channel clip of audio samples. The captured clip and the
/// synthesized clip are distinct instances with independent lifetimes.
#[derive(Clone, Debug)]
pub struct SampleBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}
