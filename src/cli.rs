use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "resyn", about = "Spectral analysis and additive resynthesis of short audio clips")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: Option<PathBuf>,

    /// Record from the default input device instead of reading a file (seconds)
    #[arg(short, long, value_name = "SECONDS")]
    pub record: Option<f32>,

    /// Output WAV file for the synthesized clip
    #[arg(short, long, default_value = "resynth.wav")]
    pub output: PathBuf,

    /// Component indices to synthesize (0-based ranks, comma-separated; default: all)
    #[arg(long, value_delimiter = ',')]
    pub components: Vec<usize>,

    /// Keep only the N strongest components
    #[arg(long)]
    pub top: Option<usize>,

    /// Transform size (bin count = size/2)
    #[arg(long, default_value_t = 16384)]
    pub transform_size: usize,

    /// Synthesized clip duration in seconds
    #[arg(long, default_value_t = 2.0)]
    pub duration: f64,

    /// Play the synthesized clip on the default output device
    #[arg(short, long)]
    pub play: bool,

    /// After playing the synthesized clip, play the original for comparison
    #[arg(long)]
    pub compare: bool,

    /// Audition each selected component as a bare tone before synthesis
    #[arg(long, value_name = "SECONDS")]
    pub audition: Option<f32>,

    /// Print the ranked component table and exit without synthesizing
    #[arg(long)]
    pub list_only: bool,

    /// Config file path (default: resyn.toml or ~/.config/resyn/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}
