mod analysis;
mod audio;
mod audition;
mod cli;
mod config;
mod error;
mod synth;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::time::Duration;

use analysis::select;
use analysis::session::AnalysisSession;
use audio::playback::{OutputDevice, Playback};
use audio::SampleBuffer;
use audition::SelectionState;
use cli::Cli;
use error::EngineError;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect resyn.toml / global config
    let config_path = cli.config.clone().or_else(|| {
        let local = std::path::PathBuf::from("resyn.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("resyn").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("resyn").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    });
    let mut fallback_rate = 44100u32;
    if let Some(ref path) = config_path {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            // Merge: config values apply only when CLI is at its default
            if cli.transform_size == 16384 {
                cli.transform_size = cfg.analysis.transform_size;
            }
            if cli.duration == synth::SYNTHESIS_DURATION_SECS {
                cli.duration = cfg.synthesis.duration;
            }
            fallback_rate = cfg.synthesis.sample_rate;
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    log::info!("resyn - spectral analysis and additive resynthesis");

    // 1. Acquire a sample buffer (recorded clip or decoded file)
    let captured = if let Some(seconds) = cli.record {
        audio::capture::record_clip(seconds)?
    } else if let Some(ref input) = cli.input {
        if !input.exists() {
            anyhow::bail!("Input file not found: {}", input.display());
        }
        log::info!("Input: {}", input.display());
        audio::decode::decode_file(input)?
    } else {
        return Err(EngineError::NoAudioData)
            .context("pass an input file or use --record SECONDS");
    };

    log::info!(
        "Clip: {:.2}s @ {}Hz ({} samples)",
        captured.duration_secs(),
        captured.sample_rate,
        captured.samples.len()
    );

    // 2. Analyze (window + direct transform + component selection)
    let mut session = analysis::analyze(&captured, cli.transform_size)?;
    if session.components.is_empty() {
        log::warn!("No components passed the threshold; using diagnostic probe tones");
        session = AnalysisSession::new(
            captured.sample_rate,
            session.peak_amplitude,
            select::probe_tones(session.peak_amplitude),
        );
    }

    // 3. Ranked component table
    println!("rank  frequency     level              phase");
    for (i, c) in session.components.iter().enumerate() {
        let relative = session.relative_amplitude(c);
        println!(
            "{:>4}  {:>8.1} Hz  {:>6.1} dB ({:>5.1}%)  {:>7.1}°",
            i,
            c.frequency,
            c.amplitude_db,
            relative * 100.0,
            c.phase.to_degrees()
        );
    }
    if cli.list_only {
        return Ok(());
    }

    // 4. Work out which component indices take part
    let chosen: Vec<usize> = if !cli.components.is_empty() {
        for &index in &cli.components {
            if index >= session.components.len() {
                anyhow::bail!(EngineError::UnknownComponent {
                    index,
                    len: session.components.len(),
                });
            }
        }
        cli.components.clone()
    } else if let Some(top) = cli.top {
        (0..top.min(session.components.len())).collect()
    } else {
        (0..session.components.len()).collect()
    };

    // 5. Audition each chosen component as a bare tone (optional). Toggled
    // tones layer up like the original's checkboxes; deselect-all stops
    // whatever is still sounding.
    let mut selection = SelectionState::new(session.components.len());
    if let Some(seconds) = cli.audition {
        match OutputDevice::open() {
            Ok(device) => {
                for &index in &chosen {
                    let c = &session.components[index];
                    let gain =
                        audition::audition_gain(c.raw_amplitude, session.peak_amplitude);
                    let started = selection.toggle(index, || {
                        device
                            .play_tone(c.frequency, gain, c.phase)
                            .map(|h| Box::new(h) as Box<dyn Playback>)
                    });
                    // A failed audition is never fatal; the component just
                    // doesn't get its preview.
                    if started {
                        log::info!("Auditioning [{}] {:.1} Hz", index, c.frequency);
                        std::thread::sleep(Duration::from_secs_f32(seconds));
                    }
                }
                let stopped = selection.deselect_all();
                log::info!("Stopped {} audition tones", stopped);
            }
            Err(e) => log::warn!("Skipping audition: {}", e),
        }
    }

    // 6. Build the synthesis selection
    if chosen.len() == session.components.len() {
        selection.select_all();
    } else {
        for &index in &chosen {
            selection.mark(index);
        }
    }
    log::info!("Selected {} components", selection.selected().len());

    // 7. Synthesize at the playback device's native rate
    let device = if cli.play || cli.compare {
        match OutputDevice::open() {
            Ok(d) => Some(d),
            Err(e) => {
                log::warn!("Playback unavailable, writing WAV only: {}", e);
                None
            }
        }
    } else {
        None
    };
    let sample_rate = device
        .as_ref()
        .map(|d| d.sample_rate())
        .unwrap_or(fallback_rate);

    let synthesized = session
        .render_selection(selection.selected(), cli.duration, sample_rate)?
        .clone();

    // 8. Write the synthesized clip
    write_wav(&cli.output, &synthesized)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;
    log::info!("Wrote {}", cli.output.display());

    // 9. Playback and comparison against the original
    if let Some(device) = device {
        log::info!("Playing synthesized clip...");
        let handle = device.play_buffer(&synthesized)?;
        handle.wait();

        if cli.compare {
            log::info!("Playing original recording for comparison...");
            let handle = device.play_buffer(&captured)?;
            handle.wait();
        }
    }

    log::info!("Done! Output: {}", cli.output.display());
    Ok(())
}

fn write_wav(path: &Path, buffer: &SampleBuffer) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in &buffer.samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}
