use anyhow::{Context, Result};
use bandbeat::save_wav;
use bandbeat::simulation::{
    AdditiveNoiseConfig, ClickVoice, ImpulseNoiseConfig, NoiseConfig, apply_noise,
    generate_click_track, to_stereo_i16,
};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "generate_wav")]
#[command(about = "Generate synthetic click-track WAV files with configurable noise for beat detection testing")]
struct Args {
    /// TOML voice and noise configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "data/synthetic")]
    output_dir: PathBuf,

    /// Tempos in BPM: comma-separated (e.g., "90,120,140") or range (e.g., "60-180:20")
    #[arg(short, long, default_value = "60-180:20")]
    tempos: String,

    /// Number of trials per tempo
    #[arg(long, default_value_t = 3)]
    trials: u32,

    /// Base seed for reproducibility
    #[arg(short, long)]
    seed: Option<u64>,

    /// Signal duration in seconds
    #[arg(short, long, default_value_t = 10.0)]
    duration: f32,

    /// Sample rate in Hz
    #[arg(long, default_value_t = 44100)]
    sample_rate: u32,

    /// Tone of the primary click voice in Hz
    #[arg(long, default_value_t = 1000.0)]
    tone_hz: f32,

    /// Amplitude of the primary click voice (0-1)
    #[arg(long, default_value_t = 0.8)]
    amplitude: f32,

    /// Output filename prefix
    #[arg(long, default_value = "clicks")]
    prefix: String,

    /// Generate manifest.json
    #[arg(long)]
    manifest: bool,

    /// AWGN SNR in dB (CLI override)
    #[arg(long)]
    snr: Option<f32>,

    /// Impulse noise rate in Hz (CLI override)
    #[arg(long)]
    impulse_rate: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlConfig {
    /// Extra voices mixed on top of the primary tempo voice
    voices: Option<Vec<ClickVoice>>,
    awgn: Option<AwgnSection>,
    impulse: Option<ImpulseSection>,
}

#[derive(Debug, Deserialize)]
struct AwgnSection {
    snr_db: f32,
}

#[derive(Debug, Deserialize)]
struct ImpulseSection {
    rate_hz: f32,
    amplitude: f32,
    duration_samples: usize,
}

#[derive(Debug, serde::Serialize)]
struct ManifestEntry {
    file: String,
    bpm: f32,
    trial: u32,
    seed: u64,
    onsets_ms: Vec<f32>,
}

#[derive(Debug, serde::Serialize)]
struct Manifest {
    sample_rate: u32,
    tone_hz: f32,
    duration: f32,
    files: Vec<ManifestEntry>,
}

fn parse_tempos(s: &str) -> Result<Vec<f32>> {
    let Some((range, step)) = s.split_once(':') else {
        return s
            .split(',')
            .map(|p| p.trim().parse::<f32>().context("Invalid tempo value"))
            .collect();
    };

    let (start, end) = range
        .split_once('-')
        .context("Invalid range format. Use 'start-end:step'")?;
    let start: f32 = start.trim().parse().context("Invalid start value")?;
    let end: f32 = end.trim().parse().context("Invalid end value")?;
    let step: f32 = step.trim().parse().context("Invalid step value")?;
    if step <= 0.0 {
        anyhow::bail!("Range step must be positive");
    }

    let count = ((end - start) / step).floor().max(-1.0) as i64 + 1;
    Ok((0..count).map(|k| start + k as f32 * step).collect())
}

fn load_toml_config(path: &PathBuf) -> Result<TomlConfig> {
    let content = fs::read_to_string(path).context("Failed to read config file")?;
    toml::from_str(&content).context("Failed to parse config file")
}

fn build_noise_config(toml: &TomlConfig, args: &Args, seed: u64) -> NoiseConfig {
    let mut config = NoiseConfig::default().with_seed(seed);

    if let Some(snr) = args.snr {
        config.additive = Some(AdditiveNoiseConfig { snr_db: snr });
    } else if let Some(ref awgn) = toml.awgn {
        config.additive = Some(AdditiveNoiseConfig {
            snr_db: awgn.snr_db,
        });
    }

    if let Some(impulse_rate) = args.impulse_rate {
        config.impulse = Some(ImpulseNoiseConfig {
            rate_hz: impulse_rate,
            amplitude: 0.5,
            duration_samples: 3,
        });
    } else if let Some(ref impulse) = toml.impulse {
        config.impulse = Some(ImpulseNoiseConfig {
            rate_hz: impulse.rate_hz,
            amplitude: impulse.amplitude,
            duration_samples: impulse.duration_samples,
        });
    }

    config
}

fn build_voices(toml: &TomlConfig, args: &Args, bpm: f32) -> Vec<ClickVoice> {
    let mut voices = vec![ClickVoice::new(bpm, args.tone_hz, args.amplitude)];
    if let Some(ref extra) = toml.voices {
        voices.extend(extra.iter().cloned());
    }
    voices
}

fn main() -> Result<()> {
    let args = Args::parse();

    fs::create_dir_all(&args.output_dir).context("Failed to create output directory")?;

    let toml_config = if let Some(ref config_path) = args.config {
        load_toml_config(config_path)?
    } else {
        TomlConfig::default()
    };

    let tempos = parse_tempos(&args.tempos)?;
    let base_seed = args.seed.unwrap_or(0);
    let num_samples = (args.duration * args.sample_rate as f32) as usize;

    let mut manifest_entries = Vec::new();
    let total_files = tempos.len() * args.trials as usize;
    let mut file_count = 0;

    for &bpm in &tempos {
        for trial in 0..args.trials {
            let seed = base_seed + trial as u64 * 1000 + bpm as u64;
            let noise_config = build_noise_config(&toml_config, &args, seed);
            let voices = build_voices(&toml_config, &args, bpm);

            let mut mono = generate_click_track(args.duration, args.sample_rate, &voices);
            apply_noise(&mut mono, &noise_config, args.sample_rate as f32);
            let signal = to_stereo_i16(&mono);

            let filename = format!("{}_{:03}bpm_t{:02}.wav", args.prefix, bpm as i32, trial);
            let filepath = args.output_dir.join(&filename);

            save_wav(
                filepath
                    .to_str()
                    .ok_or_else(|| anyhow::anyhow!("Invalid path"))?,
                &signal,
                args.sample_rate,
            )
            .context("Failed to write WAV file")?;

            let onsets_ms = voices[0]
                .onsets(args.sample_rate, num_samples)
                .into_iter()
                .map(|n| n as f32 * 1000.0 / args.sample_rate as f32)
                .collect();

            manifest_entries.push(ManifestEntry {
                file: filename,
                bpm,
                trial,
                seed,
                onsets_ms,
            });

            file_count += 1;
            eprint!("\rGenerating: {}/{}", file_count, total_files);
        }
    }
    eprintln!();

    if args.manifest {
        let manifest = Manifest {
            sample_rate: args.sample_rate,
            tone_hz: args.tone_hz,
            duration: args.duration,
            files: manifest_entries,
        };
        let manifest_path = args.output_dir.join("manifest.json");
        let manifest_json =
            serde_json::to_string_pretty(&manifest).context("Failed to serialize manifest")?;
        fs::write(&manifest_path, manifest_json).context("Failed to write manifest")?;
        eprintln!("Manifest written to: {}", manifest_path.display());
    }

    eprintln!(
        "Generated {} files in {}",
        total_files,
        args.output_dir.display()
    );
    Ok(())
}
