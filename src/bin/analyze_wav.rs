use anyhow::Context;
use clap::Parser;
use rolling_stats::Stats;
use serde::Serialize;
use std::path::{Path, PathBuf};

use bandbeat::audio::{AudioSource, WavFileSource};
use bandbeat::config::{BeatConfig, ChannelRole, DesignMethod};
use bandbeat::processing::StreamAnalyzer;

#[derive(Parser, Debug)]
#[command(name = "analyze_wav")]
#[command(about = "Analyze WAV files for per-band beat and tempo statistics", long_about = None)]
struct Args {
    /// WAV files to analyze
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output format: text, csv, json
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Channel to analyse
    #[arg(long, value_enum)]
    channel: Option<ChannelRole>,

    /// Threshold sensitivity multiplier
    #[arg(long)]
    sensitivity: Option<f64>,

    /// Absolute threshold floor in 16-bit sample units
    #[arg(long)]
    min_threshold: Option<f64>,

    /// Filter design method
    #[arg(long, value_enum)]
    design: Option<DesignMethod>,

    /// Dump the filtered output of this band (see --dump-audio)
    #[arg(long)]
    debug_band: Option<usize>,

    /// Directory for filtered WAV dumps (requires --debug-band)
    #[arg(long, requires = "debug_band")]
    dump_audio: Option<PathBuf>,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Csv,
    Json,
}

#[derive(Debug, Clone, Serialize)]
struct StatsSummary {
    count: usize,
    mean: f32,
    std_dev: f32,
    min: f32,
    max: f32,
}

impl StatsSummary {
    fn from_stats(stats: &Stats<f32>) -> Option<Self> {
        if stats.count == 0 {
            return None;
        }
        Some(Self {
            count: stats.count,
            mean: stats.mean,
            std_dev: stats.std_dev,
            min: stats.min,
            max: stats.max,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
struct BandAnalysis {
    name: String,
    peaks: usize,
    bpm: Option<StatsSummary>,
    interval_ms: Option<StatsSummary>,
    last_bpm: u32,
}

#[derive(Debug, Clone, Serialize)]
struct FileAnalysis {
    filename: String,
    frames: u64,
    duration_secs: f32,
    bands: Vec<BandAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut config = match args.config {
        Some(ref path) => BeatConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => BeatConfig::default(),
    };
    if let Some(channel) = args.channel {
        config.audio.analysis_channel = channel;
    }
    if let Some(sensitivity) = args.sensitivity {
        config.detector.sensitivity = sensitivity;
    }
    if let Some(min_threshold) = args.min_threshold {
        config.detector.min_threshold = min_threshold;
    }
    if let Some(design) = args.design {
        config.detector.design = design;
    }
    if args.debug_band.is_some() {
        config.detector.debug_band = args.debug_band;
    }

    let results: Vec<FileAnalysis> = args
        .files
        .iter()
        .map(|path| analyze_file(path, &config, args.dump_audio.as_deref()))
        .collect();

    match args.format {
        OutputFormat::Text => print_text(&results),
        OutputFormat::Csv => print_csv(&results),
        OutputFormat::Json => print_json(&results)?,
    }

    Ok(())
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn analyze_file(path: &Path, config: &BeatConfig, dump_audio: Option<&Path>) -> FileAnalysis {
    match analyze_file_impl(path, config, dump_audio) {
        Ok(analysis) => analysis,
        Err(e) => FileAnalysis {
            filename: file_label(path),
            frames: 0,
            duration_secs: 0.0,
            bands: Vec::new(),
            error: Some(format!("{:#}", e)),
        },
    }
}

fn analyze_file_impl(
    path: &Path,
    config: &BeatConfig,
    dump_audio: Option<&Path>,
) -> anyhow::Result<FileAnalysis> {
    let chunk_size = config.audio.buffer_size * 2;
    let mut source: Box<dyn AudioSource> = Box::new(WavFileSource::new(path, chunk_size)?);

    let mut config = config.clone();
    if config.retarget_sample_rate(source.sample_rate())? {
        log::info!(
            "{}: using file sample rate {} Hz",
            path.display(),
            source.sample_rate()
        );
    }

    let mut analyzer = StreamAnalyzer::new(&config)?;
    let band_count = config.bands.len();

    let mut bpm_stats: Vec<Stats<f32>> = (0..band_count).map(|_| Stats::new()).collect();
    let mut interval_stats: Vec<Stats<f32>> = (0..band_count).map(|_| Stats::new()).collect();
    let mut peak_counts = vec![0usize; band_count];
    let mut last_peak_ms: Vec<Option<u64>> = vec![None; band_count];

    let mut dump_samples: Vec<i16> = Vec::new();

    while let Some(mut frames) = source.next_buffer()? {
        let peaks = analyzer.process_frames(&mut frames)?;

        for event in &peaks {
            peak_counts[event.band] += 1;
            // The first peak of a band has no predecessor to measure tempo against.
            if event.bpm > 0 {
                bpm_stats[event.band].update(event.bpm as f32);
            }
            if let Some(last) = last_peak_ms[event.band] {
                interval_stats[event.band].update(event.elapsed_ms.saturating_sub(last) as f32);
            }
            last_peak_ms[event.band] = Some(event.elapsed_ms);
        }

        if dump_audio.is_some() {
            dump_samples.extend_from_slice(&frames);
        }
    }

    if let Some(dump_dir) = dump_audio {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string());
        let dump_path = dump_dir.join(format!("{}_filtered.wav", stem));
        eprintln!(
            "Writing {} frames to {}",
            dump_samples.len() / 2,
            dump_path.display()
        );
        bandbeat::save_wav(
            dump_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Invalid path"))?,
            &dump_samples,
            config.audio.sample_rate,
        )?;
    }

    let bank = analyzer.bank();
    let bands = (0..band_count)
        .map(|i| BandAnalysis {
            name: config.bands[i].name.clone(),
            peaks: peak_counts[i],
            bpm: StatsSummary::from_stats(&bpm_stats[i]),
            interval_ms: StatsSummary::from_stats(&interval_stats[i]),
            last_bpm: bank.band(i).map(|b| b.bpm()).unwrap_or(0),
        })
        .collect();

    let frames = analyzer.frames_processed();
    Ok(FileAnalysis {
        filename: file_label(path),
        frames,
        duration_secs: frames as f32 / config.audio.sample_rate as f32,
        bands,
        error: None,
    })
}

fn print_text(results: &[FileAnalysis]) {
    println!(
        "{:<40} {:<8} {:>7} {:>9} {:>8} {:>12}",
        "File", "Band", "Peaks", "BPM", "Std", "Interval ms"
    );
    println!("{}", "-".repeat(89));

    for result in results {
        if let Some(ref err) = result.error {
            println!("{:<40} ERROR: {}", result.filename, err);
            continue;
        }

        for band in &result.bands {
            let bpm_mean = band
                .bpm
                .as_ref()
                .map(|s| format!("{:.1}", s.mean))
                .unwrap_or_else(|| "-".to_string());
            let bpm_std = band
                .bpm
                .as_ref()
                .map(|s| format!("{:.1}", s.std_dev))
                .unwrap_or_else(|| "-".to_string());
            let interval = band
                .interval_ms
                .as_ref()
                .map(|s| format!("{:.1}", s.mean))
                .unwrap_or_else(|| "-".to_string());

            println!(
                "{:<40} {:<8} {:>7} {:>9} {:>8} {:>12}",
                result.filename, band.name, band.peaks, bpm_mean, bpm_std, interval
            );
        }
    }

    for result in results {
        if result.error.is_none() {
            eprintln!();
            eprintln!(
                "{}: {} frames ({:.2} s)",
                result.filename, result.frames, result.duration_secs
            );
        }
    }
}

fn print_csv(results: &[FileAnalysis]) {
    println!("filename,band,peaks,bpm_mean,bpm_std,bpm_min,bpm_max,interval_ms_mean,last_bpm,error");
    for result in results {
        if let Some(ref err) = result.error {
            println!("{},,,,,,,,,{}", result.filename, err);
            continue;
        }
        for band in &result.bands {
            let bpm = |f: fn(&StatsSummary) -> f32| {
                band.bpm
                    .as_ref()
                    .map(|s| format!("{:.2}", f(s)))
                    .unwrap_or_default()
            };
            let interval = band
                .interval_ms
                .as_ref()
                .map(|s| format!("{:.2}", s.mean))
                .unwrap_or_default();

            println!(
                "{},{},{},{},{},{},{},{},{},",
                result.filename,
                band.name,
                band.peaks,
                bpm(|s| s.mean),
                bpm(|s| s.std_dev),
                bpm(|s| s.min),
                bpm(|s| s.max),
                interval,
                band.last_bpm
            );
        }
    }
}

fn print_json(results: &[FileAnalysis]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    println!("{}", json);
    Ok(())
}
