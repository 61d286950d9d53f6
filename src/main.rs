use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use bandbeat::audio::{AudioSource, DeviceSource};
use bandbeat::config::{BeatConfig, ChannelRole};
use bandbeat::output::{OutputFormat, PeakOutput, create_formatter};
use bandbeat::processing::StreamAnalyzer;

#[derive(Parser, Debug)]
#[command(name = "bandbeat")]
#[command(about = "Live multi-band beat detection from the default input device", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format: text, json, csv
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Channel to analyse
    #[arg(long, value_enum)]
    channel: Option<ChannelRole>,

    /// Threshold sensitivity multiplier
    #[arg(long)]
    sensitivity: Option<f64>,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
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
    config.validate()?;

    println!("=== bandbeat ===");
    println!("Sample rate: {} Hz", config.audio.sample_rate);
    println!("Channel: {:?}", config.audio.analysis_channel);
    for band in &config.bands {
        println!(
            "Band '{}': {}-{} Hz (order {})",
            band.name, band.low_hz, band.high_hz, band.order
        );
    }
    println!();

    let mut source = DeviceSource::new(&config.audio)?;
    let configured_rate = config.audio.sample_rate;
    if config.retarget_sample_rate(source.sample_rate())? {
        log::warn!(
            "Device runs at {} Hz instead of the configured {} Hz, detecting at device rate",
            source.sample_rate(),
            configured_rate
        );
    }

    let mut analyzer = StreamAnalyzer::new(&config)?;
    let band_names: Vec<String> = config.bands.iter().map(|b| b.name.clone()).collect();
    let formatter = create_formatter(args.format, args.verbose > 0);

    if let Some(header) = formatter.header() {
        println!("{}", header);
    }

    while let Some(mut frames) = source.next_buffer()? {
        let peaks = match analyzer.process_frames(&mut frames) {
            Ok(peaks) => peaks,
            Err(e) => {
                log::warn!("Dropping buffer: {}", e);
                continue;
            }
        };

        for event in &peaks {
            let output = PeakOutput {
                event,
                band_name: &band_names[event.band],
            };
            println!("{}", formatter.format(&output));
        }
    }

    log::info!("Audio stream closed after {} frames", analyzer.frames_processed());
    Ok(())
}
