//! Configuration for the band beat detector.
//!
//! ## Band layout
//!
//! The default configuration analyses three overlapping bands of the left
//! channel, matching the usual low/mid/high split for light shows:
//!
//! ```ignore
//! low:  20 -   500 Hz
//! mid:  300 -  2000 Hz
//! high: 2000 - 22000 Hz
//! ```
//!
//! Every field can be overridden from a TOML file; missing keys fall back
//! to the defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_FILTER_ORDER, DEFAULT_MIN_PEAK_DISTANCE_SECS, DEFAULT_MIN_THRESHOLD_FRACTION,
    DEFAULT_SAMPLE_RATE, DEFAULT_TRANSITION_HZ, DEFAULT_WINDOW_SECS, MAX_INT16,
};
use crate::error::{BeatError, Result};

/// Channel assignment for stereo input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChannelRole {
    /// Left channel (index 0 in interleaved stereo)
    Left,
    /// Right channel (index 1 in interleaved stereo)
    Right,
}

impl ChannelRole {
    /// Index of this channel inside an interleaved stereo frame
    pub fn index(self) -> usize {
        match self {
            ChannelRole::Left => 0,
            ChannelRole::Right => 1,
        }
    }

    /// The other channel of the stereo pair
    pub fn other(self) -> Self {
        match self {
            ChannelRole::Left => ChannelRole::Right,
            ChannelRole::Right => ChannelRole::Left,
        }
    }
}

/// Coefficient design method for band filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DesignMethod {
    /// Hamming-windowed sinc (robust for very narrow low bands)
    WindowedSinc,
    /// Parks-McClellan equiripple design
    Remez,
}

/// Top-level detector configuration
///
/// # Example
/// ```
/// use bandbeat::config::BeatConfig;
///
/// let mut config = BeatConfig::default();
/// config.detector.sensitivity = 0.8;
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BeatConfig {
    /// Audio input configuration
    pub audio: AudioConfig,
    /// Threshold, debounce and filter design parameters shared by all bands
    pub detector: DetectorConfig,
    /// Frequency bands, analysed in this order
    pub bands: Vec<BandSpec>,
}

/// Audio input configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Audio sample rate in Hz
    pub sample_rate: u32,
    /// Processing buffer size in frames
    pub buffer_size: usize,
    /// Number of audio channels (must be 2 for stereo)
    pub channels: u16,
    /// Which channel is analysed for beats
    pub analysis_channel: ChannelRole,
}

/// Detection parameters shared by every band
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Multiplier applied to the trailing window maximum to form the threshold
    pub sensitivity: f64,
    /// Absolute threshold floor in sample units
    pub min_threshold: f64,
    /// Trailing maximum window length in seconds
    pub window_secs: f64,
    /// Minimum spacing between peaks of one band in seconds
    pub min_peak_distance_secs: f64,
    /// How band filter coefficients are designed
    pub design: DesignMethod,
    /// Transition bandwidth for the equiripple designer in Hz
    pub transition_hz: f64,
    /// Band whose filtered output is traced and passed through for debugging
    pub debug_band: Option<usize>,
}

/// One analysed frequency band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandSpec {
    /// Human readable label used in output
    pub name: String,
    /// Lower band edge in Hz
    pub low_hz: f64,
    /// Upper band edge in Hz
    pub high_hz: f64,
    /// FIR order (the filter has `order + 1` taps)
    #[serde(default = "default_order")]
    pub order: usize,
}

fn default_order() -> usize {
    DEFAULT_FILTER_ORDER
}

impl BandSpec {
    pub fn new(name: impl Into<String>, low_hz: f64, high_hz: f64, order: usize) -> Self {
        Self {
            name: name.into(),
            low_hz,
            high_hz,
            order,
        }
    }
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            audio: AudioConfig::default(),
            detector: DetectorConfig::default(),
            bands: vec![
                BandSpec::new("low", 20.0, 500.0, DEFAULT_FILTER_ORDER),
                BandSpec::new("mid", 300.0, 2000.0, DEFAULT_FILTER_ORDER),
                BandSpec::new("high", 2000.0, 22000.0, DEFAULT_FILTER_ORDER),
            ],
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            buffer_size: 1024,
            channels: 2,
            analysis_channel: ChannelRole::Left,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            sensitivity: 1.0,
            min_threshold: MAX_INT16 * DEFAULT_MIN_THRESHOLD_FRACTION,
            window_secs: DEFAULT_WINDOW_SECS,
            min_peak_distance_secs: DEFAULT_MIN_PEAK_DISTANCE_SECS,
            design: DesignMethod::WindowedSinc,
            transition_hz: DEFAULT_TRANSITION_HZ,
            debug_band: None,
        }
    }
}

impl DetectorConfig {
    /// Trailing window length in samples for the given sample rate
    pub fn window_samples(&self, sample_rate: u32) -> usize {
        (self.window_secs * sample_rate as f64).round() as usize
    }

    /// Minimum peak spacing in samples for the given sample rate
    pub fn min_peak_distance_samples(&self, sample_rate: u32) -> u32 {
        (self.min_peak_distance_secs * sample_rate as f64).round() as u32
    }
}

impl BeatConfig {
    /// Parse a configuration from TOML text, filling gaps with defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| BeatError::Config(format!("TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file from disk
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Switch to the rate the audio actually arrives at
    ///
    /// Window and debounce lengths are kept in seconds, so they follow the
    /// new rate. Returns whether the rate changed.
    pub fn retarget_sample_rate(&mut self, sample_rate: u32) -> Result<bool> {
        if sample_rate == 0 {
            return Err(BeatError::Config("sample rate must be positive".into()));
        }
        if sample_rate == self.audio.sample_rate {
            return Ok(false);
        }
        self.audio.sample_rate = sample_rate;
        self.validate()?;
        Ok(true)
    }

    /// Check every field a detector is built from
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(BeatError::Config("sample rate must be positive".into()));
        }
        if self.audio.channels != 2 {
            return Err(BeatError::Config(format!(
                "expected 2 channels, got {}",
                self.audio.channels
            )));
        }

        let detector = &self.detector;
        if !detector.sensitivity.is_finite() || detector.sensitivity < 0.0 {
            return Err(BeatError::Config(format!(
                "sensitivity must be a non-negative number, got {}",
                detector.sensitivity
            )));
        }
        if !detector.min_threshold.is_finite() {
            return Err(BeatError::Config("min threshold must be finite".into()));
        }
        if !detector.min_peak_distance_secs.is_finite() || detector.min_peak_distance_secs < 0.0 {
            return Err(BeatError::Config(format!(
                "min peak distance must be non-negative, got {}s",
                detector.min_peak_distance_secs
            )));
        }
        if detector.window_samples(self.audio.sample_rate) == 0 {
            return Err(BeatError::Config(format!(
                "window of {}s is shorter than one sample",
                detector.window_secs
            )));
        }

        if self.bands.is_empty() {
            return Err(BeatError::Config("at least one band is required".into()));
        }
        for band in &self.bands {
            if band.order == 0 {
                return Err(BeatError::Config(format!(
                    "band '{}' needs a positive filter order",
                    band.name
                )));
            }
            if !(band.low_hz >= 0.0 && band.low_hz < band.high_hz) {
                return Err(BeatError::Config(format!(
                    "band '{}' has invalid edges {}-{} Hz",
                    band.name, band.low_hz, band.high_hz
                )));
            }
        }

        if let Some(index) = detector.debug_band
            && index >= self.bands.len()
        {
            return Err(BeatError::Config(format!(
                "debug band {} out of range (have {} bands)",
                index,
                self.bands.len()
            )));
        }

        Ok(())
    }
}
