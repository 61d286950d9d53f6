pub mod audio;
pub mod band;
pub mod bank;
pub mod config;
pub mod constants;
pub mod error;
pub mod output;
pub mod processing;
pub mod signal_processing;
pub mod wav;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use band::{Band, BandParams};
pub use bank::{BandBank, PeakEvent, ThresholdTrace};
pub use config::BeatConfig;
pub use error::{BeatError, Result};
pub use processing::StreamAnalyzer;
pub use wav::save_wav;
