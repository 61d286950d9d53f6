//! Numeric constants for the beat detection pipeline
//!
//! Defaults target 44.1 kHz stereo input with a 1.5 s trailing maximum
//! window and a 200 ms debounce per band.

/// Reference audio sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Length of the trailing maximum window in seconds.
pub const DEFAULT_WINDOW_SECS: f64 = 1.5;

/// Minimum spacing between two peaks of the same band in seconds.
/// Caps the detectable tempo at 300 BPM.
pub const DEFAULT_MIN_PEAK_DISTANCE_SECS: f64 = 0.2;

/// Fraction of full-scale 16-bit magnitude used as the default threshold floor.
pub const DEFAULT_MIN_THRESHOLD_FRACTION: f64 = 0.05;

/// Full-scale magnitude of a signed 16-bit sample.
pub const MAX_INT16: f64 = i16::MAX as f64;

/// Default FIR order for designed band filters (order + 1 taps).
pub const DEFAULT_FILTER_ORDER: usize = 100;

/// Transition bandwidth used by the Parks-McClellan designer, in Hz.
pub const DEFAULT_TRANSITION_HZ: f64 = 100.0;

/// Lowest normalized frequency handed to the equiripple designer.
/// Keeps the lower stopband from collapsing to zero width.
pub const MIN_NORMALIZED_FREQ: f64 = 0.001;

/// Highest normalized frequency handed to the equiripple designer (Nyquist is 0.5).
pub const MAX_NORMALIZED_FREQ: f64 = 0.499;

/// Bytes per interleaved stereo frame of 16-bit PCM.
pub const STEREO_I16_FRAME_BYTES: usize = 4;
