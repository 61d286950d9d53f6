/// Outcome of feeding one sample to a [`PeakDetector`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeakDecision {
    /// Whether this sample was accepted as a peak
    pub is_peak: bool,
    /// Latest tempo estimate; only changes on a peak
    pub bpm: u32,
}

/// Mutable per-band detector state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandRuntimeState {
    /// Threshold computed for the most recent sample
    pub threshold: f64,
    /// Samples since the last accepted peak, pinned at `u32::MAX`
    pub samples_since_last_peak: u32,
    /// Stream position used for peak timestamps; not advanced on peak samples
    pub position: u64,
    /// Tempo estimate from the most recent peak
    pub bpm: u32,
}

impl BandRuntimeState {
    fn new() -> Self {
        Self {
            threshold: 0.0,
            // Saturated so the very first sample is never debounced.
            samples_since_last_peak: u32::MAX,
            position: 0,
            bpm: 0,
        }
    }
}

/// Adaptive-threshold peak detector with debounce and BPM estimate
///
/// The threshold follows the loudest recent filtered sample scaled by
/// `sensitivity`, but never drops below `min_threshold`, so silence and
/// low-level noise cannot trigger. A peak additionally requires more than
/// `min_peak_distance` samples since the previous one, which stops a
/// single decaying transient from retriggering.
///
/// The comparison is on the signed filtered value: negative-going
/// excursions never register.
#[derive(Debug, Clone)]
pub struct PeakDetector {
    sample_rate: f64,
    sensitivity: f64,
    min_threshold: f64,
    min_peak_distance: u32,
    state: BandRuntimeState,
}

impl PeakDetector {
    /// Create a new peak detector
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz, used for the BPM estimate
    /// * `sensitivity` - Multiplier on the window maximum (≥ 0)
    /// * `min_threshold` - Absolute threshold floor in sample units
    /// * `min_peak_distance` - A peak needs strictly more samples than this since the last one
    pub fn new(sample_rate: f64, sensitivity: f64, min_threshold: f64, min_peak_distance: u32) -> Self {
        Self {
            sample_rate,
            sensitivity,
            min_threshold,
            min_peak_distance,
            state: BandRuntimeState::new(),
        }
    }

    /// Feed one filtered sample together with the current window maximum
    pub fn step(&mut self, sample: i32, window_max: i32) -> PeakDecision {
        let state = &mut self.state;
        state.threshold = (window_max as f64 * self.sensitivity).max(self.min_threshold);

        let over_threshold = sample as f64 >= state.threshold;
        let debounced = state.samples_since_last_peak > self.min_peak_distance;

        if over_threshold && debounced {
            state.bpm = (60.0 * self.sample_rate / state.samples_since_last_peak as f64).round() as u32;
            state.samples_since_last_peak = 0;
            return PeakDecision {
                is_peak: true,
                bpm: state.bpm,
            };
        }

        state.position += 1;
        state.samples_since_last_peak = state.samples_since_last_peak.saturating_add(1);

        PeakDecision {
            is_peak: false,
            bpm: state.bpm,
        }
    }

    /// Milliseconds of audio covered by the position counter
    pub fn elapsed_ms(&self) -> u64 {
        (self.state.position as f64 / (self.sample_rate / 1000.0)).round() as u64
    }

    pub fn state(&self) -> &BandRuntimeState {
        &self.state
    }

    pub fn threshold(&self) -> f64 {
        self.state.threshold
    }

    pub fn bpm(&self) -> u32 {
        self.state.bpm
    }

    pub fn position(&self) -> u64 {
        self.state.position
    }

    pub fn samples_since_last_peak(&self) -> u32 {
        self.state.samples_since_last_peak
    }

    pub fn min_peak_distance(&self) -> u32 {
        self.min_peak_distance
    }
}
