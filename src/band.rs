use crate::config::{BandSpec, BeatConfig};
use crate::error::{BeatError, Result};
use crate::signal_processing::{
    BandRuntimeState, CoefficientDesigner, FilterSpec, FirFilterCore, PeakDecision, PeakDetector,
    SlidingWindowMax,
};

/// Detection parameters for a single band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandParams {
    /// Audio sample rate in Hz
    pub sample_rate: u32,
    /// Multiplier on the trailing maximum
    pub sensitivity: f64,
    /// Absolute threshold floor in sample units
    pub min_threshold: f64,
    /// Trailing maximum window in samples
    pub window_samples: usize,
    /// Debounce distance in samples
    pub min_peak_distance: u32,
}

impl BandParams {
    /// Derive band parameters from the shared detector configuration
    pub fn from_config(config: &BeatConfig) -> Self {
        let sample_rate = config.audio.sample_rate;
        Self {
            sample_rate,
            sensitivity: config.detector.sensitivity,
            min_threshold: config.detector.min_threshold,
            window_samples: config.detector.window_samples(sample_rate),
            min_peak_distance: config.detector.min_peak_distance_samples(sample_rate),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(BeatError::Config("sample rate must be positive".into()));
        }
        if !self.sensitivity.is_finite() || self.sensitivity < 0.0 {
            return Err(BeatError::Config(format!(
                "sensitivity must be a non-negative number, got {}",
                self.sensitivity
            )));
        }
        if !self.min_threshold.is_finite() {
            return Err(BeatError::Config("min threshold must be finite".into()));
        }
        if self.window_samples == 0 {
            return Err(BeatError::Config("window must hold at least one sample".into()));
        }
        Ok(())
    }
}

/// Result of pushing one sample through a band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandStep {
    pub filtered: i32,
    pub window_max: i32,
    pub decision: PeakDecision,
}

/// One analysed frequency band: FIR filter, trailing maximum and peak detector
///
/// Bands share nothing; a bank simply drives several of them with the same
/// input sample.
#[derive(Debug, Clone)]
pub struct Band {
    name: String,
    filter: FirFilterCore,
    window_max: SlidingWindowMax,
    detector: PeakDetector,
    last_filtered: i32,
    next_index: u64,
}

impl Band {
    /// Build a band around caller-supplied filter taps
    pub fn with_taps(name: impl Into<String>, taps: Vec<f64>, params: &BandParams) -> Result<Self> {
        params.validate()?;
        let filter = FirFilterCore::new(taps)?;

        Ok(Self {
            name: name.into(),
            filter,
            window_max: SlidingWindowMax::new(params.window_samples),
            detector: PeakDetector::new(
                params.sample_rate as f64,
                params.sensitivity,
                params.min_threshold,
                params.min_peak_distance,
            ),
            last_filtered: 0,
            next_index: 0,
        })
    }

    /// Build a band whose taps come from `designer`
    pub fn from_spec(
        spec: &BandSpec,
        params: &BandParams,
        designer: &dyn CoefficientDesigner,
    ) -> Result<Self> {
        params.validate()?;
        let taps = designer.design(&FilterSpec::new(
            spec.order,
            params.sample_rate as f64,
            spec.low_hz,
            spec.high_hz,
        ))?;
        Self::with_taps(spec.name.clone(), taps, params)
    }

    /// Filter one raw sample, update the trailing maximum and run detection
    ///
    /// `index` is the absolute stream index of the sample. It may skip
    /// ahead but never repeat or go back; such a sample is rejected with
    /// `BeatError::IndexOutOfOrder` and leaves the band untouched.
    pub fn process(&mut self, sample: i32, index: u64) -> Result<BandStep> {
        if index < self.next_index {
            return Err(BeatError::IndexOutOfOrder {
                index,
                next: self.next_index,
            });
        }

        let filtered = self.filter.process(sample);
        let window_max = self.window_max.push(filtered, index);
        let decision = self.detector.step(filtered, window_max);
        self.last_filtered = filtered;
        self.next_index = index + 1;

        Ok(BandStep {
            filtered,
            window_max,
            decision,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn filter(&self) -> &FirFilterCore {
        &self.filter
    }

    pub fn detector(&self) -> &PeakDetector {
        &self.detector
    }

    pub fn state(&self) -> &BandRuntimeState {
        self.detector.state()
    }

    pub fn bpm(&self) -> u32 {
        self.detector.bpm()
    }

    /// Filter output for the most recent sample
    pub fn last_filtered(&self) -> i32 {
        self.last_filtered
    }

    /// Milliseconds of audio covered by this band's position counter
    pub fn elapsed_ms(&self) -> u64 {
        self.detector.elapsed_ms()
    }

    /// Current trailing maximum, `None` before the first sample
    pub fn window_max(&self) -> Option<i32> {
        self.window_max.max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal_processing::WindowedSincDesigner;

    fn params() -> BandParams {
        BandParams {
            sample_rate: 1000,
            sensitivity: 1.0,
            min_threshold: 0.0,
            window_samples: 4,
            min_peak_distance: 0,
        }
    }

    #[test]
    fn test_rejects_empty_taps() {
        assert!(Band::with_taps("x", vec![], &params()).is_err());
    }

    #[test]
    fn test_rejects_bad_params() {
        let mut p = params();
        p.sensitivity = -1.0;
        assert!(Band::with_taps("x", vec![1.0], &p).is_err());

        let mut p = params();
        p.window_samples = 0;
        assert!(Band::with_taps("x", vec![1.0], &p).is_err());

        let mut p = params();
        p.sample_rate = 0;
        assert!(Band::with_taps("x", vec![1.0], &p).is_err());
    }

    #[test]
    fn test_pipeline_order() {
        let mut band = Band::with_taps("gain", vec![2.0], &params()).unwrap();
        let step = band.process(100, 0).unwrap();
        assert_eq!(step.filtered, 200);
        assert_eq!(step.window_max, 200);
        assert!(step.decision.is_peak);
        assert_eq!(band.last_filtered(), 200);

        let step = band.process(10, 1).unwrap();
        assert_eq!(step.filtered, 20);
        assert_eq!(step.window_max, 200);
        assert!(!step.decision.is_peak);
    }

    #[test]
    fn test_window_expiry_lowers_threshold() {
        let mut band = Band::with_taps("id", vec![1.0], &params()).unwrap();
        assert!(band.process(100, 0).unwrap().decision.is_peak);
        for i in 1..4 {
            assert!(!band.process(50, i).unwrap().decision.is_peak);
        }
        // Index 4: the 100 has left the 4-sample window.
        let step = band.process(50, 4).unwrap();
        assert_eq!(step.window_max, 50);
        assert!(step.decision.is_peak);
    }

    #[test]
    fn test_rejects_index_going_back() {
        let mut band = Band::with_taps("id", vec![1.0], &params()).unwrap();
        band.process(30000, 49).unwrap();

        assert!(matches!(
            band.process(1000, 0),
            Err(BeatError::IndexOutOfOrder { index: 0, next: 50 })
        ));
        assert!(band.process(1000, 49).is_err());
        assert_eq!(band.last_filtered(), 30000);
        assert_eq!(band.state().position, 0);

        // Skipping ahead is fine and ages the old maximum out.
        let step = band.process(1000, 53).unwrap();
        assert_eq!(step.window_max, 1000);
        assert!(!step.decision.is_peak, "still debounced right after the peak");
        assert!(band.process(1000, 54).unwrap().decision.is_peak);
    }

    #[test]
    fn test_from_spec_uses_designer() {
        let spec = BandSpec::new("mid", 100.0, 300.0, 32);
        let band = Band::from_spec(&spec, &params(), &WindowedSincDesigner).unwrap();
        assert_eq!(band.name(), "mid");
        assert_eq!(band.filter().num_taps(), 33);
    }

    #[test]
    fn test_from_spec_rejects_zero_order() {
        let spec = BandSpec::new("bad", 100.0, 300.0, 0);
        assert!(Band::from_spec(&spec, &params(), &WindowedSincDesigner).is_err());
    }
}
