//! FIR coefficient design for the analysis bands
//!
//! Design is a one-time construction step; the per-sample path only ever
//! sees the resulting taps through [`FirFilterCore`](super::FirFilterCore).

use std::f64::consts::PI;

use pm_remez::{BandSetting, constant, pm_parameters, pm_remez};

use crate::config::DesignMethod;
use crate::constants::{MAX_NORMALIZED_FREQ, MIN_NORMALIZED_FREQ};
use crate::error::{BeatError, Result};

/// Band-pass request handed to a coefficient designer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSpec {
    /// Filter order; designers round odd orders up so the tap count is odd
    pub order: usize,
    pub sample_rate: f64,
    pub low_hz: f64,
    pub high_hz: f64,
}

impl FilterSpec {
    pub fn new(order: usize, sample_rate: f64, low_hz: f64, high_hz: f64) -> Self {
        Self {
            order,
            sample_rate,
            low_hz,
            high_hz,
        }
    }

    fn nyquist(&self) -> f64 {
        self.sample_rate / 2.0
    }

    /// Order rounded up to even, giving an odd (Type I) tap count
    fn even_order(&self) -> usize {
        if self.order.is_multiple_of(2) {
            self.order
        } else {
            self.order + 1
        }
    }

    fn validate(&self) -> Result<()> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(BeatError::Config(format!(
                "sample rate must be positive, got {}",
                self.sample_rate
            )));
        }
        if self.order == 0 {
            return Err(BeatError::Config("filter order must be positive".into()));
        }
        if !(self.low_hz >= 0.0 && self.low_hz < self.high_hz) {
            return Err(BeatError::Config(format!(
                "invalid band edges: low={} Hz, high={} Hz",
                self.low_hz, self.high_hz
            )));
        }
        if self.low_hz >= self.nyquist() {
            return Err(BeatError::Config(format!(
                "low edge {} Hz is above Nyquist ({} Hz)",
                self.low_hz,
                self.nyquist()
            )));
        }
        Ok(())
    }
}

/// Source of FIR tap coefficients for a band
pub trait CoefficientDesigner {
    /// Produce the taps for `spec`, newest-sample weight first
    fn design(&self, spec: &FilterSpec) -> Result<Vec<f64>>;
}

/// Build the designer selected in the configuration
pub fn create_designer(method: DesignMethod, transition_hz: f64) -> Box<dyn CoefficientDesigner> {
    match method {
        DesignMethod::WindowedSinc => Box::new(WindowedSincDesigner),
        DesignMethod::Remez => Box::new(RemezDesigner::new(transition_hz)),
    }
}

/// Hamming-windowed sinc band-pass
///
/// The band-pass is the difference of two low-passes, each normalized to
/// unity gain at DC. An upper edge at or above Nyquist turns the result
/// into a high-pass; a lower edge of 0 Hz into a low-pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowedSincDesigner;

impl WindowedSincDesigner {
    fn lowpass(cutoff_norm: f64, order: usize) -> Vec<f64> {
        let center = order as f64 / 2.0;
        let mut taps: Vec<f64> = (0..=order)
            .map(|i| {
                let m = i as f64 - center;
                let sinc = if m == 0.0 {
                    2.0 * cutoff_norm
                } else {
                    (2.0 * PI * cutoff_norm * m).sin() / (PI * m)
                };
                let window = 0.54 - 0.46 * (2.0 * PI * i as f64 / order as f64).cos();
                sinc * window
            })
            .collect();

        let dc: f64 = taps.iter().sum();
        if dc.abs() > f64::EPSILON {
            taps.iter_mut().for_each(|t| *t /= dc);
        }
        taps
    }

    fn unit_impulse(order: usize) -> Vec<f64> {
        let mut taps = vec![0.0; order + 1];
        taps[order / 2] = 1.0;
        taps
    }
}

impl CoefficientDesigner for WindowedSincDesigner {
    fn design(&self, spec: &FilterSpec) -> Result<Vec<f64>> {
        spec.validate()?;
        let order = spec.even_order();

        let upper = if spec.high_hz >= spec.nyquist() {
            Self::unit_impulse(order)
        } else {
            Self::lowpass(spec.high_hz / spec.sample_rate, order)
        };

        if spec.low_hz <= 0.0 {
            return Ok(upper);
        }

        let lower = Self::lowpass(spec.low_hz / spec.sample_rate, order);
        Ok(upper.iter().zip(lower.iter()).map(|(u, l)| u - l).collect())
    }
}

/// Parks-McClellan (Remez) equiripple band-pass
///
/// Produces a linear-phase filter with the given transition width on each
/// side of the pass band. When the upper edge leaves no room for an upper
/// stop band the design falls back to a high-pass.
#[derive(Debug, Clone, Copy)]
pub struct RemezDesigner {
    transition_hz: f64,
}

impl RemezDesigner {
    pub fn new(transition_hz: f64) -> Self {
        Self { transition_hz }
    }
}

impl CoefficientDesigner for RemezDesigner {
    fn design(&self, spec: &FilterSpec) -> Result<Vec<f64>> {
        spec.validate()?;
        if !(self.transition_hz.is_finite() && self.transition_hz > 0.0) {
            return Err(BeatError::Config(format!(
                "transition width must be positive, got {}",
                self.transition_hz
            )));
        }

        let num_taps = spec.even_order() + 1;
        let normalize = |hz: f64| hz / spec.sample_rate;
        let trans_norm = normalize(self.transition_hz);

        let stop1_end = (normalize(spec.low_hz) - trans_norm).max(MIN_NORMALIZED_FREQ);
        let pass_start = normalize(spec.low_hz);
        let pass_end = normalize(spec.high_hz).min(MAX_NORMALIZED_FREQ);
        let stop2_start = pass_end + trans_norm;

        if pass_start <= stop1_end {
            return Err(BeatError::FilterDesign(format!(
                "low edge {} Hz leaves no room for a {} Hz transition at {} Hz",
                spec.low_hz, self.transition_hz, spec.sample_rate
            )));
        }

        let design = if stop2_start < MAX_NORMALIZED_FREQ {
            let bands = [
                BandSetting::new(0.0, stop1_end, constant(0.0))
                    .map_err(|e| BeatError::FilterDesign(format!("Lower stopband: {:?}", e)))?,
                BandSetting::new(pass_start, pass_end, constant(1.0))
                    .map_err(|e| BeatError::FilterDesign(format!("Passband: {:?}", e)))?,
                BandSetting::new(stop2_start, 0.5, constant(0.0))
                    .map_err(|e| BeatError::FilterDesign(format!("Upper stopband: {:?}", e)))?,
            ];
            let params = pm_parameters(num_taps, &bands)
                .map_err(|e| BeatError::FilterDesign(format!("PM parameters: {:?}", e)))?;
            pm_remez(&params).map_err(|e| BeatError::FilterDesign(format!("PM Remez: {:?}", e)))?
        } else {
            log::debug!(
                "Upper edge {} Hz too close to Nyquist, designing high-pass",
                spec.high_hz
            );
            let bands = [
                BandSetting::new(0.0, stop1_end, constant(0.0))
                    .map_err(|e| BeatError::FilterDesign(format!("Stopband: {:?}", e)))?,
                BandSetting::new(pass_start, 0.5, constant(1.0))
                    .map_err(|e| BeatError::FilterDesign(format!("Passband: {:?}", e)))?,
            ];
            let params = pm_parameters(num_taps, &bands)
                .map_err(|e| BeatError::FilterDesign(format!("PM parameters: {:?}", e)))?;
            pm_remez(&params).map_err(|e| BeatError::FilterDesign(format!("PM Remez: {:?}", e)))?
        };

        Ok(design.impulse_response)
    }
}
