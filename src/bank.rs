use crate::band::{Band, BandParams};
use crate::config::BeatConfig;
use crate::error::{BeatError, Result};
use crate::signal_processing::create_designer;

/// A beat detected in one band
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PeakEvent {
    /// Index of the band in the bank
    pub band: usize,
    /// Band position converted to milliseconds since stream start
    pub elapsed_ms: u64,
    /// Band position counter at the peak
    pub position: u64,
    /// Tempo estimate produced by this peak
    pub bpm: u32,
}

/// Detector state handed to the threshold observer on non-peak samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdTrace {
    /// Filtered sample compared against the threshold
    pub sample: i32,
    pub threshold: f64,
    /// Distance to the last peak as seen by this sample, before it is counted
    pub samples_since_last_peak: u32,
}

pub type ThresholdObserver = Box<dyn FnMut(&ThresholdTrace) + Send>;
pub type PeakCallback = Box<dyn FnMut(u64) + Send>;

/// Runs every configured band over the same input sample
///
/// Bands are processed in configuration order and never share state. The
/// optional hooks are invoked synchronously and have no effect on detection.
pub struct BandBank {
    sample_rate: u32,
    bands: Vec<Band>,
    next_index: u64,
    threshold_observer: Option<(usize, ThresholdObserver)>,
    peak_callback: Option<PeakCallback>,
}

impl BandBank {
    /// Design and build every band in `config`
    pub fn new(config: &BeatConfig) -> Result<Self> {
        config.validate()?;

        let params = BandParams::from_config(config);
        let designer = create_designer(config.detector.design, config.detector.transition_hz);

        let bands = config
            .bands
            .iter()
            .map(|spec| Band::from_spec(spec, &params, designer.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        for band in &bands {
            log::info!(
                "Band '{}': {} taps, window {} samples, debounce {} samples",
                band.name(),
                band.filter().num_taps(),
                params.window_samples,
                params.min_peak_distance
            );
        }

        Self::from_bands(config.audio.sample_rate, bands)
    }

    /// Assemble a bank from prebuilt bands
    pub fn from_bands(sample_rate: u32, bands: Vec<Band>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(BeatError::Config("sample rate must be positive".into()));
        }
        if bands.is_empty() {
            return Err(BeatError::Config("at least one band is required".into()));
        }

        Ok(Self {
            sample_rate,
            bands,
            next_index: 0,
            threshold_observer: None,
            peak_callback: None,
        })
    }

    /// Observe threshold state of `band` on every sample that is not a peak
    pub fn set_threshold_observer(&mut self, band: usize, observer: ThresholdObserver) -> Result<()> {
        if band >= self.bands.len() {
            return Err(BeatError::Config(format!(
                "trace band {} out of range (have {} bands)",
                band,
                self.bands.len()
            )));
        }
        self.threshold_observer = Some((band, observer));
        Ok(())
    }

    pub fn clear_threshold_observer(&mut self) {
        self.threshold_observer = None;
    }

    /// Called with the elapsed milliseconds of every peak
    pub fn set_peak_callback(&mut self, callback: PeakCallback) {
        self.peak_callback = Some(callback);
    }

    pub fn clear_peak_callback(&mut self) {
        self.peak_callback = None;
    }

    /// Push one raw sample at absolute stream `index` through every band
    ///
    /// `index` may skip ahead of [`next_index`](Self::next_index) but never
    /// fall behind it. A stale index is rejected with
    /// `BeatError::IndexOutOfOrder` before any band is touched.
    pub fn process_sample(&mut self, sample: i32, index: u64) -> Result<Vec<PeakEvent>> {
        let mut peaks = Vec::new();
        self.process_into(sample, index, &mut peaks)?;
        Ok(peaks)
    }

    /// Process consecutive samples following the last processed index
    pub fn process_samples(&mut self, samples: &[i32]) -> Result<Vec<PeakEvent>> {
        let mut peaks = Vec::new();
        for &sample in samples {
            self.process_into(sample, self.next_index, &mut peaks)?;
        }
        Ok(peaks)
    }

    /// Same as [`process_sample`](Self::process_sample) but appends to `peaks`
    pub fn process_into(&mut self, sample: i32, index: u64, peaks: &mut Vec<PeakEvent>) -> Result<()> {
        if index < self.next_index {
            return Err(BeatError::IndexOutOfOrder {
                index,
                next: self.next_index,
            });
        }

        for (band_idx, band) in self.bands.iter_mut().enumerate() {
            let since_before = band.state().samples_since_last_peak;
            let step = band.process(sample, index)?;

            if step.decision.is_peak {
                let event = PeakEvent {
                    band: band_idx,
                    elapsed_ms: band.elapsed_ms(),
                    position: band.state().position,
                    bpm: step.decision.bpm,
                };
                log::debug!(
                    "Peak in '{}' at {} ms ({} BPM)",
                    band.name(),
                    event.elapsed_ms,
                    event.bpm
                );
                if let Some(callback) = self.peak_callback.as_mut() {
                    callback(event.elapsed_ms);
                }
                peaks.push(event);
            } else if let Some((trace_band, observer)) = self.threshold_observer.as_mut()
                && *trace_band == band_idx
            {
                observer(&ThresholdTrace {
                    sample: step.filtered,
                    threshold: band.state().threshold,
                    samples_since_last_peak: since_before,
                });
            }
        }
        self.next_index = index + 1;
        Ok(())
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn band(&self, index: usize) -> Option<&Band> {
        self.bands.get(index)
    }

    /// Latest tempo estimate of every band, in band order
    pub fn bpms(&self) -> Vec<u32> {
        self.bands.iter().map(Band::bpm).collect()
    }

    /// Index the next call to [`process_samples`](Self::process_samples) will use
    pub fn next_index(&self) -> u64 {
        self.next_index
    }
}
