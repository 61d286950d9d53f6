use crate::bank::{BandBank, PeakCallback, PeakEvent, ThresholdObserver};
use crate::config::{BeatConfig, ChannelRole};
use crate::constants::STEREO_I16_FRAME_BYTES;
use crate::error::{BeatError, Result};
use crate::signal_processing::FirFilterCore;

/// Replaces each frame with one band's filtered output for listening checks
struct DebugPassthrough {
    band: usize,
    other_filter: FirFilterCore,
}

/// Feeds interleaved stereo PCM into a [`BandBank`]
///
/// Keeps a running frame index so that detection is independent of how
/// the stream is chunked. Only the configured analysis channel reaches the
/// bank; the other channel is left untouched unless debug pass-through is
/// enabled.
pub struct StreamAnalyzer {
    bank: BandBank,
    analysis_channel: ChannelRole,
    frame_index: u64,
    passthrough: Option<DebugPassthrough>,
}

impl StreamAnalyzer {
    pub fn new(config: &BeatConfig) -> Result<Self> {
        let bank = BandBank::new(config)?;
        let mut analyzer = Self::with_bank(bank, config.audio.analysis_channel);
        if let Some(band) = config.detector.debug_band {
            analyzer.enable_passthrough(band)?;
        }
        Ok(analyzer)
    }

    pub fn with_bank(bank: BandBank, analysis_channel: ChannelRole) -> Self {
        Self {
            bank,
            analysis_channel,
            frame_index: 0,
            passthrough: None,
        }
    }

    /// Overwrite processed frames with the output of `band`
    ///
    /// The analysis channel carries the band's filtered signal; the other
    /// channel is run through an independent filter with the same taps.
    pub fn enable_passthrough(&mut self, band: usize) -> Result<()> {
        let taps = self
            .bank
            .band(band)
            .ok_or_else(|| {
                BeatError::Config(format!(
                    "debug band {} out of range (have {} bands)",
                    band,
                    self.bank.bands().len()
                ))
            })?
            .filter()
            .taps()
            .to_vec();

        log::info!("Debug pass-through of band {}", band);
        self.passthrough = Some(DebugPassthrough {
            band,
            other_filter: FirFilterCore::new(taps)?,
        });
        Ok(())
    }

    pub fn disable_passthrough(&mut self) {
        self.passthrough = None;
    }

    pub fn set_peak_callback(&mut self, callback: PeakCallback) {
        self.bank.set_peak_callback(callback);
    }

    pub fn set_threshold_observer(&mut self, band: usize, observer: ThresholdObserver) -> Result<()> {
        self.bank.set_threshold_observer(band, observer)
    }

    /// Analyse interleaved `[L, R, L, R, ...]` samples
    ///
    /// # Errors
    /// Returns `BeatError::MalformedBuffer` if the slice holds a partial frame;
    /// nothing is processed in that case.
    pub fn process_frames(&mut self, interleaved: &mut [i16]) -> Result<Vec<PeakEvent>> {
        if !interleaved.len().is_multiple_of(2) {
            return Err(BeatError::MalformedBuffer {
                len: interleaved.len() * 2,
                frame_bytes: STEREO_I16_FRAME_BYTES,
            });
        }

        let analysed = self.analysis_channel.index();
        let other = self.analysis_channel.other().index();
        let mut peaks = Vec::new();

        for frame in interleaved.chunks_exact_mut(2) {
            let index = self.bank.next_index();
            self.bank.process_into(frame[analysed] as i32, index, &mut peaks)?;
            self.frame_index += 1;

            if let Some(passthrough) = self.passthrough.as_mut()
                && let Some(band) = self.bank.band(passthrough.band)
            {
                frame[analysed] = saturate_i16(band.last_filtered());
                frame[other] = saturate_i16(passthrough.other_filter.process(frame[other] as i32));
            }
        }

        Ok(peaks)
    }

    /// Analyse a 16-bit little-endian interleaved stereo PCM packet
    ///
    /// With pass-through enabled the packet is rewritten in place.
    pub fn process_bytes(&mut self, packet: &mut [u8]) -> Result<Vec<PeakEvent>> {
        if !packet.len().is_multiple_of(STEREO_I16_FRAME_BYTES) {
            return Err(BeatError::MalformedBuffer {
                len: packet.len(),
                frame_bytes: STEREO_I16_FRAME_BYTES,
            });
        }

        let mut samples: Vec<i16> = packet
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();

        let peaks = self.process_frames(&mut samples)?;

        if self.passthrough.is_some() {
            for (bytes, sample) in packet.chunks_exact_mut(2).zip(samples.iter()) {
                bytes.copy_from_slice(&sample.to_le_bytes());
            }
        }

        Ok(peaks)
    }

    pub fn bank(&self) -> &BandBank {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut BandBank {
        &mut self.bank
    }

    /// Total stereo frames consumed so far
    pub fn frames_processed(&self) -> u64 {
        self.frame_index
    }
}

fn saturate_i16(value: i32) -> i16 {
    value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}
