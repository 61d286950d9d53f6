use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crossbeam_channel::Receiver;
use hound::WavReader;

use super::{AudioCapture, f32_to_i16};
use crate::config::AudioConfig;

/// Producer of interleaved stereo 16-bit buffers
pub trait AudioSource: Send {
    fn next_buffer(&mut self) -> anyhow::Result<Option<Vec<i16>>>;
    fn sample_rate(&self) -> u32;
}

pub struct DeviceSource {
    rx: Receiver<Vec<i16>>,
    sample_rate: u32,
    _capture: AudioCapture,
}

impl DeviceSource {
    pub fn new(config: &AudioConfig) -> anyhow::Result<Self> {
        let (tx, rx) = crossbeam_channel::bounded(10);
        let capture = AudioCapture::new(config, tx)?;
        Ok(Self {
            rx,
            sample_rate: capture.sample_rate(),
            _capture: capture,
        })
    }
}

impl AudioSource for DeviceSource {
    fn next_buffer(&mut self) -> anyhow::Result<Option<Vec<i16>>> {
        match self.rx.recv() {
            Ok(data) => Ok(Some(data)),
            Err(_) => Ok(None),
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Stereo WAV file read fully into memory and handed out in chunks
pub struct WavFileSource {
    samples: Vec<i16>,
    position: usize,
    chunk_size: usize,
    sample_rate: u32,
}

impl WavFileSource {
    /// Open `path`; `chunk_size` is in interleaved samples and is rounded
    /// down to whole frames
    pub fn new<P: AsRef<Path>>(path: P, chunk_size: usize) -> anyhow::Result<Self> {
        let reader = WavReader::open(path.as_ref())?;
        let spec = reader.spec();

        if spec.channels != 2 {
            anyhow::bail!("Expected stereo WAV file, got {} channels", spec.channels);
        }

        let sample_rate = spec.sample_rate;
        let samples = Self::read_samples(reader, &spec)?;

        Ok(Self {
            samples,
            position: 0,
            chunk_size: (chunk_size & !1).max(2),
            sample_rate,
        })
    }

    fn read_samples(
        mut reader: WavReader<BufReader<File>>,
        spec: &hound::WavSpec,
    ) -> anyhow::Result<Vec<i16>> {
        let samples = match (spec.sample_format, spec.bits_per_sample) {
            (hound::SampleFormat::Float, _) => reader
                .samples::<f32>()
                .map(|s| s.map(f32_to_i16))
                .collect::<Result<Vec<_>, _>>()?,
            (hound::SampleFormat::Int, 16) => reader.samples::<i16>().collect::<Result<Vec<_>, _>>()?,
            (hound::SampleFormat::Int, bits) => {
                let shift = bits as i32 - 16;
                reader
                    .samples::<i32>()
                    .map(|s| {
                        s.map(|v| {
                            if shift > 0 {
                                (v >> shift) as i16
                            } else {
                                (v << -shift) as i16
                            }
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(samples)
    }
}

impl AudioSource for WavFileSource {
    fn next_buffer(&mut self) -> anyhow::Result<Option<Vec<i16>>> {
        if self.position >= self.samples.len() {
            return Ok(None);
        }

        let end = (self.position + self.chunk_size).min(self.samples.len());
        let chunk = self.samples[self.position..end].to_vec();
        self.position = end;

        Ok(Some(chunk))
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
