use crate::audio::f32_to_i16;
use crate::config::AudioConfig;
use crate::error::{BeatError, Result};
use audio_thread_priority::RtPriorityHandle;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;

/// Live stereo input delivering interleaved 16-bit frames over a channel
pub struct AudioCapture {
    stream: cpal::Stream,
    sample_rate: u32,
    _rt_handle: Option<RtPriorityHandle>,
}

impl AudioCapture {
    /// Open the default input device and start streaming
    pub fn new(config: &AudioConfig, tx: Sender<Vec<i16>>) -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| BeatError::AudioDevice("No input device found".into()))?;

        match device.description() {
            Ok(desc) => log::info!("Input device: {:?}", desc),
            Err(_) => log::info!("Input device: Unknown"),
        }

        let sample_rate = Self::negotiate_sample_rate(&device, config)?;

        let stream_config = cpal::StreamConfig {
            channels: config.channels,
            sample_rate,
            buffer_size: cpal::BufferSize::Fixed(config.buffer_size as u32),
        };

        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let frames: Vec<i16> = data.iter().map(|&s| f32_to_i16(s)).collect();
                    if tx.send(frames).is_err() {
                        log::warn!("Audio receiver dropped");
                    }
                },
                |err| log::error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| BeatError::AudioStream(format!("{}", e)))?;

        let rt_handle = audio_thread_priority::promote_current_thread_to_real_time(
            config.buffer_size as u32,
            sample_rate,
        );

        let rt_handle = match rt_handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::warn!("Could not set real-time priority: {}", e);
                None
            }
        };

        stream
            .play()
            .map_err(|e| BeatError::AudioStream(format!("{}", e)))?;

        Ok(Self {
            stream,
            sample_rate,
            _rt_handle: rt_handle,
        })
    }

    /// Rate the stream was opened at, which may differ from the request
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Use the configured rate if the device supports it, else its default
    fn negotiate_sample_rate(device: &cpal::Device, config: &AudioConfig) -> Result<u32> {
        let supported = device
            .supported_input_configs()
            .map_err(|e| BeatError::AudioDevice(format!("{}", e)))?
            .any(|range| {
                range.channels() == config.channels
                    && range.min_sample_rate() <= config.sample_rate
                    && config.sample_rate <= range.max_sample_rate()
            });
        if supported {
            return Ok(config.sample_rate);
        }

        let fallback = device
            .default_input_config()
            .map_err(|e| BeatError::AudioDevice(format!("{}", e)))?
            .sample_rate();
        log::warn!(
            "Input device does not support {} Hz, falling back to {} Hz",
            config.sample_rate,
            fallback
        );
        Ok(fallback)
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        let _ = self.stream.pause();
    }
}
