pub mod capture;
pub mod source;

pub use capture::AudioCapture;
pub use source::{AudioSource, DeviceSource, WavFileSource};

/// Convert a normalized float sample to 16-bit PCM
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample * i16::MAX as f32)
        .round()
        .clamp(i16::MIN as f32, i16::MAX as f32) as i16
}
