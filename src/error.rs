use thiserror::Error;

#[derive(Error, Debug)]
pub enum BeatError {
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Audio stream error: {0}")]
    AudioStream(String),

    #[error("Filter design failed: {0}")]
    FilterDesign(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed PCM buffer: {len} bytes is not a multiple of the {frame_bytes}-byte frame")]
    MalformedBuffer { len: usize, frame_bytes: usize },

    #[error("Sample index {index} is behind the stream (next index is {next})")]
    IndexOutOfOrder { index: u64, next: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

pub type Result<T> = std::result::Result<T, BeatError>;
