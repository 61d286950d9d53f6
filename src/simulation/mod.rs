mod noise;
mod signal;

pub use noise::{
    AdditiveNoiseConfig, ImpulseNoiseConfig, NoiseConfig, apply_noise, create_rng, random_samples,
    signal_power,
};
pub use signal::{
    ClickVoice, generate_click_track, generate_impulse_train, interleave_left, to_stereo_i16,
};
