use std::f32::consts::PI;

/// One periodic percussive voice of a synthetic click track
#[derive(Clone, Debug, serde::Deserialize)]
pub struct ClickVoice {
    /// Tempo of the voice in beats per minute
    pub bpm: f32,
    /// Frequency of the decaying sine burst in Hz
    pub tone_hz: f32,
    /// Peak amplitude (0-1 range)
    pub amplitude: f32,
    /// Exponential decay time constant in milliseconds
    #[serde(default = "default_decay_ms")]
    pub decay_ms: f32,
    /// Delay of the first beat in milliseconds
    #[serde(default)]
    pub offset_ms: f32,
}

fn default_decay_ms() -> f32 {
    30.0
}

impl ClickVoice {
    pub fn new(bpm: f32, tone_hz: f32, amplitude: f32) -> Self {
        Self {
            bpm,
            tone_hz,
            amplitude,
            decay_ms: default_decay_ms(),
            offset_ms: 0.0,
        }
    }

    pub fn with_offset_ms(mut self, offset_ms: f32) -> Self {
        self.offset_ms = offset_ms;
        self
    }

    /// Beat onsets in samples within the first `num_samples`
    pub fn onsets(&self, sample_rate: u32, num_samples: usize) -> Vec<usize> {
        if self.bpm <= 0.0 {
            return Vec::new();
        }
        let period = 60.0 * sample_rate as f32 / self.bpm;
        let offset = self.offset_ms * sample_rate as f32 / 1000.0;
        (0..)
            .map(|k| (offset + k as f32 * period).round() as usize)
            .take_while(|&onset| onset < num_samples)
            .collect()
    }
}

/// Mono click track: every voice adds a decaying sine burst per beat
/// Returns samples in the -1..1 range (voices may sum above 1)
pub fn generate_click_track(duration_secs: f32, sample_rate: u32, voices: &[ClickVoice]) -> Vec<f32> {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let mut samples = vec![0.0f32; num_samples];

    for voice in voices {
        let decay_samples = (voice.decay_ms * sample_rate as f32 / 1000.0).max(1.0);
        // Bursts are cut after five time constants.
        let burst_len = (decay_samples * 5.0) as usize;

        for onset in voice.onsets(sample_rate, num_samples) {
            let end = (onset + burst_len).min(num_samples);
            for (n, sample) in samples[onset..end].iter_mut().enumerate() {
                let t = n as f32 / sample_rate as f32;
                let envelope = (-(n as f32) / decay_samples).exp();
                *sample += voice.amplitude * envelope * (2.0 * PI * voice.tone_hz * t).sin();
            }
        }
    }

    samples
}

/// Single-sample impulses of `amplitude` every `period` samples, starting at `offset`
pub fn generate_impulse_train(num_samples: usize, period: usize, amplitude: i16, offset: usize) -> Vec<i16> {
    let mut samples = vec![0i16; num_samples];
    if period == 0 {
        return samples;
    }
    for sample in samples.iter_mut().skip(offset).step_by(period) {
        *sample = amplitude;
    }
    samples
}

/// Duplicate a mono float signal into interleaved stereo 16-bit frames
pub fn to_stereo_i16(mono: &[f32]) -> Vec<i16> {
    mono.iter()
        .flat_map(|&s| {
            let v = crate::audio::f32_to_i16(s);
            [v, v]
        })
        .collect()
}

/// Interleave a 16-bit mono signal with silence on the other channel
pub fn interleave_left(left: &[i16]) -> Vec<i16> {
    left.iter().flat_map(|&s| [s, 0]).collect()
}
