use rand::RngExt;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct NoiseConfig {
    pub seed: Option<u64>,
    pub additive: Option<AdditiveNoiseConfig>,
    pub impulse: Option<ImpulseNoiseConfig>,
}

impl NoiseConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_awgn(mut self, snr_db: f32) -> Self {
        self.additive = Some(AdditiveNoiseConfig { snr_db });
        self
    }

    pub fn with_impulse(mut self, rate_hz: f32, amplitude: f32, duration_samples: usize) -> Self {
        self.impulse = Some(ImpulseNoiseConfig {
            rate_hz,
            amplitude,
            duration_samples,
        });
        self
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct AdditiveNoiseConfig {
    pub snr_db: f32,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct ImpulseNoiseConfig {
    pub rate_hz: f32,
    pub amplitude: f32,
    pub duration_samples: usize,
}

pub fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => rand::make_rng(),
    }
}

pub fn signal_power(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    signal.iter().map(|&x| x * x).sum::<f32>() / signal.len() as f32
}

fn apply_additive_noise(signal: &mut [f32], config: &AdditiveNoiseConfig, rng: &mut ChaCha8Rng) {
    let sig_power = signal_power(signal);
    if sig_power == 0.0 {
        return;
    }

    let snr_linear = 10.0_f32.powf(config.snr_db / 10.0);
    let noise_std = (sig_power / snr_linear).sqrt();

    let Ok(normal) = Normal::new(0.0, noise_std as f64) else {
        return;
    };

    for sample in signal.iter_mut() {
        *sample += normal.sample(rng) as f32;
    }
}

fn apply_impulse_noise(
    signal: &mut [f32],
    config: &ImpulseNoiseConfig,
    sample_rate: f32,
    rng: &mut ChaCha8Rng,
) {
    let n = signal.len();
    if n == 0 || config.rate_hz <= 0.0 {
        return;
    }

    let avg_samples_between_impulses = sample_rate / config.rate_hz;

    let mut pos = 0usize;
    loop {
        let interval = (rng.random::<f32>() * 2.0 * avg_samples_between_impulses) as usize;
        pos += interval.max(1);

        if pos >= n {
            break;
        }

        let sign = if rng.random::<bool>() { 1.0 } else { -1.0 };
        let end = (pos + config.duration_samples).min(n);

        for sample in signal[pos..end].iter_mut() {
            *sample += sign * config.amplitude;
        }
    }
}

/// Apply every configured impairment to a mono signal in place
pub fn apply_noise(signal: &mut [f32], config: &NoiseConfig, sample_rate: f32) {
    let mut rng = create_rng(config.seed);

    if let Some(ref additive) = config.additive {
        apply_additive_noise(signal, additive, &mut rng);
    }
    if let Some(ref impulse) = config.impulse {
        apply_impulse_noise(signal, impulse, sample_rate, &mut rng);
    }
}

/// Uniform random 16-bit samples in `-amplitude..=amplitude`
pub fn random_samples(len: usize, amplitude: i16, seed: u64) -> Vec<i16> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let amplitude = amplitude as f32;
    (0..len)
        .map(|_| ((rng.random::<f32>() * 2.0 - 1.0) * amplitude).round() as i16)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_awgn_reaches_requested_snr() {
        let mut signal: Vec<f32> = (0..48000)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 48000.0).sin())
            .collect();
        let clean = signal.clone();

        apply_noise(&mut signal, &NoiseConfig::default().with_seed(7).with_awgn(10.0), 48000.0);

        let noise: Vec<f32> = signal.iter().zip(clean.iter()).map(|(a, b)| a - b).collect();
        let snr_db = 10.0 * (signal_power(&clean) / signal_power(&noise)).log10();
        assert!((snr_db - 10.0).abs() < 0.5, "SNR {} dB", snr_db);
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        assert_eq!(random_samples(64, 1000, 3), random_samples(64, 1000, 3));
        assert!(random_samples(64, 1000, 3).iter().all(|s| s.abs() <= 1000));
    }

    #[test]
    fn test_impulse_noise_without_signal_power() {
        let mut signal = vec![0.0f32; 10000];
        let config = NoiseConfig::default().with_seed(1).with_impulse(100.0, 0.5, 3);
        apply_noise(&mut signal, &config, 10000.0);
        assert!(signal.iter().any(|&s| s != 0.0));
    }
}
