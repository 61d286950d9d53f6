use crate::error::{BeatError, Result};

/// Delay-line FIR filter for integer sample streams
///
/// Holds the tap coefficients, a circular history of the most recent input
/// samples and a write cursor. The convolution is accumulated in `f64`, so
/// 16-bit input never clips mid-sum; the result is rounded back to the
/// integer sample domain (saturating at the `i32` range, never at `i16`).
#[derive(Debug, Clone)]
pub struct FirFilterCore {
    taps: Vec<f64>,
    delay_line: Vec<f64>,
    pos: usize,
}

impl FirFilterCore {
    /// Create a filter from coefficients produced by a designer
    ///
    /// # Errors
    /// Returns `BeatError::Config` if `taps` is empty or contains a
    /// non-finite coefficient.
    pub fn new(taps: Vec<f64>) -> Result<Self> {
        if taps.is_empty() {
            return Err(BeatError::Config("FIR filter needs at least one tap".into()));
        }
        if let Some(bad) = taps.iter().position(|t| !t.is_finite()) {
            return Err(BeatError::Config(format!(
                "FIR tap {} is not finite ({})",
                bad, taps[bad]
            )));
        }

        Ok(Self {
            delay_line: vec![0.0; taps.len()],
            taps,
            pos: 0,
        })
    }

    /// Single-tap unity filter; output equals input.
    pub fn identity() -> Self {
        Self {
            taps: vec![1.0],
            delay_line: vec![0.0],
            pos: 0,
        }
    }

    /// Push one sample and return the filtered value
    ///
    /// `taps[0]` weights the newest sample, `taps[n - 1]` the oldest.
    pub fn process(&mut self, sample: i32) -> i32 {
        self.delay_line[self.pos] = sample as f64;

        let mut acc = 0.0f64;
        let n = self.taps.len();

        // Walk newest to oldest as two contiguous reverse ranges so the inner
        // loop needs no modulo.
        let mut tap_i = 0usize;
        for delay_idx in (0..=self.pos).rev() {
            acc += self.taps[tap_i] * self.delay_line[delay_idx];
            tap_i += 1;
        }
        for delay_idx in ((self.pos + 1)..n).rev() {
            acc += self.taps[tap_i] * self.delay_line[delay_idx];
            tap_i += 1;
        }
        debug_assert_eq!(tap_i, n);

        self.pos += 1;
        if self.pos == n {
            self.pos = 0;
        }

        // `as` saturates on overflow and maps NaN to 0.
        acc.round() as i32
    }

    /// Filter a buffer in-place
    pub fn process_buffer(&mut self, buffer: &mut [i32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Clear the sample history without touching the coefficients
    pub fn reset(&mut self) {
        self.delay_line.iter_mut().for_each(|s| *s = 0.0);
        self.pos = 0;
    }

    /// Number of taps (filter order + 1)
    pub fn num_taps(&self) -> usize {
        self.taps.len()
    }

    /// Group delay in samples for a linear-phase design
    pub fn group_delay_samples(&self) -> usize {
        (self.taps.len() - 1) / 2
    }

    pub fn taps(&self) -> &[f64] {
        &self.taps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_taps() {
        assert!(matches!(FirFilterCore::new(vec![]), Err(BeatError::Config(_))));
    }

    #[test]
    fn test_rejects_non_finite_taps() {
        assert!(FirFilterCore::new(vec![0.5, f64::NAN]).is_err());
        assert!(FirFilterCore::new(vec![f64::INFINITY]).is_err());
    }

    #[test]
    fn test_identity_passes_samples_through() {
        let mut filter = FirFilterCore::identity();
        for s in [0, 1, -1, 30000, -32768, 32767] {
            assert_eq!(filter.process(s), s);
        }
    }

    #[test]
    fn test_impulse_response_reproduces_taps() {
        let taps = vec![0.5, 0.25, -0.125, 2.0];
        let mut filter = FirFilterCore::new(taps.clone()).unwrap();

        let mut input = vec![0i32; 8];
        input[0] = 1000;
        filter.process_buffer(&mut input);

        assert_eq!(&input[..4], &[500, 250, -125, 2000]);
        assert!(input[4..].iter().all(|&s| s == 0));
    }

    #[test]
    fn test_accumulator_does_not_clip_to_16_bits() {
        let mut filter = FirFilterCore::new(vec![1.0, 1.0, 1.0]).unwrap();
        filter.process(32767);
        filter.process(32767);
        assert_eq!(filter.process(32767), 3 * 32767);
    }

    #[test]
    fn test_output_is_rounded() {
        let mut filter = FirFilterCore::new(vec![0.25]).unwrap();
        assert_eq!(filter.process(6), 2); // 1.5 rounds away from zero
        assert_eq!(filter.process(-6), -2);
        assert_eq!(filter.process(3), 1); // 0.75
        assert_eq!(filter.process(1), 0);
    }

    #[test]
    fn test_moving_sum_across_wraparound() {
        let mut filter = FirFilterCore::new(vec![1.0, 1.0]).unwrap();
        let out: Vec<i32> = [1, 2, 3, 4, 5].iter().map(|&s| filter.process(s)).collect();
        assert_eq!(out, vec![1, 3, 5, 7, 9]);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut filter = FirFilterCore::new(vec![1.0, 1.0]).unwrap();
        filter.process(100);
        filter.reset();
        assert_eq!(filter.process(1), 1);
        assert_eq!(filter.num_taps(), 2);
        assert_eq!(filter.group_delay_samples(), 0);
    }
}
