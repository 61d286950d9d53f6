use std::collections::VecDeque;

/// Maximum over the trailing `window` samples in O(1) amortized time
///
/// Candidates are kept in a monotonic deque of `(value, index)` pairs.
/// From front (oldest) to back (newest) the values strictly decrease and
/// the indices strictly increase, so the front is always the maximum of
/// the window. Each pushed pair is popped at most once, and the deque never
/// holds more than `window` entries.
///
/// Before `window` samples have been seen the reported maximum covers
/// whatever has been pushed so far; there is no warm-up suppression.
#[derive(Debug, Clone)]
pub struct SlidingWindowMax {
    window: u64,
    candidates: VecDeque<(i32, u64)>,
}

impl SlidingWindowMax {
    /// Create a tracker over the last `window` samples
    ///
    /// `window` must be at least 1.
    pub fn new(window: usize) -> Self {
        debug_assert!(window > 0, "sliding window must hold at least one sample");
        let window = window.max(1);
        Self {
            window: window as u64,
            candidates: VecDeque::with_capacity(window.min(4096)),
        }
    }

    /// Add `value` observed at absolute sample `index` and return the
    /// window maximum
    ///
    /// Indices must increase from call to call.
    pub fn push(&mut self, value: i32, index: u64) -> i32 {
        debug_assert!(
            self.candidates.back().is_none_or(|&(_, last)| index > last),
            "sample indices must be strictly increasing"
        );

        // Oldest index still inside the window ending at `index`.
        let oldest = (index + 1).saturating_sub(self.window);
        while self
            .candidates
            .front()
            .is_some_and(|&(_, i)| i < oldest)
        {
            self.candidates.pop_front();
        }

        // A newer value at least as large dominates older ones for as long
        // as they would remain in the window.
        while self.candidates.back().is_some_and(|&(v, _)| v <= value) {
            self.candidates.pop_back();
        }
        self.candidates.push_back((value, index));

        self.candidates[0].0
    }

    /// Current maximum without pushing, `None` before the first sample
    pub fn max(&self) -> Option<i32> {
        self.candidates.front().map(|&(v, _)| v)
    }

    /// Window length in samples
    pub fn window(&self) -> usize {
        self.window as usize
    }

    /// Number of candidates currently held
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn clear(&mut self) {
        self.candidates.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{RngExt, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    /// O(W) reference maximum over the trailing window ending at `end`
    fn naive_max(values: &[i32], end: usize, window: usize) -> i32 {
        let start = (end + 1).saturating_sub(window);
        *values[start..=end].iter().max().unwrap()
    }

    #[test]
    fn test_tracks_trailing_maximum() {
        let mut swm = SlidingWindowMax::new(3);
        let values = [1, 3, 2, 5, 4, 1, 0, 0, 7];
        let expected = [1, 3, 3, 5, 5, 5, 4, 1, 7];
        for (i, (&v, &e)) in values.iter().zip(expected.iter()).enumerate() {
            assert_eq!(swm.push(v, i as u64), e, "index {}", i);
        }
    }

    #[test]
    fn test_reports_partial_window_before_full() {
        let mut swm = SlidingWindowMax::new(1000);
        assert_eq!(swm.max(), None);
        assert_eq!(swm.push(-5, 0), -5);
        assert_eq!(swm.push(-7, 1), -5);
        assert_eq!(swm.push(2, 2), 2);
        assert_eq!(swm.max(), Some(2));
    }

    #[test]
    fn test_negative_values_are_tracked_signed() {
        let mut swm = SlidingWindowMax::new(2);
        assert_eq!(swm.push(-100, 0), -100);
        assert_eq!(swm.push(-300, 1), -100);
        assert_eq!(swm.push(-200, 2), -200);
    }

    #[test]
    fn test_equal_values_do_not_accumulate() {
        let mut swm = SlidingWindowMax::new(100);
        for i in 0..50 {
            assert_eq!(swm.push(42, i), 42);
        }
        assert_eq!(swm.len(), 1);
    }

    #[test]
    fn test_window_of_one_returns_latest() {
        let mut swm = SlidingWindowMax::new(1);
        for (i, v) in [5, 1, 9, -3].into_iter().enumerate() {
            assert_eq!(swm.push(v, i as u64), v);
        }
        assert_eq!(swm.len(), 1);
    }

    #[test]
    fn test_size_bounded_by_window() {
        let window = 64;
        let mut swm = SlidingWindowMax::new(window);
        // Strictly decreasing input is the worst case for the deque.
        for i in 0..1000u64 {
            swm.push(10_000 - i as i32, i);
            assert!(swm.len() <= window);
        }
        assert_eq!(swm.len(), window);
    }

    #[test]
    fn test_matches_naive_reference() {
        // Narrow value range so plateaus of equal values are common.
        let mut rng = ChaCha8Rng::seed_from_u64(0x2545_f491);
        let values: Vec<i32> = (0..5000).map(|_| rng.random_range(-1000..=1000)).collect();

        for window in [1, 2, 7, 100, 4999, 6000] {
            let mut swm = SlidingWindowMax::new(window);
            for (i, &v) in values.iter().enumerate() {
                assert_eq!(
                    swm.push(v, i as u64),
                    naive_max(&values, i, window),
                    "window {} index {}",
                    window,
                    i
                );
            }
        }
    }

    #[test]
    fn test_index_gaps_expire_stale_entries() {
        let mut swm = SlidingWindowMax::new(10);
        assert_eq!(swm.push(100, 0), 100);
        assert_eq!(swm.push(1, 5), 100);
        assert_eq!(swm.push(2, 10), 2);
    }
}
