// Sample window buffer
// Bounded, time-ordered FIFO over the most recent motion samples.
// Approximates a fixed wall-clock duration at the nominal sampling rate.

use std::collections::VecDeque;

use crate::sensor::MotionSample;

/// Default window capacity: ~5 seconds at the nominal 20 Hz rate
pub const DEFAULT_CAPACITY: usize = 100;

/// Sliding window over recent samples.
///
/// Length never exceeds the configured capacity; eviction is strictly
/// oldest-first. Samples are appended by the ingestion path and never
/// mutated after insertion. All operations are total; there are no
/// error conditions.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    buffer: VecDeque<MotionSample>,
    capacity: usize,
}

impl SampleWindow {
    /// Create a window with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a window with a specific capacity (minimum 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        SampleWindow {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample at the tail, evicting from the head while over capacity
    pub fn append(&mut self, sample: MotionSample) {
        self.buffer.push_back(sample);
        while self.buffer.len() > self.capacity {
            self.buffer.pop_front();
        }
    }

    /// Current contents, oldest first, without mutating the window
    pub fn snapshot(&self) -> Vec<MotionSample> {
        self.buffer.iter().copied().collect()
    }

    /// Clear to empty (session stop / mode toggle)
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Number of buffered samples
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True when no samples are buffered
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Configured capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for SampleWindow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(n: usize) -> MotionSample {
        MotionSample::new(n as f64, [n as f64, 0.0, 0.0], [0.0, 0.0, 0.0])
    }

    #[test]
    fn test_length_is_min_of_appends_and_capacity() {
        let mut window = SampleWindow::with_capacity(10);

        for n in 0..7 {
            window.append(sample(n));
        }
        assert_eq!(window.len(), 7);

        for n in 7..25 {
            window.append(sample(n));
        }
        assert_eq!(window.len(), 10);
    }

    #[test]
    fn test_eviction_is_oldest_first_in_arrival_order() {
        let mut window = SampleWindow::with_capacity(5);

        for n in 0..12 {
            window.append(sample(n));
        }

        let contents = window.snapshot();
        assert_eq!(contents.len(), 5);
        // Most recent 5 samples (7..12), oldest first
        for (i, s) in contents.iter().enumerate() {
            assert_eq!(s.accel_x, (7 + i) as f64);
        }
    }

    #[test]
    fn test_snapshot_does_not_mutate() {
        let mut window = SampleWindow::with_capacity(5);
        window.append(sample(0));
        window.append(sample(1));

        let first = window.snapshot();
        let second = window.snapshot();
        assert_eq!(first, second);
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn test_reset_clears_to_empty() {
        let mut window = SampleWindow::with_capacity(5);
        for n in 0..5 {
            window.append(sample(n));
        }

        window.reset();
        assert!(window.is_empty());
        assert!(window.snapshot().is_empty());
        assert_eq!(window.capacity(), 5);
    }

    #[test]
    fn test_capacity_clamped_to_one() {
        let mut window = SampleWindow::with_capacity(0);
        window.append(sample(0));
        window.append(sample(1));
        assert_eq!(window.len(), 1);
        assert_eq!(window.snapshot()[0].accel_x, 1.0);
    }
}
