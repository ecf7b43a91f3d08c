//! Ring-buffer delay line.
//!
//! The buffer is allocated once at construction and never resized, so reads
//! and writes are allocation-free.
//!
//! Read before write: `read(d)` returns the sample written `d` writes ago, so
//! a line of capacity `N` supports delays `1..=N`.
//!
//! ```rust
//! use strata_core::DelayLine;
//!
//! let mut line = DelayLine::new(4);
//! line.write(1.0);
//! line.write(0.0);
//! assert_eq!(line.read(2), 1.0);
//! ```

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use libm::floor;

/// Fixed-capacity delay line with integer and fractional reads.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f64>,
    write_pos: usize,
}

impl DelayLine {
    /// Allocates a line holding `capacity` samples (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(1)],
            write_pos: 0,
        }
    }

    /// Allocates a line long enough for `max_seconds` at `sample_rate`.
    pub fn from_time(sample_rate: f64, max_seconds: f64) -> Self {
        Self::new((sample_rate * max_seconds).max(0.0) as usize + 1)
    }

    /// Maximum delay in samples.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Reads the sample written `delay` writes ago, clamped to `1..=capacity`.
    #[inline]
    pub fn read(&self, delay: usize) -> f64 {
        let len = self.buffer.len();
        let delay = delay.clamp(1, len);
        self.buffer[(self.write_pos + len - delay) % len]
    }

    /// Linearly interpolated read at a fractional delay.
    ///
    /// The delay is clamped to `[1, capacity − 1]` so both taps are valid.
    #[inline]
    pub fn read_fractional(&self, delay: f64) -> f64 {
        let max = (self.buffer.len().saturating_sub(1)).max(1) as f64;
        let delay = if delay.is_finite() { delay.clamp(1.0, max) } else { 1.0 };
        let whole = floor(delay);
        let frac = delay - whole;
        let near = self.read(whole as usize);
        let far = self.read(whole as usize + 1);
        near + (far - near) * frac
    }

    /// Writes one sample and advances.
    #[inline]
    pub fn write(&mut self, sample: f64) {
        self.buffer[self.write_pos] = sample;
        self.write_pos += 1;
        if self.write_pos == self.buffer.len() {
            self.write_pos = 0;
        }
    }

    /// Reads at `delay`, then writes `sample`.
    #[inline]
    pub fn tick(&mut self, sample: f64, delay: usize) -> f64 {
        let out = self.read(delay);
        self.write(sample);
        out
    }

    /// Zeroes the buffer.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impulse_arrives_after_delay() {
        let mut line = DelayLine::new(100);
        let mut out = [0.0; 20];
        for (i, o) in out.iter_mut().enumerate() {
            *o = line.tick(if i == 0 { 1.0 } else { 0.0 }, 10);
        }
        assert_eq!(out[10], 1.0);
        assert_eq!(out.iter().filter(|&&v| v != 0.0).count(), 1);
    }

    #[test]
    fn full_capacity_delay() {
        let mut line = DelayLine::new(8);
        line.write(1.0);
        for _ in 0..7 {
            line.write(0.0);
        }
        assert_eq!(line.read(8), 1.0);
    }

    #[test]
    fn fractional_read_interpolates() {
        let mut line = DelayLine::new(16);
        line.write(1.0);
        line.write(0.0);
        // 1.0 is two writes back, 0.0 one write back
        assert!((line.read_fractional(1.25) - 0.25).abs() < 1e-12);
        assert!((line.read_fractional(2.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn out_of_range_reads_clamp() {
        let mut line = DelayLine::new(4);
        line.write(0.5);
        assert_eq!(line.read(0), 0.5);
        assert!(line.read(100).is_finite());
        assert!(line.read_fractional(f64::NAN).is_finite());
    }

    #[test]
    fn clear_silences() {
        let mut line = DelayLine::new(4);
        line.write(1.0);
        line.clear();
        for d in 1..=4 {
            assert_eq!(line.read(d), 0.0);
        }
    }
}
