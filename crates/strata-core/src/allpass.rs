//! Schroeder allpass filter for reverb diffusion.
//!
//! Passes all frequencies at equal amplitude but smears phase, turning a
//! transient into a dense burst before it enters the feedback network.

use crate::delay::DelayLine;
use crate::math::flush_denormal;

/// Schroeder allpass over a fixed ring buffer.
///
/// ```text
/// v[n] = x[n] + g·v[n−M]
/// y[n] = v[n−M] − g·v[n]
/// ```
///
/// # Example
///
/// ```rust
/// use strata_core::AllpassFilter;
///
/// let mut ap = AllpassFilter::new(142);
/// ap.set_gain(0.6);
/// let y = ap.process(1.0);
/// assert!((y + 0.6).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct AllpassFilter {
    delay: DelayLine,
    length: usize,
    gain: f64,
}

impl AllpassFilter {
    /// Creates an allpass with a delay of `length` samples and gain 0.5.
    pub fn new(length: usize) -> Self {
        let length = length.max(1);
        Self {
            delay: DelayLine::new(length),
            length,
            gain: 0.5,
        }
    }

    /// Sets the allpass gain, clamped to ±0.99 for stability.
    #[inline]
    pub fn set_gain(&mut self, gain: f64) {
        self.gain = if gain.is_finite() {
            gain.clamp(-0.99, 0.99)
        } else {
            0.0
        };
    }

    /// Current gain.
    pub fn gain(&self) -> f64 {
        self.gain
    }

    /// Delay length in samples.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Processes one sample.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let delayed = self.delay.read(self.length);
        let v = flush_denormal(input + self.gain * delayed);
        self.delay.write(v);
        delayed - self.gain * v
    }

    /// Zeroes the buffer.
    pub fn clear(&mut self) {
        self.delay.clear();
    }
}
