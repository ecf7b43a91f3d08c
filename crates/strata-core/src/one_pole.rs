//! One-pole lowpass filter.
//!
//! ```text
//! y[n] = (1 − a)·x[n] + a·y[n−1]
//! ```
//!
//! Used for high-frequency damping inside the reverb feedback loop, where the
//! coefficient `a` is set directly from a 0..1 damping amount.
//!
//! ```rust
//! use strata_core::OnePole;
//!
//! let mut lp = OnePole::new(48000.0, 4000.0);
//! let filtered = lp.process(1.0);
//! assert!(filtered < 1.0);
//! ```

use core::f64::consts::TAU;
use libm::exp;

use crate::math::flush_denormal;

/// One-pole (6 dB/oct) lowpass filter.
///
/// `coeff` is always kept in `[0, 1)`.
#[derive(Debug, Clone, Default)]
pub struct OnePole {
    state: f64,
    coeff: f64,
}

impl OnePole {
    /// Creates a lowpass with a cutoff in Hz.
    pub fn new(sample_rate: f64, freq_hz: f64) -> Self {
        let mut filter = Self::default();
        filter.set_frequency(freq_hz, sample_rate);
        filter
    }

    /// Creates a lowpass from a raw coefficient.
    pub fn with_coefficient(coeff: f64) -> Self {
        let mut filter = Self::default();
        filter.set_coefficient(coeff);
        filter
    }

    /// Sets the cutoff: `coeff = exp(−2π·f/fs)`.
    pub fn set_frequency(&mut self, freq_hz: f64, sample_rate: f64) {
        let fs = sample_rate.max(1.0);
        self.set_coefficient(exp(-TAU * freq_hz.max(0.0) / fs));
    }

    /// Sets the pole position directly. 0 is a wire, near 1 is heavy filtering.
    #[inline]
    pub fn set_coefficient(&mut self, coeff: f64) {
        self.coeff = if coeff.is_finite() {
            coeff.clamp(0.0, 0.9999)
        } else {
            0.0
        };
    }

    /// Current coefficient.
    pub fn coefficient(&self) -> f64 {
        self.coeff
    }

    /// Processes one sample.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        self.state = flush_denormal(input + self.coeff * (self.state - input));
        self.state
    }

    /// Zeroes the state.
    pub fn reset(&mut self) {
        self.state = 0.0;
    }
}
