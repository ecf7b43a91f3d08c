//! Envelope follower for tracking signal amplitude.
//!
//! Used by the compressor detector and by dynamic EQ bands.

use libm::sqrt;

use crate::math::{flush_denormal, time_constant_coeff};

/// How the follower measures level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DetectionMode {
    /// Rectified peak with asymmetric attack/release.
    #[default]
    Peak,
    /// Root-mean-square: the squared signal is smoothed, then square-rooted.
    Rms,
}

/// Envelope follower with separate attack and release times.
///
/// Coefficients follow `coeff = exp(−1 / (time_ms · fs / 1000))`.
///
/// # Example
///
/// ```rust
/// use strata_core::EnvelopeFollower;
///
/// let mut env = EnvelopeFollower::new(48000.0);
/// env.set_attack_ms(10.0);
/// env.set_release_ms(100.0);
///
/// let level = env.process(0.5);
/// assert!(level > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct EnvelopeFollower {
    /// Smoothed level (squared in RMS mode).
    state: f64,
    attack_coeff: f64,
    release_coeff: f64,
    sample_rate: f64,
    attack_ms: f64,
    release_ms: f64,
    mode: DetectionMode,
}

impl EnvelopeFollower {
    /// Creates a peak follower with 10 ms attack and 100 ms release.
    pub fn new(sample_rate: f64) -> Self {
        let mut follower = Self {
            state: 0.0,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            sample_rate,
            attack_ms: 10.0,
            release_ms: 100.0,
            mode: DetectionMode::Peak,
        };
        follower.recalculate_coefficients();
        follower
    }

    /// Creates a follower with the given times.
    pub fn with_times(sample_rate: f64, attack_ms: f64, release_ms: f64) -> Self {
        let mut follower = Self::new(sample_rate);
        follower.attack_ms = attack_ms.max(0.0);
        follower.release_ms = release_ms.max(0.0);
        follower.recalculate_coefficients();
        follower
    }

    /// Sets the attack time in milliseconds.
    pub fn set_attack_ms(&mut self, attack_ms: f64) {
        self.attack_ms = attack_ms.max(0.0);
        self.recalculate_coefficients();
    }

    /// Attack time in milliseconds.
    pub fn attack_ms(&self) -> f64 {
        self.attack_ms
    }

    /// Sets the release time in milliseconds.
    pub fn set_release_ms(&mut self, release_ms: f64) {
        self.release_ms = release_ms.max(0.0);
        self.recalculate_coefficients();
    }

    /// Release time in milliseconds.
    pub fn release_ms(&self) -> f64 {
        self.release_ms
    }

    /// Selects peak or RMS detection. Resets the level.
    pub fn set_mode(&mut self, mode: DetectionMode) {
        if self.mode != mode {
            self.mode = mode;
            self.state = 0.0;
        }
    }

    /// Current detection mode.
    pub fn mode(&self) -> DetectionMode {
        self.mode
    }

    /// Updates the sample rate and recalculates coefficients.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.recalculate_coefficients();
    }

    /// Processes one sample and returns the linear envelope level.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let x = match self.mode {
            DetectionMode::Peak => input.abs(),
            DetectionMode::Rms => input * input,
        };
        let coeff = if x > self.state {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.state = flush_denormal(x + coeff * (self.state - x));
        self.level()
    }

    /// Current envelope level without processing new input.
    #[inline]
    pub fn level(&self) -> f64 {
        match self.mode {
            DetectionMode::Peak => self.state,
            DetectionMode::Rms => sqrt(self.state),
        }
    }

    /// Resets the envelope to zero.
    pub fn reset(&mut self) {
        self.state = 0.0;
    }

    fn recalculate_coefficients(&mut self) {
        self.attack_coeff = time_constant_coeff(self.attack_ms, self.sample_rate);
        self.release_coeff = time_constant_coeff(self.release_ms, self.sample_rate);
    }
}

impl Default for EnvelopeFollower {
    fn default() -> Self {
        Self::new(48000.0)
    }
}
