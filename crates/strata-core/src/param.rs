//! Parameter smoothing for zipper-free changes.
//!
//! - [`SmoothedParam`]: exponential (one-pole) approach, used for makeup gain
//!   and output level.
//! - [`LinearRamp`]: constant-rate ramp with an exact duration, used for
//!   bypass crossfades.
//!
//! ## Usage
//!
//! ```rust
//! use strata_core::SmoothedParam;
//!
//! let mut gain = SmoothedParam::with_config(1.0, 48000.0, 10.0);
//! gain.set_target(0.5);
//! for _ in 0..480 {
//!     let _g = gain.advance();
//! }
//! assert!(gain.get() < 0.7);
//! ```

use libm::exp;

/// A parameter with exponential smoothing.
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    current: f64,
    target: f64,
    /// 1.0 = instant, towards 0 = slower
    coeff: f64,
    sample_rate: f64,
    smoothing_time_ms: f64,
}

impl SmoothedParam {
    /// Creates a parameter with smoothing disabled.
    pub fn new(initial: f64) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: 1.0,
            sample_rate: 48000.0,
            smoothing_time_ms: 0.0,
        }
    }

    /// Creates a parameter with the given sample rate and smoothing time.
    pub fn with_config(initial: f64, sample_rate: f64, smoothing_time_ms: f64) -> Self {
        let mut param = Self::new(initial);
        param.sample_rate = sample_rate;
        param.smoothing_time_ms = smoothing_time_ms;
        param.recalculate_coeff();
        param
    }

    /// Sets the value to approach.
    #[inline]
    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    /// Sets the target and jumps to it.
    #[inline]
    pub fn set_immediate(&mut self, value: f64) {
        self.target = value;
        self.current = value;
    }

    /// Updates the sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    /// Sets the smoothing time constant in milliseconds.
    pub fn set_smoothing_time_ms(&mut self, time_ms: f64) {
        self.smoothing_time_ms = time_ms;
        self.recalculate_coeff();
    }

    /// Advances one sample and returns the smoothed value.
    #[inline]
    pub fn advance(&mut self) -> f64 {
        self.current += self.coeff * (self.target - self.current);
        self.current
    }

    /// Current value without advancing.
    #[inline]
    pub fn get(&self) -> f64 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f64 {
        self.target
    }

    /// True once within 1e-9 of the target.
    #[inline]
    pub fn is_settled(&self) -> bool {
        (self.current - self.target).abs() < 1e-9
    }

    /// Jumps to the target.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }

    /// `coeff = 1 − exp(−1 / (τ · fs))`; zero time means instant.
    fn recalculate_coeff(&mut self) {
        if self.smoothing_time_ms <= 0.0 || self.sample_rate <= 0.0 {
            self.coeff = 1.0;
        } else {
            let samples = self.smoothing_time_ms / 1000.0 * self.sample_rate;
            self.coeff = 1.0 - exp(-1.0 / samples);
        }
    }
}

impl Default for SmoothedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// A linear ramp that reaches its target in an exact number of samples.
///
/// ```rust
/// use strata_core::LinearRamp;
///
/// let mut fade = LinearRamp::with_config(1.0, 48000.0, 5.0);
/// fade.set_target(0.0);
/// for _ in 0..240 {
///     fade.advance();
/// }
/// assert_eq!(fade.get(), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct LinearRamp {
    current: f64,
    target: f64,
    increment: f64,
    samples_remaining: u32,
    sample_rate: f64,
    transition_time_ms: f64,
}

impl LinearRamp {
    /// Creates a ramp with a 10 ms transition at 48 kHz.
    pub fn new(initial: f64) -> Self {
        Self::with_config(initial, 48000.0, 10.0)
    }

    /// Creates a ramp with the given sample rate and transition time.
    pub fn with_config(initial: f64, sample_rate: f64, transition_time_ms: f64) -> Self {
        Self {
            current: initial,
            target: initial,
            increment: 0.0,
            samples_remaining: 0,
            sample_rate,
            transition_time_ms,
        }
    }

    /// Starts a ramp from the current value toward `target`.
    pub fn set_target(&mut self, target: f64) {
        if (target - self.target).abs() < 1e-12 {
            return;
        }
        self.target = target;

        let samples = (self.transition_time_ms / 1000.0 * self.sample_rate) as u32;
        if samples == 0 {
            self.snap_to_target();
        } else {
            self.increment = (target - self.current) / f64::from(samples);
            self.samples_remaining = samples;
        }
    }

    /// Sets the value immediately.
    pub fn set_immediate(&mut self, value: f64) {
        self.current = value;
        self.target = value;
        self.increment = 0.0;
        self.samples_remaining = 0;
    }

    /// Updates the sample rate for future ramps.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
    }

    /// Sets the transition time for future ramps.
    pub fn set_transition_time_ms(&mut self, time_ms: f64) {
        self.transition_time_ms = time_ms;
    }

    /// Advances one sample and returns the value.
    #[inline]
    pub fn advance(&mut self) -> f64 {
        if self.samples_remaining > 0 {
            self.current += self.increment;
            self.samples_remaining -= 1;
            if self.samples_remaining == 0 {
                self.current = self.target;
            }
        }
        self.current
    }

    /// Current value without advancing.
    #[inline]
    pub fn get(&self) -> f64 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f64 {
        self.target
    }

    /// True when no ramp is in progress.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.samples_remaining == 0
    }

    /// Jumps to the target.
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
        self.increment = 0.0;
        self.samples_remaining = 0;
    }
}

impl Default for LinearRamp {
    fn default() -> Self {
        Self::new(0.0)
    }
}
