//! Biquad (bi-quadratic) filter stage.
//!
//! Provides a second-order IIR section evaluated in transposed direct form II,
//! plus coefficient designs from the RBJ Audio EQ Cookbook for every filter
//! shape the EQ needs.
//!
//! Coefficients and state are double precision. Design functions sanitise
//! their inputs (frequency inside `(0, Nyquist)`, `Q > 0`, shelf slope in
//! `(0, 1]`) so they always return a stable transfer function.
//!
//! Design is split from processing: every `*_coefficients` function evaluates
//! trigonometry and belongs on the control plane, while [`Biquad::process`]
//! only runs the five-multiply recursion. [`BellPrototype`] and
//! [`ShelfPrototype`] cache the trigonometric terms of a design so a gain-only
//! change can be recomputed cheaply on the audio thread.
//! [`MatchedBellPrototype`] does the same for a bell that keeps its analog
//! shape near Nyquist.

use core::f64::consts::PI;
use libm::{cos, exp, sin, sqrt, tan};

use crate::math::flush_denormal;

/// Lowest design frequency in Hz.
pub const MIN_FREQUENCY: f64 = 1.0;

/// Highest design frequency as a fraction of the sample rate.
pub const MAX_FREQUENCY_RATIO: f64 = 0.499;

/// Smallest Q accepted by the designs.
pub const MIN_Q: f64 = 1e-3;

/// Normalised biquad coefficients (`a0` divided out).
///
/// Transfer function:
/// ```text
///        b0 + b1·z⁻¹ + b2·z⁻²
/// H(z) = --------------------
///        1  + a1·z⁻¹ + a2·z⁻²
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    /// Feedforward coefficient for x[n].
    pub b0: f64,
    /// Feedforward coefficient for x[n-1].
    pub b1: f64,
    /// Feedforward coefficient for x[n-2].
    pub b2: f64,
    /// Feedback coefficient for y[n-1].
    pub a1: f64,
    /// Feedback coefficient for y[n-2].
    pub a2: f64,
}

impl Coefficients {
    /// Passthrough: `y[n] = x[n]`.
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Build from raw cookbook terms, normalising by `a0`.
    ///
    /// A vanishing `a0` yields [`Coefficients::IDENTITY`].
    pub fn from_raw(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        if a0.abs() < 1e-30 || !a0.is_finite() {
            return Self::IDENTITY;
        }
        let inv = 1.0 / a0;
        Self {
            b0: b0 * inv,
            b1: b1 * inv,
            b2: b2 * inv,
            a1: a1 * inv,
            a2: a2 * inv,
        }
    }

    /// Returns true when both poles lie strictly inside the unit circle.
    ///
    /// Uses the Jury stability conditions for a second-order denominator:
    /// `|a2| < 1` and `|a1| < 1 + a2`.
    pub fn is_stable(&self) -> bool {
        self.a2.abs() < 1.0 && self.a1.abs() < 1.0 + self.a2
    }

    /// Linear magnitude response at `freq` Hz.
    pub fn magnitude(&self, freq: f64, sample_rate: f64) -> f64 {
        let w = 2.0 * PI * freq / sample_rate;
        let (c1, s1) = (cos(w), sin(w));
        let (c2, s2) = (cos(2.0 * w), sin(2.0 * w));

        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = 1.0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);

        let num = num_re * num_re + num_im * num_im;
        let den = (den_re * den_re + den_im * den_im).max(1e-300);
        sqrt(num / den)
    }

    /// Magnitude response at `freq` Hz in decibels.
    pub fn magnitude_db(&self, freq: f64, sample_rate: f64) -> f64 {
        crate::math::linear_to_db(self.magnitude(freq, sample_rate))
    }
}

impl Default for Coefficients {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Second-order IIR filter stage.
///
/// Transposed direct form II:
/// ```text
/// y[n]  = b0·x[n] + z1
/// z1'   = b1·x[n] − a1·y[n] + z2
/// z2'   = b2·x[n] − a2·y[n]
/// ```
///
/// Two state values, O(1) per sample, never allocates. State is flushed to
/// zero when it turns subnormal or non-finite.
///
/// # Example
///
/// ```rust
/// use strata_core::{Biquad, lowpass_coefficients};
///
/// let mut lp = Biquad::new();
/// lp.set_coefficients(lowpass_coefficients(1000.0, 0.707, 48000.0));
/// let y = lp.process(1.0);
/// assert!(y.is_finite());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Biquad {
    coeffs: Coefficients,
    z1: f64,
    z2: f64,
}

impl Biquad {
    /// Creates a biquad with passthrough coefficients.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a biquad with the given coefficients and silent state.
    pub fn with_coefficients(coeffs: Coefficients) -> Self {
        Self {
            coeffs,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Replaces the coefficients, keeping the state.
    #[inline]
    pub fn set_coefficients(&mut self, coeffs: Coefficients) {
        self.coeffs = coeffs;
    }

    /// Current coefficients.
    #[inline]
    pub fn coefficients(&self) -> &Coefficients {
        &self.coeffs
    }

    /// Processes one sample.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let c = &self.coeffs;
        let output = c.b0 * input + self.z1;
        self.z1 = flush_denormal(c.b1 * input - c.a1 * output + self.z2);
        self.z2 = flush_denormal(c.b2 * input - c.a2 * output);
        output
    }

    /// Zeroes the state without touching the coefficients.
    ///
    /// Call on seek or any other stream discontinuity.
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    /// Returns the `(z1, z2)` state.
    pub fn state(&self) -> (f64, f64) {
        (self.z1, self.z2)
    }
}

/// Clamps a design frequency into `[MIN_FREQUENCY, MAX_FREQUENCY_RATIO·fs]`.
#[inline]
pub fn clamp_frequency(freq: f64, sample_rate: f64) -> f64 {
    let max = (sample_rate * MAX_FREQUENCY_RATIO).max(MIN_FREQUENCY);
    if freq.is_finite() {
        freq.clamp(MIN_FREQUENCY, max)
    } else {
        max
    }
}

#[inline]
fn sanitize_q(q: f64) -> f64 {
    if q.is_finite() { q.max(MIN_Q) } else { MIN_Q }
}

#[inline]
fn sanitize_rate(sample_rate: f64) -> f64 {
    if sample_rate.is_finite() { sample_rate.max(1.0) } else { 48000.0 }
}

/// Angular frequency `ω = 2π·f/fs` after clamping.
#[inline]
fn omega(freq: f64, sample_rate: f64) -> f64 {
    let fs = sanitize_rate(sample_rate);
    2.0 * PI * clamp_frequency(freq, fs) / fs
}

/// `A = 10^(gain/40)`, the square root of the linear gain.
#[inline]
fn shelf_amplitude(gain_db: f64) -> f64 {
    const FACTOR: f64 = core::f64::consts::LN_10 / 40.0;
    exp(gain_db * FACTOR)
}

/// Low-pass (high-cut) coefficients.
pub fn lowpass_coefficients(freq: f64, q: f64, sample_rate: f64) -> Coefficients {
    let w = omega(freq, sample_rate);
    let (cw, sw) = (cos(w), sin(w));
    let alpha = sw / (2.0 * sanitize_q(q));
    Coefficients::from_raw(
        (1.0 - cw) / 2.0,
        1.0 - cw,
        (1.0 - cw) / 2.0,
        1.0 + alpha,
        -2.0 * cw,
        1.0 - alpha,
    )
}

/// High-pass (low-cut) coefficients.
pub fn highpass_coefficients(freq: f64, q: f64, sample_rate: f64) -> Coefficients {
    let w = omega(freq, sample_rate);
    let (cw, sw) = (cos(w), sin(w));
    let alpha = sw / (2.0 * sanitize_q(q));
    Coefficients::from_raw(
        (1.0 + cw) / 2.0,
        -(1.0 + cw),
        (1.0 + cw) / 2.0,
        1.0 + alpha,
        -2.0 * cw,
        1.0 - alpha,
    )
}

/// First-order low-pass via the prewarped bilinear transform (6 dB/oct).
pub fn first_order_lowpass_coefficients(freq: f64, sample_rate: f64) -> Coefficients {
    let k = tan(omega(freq, sample_rate) / 2.0);
    Coefficients::from_raw(k, k, 0.0, k + 1.0, k - 1.0, 0.0)
}

/// First-order high-pass via the prewarped bilinear transform (6 dB/oct).
pub fn first_order_highpass_coefficients(freq: f64, sample_rate: f64) -> Coefficients {
    let k = tan(omega(freq, sample_rate) / 2.0);
    Coefficients::from_raw(1.0, -1.0, 0.0, k + 1.0, k - 1.0, 0.0)
}

/// Band-pass coefficients with constant 0 dB peak gain.
pub fn bandpass_coefficients(freq: f64, q: f64, sample_rate: f64) -> Coefficients {
    let w = omega(freq, sample_rate);
    let (cw, sw) = (cos(w), sin(w));
    let alpha = sw / (2.0 * sanitize_q(q));
    Coefficients::from_raw(alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cw, 1.0 - alpha)
}

/// Notch (band-reject) coefficients, unity gain away from the notch.
pub fn notch_coefficients(freq: f64, q: f64, sample_rate: f64) -> Coefficients {
    let w = omega(freq, sample_rate);
    let (cw, sw) = (cos(w), sin(w));
    let alpha = sw / (2.0 * sanitize_q(q));
    Coefficients::from_raw(1.0, -2.0 * cw, 1.0, 1.0 + alpha, -2.0 * cw, 1.0 - alpha)
}

/// All-pass coefficients: unity magnitude, phase turns through −360° around `freq`.
pub fn allpass_coefficients(freq: f64, q: f64, sample_rate: f64) -> Coefficients {
    let w = omega(freq, sample_rate);
    let (cw, sw) = (cos(w), sin(w));
    let alpha = sw / (2.0 * sanitize_q(q));
    Coefficients::from_raw(
        1.0 - alpha,
        -2.0 * cw,
        1.0 + alpha,
        1.0 + alpha,
        -2.0 * cw,
        1.0 - alpha,
    )
}

/// Peaking (bell) coefficients.
///
/// `A = 10^(gain/40)`, `α = sin ω / 2Q`, `a0 = 1 + α/A`. The magnitude at
/// `freq` is exactly `gain_db`.
pub fn bell_coefficients(freq: f64, q: f64, gain_db: f64, sample_rate: f64) -> Coefficients {
    BellPrototype::new(freq, q, sample_rate).coefficients(gain_db)
}

/// Bell whose magnitude follows the analog prototype up to Nyquist.
///
/// See [`MatchedBellPrototype`]. The magnitude at `freq` is exactly `gain_db`.
pub fn matched_bell_coefficients(freq: f64, q: f64, gain_db: f64, sample_rate: f64) -> Coefficients {
    MatchedBellPrototype::new(freq, q, sample_rate).coefficients(gain_db)
}

/// Low-shelf coefficients. `slope` is the cookbook shelf slope `S` in `(0, 1]`.
pub fn low_shelf_coefficients(freq: f64, gain_db: f64, slope: f64, sample_rate: f64) -> Coefficients {
    ShelfPrototype::new(ShelfKind::Low, freq, slope, sample_rate).coefficients(gain_db)
}

/// High-shelf coefficients. `slope` is the cookbook shelf slope `S` in `(0, 1]`.
pub fn high_shelf_coefficients(freq: f64, gain_db: f64, slope: f64, sample_rate: f64) -> Coefficients {
    ShelfPrototype::new(ShelfKind::High, freq, slope, sample_rate).coefficients(gain_db)
}

/// First-order tilt around a pivot frequency.
///
/// Frequencies far below `freq` are attenuated by `gain_db/2`, frequencies
/// far above are boosted by `gain_db/2`, the pivot itself passes at 0 dB.
pub fn tilt_coefficients(freq: f64, gain_db: f64, sample_rate: f64) -> Coefficients {
    TiltPrototype::new(freq, sample_rate).coefficients(gain_db)
}

/// Cached trigonometry of a bell design.
///
/// Built on the control plane; [`BellPrototype::coefficients`] evaluates only
/// an exponential and a handful of multiplies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BellPrototype {
    cos_w: f64,
    alpha: f64,
}

impl BellPrototype {
    /// Precompute the frequency/Q dependent terms.
    pub fn new(freq: f64, q: f64, sample_rate: f64) -> Self {
        let w = omega(freq, sample_rate);
        Self {
            cos_w: cos(w),
            alpha: sin(w) / (2.0 * sanitize_q(q)),
        }
    }

    /// Coefficients for the given gain.
    #[inline]
    pub fn coefficients(&self, gain_db: f64) -> Coefficients {
        let a = shelf_amplitude(gain_db);
        let alpha = self.alpha;
        Coefficients::from_raw(
            1.0 + alpha * a,
            -2.0 * self.cos_w,
            1.0 - alpha * a,
            1.0 + alpha / a,
            -2.0 * self.cos_w,
            1.0 - alpha / a,
        )
    }
}

/// Cached terms of a magnitude-matched bell.
///
/// The cookbook bell squeezes towards Nyquist because of the bilinear
/// frequency warp. This design places the poles by impulse invariance and
/// solves the numerator so the digital magnitude equals the analog bell
/// `(s² + s·A/Q + 1) / (s² + s/(A·Q) + 1)` at DC, at the centre frequency and
/// at Nyquist. Cuts are the exact inverse of the matching boost.
///
/// A gain change costs an exponential, a cosine and a few square roots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedBellPrototype {
    w0: f64,
    q: f64,
    half_sin_sq: f64,
    nyquist_ratio_sq: f64,
}

impl MatchedBellPrototype {
    /// Precompute the frequency/Q dependent terms.
    pub fn new(freq: f64, q: f64, sample_rate: f64) -> Self {
        let w0 = omega(freq, sample_rate);
        let half_sin = sin(w0 / 2.0);
        let nyquist_ratio = PI / w0;
        Self {
            w0,
            q: sanitize_q(q),
            half_sin_sq: half_sin * half_sin,
            nyquist_ratio_sq: nyquist_ratio * nyquist_ratio,
        }
    }

    /// Coefficients for the given gain.
    pub fn coefficients(&self, gain_db: f64) -> Coefficients {
        let gain_db = if gain_db.is_finite() { gain_db } else { 0.0 };
        let [b0, b1, b2, a1, a2] = self.boost(shelf_amplitude(gain_db.abs()));
        if gain_db < 0.0 {
            Coefficients::from_raw(1.0, a1, a2, b0, b1, b2)
        } else {
            Coefficients::from_raw(b0, b1, b2, 1.0, a1, a2)
        }
    }

    /// Squared analog magnitude at Nyquist for amplitude `a`.
    fn nyquist_power(&self, a: f64) -> f64 {
        let w2 = self.nyquist_ratio_sq;
        let flat = (1.0 - w2) * (1.0 - w2);
        let qq = self.q * self.q;
        (flat + a * a * w2 / qq) / (flat + w2 / (a * a * qq))
    }

    /// `[b0, b1, b2, a1, a2]` of the boost with amplitude `a ≥ 1`.
    fn boost(&self, a: f64) -> [f64; 5] {
        let w0 = self.w0;
        let zeta = 1.0 / (2.0 * self.q * a);
        let decay = exp(-zeta * w0);
        let a2 = decay * decay;
        let a1 = if zeta <= 1.0 {
            -2.0 * decay * cos(sqrt(1.0 - zeta * zeta) * w0)
        } else {
            let spread = sqrt(zeta * zeta - 1.0);
            -(exp(-w0 * (zeta - spread)) + exp(-w0 * (zeta + spread)))
        };

        // Squared magnitudes expressed over φ1 = sin²(ω/2), φ0 = 1 − φ1, φ2 = 4·φ0·φ1.
        let den0 = (1.0 + a1 + a2) * (1.0 + a1 + a2);
        let den1 = (1.0 - a1 + a2) * (1.0 - a1 + a2);
        let den2 = -4.0 * a2;
        let phi1 = self.half_sin_sq;
        let phi0 = 1.0 - phi1;
        let phi2 = 4.0 * phi0 * phi1;

        let power = a * a * a * a;
        let num0 = den0;
        let num1 = den1 * self.nyquist_power(a);
        let num2 = (power * (den0 * phi0 + den1 * phi1 + den2 * phi2) - num0 * phi0 - num1 * phi1)
            / phi2;

        let (root0, root1) = (sqrt(num0), sqrt(num1));
        let w = 0.5 * (root0 + root1);
        let b0 = 0.5 * (w + sqrt((w * w + num2).max(0.0)));
        let b1 = 0.5 * (root0 - root1);
        let b2 = -num2 / (4.0 * b0);
        [b0, b1, b2, a1, a2]
    }
}

/// Which side of the corner a shelf acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShelfKind {
    /// Boost/cut below the corner.
    Low,
    /// Boost/cut above the corner.
    High,
}

/// Cached trigonometry of a shelf design.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShelfPrototype {
    kind: ShelfKind,
    cos_w: f64,
    half_sin_w: f64,
    slope_term: f64,
}

impl ShelfPrototype {
    /// Precompute the frequency/slope dependent terms.
    pub fn new(kind: ShelfKind, freq: f64, slope: f64, sample_rate: f64) -> Self {
        let w = omega(freq, sample_rate);
        let slope = if slope.is_finite() { slope.clamp(0.01, 1.0) } else { 1.0 };
        Self {
            kind,
            cos_w: cos(w),
            half_sin_w: sin(w) / 2.0,
            slope_term: 1.0 / slope - 1.0,
        }
    }

    /// Coefficients for the given gain.
    #[inline]
    pub fn coefficients(&self, gain_db: f64) -> Coefficients {
        let a = shelf_amplitude(gain_db);
        let cw = self.cos_w;
        let alpha = self.half_sin_w * sqrt((a + 1.0 / a) * self.slope_term + 2.0);
        let two_sqrt_a_alpha = 2.0 * sqrt(a) * alpha;

        match self.kind {
            ShelfKind::Low => Coefficients::from_raw(
                a * ((a + 1.0) - (a - 1.0) * cw + two_sqrt_a_alpha),
                2.0 * a * ((a - 1.0) - (a + 1.0) * cw),
                a * ((a + 1.0) - (a - 1.0) * cw - two_sqrt_a_alpha),
                (a + 1.0) + (a - 1.0) * cw + two_sqrt_a_alpha,
                -2.0 * ((a - 1.0) + (a + 1.0) * cw),
                (a + 1.0) + (a - 1.0) * cw - two_sqrt_a_alpha,
            ),
            ShelfKind::High => Coefficients::from_raw(
                a * ((a + 1.0) + (a - 1.0) * cw + two_sqrt_a_alpha),
                -2.0 * a * ((a - 1.0) + (a + 1.0) * cw),
                a * ((a + 1.0) + (a - 1.0) * cw - two_sqrt_a_alpha),
                (a + 1.0) - (a - 1.0) * cw + two_sqrt_a_alpha,
                2.0 * ((a - 1.0) - (a + 1.0) * cw),
                (a + 1.0) - (a - 1.0) * cw - two_sqrt_a_alpha,
            ),
        }
    }
}

/// Cached prewarped corner of a tilt design.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TiltPrototype {
    k: f64,
}

impl TiltPrototype {
    /// Precompute `tan(ω/2)` for the pivot.
    pub fn new(freq: f64, sample_rate: f64) -> Self {
        Self {
            k: tan(omega(freq, sample_rate) / 2.0),
        }
    }

    /// Coefficients for the given total tilt.
    #[inline]
    pub fn coefficients(&self, gain_db: f64) -> Coefficients {
        let k = self.k;
        let inv_a = 1.0 / shelf_amplitude(gain_db);
        Coefficients::from_raw(1.0 + k * inv_a, k * inv_a - 1.0, 0.0, k + inv_a, k - inv_a, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FS: f64 = 48000.0;

    #[test]
    fn passthrough() {
        let mut biquad = Biquad::new();
        for i in 0..10 {
            let input = f64::from(i) * 0.1;
            assert!((biquad.process(input) - input).abs() < 1e-12);
        }
    }

    #[test]
    fn reset_keeps_coefficients() {
        let coeffs = lowpass_coefficients(1000.0, 0.707, FS);
        let mut biquad = Biquad::with_coefficients(coeffs);
        for _ in 0..10 {
            biquad.process(1.0);
        }
        biquad.reset();
        assert_eq!(biquad.state(), (0.0, 0.0));
        assert_eq!(*biquad.coefficients(), coeffs);
    }

    #[test]
    fn lowpass_passes_dc() {
        let mut biquad = Biquad::with_coefficients(lowpass_coefficients(1000.0, 0.707, FS));
        let mut out = 0.0;
        for _ in 0..2000 {
            out = biquad.process(1.0);
        }
        assert!((out - 1.0).abs() < 1e-6, "DC through LPF: {out}");
    }

    #[test]
    fn bell_centre_gain_is_exact() {
        for &gain in &[-18.0, -6.0, 0.0, 3.0, 12.0] {
            let c = bell_coefficients(1000.0, 1.0, gain, FS);
            assert!((c.magnitude_db(1000.0, FS) - gain).abs() < 1e-6);
        }
    }

    #[test]
    fn shelves_reach_gain() {
        let low = low_shelf_coefficients(200.0, 6.0, 1.0, FS);
        assert!((low.magnitude_db(10.0, FS) - 6.0).abs() < 0.1);
        assert!(low.magnitude_db(15000.0, FS).abs() < 0.1);

        let high = high_shelf_coefficients(4000.0, -9.0, 0.7, FS);
        assert!((high.magnitude_db(20000.0, FS) + 9.0).abs() < 0.2);
        assert!(high.magnitude_db(50.0, FS).abs() < 0.1);
    }

    #[test]
    fn shelf_midpoint_is_half_gain() {
        let c = low_shelf_coefficients(500.0, 12.0, 1.0, FS);
        assert!((c.magnitude_db(500.0, FS) - 6.0).abs() < 0.05);
    }

    #[test]
    fn notch_and_allpass() {
        let notch = notch_coefficients(1000.0, 2.0, FS);
        assert!(notch.magnitude_db(1000.0, FS) < -100.0);
        assert!(notch.magnitude_db(100.0, FS).abs() < 0.1);

        let ap = allpass_coefficients(1000.0, 0.7, FS);
        for &f in &[30.0, 500.0, 1000.0, 7000.0, 20000.0] {
            assert!(ap.magnitude_db(f, FS).abs() < 1e-9);
        }
    }

    #[test]
    fn bandpass_peak_unity() {
        let bp = bandpass_coefficients(2000.0, 4.0, FS);
        assert!(bp.magnitude_db(2000.0, FS).abs() < 1e-6);
        assert!(bp.magnitude_db(200.0, FS) < -20.0);
    }

    #[test]
    fn tilt_is_symmetric_around_pivot() {
        let c = tilt_coefficients(1000.0, 6.0, FS);
        assert!(c.magnitude_db(1000.0, FS).abs() < 0.05);
        assert!((c.magnitude_db(10.0, FS) + 3.0).abs() < 0.1);
        assert!((c.magnitude_db(22000.0, FS) - 3.0).abs() < 0.2);
    }

    #[test]
    fn first_order_corner_is_minus_three() {
        let lp = first_order_lowpass_coefficients(1000.0, FS);
        assert!((lp.magnitude_db(1000.0, FS) + 3.0103).abs() < 0.01);
        let hp = first_order_highpass_coefficients(1000.0, FS);
        assert!((hp.magnitude_db(1000.0, FS) + 3.0103).abs() < 0.01);
    }

    #[test]
    fn designs_are_stable_at_extremes() {
        let cases = [
            lowpass_coefficients(0.0, 0.0, FS),
            highpass_coefficients(1e9, 50.0, FS),
            bell_coefficients(f64::NAN, -1.0, 24.0, FS),
            low_shelf_coefficients(-5.0, -30.0, 0.0, FS),
            high_shelf_coefficients(23999.0, 30.0, 5.0, FS),
            notch_coefficients(5.0, 0.0, FS),
            allpass_coefficients(20000.0, 100.0, FS),
            tilt_coefficients(20.0, 24.0, FS),
            matched_bell_coefficients(10.0, 0.025, 30.0, FS),
            matched_bell_coefficients(23990.0, 40.0, -30.0, FS),
            matched_bell_coefficients(23990.0, 0.001, 30.0, FS),
        ];
        for c in cases {
            assert!(c.is_stable(), "unstable design: {c:?}");
            assert!(c.b0.is_finite() && c.a1.is_finite());
        }
    }

    /// Analog bell prototype magnitude at `freq`, in dB.
    fn analog_bell_db(freq: f64, centre: f64, q: f64, gain_db: f64) -> f64 {
        let a = libm::pow(10.0, gain_db / 40.0);
        let w = freq / centre;
        let flat = (1.0 - w * w) * (1.0 - w * w);
        10.0 * libm::log10((flat + (a * w / q).powi(2)) / (flat + (w / (a * q)).powi(2)))
    }

    #[test]
    fn matched_bell_follows_analog_prototype() {
        let matched = matched_bell_coefficients(8000.0, 1.0, 6.0, FS);
        let cookbook = bell_coefficients(8000.0, 1.0, 6.0, FS);
        assert!((matched.magnitude_db(8000.0, FS) - 6.0).abs() < 1e-6);
        for f in [4000.0, 12000.0, 16000.0, 20000.0, 24000.0] {
            let analog = analog_bell_db(f, 8000.0, 1.0, 6.0);
            let err = (matched.magnitude_db(f, FS) - analog).abs();
            let cookbook_err = (cookbook.magnitude_db(f, FS) - analog).abs();
            assert!(err < 0.3, "{f} Hz: matched off by {err} dB");
            assert!(err < cookbook_err, "{f} Hz: {err} vs cookbook {cookbook_err}");
        }
    }

    #[test]
    fn matched_bell_cut_inverts_boost() {
        let boost = matched_bell_coefficients(12000.0, 2.0, 9.0, FS);
        let cut = matched_bell_coefficients(12000.0, 2.0, -9.0, FS);
        for f in [100.0, 3000.0, 12000.0, 18000.0] {
            let sum = boost.magnitude_db(f, FS) + cut.magnitude_db(f, FS);
            assert!(sum.abs() < 1e-9, "{f} Hz: {sum}");
        }
    }

    #[test]
    fn matched_bell_agrees_with_cookbook_far_below_nyquist() {
        let matched = matched_bell_coefficients(100.0, 1.0, 6.0, FS);
        let cookbook = bell_coefficients(100.0, 1.0, 6.0, FS);
        for f in [30.0, 100.0, 300.0, 1000.0] {
            let diff = matched.magnitude_db(f, FS) - cookbook.magnitude_db(f, FS);
            assert!(diff.abs() < 0.01, "{f} Hz: {diff}");
        }
        let flat = matched_bell_coefficients(5000.0, 1.0, 0.0, FS);
        assert!(flat.magnitude_db(11000.0, FS).abs() < 1e-9);
    }

    #[test]
    fn prototype_matches_direct_design() {
        let proto = BellPrototype::new(2500.0, 0.8, FS);
        assert_eq!(proto.coefficients(4.5), bell_coefficients(2500.0, 0.8, 4.5, FS));
    }
}
