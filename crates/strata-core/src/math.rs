//! Mathematical utility functions for DSP.
//!
//! All functions are allocation-free and suitable for `no_std`.
//!
//! # Level Conversions
//!
//! - [`db_to_linear`] / [`linear_to_db`] - double precision, used for
//!   coefficient design and metering
//!
//! # Stereo
//!
//! - [`ms_encode`] / [`ms_decode`] - exactly invertible mid/side transform
//!
//! # Sample Hygiene
//!
//! - [`flush_denormal`] / [`sanitize`] - keep feedback paths and inputs finite

use libm::{exp, log10};

/// Smallest linear magnitude accepted by [`linear_to_db`] (−600 dB).
pub const MIN_LINEAR: f64 = 1e-30;

/// Convert decibels to linear gain: `10^(db/20)`.
///
/// # Example
/// ```rust
/// use strata_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 1e-12);
/// assert!((db_to_linear(-6.020_599_913) - 0.5).abs() < 1e-9);
/// ```
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    const FACTOR: f64 = core::f64::consts::LN_10 / 20.0;
    exp(db * FACTOR)
}

/// Convert linear gain to decibels: `20·log10(linear)`.
///
/// Inputs below [`MIN_LINEAR`] (including zero and negatives) are floored so
/// the result is always finite.
///
/// # Example
/// ```rust
/// use strata_core::linear_to_db;
///
/// assert!(linear_to_db(1.0).abs() < 1e-12);
/// assert!((linear_to_db(2.0) - 6.0206).abs() < 1e-4);
/// ```
#[inline]
pub fn linear_to_db(linear: f64) -> f64 {
    20.0 * log10(linear.max(MIN_LINEAR))
}

/// Encode a stereo pair into mid/side.
///
/// `mid = (L + R) / 2`, `side = (L − R) / 2`. Inverse of [`ms_decode`].
#[inline]
pub fn ms_encode(left: f64, right: f64) -> (f64, f64) {
    ((left + right) * 0.5, (left - right) * 0.5)
}

/// Decode mid/side back into a stereo pair.
///
/// `L = mid + side`, `R = mid − side`.
#[inline]
pub fn ms_decode(mid: f64, side: f64) -> (f64, f64) {
    (mid + side, mid - side)
}

/// Convert milliseconds to samples.
#[inline]
pub fn ms_to_samples(ms: f64, sample_rate: f64) -> f64 {
    ms * sample_rate / 1000.0
}

/// One-pole smoothing coefficient for a time constant in milliseconds.
///
/// `coeff = exp(−1 / (time_ms · fs / 1000))`. Non-positive times give 0.0
/// (instant response).
#[inline]
pub fn time_constant_coeff(time_ms: f64, sample_rate: f64) -> f64 {
    let samples = ms_to_samples(time_ms, sample_rate);
    if samples <= 0.0 {
        0.0
    } else {
        exp(-1.0 / samples)
    }
}

/// Flush subnormal floats to zero.
///
/// Values below 1e-20 are replaced with zero, leaving margin before the
/// IEEE 754 subnormal range. Non-finite values are also flushed so a single
/// bad sample cannot poison a feedback path.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f64) -> f64 {
    if x.is_finite() && x.abs() >= 1e-20 {
        x
    } else {
        0.0
    }
}

/// Crossfade between dry and wet signals: `dry + (wet − dry)·mix`.
#[inline]
pub fn wet_dry_mix(dry: f64, wet: f64, mix: f64) -> f64 {
    dry + (wet - dry) * mix
}

/// Replace NaN/Inf input samples with silence.
#[inline]
pub fn sanitize(x: f32) -> f32 {
    if x.is_finite() { x } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_linear_roundtrip_full_range() {
        let mut db = -144.0;
        while db <= 24.0 {
            let back = linear_to_db(db_to_linear(db));
            let err = if db == 0.0 {
                back.abs()
            } else {
                ((back - db) / db).abs()
            };
            assert!(err < 1e-9, "roundtrip {db} -> {back} (rel err {err})");
            db += 0.37;
        }
    }

    #[test]
    fn linear_db_roundtrip_relative() {
        for &lin in &[1e-7, 0.001, 0.25, 0.5, 1.0, 3.3, 15.8] {
            let back = db_to_linear(linear_to_db(lin));
            assert!(((back - lin) / lin).abs() < 1e-9, "{lin} -> {back}");
        }
    }

    #[test]
    fn db_known_values() {
        assert!((db_to_linear(20.0) - 10.0).abs() < 1e-12);
        assert!((db_to_linear(-20.0) - 0.1).abs() < 1e-12);
        assert!((db_to_linear(6.020_599_913_279_624) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn linear_to_db_never_infinite() {
        assert!(linear_to_db(0.0).is_finite());
        assert!(linear_to_db(-1.0).is_finite());
    }

    #[test]
    fn mid_side_roundtrip() {
        let pairs = [(0.3, -0.7), (1.0, 1.0), (-0.25, 0.125), (1e-9, 0.9)];
        for (l, r) in pairs {
            let (m, s) = ms_encode(l, r);
            let (l2, r2) = ms_decode(m, s);
            assert!((l - l2).abs() <= f64::EPSILON, "left {l} -> {l2}");
            assert!((r - r2).abs() <= f64::EPSILON, "right {r} -> {r2}");
        }
    }

    #[test]
    fn time_constant_behaviour() {
        assert_eq!(time_constant_coeff(0.0, 48000.0), 0.0);
        let c = time_constant_coeff(10.0, 48000.0);
        assert!(c > 0.99 && c < 1.0);
    }

    #[test]
    fn flush_denormal_handles_bad_values() {
        assert_eq!(flush_denormal(1.0), 1.0);
        assert_eq!(flush_denormal(1e-25), 0.0);
        assert_eq!(flush_denormal(f64::NAN), 0.0);
        assert_eq!(flush_denormal(f64::INFINITY), 0.0);
    }

    #[test]
    fn wet_dry_endpoints() {
        assert_eq!(wet_dry_mix(1.0, 0.5, 0.0), 1.0);
        assert_eq!(wet_dry_mix(1.0, 0.5, 1.0), 0.5);
    }
}
