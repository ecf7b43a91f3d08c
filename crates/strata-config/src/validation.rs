//! Range checks for strip settings.
//!
//! The EQ already validates bands as they are added, but a band that was
//! fine at 96 kHz can sit above Nyquist at 44.1 kHz, and compressor and
//! reverb settings are plain public fields. [`validate`] reports every
//! out-of-range value at once; [`clamp_to_ranges`] repairs them instead.
//!
//! # Example
//!
//! ```rust
//! use strata_config::{clamp_to_ranges, validate};
//! use strata_effects::StripParams;
//!
//! let mut strip = StripParams::default();
//! strip.compressor.ratio = 0.5;
//! assert!(validate(&strip, 48000.0).is_err());
//!
//! clamp_to_ranges(&mut strip, 48000.0).unwrap();
//! assert!(validate(&strip, 48000.0).is_ok());
//! ```

use strata_effects::compressor::{MAX_LOOKAHEAD_MS, SidechainFilter};
use strata_effects::eq::EqError;
use strata_effects::eq::band::{FREQUENCY_RANGE, GAIN_RANGE_DB, Q_RANGE, SHELF_SLOPE_RANGE};
use strata_effects::reverb::{MAX_MOD_DEPTH_MS, MAX_PREDELAY_MS};
use strata_effects::{CompressorParams, ReverbParams, StripParams};
use thiserror::Error;

/// Highest band frequency as a fraction of the sample rate.
pub const NYQUIST_MARGIN: f64 = 0.49;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Sample rate is not a positive finite number.
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(f64),

    /// Parameter value out of range.
    #[error("parameter '{param}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Flat key of the parameter.
        param: String,
        /// The value that was out of range.
        value: f64,
        /// Minimum allowed value.
        min: f64,
        /// Maximum allowed value.
        max: f64,
    },

    /// The EQ refused a repaired band.
    #[error("equalizer: {0}")]
    Eq(#[from] EqError),

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Documented range of one numeric parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    /// Field name, as used in flat record keys.
    pub name: &'static str,
    /// Minimum value.
    pub min: f64,
    /// Maximum value.
    pub max: f64,
}

const fn range(name: &'static str, min: f64, max: f64) -> ParamRange {
    ParamRange { name, min, max }
}

/// Compressor parameter ranges.
pub const COMPRESSOR_RANGES: [ParamRange; 8] = [
    range("threshold_db", -60.0, 0.0),
    range("ratio", 1.0, 100.0),
    range("attack_ms", 0.01, 500.0),
    range("release_ms", 1.0, 5000.0),
    range("knee_db", 0.0, 24.0),
    range("makeup_db", -24.0, 24.0),
    range("mix", 0.0, 1.0),
    range("lookahead_ms", 0.0, MAX_LOOKAHEAD_MS),
];

/// Sidechain filter corner range, Hz.
pub const SIDECHAIN_RANGE: (f64, f64) = (20.0, 20000.0);

/// Reverb parameter ranges.
pub const REVERB_RANGES: [ParamRange; 8] = [
    range("decay_s", 0.1, 30.0),
    range("room_size", 0.0, 1.0),
    range("predelay_ms", 0.0, MAX_PREDELAY_MS),
    range("damping", 0.0, 1.0),
    range("diffusion", 0.0, 0.9),
    range("mod_rate_hz", 0.0, 5.0),
    range("mod_depth_ms", 0.0, MAX_MOD_DEPTH_MS),
    range("mix", 0.0, 1.0),
];

pub(crate) fn compressor_values(p: &CompressorParams) -> [f64; 8] {
    [
        p.threshold_db,
        p.ratio,
        p.attack_ms,
        p.release_ms,
        p.knee_db,
        p.makeup_db,
        p.mix,
        p.lookahead_ms,
    ]
}

pub(crate) fn reverb_values(p: &ReverbParams) -> [f64; 8] {
    [
        p.decay_s,
        p.room_size,
        p.predelay_ms,
        p.damping,
        p.diffusion,
        p.mod_rate_hz,
        p.mod_depth_ms,
        p.mix,
    ]
}

fn check(errors: &mut Vec<ValidationError>, param: String, value: f64, min: f64, max: f64) {
    if !(min..=max).contains(&value) {
        errors.push(ValidationError::OutOfRange {
            param,
            value,
            min,
            max,
        });
    }
}

fn check_sample_rate(sample_rate: f64) -> ValidationResult<()> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidSampleRate(sample_rate))
    }
}

/// Highest band frequency usable at `sample_rate`.
pub fn max_band_frequency(sample_rate: f64) -> f64 {
    (sample_rate * NYQUIST_MARGIN).min(FREQUENCY_RANGE.1)
}

/// Checks every strip parameter against its documented range.
///
/// Frequencies must lie below Nyquist, Q must be positive, ratios at least 1
/// and gains inside their ranges. All violations are reported together.
pub fn validate(params: &StripParams, sample_rate: f64) -> ValidationResult<()> {
    check_sample_rate(sample_rate)?;
    let mut errors = Vec::new();

    let top = max_band_frequency(sample_rate);
    for (i, (_, band)) in params.eq.bands().enumerate() {
        check(
            &mut errors,
            format!("eq.{i}.frequency_hz"),
            band.frequency_hz,
            FREQUENCY_RANGE.0,
            top,
        );
        check(
            &mut errors,
            format!("eq.{i}.gain_db"),
            band.gain_db,
            -GAIN_RANGE_DB,
            GAIN_RANGE_DB,
        );
        check(&mut errors, format!("eq.{i}.q"), band.q, Q_RANGE.0, Q_RANGE.1);
        check(
            &mut errors,
            format!("eq.{i}.shelf_slope"),
            band.shelf_slope,
            SHELF_SLOPE_RANGE.0,
            SHELF_SLOPE_RANGE.1,
        );
    }
    check(
        &mut errors,
        "eq.output_gain_db".to_string(),
        params.eq.output_gain_db(),
        -24.0,
        24.0,
    );

    for (r, value) in COMPRESSOR_RANGES.iter().zip(compressor_values(&params.compressor)) {
        check(
            &mut errors,
            format!("compressor.{}", r.name),
            value,
            r.min,
            r.max,
        );
    }
    let SidechainFilter {
        high_pass_hz,
        low_pass_hz,
    } = params.compressor.sidechain;
    for (name, corner) in [("sidechain_hp_hz", high_pass_hz), ("sidechain_lp_hz", low_pass_hz)] {
        if let Some(hz) = corner {
            check(
                &mut errors,
                format!("compressor.{name}"),
                hz,
                SIDECHAIN_RANGE.0,
                SIDECHAIN_RANGE.1.min(sample_rate * NYQUIST_MARGIN),
            );
        }
    }

    for (r, value) in REVERB_RANGES.iter().zip(reverb_values(&params.reverb)) {
        check(&mut errors, format!("reverb.{}", r.name), value, r.min, r.max);
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

/// Forces every strip parameter into range for `sample_rate`.
///
/// Bands above Nyquist are pulled down to [`max_band_frequency`]; compressor
/// and reverb fields are clamped, NaN falling back to defaults. Returns
/// whether anything changed.
pub fn clamp_to_ranges(params: &mut StripParams, sample_rate: f64) -> ValidationResult<bool> {
    check_sample_rate(sample_rate)?;
    let before = params.clone();

    let top = max_band_frequency(sample_rate);
    let high: Vec<_> = params
        .eq
        .bands()
        .filter(|(_, band)| band.frequency_hz > top)
        .map(|(id, band)| (id, *band))
        .collect();
    for (id, mut band) in high {
        band.frequency_hz = top;
        params.eq.set_band(id, band)?;
    }

    params.compressor = params.compressor.clamped();
    let corner_top = SIDECHAIN_RANGE.1.min(sample_rate * NYQUIST_MARGIN);
    for corner in [
        &mut params.compressor.sidechain.high_pass_hz,
        &mut params.compressor.sidechain.low_pass_hz,
    ] {
        if let Some(hz) = corner {
            *hz = hz.min(corner_top);
        }
    }
    params.reverb = params.reverb.clamped();

    Ok(*params != before)
}
