//! Strata Core - DSP primitives for the strata channel strip
//!
//! This crate provides the building blocks the EQ, dynamics and reverb
//! processors are made of. Everything here is real-time safe: after
//! construction nothing allocates, locks or fails.
//!
//! # Core Abstractions
//!
//! ## Effect System
//!
//! - [`Effect`] - Object-safe trait for stereo processors
//!
//! ## Filters
//!
//! - [`Biquad`] - Second-order IIR stage, transposed direct form II
//! - [`Coefficients`] - Normalised biquad coefficients with response evaluation
//! - [`Cascade`] / [`CascadeDesign`] - Up to eight biquads in series, Butterworth slopes
//! - [`BellPrototype`] / [`ShelfPrototype`] / [`TiltPrototype`] - Cached designs for gain-only updates
//! - [`OnePole`] - 6 dB/oct lowpass for damping
//! - [`AllpassFilter`] - Schroeder allpass for diffusion
//!
//! ## Delay Lines
//!
//! - [`DelayLine`] - Fixed-capacity ring buffer with fractional reads
//!
//! ## Dynamics & Smoothing
//!
//! - [`EnvelopeFollower`] - Peak or RMS level detection
//! - [`SmoothedParam`] - Exponential parameter smoothing
//! - [`LinearRamp`] - Fixed-duration linear ramps for crossfades
//!
//! ## Utilities
//!
//! - Level conversions: [`db_to_linear`], [`linear_to_db`]
//! - Mid/side: [`ms_encode`], [`ms_decode`]
//!
//! # Precision
//!
//! Coefficients, filter state and internal math are `f64`. The audio contract
//! at the [`Effect`] boundary is `f32`.
//!
//! # no_std Support
//!
//! Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! strata-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use strata_core::{Biquad, bell_coefficients};
//!
//! let mut band = Biquad::with_coefficients(bell_coefficients(1000.0, 1.0, 6.0, 48000.0));
//! let y = band.process(0.5);
//! assert!(y.is_finite());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod allpass;
pub mod biquad;
pub mod cascade;
pub mod delay;
pub mod effect;
pub mod envelope;
pub mod math;
pub mod one_pole;
pub mod param;

pub use allpass::AllpassFilter;
pub use biquad::{
    BellPrototype, Biquad, Coefficients, MatchedBellPrototype, ShelfKind, ShelfPrototype,
    TiltPrototype, allpass_coefficients, bandpass_coefficients, bell_coefficients,
    clamp_frequency, first_order_highpass_coefficients, first_order_lowpass_coefficients,
    high_shelf_coefficients, highpass_coefficients, low_shelf_coefficients, lowpass_coefficients,
    matched_bell_coefficients, notch_coefficients, tilt_coefficients,
};
pub use cascade::{
    Cascade, CascadeDesign, CutKind, MAX_CASCADE_STAGES, SINGLE_POLE_CORNER_SCALE, butterworth_qs,
    single_pole_cut_coefficients, slope_to_order,
};
pub use delay::DelayLine;
pub use effect::Effect;
pub use envelope::{DetectionMode, EnvelopeFollower};
pub use math::{
    db_to_linear, flush_denormal, linear_to_db, ms_decode, ms_encode, ms_to_samples, sanitize,
    time_constant_coeff, wet_dry_mix,
};
pub use one_pole::OnePole;
pub use param::{LinearRamp, SmoothedParam};
