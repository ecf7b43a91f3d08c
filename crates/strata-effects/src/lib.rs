//! Strata Effects - EQ, dynamics and reverb processors
//!
//! This crate builds the channel strip processors from strata-core primitives:
//!
//! - [`eq`] - 64-band parametric EQ with mid/side routing and dynamic bands
//! - [`Compressor`] - Feed-forward compressor with circuit models and lookahead
//! - [`Reverb`] - Eight-line feedback delay network
//! - [`ChannelStrip`] - EQ → compressor → reverb
//! - [`meter`] - Per-block peak/RMS metering
//!
//! Every processor separates design from processing. A `*Params` record is
//! edited on the control plane, turned into a `*Design` (all trigonometry and
//! logarithms happen here), and loaded on the audio thread with `apply`, which
//! never allocates.
//!
//! ## Example
//!
//! ```rust
//! use strata_core::Effect;
//! use strata_effects::eq::BandParams;
//! use strata_effects::{ChannelStrip, StripParams};
//!
//! let mut params = StripParams::default();
//! params.eq.add_band(BandParams::bell(3000.0, 3.0, 1.0)).unwrap();
//! params.reverb_enabled = true;
//!
//! let mut strip = ChannelStrip::new(48000.0);
//! strip.apply(&params.design(48000.0).unwrap());
//! let (l, r) = strip.process_stereo(0.2, 0.2);
//! assert!(l.is_finite() && r.is_finite());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod compressor;
pub mod eq;
pub mod meter;
pub mod reverb;
pub mod strip;

pub use compressor::{
    CircuitModel, Compressor, CompressorDesign, CompressorParams, Detector, SidechainFilter,
};
pub use eq::{EqBank, EqBankDesign, EqBankParams, PhaseMode};
pub use meter::{BlockMeter, LevelReading};
pub use reverb::{FeedbackMatrix, Reverb, ReverbDesign, ReverbParams};
pub use strip::{ChannelStrip, StripDesign, StripParams};
