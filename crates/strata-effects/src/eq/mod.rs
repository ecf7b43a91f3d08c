//! Parametric equalizer: up to 64 bands with per-band routing and dynamics.
//!
//! The EQ is split the same way as every processor in this crate:
//!
//! - [`EqBankParams`] is edited on the control plane and validated there.
//! - [`EqBankParams::design`] computes all coefficients into an [`EqBankDesign`].
//! - [`EqBank::apply`] loads a design on the audio thread without allocating.

pub mod band;
pub mod bank;

pub use band::{
    BandDesign, BandError, BandParams, ChannelMode, DYNAMIC_UPDATE_INTERVAL, DynamicParams,
    DynamicStage, EqBand, FilterType, GAIN_EPSILON_DB,
};
pub use bank::{BandId, EqBank, EqBankDesign, EqBankParams, EqError, MAX_BANDS};

/// How bell coefficients are derived from their analog prototype.
///
/// Both modes are zero-latency. Shapes other than bells design the same way
/// in either mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PhaseMode {
    /// Plain bilinear cookbook designs.
    #[default]
    Minimum,
    /// Magnitude-matched bells that keep their analog shape near Nyquist
    /// instead of squeezing towards it.
    Analog,
}
