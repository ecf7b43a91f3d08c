//! Messages between the control plane and the audio thread.
//!
//! Everything that crosses to the audio thread is boxed and allocated by the
//! controller. The processor hands every box back on the retire channel so
//! that deallocation also happens on the control side.

use strata_effects::{ChannelStrip, StripDesign};

/// Control plane → audio thread.
pub(crate) enum Command {
    /// New coefficients for the current strip.
    Snapshot(Box<StripDesign>),
    /// Fade the strip out (`true`) or back in.
    Bypass(bool),
    /// Replace the strip and scratch buffers for a new rate or block size.
    Reconfigure(Box<Reconfiguration>),
}

/// Freshly allocated processing state for a new stream configuration.
///
/// After the swap the same box carries the processor's previous state back
/// to the controller.
pub(crate) struct Reconfiguration {
    pub strip: ChannelStrip,
    pub dry_left: Vec<f32>,
    pub dry_right: Vec<f32>,
    pub sample_rate: f64,
    pub max_block: usize,
}

impl Reconfiguration {
    /// Allocates a strip with `design` applied and scratch for `max_block`.
    pub fn new(design: &StripDesign, max_block: usize) -> Self {
        Self {
            strip: ChannelStrip::with_design(design),
            dry_left: vec![0.0; max_block],
            dry_right: vec![0.0; max_block],
            sample_rate: design.sample_rate,
            max_block,
        }
    }
}

/// Audio thread → control plane, for deallocation.
pub(crate) enum Retired {
    Snapshot(Box<StripDesign>),
    Reconfiguration(Box<Reconfiguration>),
}
