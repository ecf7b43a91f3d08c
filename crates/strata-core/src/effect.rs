//! Core Effect trait.
//!
//! Every processor in the chain (EQ bank, compressor, reverb, channel strip)
//! implements [`Effect`], giving the engine one interface for stereo
//! block processing.
//!
//! ## Design Decisions
//!
//! - **Stereo in place**: blocks arrive as two channel slices and are
//!   overwritten with the processed signal.
//! - **`f32` I/O, `f64` inside**: the audio contract is single precision;
//!   implementations keep their filter state in double precision.
//! - **Object-safe**: `dyn Effect` works, but the strip uses static dispatch.
//! - **No allocations**: every method may be called on the audio thread.

/// Core trait for stereo audio processors.
///
/// # Example
///
/// ```rust
/// use strata_core::Effect;
///
/// struct Gain(f32);
///
/// impl Effect for Gain {
///     fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
///         (left * self.0, right * self.0)
///     }
///     fn set_sample_rate(&mut self, _sample_rate: f64) {}
///     fn reset(&mut self) {}
/// }
///
/// let mut g = Gain(0.5);
/// assert_eq!(g.process_stereo(1.0, -1.0), (0.5, -0.5));
/// ```
pub trait Effect {
    /// Processes one stereo frame.
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32);

    /// Processes a block in place.
    ///
    /// Both slices must have the same length; extra samples in the longer
    /// slice are left untouched.
    fn process_block_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len(), "channel length mismatch");
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let (ol, or) = self.process_stereo(*l, *r);
            *l = ol;
            *r = or;
        }
    }

    /// Updates the sample rate and recomputes rate-dependent coefficients.
    ///
    /// Processors with delay buffers resize them here, so this is a
    /// control-plane call.
    fn set_sample_rate(&mut self, sample_rate: f64);

    /// Clears all internal state without changing parameters.
    fn reset(&mut self);

    /// Processing latency in samples. Zero unless the effect looks ahead.
    fn latency_samples(&self) -> usize {
        0
    }
}
