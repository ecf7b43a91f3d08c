//! Cascaded biquad sections for steep filter slopes.
//!
//! A [`CascadeDesign`] is a fixed-capacity list of coefficient sets computed on
//! the control plane. A [`Cascade`] holds the matching [`Biquad`] states and
//! runs them in series on the audio thread.
//!
//! # Butterworth Slopes
//!
//! | Slope (dB/oct) | Order | Sections |
//! |----------------|-------|----------|
//! | 6 | 1 | 1 first-order |
//! | 12 | 2 | 1 biquad |
//! | 18 | 3 | 1 first-order + 1 biquad |
//! | 24 | 4 | 2 biquads |
//! | 48 | 8 | 4 biquads |
//! | 96 | 16 | 8 biquads |
//!
//! Even orders place section `k` at `Q = 1 / (2·cos(π(2k+1)/(2n)))`. Odd orders
//! use a real first-order pole plus pairs at `Q = 1 / (2·cos(mπ/n))`.

use core::f64::consts::PI;
use libm::{cos, round};

use crate::biquad::{
    Biquad, Coefficients, first_order_highpass_coefficients, first_order_lowpass_coefficients,
    highpass_coefficients, lowpass_coefficients,
};

/// Maximum number of biquad sections in one cascade.
pub const MAX_CASCADE_STAGES: usize = 8;

/// Smallest supported cut slope in dB/octave.
pub const MIN_SLOPE_DB: f64 = 6.0;

/// Largest supported cut slope in dB/octave.
pub const MAX_SLOPE_DB: f64 = 96.0;

/// Corner scale for a cut made of one first-order section.
///
/// A plain first-order corner sits 7 dB down one octave out. Moving the
/// corner by this factor puts that point at exactly 6 dB, so the 6 dB/oct
/// slope reads the same way as the steeper cascades.
pub const SINGLE_POLE_CORNER_SCALE: f64 = 0.863_289_016_716_732_6;

/// Which side of the corner a Butterworth cut removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutKind {
    /// High-pass: removes content below the corner.
    LowCut,
    /// Low-pass: removes content above the corner.
    HighCut,
}

/// Converts a slope in dB/octave into a Butterworth order.
///
/// The slope is rounded to the nearest 6 dB step inside
/// `[MIN_SLOPE_DB, MAX_SLOPE_DB]`.
pub fn slope_to_order(slope_db: f64) -> usize {
    let slope = if slope_db.is_finite() {
        slope_db.clamp(MIN_SLOPE_DB, MAX_SLOPE_DB)
    } else {
        MIN_SLOPE_DB
    };
    round(slope / 6.0) as usize
}

/// First-order cut with its corner moved by [`SINGLE_POLE_CORNER_SCALE`].
///
/// Used when the whole cut is a single first-order section (6 dB/oct).
pub fn single_pole_cut_coefficients(kind: CutKind, freq: f64, sample_rate: f64) -> Coefficients {
    match kind {
        CutKind::LowCut => {
            first_order_highpass_coefficients(freq * SINGLE_POLE_CORNER_SCALE, sample_rate)
        }
        CutKind::HighCut => {
            first_order_lowpass_coefficients(freq / SINGLE_POLE_CORNER_SCALE, sample_rate)
        }
    }
}

/// Q of each second-order section of an order-`order` Butterworth filter.
///
/// Writes into `out` and returns how many values were written.
pub fn butterworth_qs(order: usize, out: &mut [f64; MAX_CASCADE_STAGES]) -> usize {
    let order = order.clamp(1, 2 * MAX_CASCADE_STAGES);
    let n = order as f64;
    let pairs = order / 2;
    for (k, q) in out.iter_mut().take(pairs).enumerate() {
        let angle = if order % 2 == 0 {
            PI * (2 * k + 1) as f64 / (2.0 * n)
        } else {
            PI * (k + 1) as f64 / n
        };
        *q = 1.0 / (2.0 * cos(angle));
    }
    pairs
}

/// Coefficients for up to [`MAX_CASCADE_STAGES`] sections in series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeDesign {
    stages: [Coefficients; MAX_CASCADE_STAGES],
    len: usize,
}

impl CascadeDesign {
    /// An empty cascade (passthrough).
    pub const fn empty() -> Self {
        Self {
            stages: [Coefficients::IDENTITY; MAX_CASCADE_STAGES],
            len: 0,
        }
    }

    /// A cascade of one section.
    pub fn single(coeffs: Coefficients) -> Self {
        let mut design = Self::empty();
        design.push(coeffs);
        design
    }

    /// Butterworth low-cut or high-cut with the given slope.
    ///
    /// # Example
    ///
    /// ```rust
    /// use strata_core::{CascadeDesign, CutKind};
    ///
    /// let design = CascadeDesign::butterworth(CutKind::LowCut, 1000.0, 48.0, 48000.0);
    /// assert_eq!(design.len(), 4);
    /// assert!(design.magnitude_db(500.0, 48000.0) < -45.0);
    /// ```
    pub fn butterworth(kind: CutKind, freq: f64, slope_db: f64, sample_rate: f64) -> Self {
        let order = slope_to_order(slope_db);
        let mut qs = [0.0; MAX_CASCADE_STAGES];
        let pairs = butterworth_qs(order, &mut qs);

        let mut design = Self::empty();
        if order == 1 {
            design.push(single_pole_cut_coefficients(kind, freq, sample_rate));
        } else if order % 2 == 1 {
            design.push(match kind {
                CutKind::LowCut => first_order_highpass_coefficients(freq, sample_rate),
                CutKind::HighCut => first_order_lowpass_coefficients(freq, sample_rate),
            });
        }
        for &q in &qs[..pairs] {
            design.push(match kind {
                CutKind::LowCut => highpass_coefficients(freq, q, sample_rate),
                CutKind::HighCut => lowpass_coefficients(freq, q, sample_rate),
            });
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(?kind, freq, order, sections = design.len(), "butterworth design");
        design
    }

    /// Appends a section. Returns false when the cascade is full.
    pub fn push(&mut self, coeffs: Coefficients) -> bool {
        if self.len == MAX_CASCADE_STAGES {
            return false;
        }
        self.stages[self.len] = coeffs;
        self.len += 1;
        true
    }

    /// Number of live sections.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the cascade has no sections.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The live sections.
    pub fn stages(&self) -> &[Coefficients] {
        &self.stages[..self.len]
    }

    /// True when every section is stable.
    pub fn is_stable(&self) -> bool {
        self.stages().iter().all(Coefficients::is_stable)
    }

    /// Combined linear magnitude at `freq`.
    pub fn magnitude(&self, freq: f64, sample_rate: f64) -> f64 {
        self.stages()
            .iter()
            .map(|c| c.magnitude(freq, sample_rate))
            .product()
    }

    /// Combined magnitude at `freq` in decibels.
    pub fn magnitude_db(&self, freq: f64, sample_rate: f64) -> f64 {
        self.stages()
            .iter()
            .map(|c| c.magnitude_db(freq, sample_rate))
            .sum()
    }
}

impl Default for CascadeDesign {
    fn default() -> Self {
        Self::empty()
    }
}

/// Up to eight biquads processed in series.
///
/// Storage is a fixed array, so changing the section count never allocates.
#[derive(Debug, Clone, Default)]
pub struct Cascade {
    stages: [Biquad; MAX_CASCADE_STAGES],
    len: usize,
}

impl Cascade {
    /// Creates an empty cascade (passthrough).
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads coefficients from a design.
    ///
    /// Existing sections keep their state. Sections that become live again
    /// after the count grew start from silence.
    pub fn set_design(&mut self, design: &CascadeDesign) {
        for (i, coeffs) in design.stages().iter().enumerate() {
            if i >= self.len {
                self.stages[i].reset();
            }
            self.stages[i].set_coefficients(*coeffs);
        }
        self.len = design.len();
    }

    /// Replaces coefficients of one section without changing the count.
    #[inline]
    pub fn set_stage(&mut self, index: usize, coeffs: Coefficients) {
        if index < self.len {
            self.stages[index].set_coefficients(coeffs);
        }
    }

    /// Number of live sections.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no sections are live.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Processes one sample through every live section.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let mut x = input;
        for stage in &mut self.stages[..self.len] {
            x = stage.process(x);
        }
        x
    }

    /// Zeroes the state of every section.
    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libm::log10;

    const FS: f64 = 48000.0;

    #[test]
    fn slope_rounding() {
        assert_eq!(slope_to_order(6.0), 1);
        assert_eq!(slope_to_order(13.0), 2);
        assert_eq!(slope_to_order(96.0), 16);
        assert_eq!(slope_to_order(500.0), 16);
        assert_eq!(slope_to_order(0.0), 1);
        assert_eq!(slope_to_order(f64::NAN), 1);
    }

    #[test]
    fn butterworth_q_values() {
        let mut qs = [0.0; MAX_CASCADE_STAGES];
        assert_eq!(butterworth_qs(2, &mut qs), 1);
        assert!((qs[0] - core::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);

        assert_eq!(butterworth_qs(3, &mut qs), 1);
        assert!((qs[0] - 1.0).abs() < 1e-12);

        assert_eq!(butterworth_qs(4, &mut qs), 2);
        assert!((qs[0] - 0.541_196).abs() < 1e-5);
        assert!((qs[1] - 1.306_563).abs() < 1e-5);
    }

    #[test]
    fn section_counts() {
        for (slope, sections) in [(6.0, 1), (12.0, 1), (18.0, 2), (24.0, 2), (90.0, 8), (96.0, 8)] {
            let d = CascadeDesign::butterworth(CutKind::HighCut, 1000.0, slope, FS);
            assert_eq!(d.len(), sections, "slope {slope}");
        }
    }

    #[test]
    fn corner_is_minus_three_db() {
        for slope in [12.0, 18.0, 24.0, 48.0, 96.0] {
            let d = CascadeDesign::butterworth(CutKind::LowCut, 1000.0, slope, FS);
            let db = d.magnitude_db(1000.0, FS);
            assert!((db + 3.0103).abs() < 0.01, "slope {slope}: {db} dB at corner");
        }
    }

    #[test]
    fn follows_ideal_butterworth_curve() {
        let corner = 1000.0;
        let warp = |f: f64| libm::tan(PI * f / FS);
        let ratio = warp(corner) / warp(corner / 2.0);
        for slope in [12.0, 18.0, 24.0, 36.0, 48.0, 72.0, 96.0] {
            let order = slope_to_order(slope) as i32;
            let ideal = 10.0 * log10(1.0 + ratio.powi(2 * order));
            let d = CascadeDesign::butterworth(CutKind::LowCut, corner, slope, FS);
            let atten = -d.magnitude_db(corner / 2.0, FS);
            assert!((atten - ideal).abs() < 0.5, "slope {slope}: {atten} vs {ideal}");
        }
    }

    #[test]
    fn single_pole_cut_is_six_db_one_octave_out() {
        for fs in [44100.0, 48000.0, 96000.0] {
            for corner in [50.0, 500.0, 2000.0, 5000.0] {
                let low = CascadeDesign::butterworth(CutKind::LowCut, corner, 6.0, fs);
                let db = low.magnitude_db(corner / 2.0, fs);
                assert!((db + 6.0).abs() < 0.2, "low cut {corner} Hz @ {fs}: {db} dB");

                let high = CascadeDesign::butterworth(CutKind::HighCut, corner, 6.0, fs);
                let db = high.magnitude_db(corner * 2.0, fs);
                assert!((db + 6.0).abs() < 1.0, "high cut {corner} Hz @ {fs}: {db} dB");
            }
        }
    }

    #[test]
    fn set_design_resets_new_stages_only() {
        let mut cascade = Cascade::new();
        cascade.set_design(&CascadeDesign::butterworth(CutKind::HighCut, 500.0, 12.0, FS));
        for _ in 0..64 {
            cascade.process(1.0);
        }
        let kept = cascade.stages[0].state();
        cascade.set_design(&CascadeDesign::butterworth(CutKind::HighCut, 500.0, 24.0, FS));
        assert_eq!(cascade.len(), 2);
        assert_eq!(cascade.stages[0].state(), kept);
        assert_eq!(cascade.stages[1].state(), (0.0, 0.0));
    }

    #[test]
    fn empty_cascade_is_passthrough() {
        let mut cascade = Cascade::new();
        assert_eq!(cascade.process(0.75), 0.75);
        assert!((CascadeDesign::empty().magnitude(1000.0, FS) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn push_refuses_overflow() {
        let mut d = CascadeDesign::empty();
        for _ in 0..MAX_CASCADE_STAGES {
            assert!(d.push(Coefficients::IDENTITY));
        }
        assert!(!d.push(Coefficients::IDENTITY));
    }
}
