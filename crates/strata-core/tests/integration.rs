//! Integration tests for strata-core DSP primitives.
//!
//! Verifies filter accuracy with signal-level measurements: sine amplitudes
//! through biquads, Butterworth cascade slopes, and prototype-driven gain
//! updates.

use strata_core::{
    BellPrototype, Biquad, Cascade, CascadeDesign, CutKind, ShelfKind, ShelfPrototype,
    bell_coefficients, low_shelf_coefficients,
};

const SAMPLE_RATE: f64 = 48000.0;
const TAU: f64 = core::f64::consts::TAU;

fn generate_sine(freq_hz: f64, num_samples: usize) -> Vec<f64> {
    (0..num_samples)
        .map(|n| libm::sin(TAU * freq_hz * n as f64 / SAMPLE_RATE))
        .collect()
}

/// Peak absolute value after the filter has settled.
fn settled_peak(mut process: impl FnMut(f64) -> f64, freq_hz: f64) -> f64 {
    let input = generate_sine(freq_hz, 48000);
    let mut peak: f64 = 0.0;
    for (i, &x) in input.iter().enumerate() {
        let y = process(x);
        if i >= 24000 {
            peak = peak.max(y.abs());
        }
    }
    peak
}

// ============================================================================
// 1. Bell filter
// ============================================================================

#[test]
fn bell_sine_amplitudes() {
    let coeffs = bell_coefficients(1000.0, 1.0, 6.0, SAMPLE_RATE);

    let mut biquad = Biquad::with_coefficients(coeffs);
    let centre = settled_peak(|x| biquad.process(x), 1000.0);
    assert!((centre - 1.995).abs() < 0.01, "1 kHz peak {centre}");

    for freq in [100.0, 10000.0] {
        let mut biquad = Biquad::with_coefficients(coeffs);
        let peak = settled_peak(|x| biquad.process(x), freq);
        assert!((peak - 1.0).abs() < 0.03, "{freq} Hz peak {peak}");
    }
}

#[test]
fn reset_removes_history() {
    let mut biquad = Biquad::with_coefficients(bell_coefficients(200.0, 4.0, 12.0, SAMPLE_RATE));
    for x in generate_sine(200.0, 1000) {
        biquad.process(x);
    }
    biquad.reset();
    assert_eq!(biquad.process(0.0), 0.0);
}

// ============================================================================
// 2. Butterworth cascades
// ============================================================================

#[test]
fn cascade_attenuates_slope_one_octave_out() {
    let corner = 1000.0;
    for slope in [6.0, 12.0, 18.0, 24.0, 36.0, 48.0, 72.0, 96.0] {
        let low_cut = CascadeDesign::butterworth(CutKind::LowCut, corner, slope, SAMPLE_RATE);
        let atten = -low_cut.magnitude_db(corner / 2.0, SAMPLE_RATE);
        assert!((atten - slope).abs() <= 1.0, "low cut {slope} dB/oct: {atten} dB");

        let high_cut = CascadeDesign::butterworth(CutKind::HighCut, corner, slope, SAMPLE_RATE);
        let atten = -high_cut.magnitude_db(corner * 2.0, SAMPLE_RATE);
        assert!(atten > slope - 1.0, "high cut {slope} dB/oct: {atten} dB");
    }
}

#[test]
fn cascade_sine_matches_design() {
    let design = CascadeDesign::butterworth(CutKind::LowCut, 1000.0, 24.0, SAMPLE_RATE);
    let mut cascade = Cascade::new();
    cascade.set_design(&design);

    let peak = settled_peak(|x| cascade.process(x), 500.0);
    let expected = design.magnitude(500.0, SAMPLE_RATE);
    assert!(
        (peak - expected).abs() < 0.002,
        "measured {peak}, designed {expected}"
    );
}

#[test]
fn cascade_passband_is_flat() {
    let design = CascadeDesign::butterworth(CutKind::HighCut, 8000.0, 96.0, SAMPLE_RATE);
    for f in [20.0, 100.0, 1000.0, 3000.0] {
        let db = design.magnitude_db(f, SAMPLE_RATE);
        assert!(db.abs() < 0.05, "{f} Hz: {db} dB");
    }
}

// ============================================================================
// 3. Prototypes
// ============================================================================

#[test]
fn prototypes_track_direct_designs() {
    let bell = BellPrototype::new(3000.0, 2.0, SAMPLE_RATE);
    let shelf = ShelfPrototype::new(ShelfKind::Low, 150.0, 0.8, SAMPLE_RATE);
    for gain in [-18.0, -3.5, 0.0, 7.25, 15.0] {
        assert_eq!(bell.coefficients(gain), bell_coefficients(3000.0, 2.0, gain, SAMPLE_RATE));
        assert_eq!(
            shelf.coefficients(gain),
            low_shelf_coefficients(150.0, gain, 0.8, SAMPLE_RATE)
        );
    }
}
