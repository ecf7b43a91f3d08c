//! Feed-forward compressor with circuit models, lookahead and sidechain.
//!
//! # Signal Flow
//!
//! ```text
//! Sidechain → HP/LP → Detector → Gain Computer → Smoothing ─┐
//!                                                           ↓
//! Input → Lookahead Delay ─────────────────────→ × Gain × Makeup → Saturation → Mix → Output
//!           └──────────────────── Dry ───────────────────────────────────────────┘
//! ```
//!
//! # Parameters
//!
//! | Parameter | Range | Default |
//! |-----------|-------|---------|
//! | Threshold | −60 to 0 dB | −18 |
//! | Ratio | 1:1 to 100:1 | 4 |
//! | Attack | 0.01–500 ms | 10 |
//! | Release | 1–5000 ms | 100 |
//! | Knee | 0–24 dB | 6 |
//! | Makeup | −24 to 24 dB | 0 |
//! | Mix | 0–1 | 1 |
//! | Lookahead | 0–20 ms | 0 |
//!
//! # Circuit Models
//!
//! | Model | Attack | Detector blend | Character |
//! |-------|--------|----------------|-----------|
//! | Clean | 10 ms | peak | none |
//! | Vca | 1 ms | mostly peak | slight odd |
//! | Fet | 0.2 ms | peak | bright, odd-heavy |
//! | Opto | 10 ms | mostly RMS | soft, even |
//! | VariMu | 20 ms | RMS | thick, even |

use libm::{exp, tanh};
use strata_core::{
    Biquad, Coefficients, DelayLine, DetectionMode, Effect, EnvelopeFollower, SmoothedParam,
    db_to_linear, flush_denormal, highpass_coefficients, linear_to_db, lowpass_coefficients,
    ms_to_samples, sanitize, time_constant_coeff, wet_dry_mix,
};

use crate::meter::{BlockMeter, LevelReading};

/// Longest lookahead, ms. Delay buffers are sized for it at construction.
pub const MAX_LOOKAHEAD_MS: f64 = 20.0;

/// Averaging window of the RMS detector.
pub const RMS_WINDOW_MS: f64 = 10.0;

/// Output ceiling of the saturation stage (+12 dBFS).
pub const SATURATION_CEILING: f64 = 4.0;

/// Reduction depth at which program-dependent release runs twice as fast.
const PROGRAM_RELEASE_DEPTH_DB: f64 = 12.0;

const SMOOTHING_MS: f64 = 10.0;

/// Static gain reduction for a detector level, in dB (always ≥ 0).
///
/// Zero below `threshold − knee/2`, quadratic inside the knee and
/// `(level − threshold)·(1 − 1/ratio)` above it.
///
/// ```rust
/// use strata_effects::compressor::gain_reduction_db;
///
/// assert_eq!(gain_reduction_db(-30.0, -20.0, 4.0, 0.0), 0.0);
/// assert!((gain_reduction_db(-10.0, -20.0, 4.0, 0.0) - 7.5).abs() < 1e-12);
/// ```
#[inline]
pub fn gain_reduction_db(level_db: f64, threshold_db: f64, ratio: f64, knee_db: f64) -> f64 {
    let slope = 1.0 - 1.0 / ratio.max(1.0);
    let over = level_db - threshold_db;
    let half_knee = knee_db * 0.5;

    if knee_db > 0.0 && over.abs() <= half_knee {
        let x = over + half_knee;
        slope * x * x / (2.0 * knee_db)
    } else if over > 0.0 {
        over * slope
    } else {
        0.0
    }
}

/// Analog circuit the compressor imitates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CircuitModel {
    /// Transparent digital compression.
    #[default]
    Clean,
    /// Voltage-controlled amplifier.
    Vca,
    /// Field-effect transistor.
    Fet,
    /// Optical cell.
    Opto,
    /// Variable-mu tube.
    VariMu,
}

/// Fixed characteristics of a [`CircuitModel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircuitTraits {
    /// Attack time the model is usually run with, ms.
    pub attack_ms: f64,
    /// Saturation amount, 0 disables saturation.
    pub drive: f64,
    /// Share of the even-harmonic (asymmetric) term, 0..1.
    pub even_mix: f64,
    /// Detector blend for [`Detector::Circuit`]: 0 = peak, 1 = RMS.
    pub rms_blend: f64,
}

impl CircuitModel {
    /// Every model, in declaration order.
    pub const ALL: [CircuitModel; 5] = [
        Self::Clean,
        Self::Vca,
        Self::Fet,
        Self::Opto,
        Self::VariMu,
    ];

    /// Characteristics of this model.
    pub fn traits(self) -> CircuitTraits {
        match self {
            Self::Clean => CircuitTraits {
                attack_ms: 10.0,
                drive: 0.0,
                even_mix: 0.0,
                rms_blend: 0.0,
            },
            Self::Vca => CircuitTraits {
                attack_ms: 1.0,
                drive: 0.1,
                even_mix: 0.2,
                rms_blend: 0.3,
            },
            Self::Fet => CircuitTraits {
                attack_ms: 0.2,
                drive: 0.4,
                even_mix: 0.25,
                rms_blend: 0.0,
            },
            Self::Opto => CircuitTraits {
                attack_ms: 10.0,
                drive: 0.2,
                even_mix: 0.6,
                rms_blend: 0.8,
            },
            Self::VariMu => CircuitTraits {
                attack_ms: 20.0,
                drive: 0.3,
                even_mix: 0.7,
                rms_blend: 1.0,
            },
        }
    }
}

/// Level detector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Detector {
    /// Instantaneous rectified level.
    #[default]
    Peak,
    /// RMS over [`RMS_WINDOW_MS`].
    Rms,
    /// Peak/RMS blend of the circuit model.
    Circuit,
}

/// Filters applied to the detector signal only.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SidechainFilter {
    /// High-pass corner, Hz.
    pub high_pass_hz: Option<f64>,
    /// Low-pass corner, Hz.
    pub low_pass_hz: Option<f64>,
}

/// Compressor settings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CompressorParams {
    /// Threshold, dB.
    pub threshold_db: f64,
    /// Ratio, `n:1`.
    pub ratio: f64,
    /// Attack, ms.
    pub attack_ms: f64,
    /// Release, ms.
    pub release_ms: f64,
    /// Knee width, dB.
    pub knee_db: f64,
    /// Makeup gain, dB.
    pub makeup_db: f64,
    /// Wet share for parallel compression.
    pub mix: f64,
    /// Lookahead, ms.
    pub lookahead_ms: f64,
    /// Circuit model.
    pub circuit: CircuitModel,
    /// Level detector.
    pub detector: Detector,
    /// Release faster when reduction is deep.
    pub program_release: bool,
    /// Detector filters.
    pub sidechain: SidechainFilter,
    /// Key from the external sidechain input when one is supplied.
    pub external_sidechain: bool,
}

impl Default for CompressorParams {
    fn default() -> Self {
        Self {
            threshold_db: -18.0,
            ratio: 4.0,
            attack_ms: 10.0,
            release_ms: 100.0,
            knee_db: 6.0,
            makeup_db: 0.0,
            mix: 1.0,
            lookahead_ms: 0.0,
            circuit: CircuitModel::Clean,
            detector: Detector::Peak,
            program_release: false,
            sidechain: SidechainFilter::default(),
            external_sidechain: false,
        }
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

fn clamp_corner(hz: Option<f64>) -> Option<f64> {
    hz.filter(|f| f.is_finite() && *f > 0.0)
        .map(|f| f.clamp(20.0, 20000.0))
}

impl CompressorParams {
    /// Defaults for `model`: its attack time and detector blend.
    ///
    /// The circuit's saturation applies only while the ratio is above 1 or
    /// gain reduction is active, so a 1:1 compressor passes audio unchanged
    /// whatever the model.
    pub fn with_circuit(model: CircuitModel) -> Self {
        Self {
            attack_ms: model.traits().attack_ms,
            circuit: model,
            detector: Detector::Circuit,
            ..Self::default()
        }
    }

    /// Copy with every field forced into range. NaN falls back to the default.
    pub fn clamped(&self) -> Self {
        let d = Self::default();
        Self {
            threshold_db: finite_or(self.threshold_db, d.threshold_db).clamp(-60.0, 0.0),
            ratio: finite_or(self.ratio, d.ratio).clamp(1.0, 100.0),
            attack_ms: finite_or(self.attack_ms, d.attack_ms).clamp(0.01, 500.0),
            release_ms: finite_or(self.release_ms, d.release_ms).clamp(1.0, 5000.0),
            knee_db: finite_or(self.knee_db, d.knee_db).clamp(0.0, 24.0),
            makeup_db: finite_or(self.makeup_db, d.makeup_db).clamp(-24.0, 24.0),
            mix: finite_or(self.mix, d.mix).clamp(0.0, 1.0),
            lookahead_ms: finite_or(self.lookahead_ms, d.lookahead_ms).clamp(0.0, MAX_LOOKAHEAD_MS),
            circuit: self.circuit,
            detector: self.detector,
            program_release: self.program_release,
            sidechain: SidechainFilter {
                high_pass_hz: clamp_corner(self.sidechain.high_pass_hz),
                low_pass_hz: clamp_corner(self.sidechain.low_pass_hz),
            },
            external_sidechain: self.external_sidechain,
        }
    }
}

/// Compressor coefficients for one sample rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressorDesign {
    params: CompressorParams,
    traits: CircuitTraits,
    sample_rate: f64,
    attack_coeff: f64,
    release_coeff: f64,
    /// `ln(release_coeff)`, for program-dependent release.
    release_log: f64,
    makeup: f64,
    lookahead_samples: usize,
    sidechain_hp: Option<Coefficients>,
    sidechain_lp: Option<Coefficients>,
}

impl CompressorDesign {
    /// Computes coefficients for `params` at `sample_rate`.
    pub fn new(params: &CompressorParams, sample_rate: f64) -> Self {
        let p = params.clamped();
        let release_samples = ms_to_samples(p.release_ms, sample_rate).max(1.0);

        #[cfg(feature = "tracing")]
        tracing::trace!(
            threshold_db = p.threshold_db,
            ratio = p.ratio,
            circuit = ?p.circuit,
            lookahead_ms = p.lookahead_ms,
            "compressor designed"
        );

        Self {
            traits: p.circuit.traits(),
            sample_rate,
            attack_coeff: time_constant_coeff(p.attack_ms, sample_rate),
            release_coeff: exp(-1.0 / release_samples),
            release_log: -1.0 / release_samples,
            makeup: db_to_linear(p.makeup_db),
            lookahead_samples: libm::round(ms_to_samples(p.lookahead_ms, sample_rate)) as usize,
            sidechain_hp: p
                .sidechain
                .high_pass_hz
                .map(|f| highpass_coefficients(f, core::f64::consts::FRAC_1_SQRT_2, sample_rate)),
            sidechain_lp: p
                .sidechain
                .low_pass_hz
                .map(|f| lowpass_coefficients(f, core::f64::consts::FRAC_1_SQRT_2, sample_rate)),
            params: p,
        }
    }

    /// The clamped parameters.
    pub fn params(&self) -> &CompressorParams {
        &self.params
    }

    /// Lookahead in samples.
    pub fn lookahead_samples(&self) -> usize {
        self.lookahead_samples
    }

    /// Sample rate the design was computed for.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}

/// Circuit colouration: an asymmetric even term blended with a `tanh` odd
/// term, capped at ±[`SATURATION_CEILING`].
#[inline]
fn saturate(x: f64, traits: &CircuitTraits) -> f64 {
    if traits.drive <= 0.0 {
        return x;
    }
    let drive = 1.0 + 4.0 * traits.drive;
    let odd = tanh(drive * x) / drive;
    let even = x + 0.5 * traits.drive * x * x;
    let y = traits.even_mix * even + (1.0 - traits.even_mix) * odd;
    y.clamp(-SATURATION_CEILING, SATURATION_CEILING)
}

/// Stereo-linked compressor.
///
/// Both channels share one detector (fed the louder channel of the key
/// signal) and one gain, so the stereo image never shifts.
///
/// # Example
///
/// ```rust
/// use strata_core::Effect;
/// use strata_effects::compressor::{Compressor, CompressorParams};
///
/// let params = CompressorParams {
///     threshold_db: -20.0,
///     ratio: 4.0,
///     ..CompressorParams::default()
/// };
/// let mut comp = Compressor::with_params(48000.0, &params);
/// let (l, r) = comp.process_stereo(0.5, 0.5);
/// assert!(l.is_finite() && r.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct Compressor {
    design: CompressorDesign,
    sidechain_hp: [Biquad; 2],
    sidechain_lp: [Biquad; 2],
    rms: EnvelopeFollower,
    /// Smoothed gain reduction, dB, ≥ 0.
    reduction_db: f64,
    makeup: SmoothedParam,
    mix: SmoothedParam,
    lookahead: [DelayLine; 2],
    meter: BlockMeter,
}

impl Compressor {
    /// Creates a compressor with default settings.
    pub fn new(sample_rate: f64) -> Self {
        Self::with_params(sample_rate, &CompressorParams::default())
    }

    /// Creates a compressor and allocates its lookahead buffers.
    pub fn with_params(sample_rate: f64, params: &CompressorParams) -> Self {
        let design = CompressorDesign::new(params, sample_rate);
        let capacity = ms_to_samples(MAX_LOOKAHEAD_MS, sample_rate) as usize + 1;
        let mut rms = EnvelopeFollower::with_times(sample_rate, RMS_WINDOW_MS, RMS_WINDOW_MS);
        rms.set_mode(DetectionMode::Rms);

        let mut comp = Self {
            design,
            sidechain_hp: [Biquad::new(), Biquad::new()],
            sidechain_lp: [Biquad::new(), Biquad::new()],
            rms,
            reduction_db: 0.0,
            makeup: SmoothedParam::with_config(design.makeup, sample_rate, SMOOTHING_MS),
            mix: SmoothedParam::with_config(design.params.mix, sample_rate, SMOOTHING_MS),
            lookahead: [DelayLine::new(capacity), DelayLine::new(capacity)],
            meter: BlockMeter::new(),
        };
        comp.apply(&design);
        comp
    }

    /// Loads a design. Real-time safe.
    ///
    /// Lookahead beyond the buffers allocated at construction is capped.
    pub fn apply(&mut self, design: &CompressorDesign) {
        let had_hp = self.design.sidechain_hp.is_some();
        let had_lp = self.design.sidechain_lp.is_some();
        self.design = *design;

        let capacity = self.lookahead[0].capacity();
        self.design.lookahead_samples = self.design.lookahead_samples.min(capacity);

        for filter in &mut self.sidechain_hp {
            match design.sidechain_hp {
                Some(c) => {
                    if !had_hp {
                        filter.reset();
                    }
                    filter.set_coefficients(c);
                }
                None => filter.set_coefficients(Coefficients::IDENTITY),
            }
        }
        for filter in &mut self.sidechain_lp {
            match design.sidechain_lp {
                Some(c) => {
                    if !had_lp {
                        filter.reset();
                    }
                    filter.set_coefficients(c);
                }
                None => filter.set_coefficients(Coefficients::IDENTITY),
            }
        }

        self.makeup.set_target(design.makeup);
        self.mix.set_target(design.params.mix);
    }

    /// Current design.
    pub fn design(&self) -> &CompressorDesign {
        &self.design
    }

    /// Current gain reduction in dB (0 = none, always ≥ 0).
    pub fn gain_reduction_db(&self) -> f64 {
        self.reduction_db
    }

    /// Output peak/RMS since the last call.
    pub fn take_meter(&mut self) -> LevelReading {
        self.meter.take()
    }

    /// Detector level of a stereo key, linked on the louder channel.
    #[inline]
    fn detect(&mut self, key_left: f64, key_right: f64) -> f64 {
        let [hp_l, hp_r] = &mut self.sidechain_hp;
        let [lp_l, lp_r] = &mut self.sidechain_lp;
        let left = lp_l.process(hp_l.process(key_left));
        let right = lp_r.process(hp_r.process(key_right));
        let peak = left.abs().max(right.abs());
        match self.design.params.detector {
            Detector::Peak => peak,
            Detector::Rms => self.rms.process(peak),
            Detector::Circuit => {
                let rms = self.rms.process(peak);
                peak + (rms - peak) * self.design.traits.rms_blend
            }
        }
    }

    /// Processes one frame with an explicit detector key.
    #[inline]
    pub fn process_frame(&mut self, left: f64, right: f64, key_left: f64, key_right: f64) -> (f64, f64) {
        let level = self.detect(key_left, key_right);
        let d = &self.design;
        let p = &d.params;

        let target = gain_reduction_db(linear_to_db(level), p.threshold_db, p.ratio, p.knee_db);
        let coeff = if target > self.reduction_db {
            d.attack_coeff
        } else if p.program_release {
            exp(d.release_log * (1.0 + self.reduction_db / PROGRAM_RELEASE_DEPTH_DB))
        } else {
            d.release_coeff
        };
        self.reduction_db = flush_denormal(target + coeff * (self.reduction_db - target));

        let gain = if self.reduction_db > 0.0 {
            db_to_linear(-self.reduction_db)
        } else {
            1.0
        };

        let delay = d.lookahead_samples;
        let (dry_l, dry_r) = if delay > 0 {
            (
                self.lookahead[0].tick(left, delay),
                self.lookahead[1].tick(right, delay),
            )
        } else {
            (left, right)
        };

        let traits = d.traits;
        // At unity ratio no circuit colours the signal until the gain moves.
        let colour = p.ratio > 1.0 || self.reduction_db > 0.0;
        let g = gain * self.makeup.advance();
        let mix = self.mix.advance();
        let (wet_l, wet_r) = if colour {
            (saturate(dry_l * g, &traits), saturate(dry_r * g, &traits))
        } else {
            (dry_l * g, dry_r * g)
        };
        let out_l = wet_dry_mix(dry_l, wet_l, mix);
        let out_r = wet_dry_mix(dry_r, wet_r, mix);
        self.meter.accumulate(out_l, out_r);
        (out_l, out_r)
    }

    /// Processes a block keyed from an external sidechain.
    ///
    /// The sidechain is used only when `external_sidechain` is set;
    /// otherwise the main input keys the detector.
    pub fn process_block_stereo_with_sidechain(
        &mut self,
        left: &mut [f32],
        right: &mut [f32],
        side_left: &[f32],
        side_right: &[f32],
    ) {
        let external = self.design.params.external_sidechain;
        for (i, (l, r)) in left.iter_mut().zip(right.iter_mut()).enumerate() {
            let xl = f64::from(sanitize(*l));
            let xr = f64::from(sanitize(*r));
            let (kl, kr) = match (external, side_left.get(i), side_right.get(i)) {
                (true, Some(&sl), Some(&sr)) => (f64::from(sanitize(sl)), f64::from(sanitize(sr))),
                _ => (xl, xr),
            };
            let (ol, or) = self.process_frame(xl, xr, kl, kr);
            *l = ol as f32;
            *r = or as f32;
        }
    }
}

impl Effect for Compressor {
    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let l = f64::from(sanitize(left));
        let r = f64::from(sanitize(right));
        let (ol, or) = self.process_frame(l, r, l, r);
        (ol as f32, or as f32)
    }

    /// Rebuilds the compressor at the new rate, reallocating the lookahead
    /// buffers. Not real-time safe.
    fn set_sample_rate(&mut self, sample_rate: f64) {
        let params = self.design.params;
        *self = Self::with_params(sample_rate, &params);
    }

    fn reset(&mut self) {
        for filter in self.sidechain_hp.iter_mut().chain(&mut self.sidechain_lp) {
            filter.reset();
        }
        self.rms.reset();
        self.reduction_db = 0.0;
        self.makeup.snap_to_target();
        self.mix.snap_to_target();
        for line in &mut self.lookahead {
            line.clear();
        }
        self.meter = BlockMeter::new();
    }

    fn latency_samples(&self) -> usize {
        self.design.lookahead_samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FS: f64 = 48000.0;

    #[test]
    fn test_curve_regions() {
        // Hard knee
        assert_eq!(gain_reduction_db(-25.0, -20.0, 4.0, 0.0), 0.0);
        assert_eq!(gain_reduction_db(-20.0, -20.0, 4.0, 0.0), 0.0);
        assert!((gain_reduction_db(-8.0, -20.0, 4.0, 0.0) - 9.0).abs() < 1e-12);

        // Soft knee: zero at the lower edge, continuous at the upper edge
        assert_eq!(gain_reduction_db(-23.0, -20.0, 4.0, 6.0), 0.0);
        let edge = gain_reduction_db(-17.0, -20.0, 4.0, 6.0);
        assert!((edge - 3.0 * 0.75).abs() < 1e-12, "{edge}");
        // Knee midpoint: W/8 · (1 − 1/R)
        let mid = gain_reduction_db(-20.0, -20.0, 4.0, 6.0);
        assert!((mid - 6.0 / 8.0 * 0.75).abs() < 1e-12, "{mid}");
    }

    #[test]
    fn test_curve_is_monotonic() {
        let mut prev = 0.0;
        for i in 0..600 {
            let level = -60.0 + i as f64 * 0.1;
            let gr = gain_reduction_db(level, -20.0, 8.0, 12.0);
            assert!(gr >= prev - 1e-12, "non-monotonic at {level}");
            prev = gr;
        }
    }

    #[test]
    fn test_clamped_replaces_nan() {
        let p = CompressorParams {
            ratio: f64::NAN,
            attack_ms: -5.0,
            lookahead_ms: 100.0,
            sidechain: SidechainFilter {
                high_pass_hz: Some(f64::INFINITY),
                low_pass_hz: Some(5.0),
            },
            ..CompressorParams::default()
        }
        .clamped();
        assert_eq!(p.ratio, 4.0);
        assert_eq!(p.attack_ms, 0.01);
        assert_eq!(p.lookahead_ms, MAX_LOOKAHEAD_MS);
        assert_eq!(p.sidechain.high_pass_hz, None);
        assert_eq!(p.sidechain.low_pass_hz, Some(20.0));
    }

    #[test]
    fn test_lookahead_latency() {
        let params = CompressorParams {
            lookahead_ms: 5.0,
            ..CompressorParams::default()
        };
        let mut comp = Compressor::with_params(FS, &params);
        assert_eq!(comp.latency_samples(), 240);

        // An impulse comes out exactly `latency` samples later.
        let mut hit = None;
        for n in 0..400 {
            let x = if n == 0 { 0.01 } else { 0.0 };
            let (l, _) = comp.process_frame(x, x, x, x);
            if l != 0.0 && hit.is_none() {
                hit = Some(n);
            }
        }
        assert_eq!(hit, Some(240));
    }

    #[test]
    fn test_lookahead_catches_transient() {
        // With lookahead the detector sees the step before the audio does.
        let params = CompressorParams {
            threshold_db: -20.0,
            ratio: 20.0,
            attack_ms: 0.5,
            knee_db: 0.0,
            lookahead_ms: 5.0,
            ..CompressorParams::default()
        };
        let mut comp = Compressor::with_params(FS, &params);
        let mut first_loud = None;
        for n in 0..1000 {
            let x = if n >= 100 { 1.0 } else { 0.0 };
            let (l, _) = comp.process_frame(x, x, x, x);
            if l > 0.0 && first_loud.is_none() {
                first_loud = Some(l);
            }
        }
        let first = first_loud.expect("step reaches the output");
        assert!(first < 0.5, "transient passed at {first}");
    }

    #[test]
    fn test_program_release_is_faster_when_deep() {
        let base = CompressorParams {
            threshold_db: -40.0,
            ratio: 10.0,
            knee_db: 0.0,
            attack_ms: 0.1,
            release_ms: 200.0,
            ..CompressorParams::default()
        };
        let run = |program: bool| {
            let mut comp = Compressor::with_params(
                FS,
                &CompressorParams {
                    program_release: program,
                    ..base
                },
            );
            for _ in 0..4800 {
                comp.process_frame(1.0, 1.0, 1.0, 1.0);
            }
            for _ in 0..2400 {
                comp.process_frame(0.0, 0.0, 0.0, 0.0);
            }
            comp.gain_reduction_db()
        };
        assert!(run(true) < run(false));
    }

    #[test]
    fn test_sidechain_highpass_ignores_bass() {
        let params = CompressorParams {
            threshold_db: -30.0,
            ratio: 10.0,
            sidechain: SidechainFilter {
                high_pass_hz: Some(2000.0),
                low_pass_hz: None,
            },
            ..CompressorParams::default()
        };
        let mut filtered = Compressor::with_params(FS, &params);
        let mut plain = Compressor::with_params(FS, &CompressorParams::default());
        plain.apply(&CompressorDesign::new(
            &CompressorParams {
                sidechain: SidechainFilter::default(),
                ..params
            },
            FS,
        ));
        for n in 0..9600 {
            let x = 0.5 * libm::sin(core::f64::consts::TAU * 50.0 * n as f64 / FS);
            filtered.process_frame(x, x, x, x);
            plain.process_frame(x, x, x, x);
        }
        assert!(plain.gain_reduction_db() > 10.0);
        assert!(filtered.gain_reduction_db() < plain.gain_reduction_db() - 10.0);
    }

    #[test]
    fn test_external_sidechain_keys_detector() {
        let params = CompressorParams {
            threshold_db: -30.0,
            ratio: 10.0,
            knee_db: 0.0,
            external_sidechain: true,
            ..CompressorParams::default()
        };
        let mut comp = Compressor::with_params(FS, &params);
        let mut left = vec![0.01f32; 4800];
        let mut right = vec![0.01f32; 4800];
        let key = vec![1.0f32; 4800];
        comp.process_block_stereo_with_sidechain(&mut left, &mut right, &key, &key);
        assert!(comp.gain_reduction_db() > 20.0);
        assert!(left[4799] < 0.001, "{}", left[4799]);
    }

    #[test]
    fn test_saturation_bounded() {
        for model in CircuitModel::ALL {
            let traits = model.traits();
            for x in [-100.0, -4.0, -1.0, 0.0, 1.0, 4.0, 100.0] {
                let y = saturate(x, &traits);
                assert!(y.abs() <= SATURATION_CEILING || model == CircuitModel::Clean);
                assert!(y.is_finite());
            }
        }
        assert_eq!(saturate(0.3, &CircuitModel::Clean.traits()), 0.3);
    }

    #[test]
    fn test_unity_ratio_is_transparent_for_every_circuit() {
        for model in CircuitModel::ALL {
            let params = CompressorParams {
                ratio: 1.0,
                ..CompressorParams::with_circuit(model)
            };
            let mut comp = Compressor::with_params(FS, &params);
            for n in 0..4800 {
                let x = 0.8 * libm::sin(core::f64::consts::TAU * 440.0 * n as f64 / FS);
                let (l, r) = comp.process_frame(x, -x, x, -x);
                assert!((l - x).abs() < 1e-12 && (r + x).abs() < 1e-12, "{model:?}: {l} vs {x}");
            }
        }
    }

    #[test]
    fn test_linked_detector_hears_anti_phase() {
        let params = CompressorParams {
            threshold_db: -20.0,
            ratio: 10.0,
            ..CompressorParams::default()
        };
        let mut comp = Compressor::with_params(FS, &params);
        for _ in 0..4800 {
            comp.process_frame(0.9, -0.9, 0.9, -0.9);
        }
        assert!(comp.gain_reduction_db() > 10.0, "{}", comp.gain_reduction_db());
    }

    #[test]
    fn test_hard_panned_key_matches_centred() {
        let params = CompressorParams {
            threshold_db: -20.0,
            ratio: 4.0,
            detector: Detector::Peak,
            ..CompressorParams::default()
        };
        let mut panned = Compressor::with_params(FS, &params);
        let mut centred = Compressor::with_params(FS, &params);
        for _ in 0..4800 {
            panned.process_frame(0.5, 0.0, 0.5, 0.0);
            centred.process_frame(0.5, 0.5, 0.5, 0.5);
        }
        assert!((panned.gain_reduction_db() - centred.gain_reduction_db()).abs() < 1e-9);
    }

    #[test]
    fn test_rate_change_keeps_full_lookahead() {
        let params = CompressorParams {
            lookahead_ms: MAX_LOOKAHEAD_MS,
            ..CompressorParams::default()
        };
        let mut comp = Compressor::with_params(48000.0, &params);
        assert_eq!(comp.latency_samples(), 960);
        comp.set_sample_rate(192000.0);
        assert_eq!(comp.latency_samples(), 3840);
        assert_eq!(comp.design().sample_rate(), 192000.0);
    }

    #[test]
    fn test_parallel_mix() {
        let params = CompressorParams {
            threshold_db: -40.0,
            ratio: 100.0,
            knee_db: 0.0,
            mix: 0.0,
            ..CompressorParams::default()
        };
        let mut comp = Compressor::with_params(FS, &params);
        for _ in 0..4800 {
            let (l, _) = comp.process_frame(0.5, 0.5, 0.5, 0.5);
            assert_eq!(l, 0.5);
        }
    }

    #[test]
    fn test_meter_reports_output() {
        let mut comp = Compressor::new(FS);
        for _ in 0..100 {
            comp.process_frame(0.01, 0.01, 0.01, 0.01);
        }
        let reading = comp.take_meter();
        assert!((reading.peak_db - (-40.0)).abs() < 0.01);
    }
}
