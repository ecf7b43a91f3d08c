//! Eight-line feedback delay network reverb.
//!
//! # Signal Flow
//!
//! ```text
//! Input (mid) → Pre-delay → 4 × All-pass ─┬─→ Line 0 ─┐
//!                                         ├─→ ...     ├→ Damping → Hadamard ─┐
//!                                         └─→ Line 7 ─┘                      │
//!                    ↑                                                        │
//!                    └──────────────── feedback × g_k ────────────────────────┘
//! Lines → orthogonal output taps → L/R → Mix
//! ```
//!
//! Line lengths are primes scaled by room size. Each line's feedback gain
//! `10^(−3·delay/decay)` makes every line lose 60 dB in `decay_s` seconds, so
//! the tail decays uniformly regardless of line length.
//!
//! # Parameters
//!
//! | Parameter | Range | Default |
//! |-----------|-------|---------|
//! | decay_s | 0.1–30 s | 2.0 |
//! | room_size | 0–1 | 0.5 |
//! | predelay_ms | 0–250 ms | 10 |
//! | damping | 0–1 | 0.5 |
//! | diffusion | 0–0.9 | 0.7 |
//! | mod_rate_hz | 0–5 Hz | 0.5 |
//! | mod_depth_ms | 0–2 ms | 0.3 |
//! | mix | 0–1 | 0.3 |

use core::f64::consts::TAU;

use libm::{ceil, pow, round, sin, sqrt};
use strata_core::{
    AllpassFilter, DelayLine, Effect, OnePole, SmoothedParam, flush_denormal, ms_to_samples,
    sanitize, wet_dry_mix,
};

/// Number of delay lines.
pub const LINES: usize = 8;

/// Base line lengths at 48 kHz, before room scaling.
pub const BASE_LENGTHS: [usize; LINES] = [1031, 1327, 1523, 1777, 1993, 2239, 2467, 2719];

/// Input diffuser lengths at 48 kHz.
pub const DIFFUSER_LENGTHS: [usize; 4] = [142, 107, 379, 277];

/// Shortest allowed line, ms.
pub const MIN_LINE_MS: f64 = 5.0;

/// Longest pre-delay, ms.
pub const MAX_PREDELAY_MS: f64 = 250.0;

/// Deepest modulation, ms.
pub const MAX_MOD_DEPTH_MS: f64 = 2.0;

const REFERENCE_RATE: f64 = 48000.0;

/// Heaviest damping coefficient (at `damping = 1`).
const MAX_DAMPING_COEFF: f64 = 0.95;

/// Output tap scale: taps sum eight lines.
const OUTPUT_SCALE: f64 = 0.35;

/// Input gain into each line.
const INPUT_GAIN: f64 = 0.5;

/// Signs of the output taps: two orthogonal Hadamard rows.
const TAPS_LEFT: [f64; LINES] = [1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
const TAPS_RIGHT: [f64; LINES] = [1.0, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0, -1.0];

/// Signs applied to the diffused input per line.
const INPUT_SIGNS: [f64; LINES] = [1.0, -1.0, 1.0, 1.0, -1.0, 1.0, -1.0, -1.0];

/// Room scaling factor: `0.25 + 0.75·room`.
#[inline]
fn room_scale(room_size: f64) -> f64 {
    0.25 + 0.75 * room_size
}

/// Shortest line in samples at `sample_rate`.
pub fn min_line_samples(sample_rate: f64) -> usize {
    ceil(ms_to_samples(MIN_LINE_MS, sample_rate)) as usize
}

/// Line lengths in samples: scaled primes, floored, then made distinct.
pub fn line_lengths(room_size: f64, sample_rate: f64) -> [usize; LINES] {
    let scale = room_scale(room_size.clamp(0.0, 1.0)) * sample_rate / REFERENCE_RATE;
    let floor = min_line_samples(sample_rate).max(1);
    let mut lengths = BASE_LENGTHS.map(|base| (round(base as f64 * scale) as usize).max(floor));
    for k in 1..LINES {
        if lengths[k] <= lengths[k - 1] {
            lengths[k] = lengths[k - 1] + 1;
        }
    }
    lengths
}

/// Orthogonal 8×8 feedback matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedbackMatrix {
    rows: [[f64; LINES]; LINES],
}

impl FeedbackMatrix {
    /// Sylvester Hadamard matrix scaled by `1/√8`.
    pub fn hadamard8() -> Self {
        let scale = 1.0 / sqrt(LINES as f64);
        let mut rows = [[0.0; LINES]; LINES];
        for (i, row) in rows.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                // Sign is the parity of the shared set bits.
                let negative = (i & j).count_ones() % 2 == 1;
                *v = if negative { -scale } else { scale };
            }
        }
        Self { rows }
    }

    /// Matrix-vector product.
    #[inline]
    pub fn apply(&self, input: &[f64; LINES]) -> [f64; LINES] {
        let mut out = [0.0; LINES];
        for (o, row) in out.iter_mut().zip(&self.rows) {
            *o = row.iter().zip(input).map(|(m, x)| m * x).sum();
        }
        out
    }

    /// Matrix entry.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.rows[row][col]
    }
}

/// Reverb settings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReverbParams {
    /// Time for the tail to fall 60 dB, seconds.
    pub decay_s: f64,
    /// Scales line lengths.
    pub room_size: f64,
    /// Delay before the tail starts, ms.
    pub predelay_ms: f64,
    /// High-frequency loss in the feedback path.
    pub damping: f64,
    /// Input all-pass gain.
    pub diffusion: f64,
    /// Line modulation rate, Hz.
    pub mod_rate_hz: f64,
    /// Line modulation depth, ms.
    pub mod_depth_ms: f64,
    /// Wet share.
    pub mix: f64,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            decay_s: 2.0,
            room_size: 0.5,
            predelay_ms: 10.0,
            damping: 0.5,
            diffusion: 0.7,
            mod_rate_hz: 0.5,
            mod_depth_ms: 0.3,
            mix: 0.3,
        }
    }
}

impl ReverbParams {
    /// Copy with every field forced into range. NaN falls back to the default.
    pub fn clamped(&self) -> Self {
        let d = Self::default();
        let f = |v: f64, fallback: f64, lo: f64, hi: f64| {
            if v.is_finite() { v.clamp(lo, hi) } else { fallback }
        };
        Self {
            decay_s: f(self.decay_s, d.decay_s, 0.1, 30.0),
            room_size: f(self.room_size, d.room_size, 0.0, 1.0),
            predelay_ms: f(self.predelay_ms, d.predelay_ms, 0.0, MAX_PREDELAY_MS),
            damping: f(self.damping, d.damping, 0.0, 1.0),
            diffusion: f(self.diffusion, d.diffusion, 0.0, 0.9),
            mod_rate_hz: f(self.mod_rate_hz, d.mod_rate_hz, 0.0, 5.0),
            mod_depth_ms: f(self.mod_depth_ms, d.mod_depth_ms, 0.0, MAX_MOD_DEPTH_MS),
            mix: f(self.mix, d.mix, 0.0, 1.0),
        }
    }
}

/// Reverb coefficients for one sample rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbDesign {
    params: ReverbParams,
    sample_rate: f64,
    lengths: [usize; LINES],
    feedback: [f64; LINES],
    damping_coeff: f64,
    predelay_samples: usize,
    mod_depth_samples: f64,
    mod_increment: f64,
}

impl ReverbDesign {
    /// Computes line lengths and gains for `params` at `sample_rate`.
    pub fn new(params: &ReverbParams, sample_rate: f64) -> Self {
        let p = params.clamped();
        let lengths = line_lengths(p.room_size, sample_rate);
        let feedback = lengths.map(|len| pow(10.0, -3.0 * (len as f64 / sample_rate) / p.decay_s));

        #[cfg(feature = "tracing")]
        tracing::trace!(
            decay_s = p.decay_s,
            room_size = p.room_size,
            shortest = lengths[0],
            longest = lengths[LINES - 1],
            "reverb designed"
        );

        Self {
            params: p,
            sample_rate,
            lengths,
            feedback,
            damping_coeff: p.damping * MAX_DAMPING_COEFF,
            predelay_samples: round(ms_to_samples(p.predelay_ms, sample_rate)) as usize,
            mod_depth_samples: ms_to_samples(p.mod_depth_ms, sample_rate),
            mod_increment: TAU * p.mod_rate_hz / sample_rate,
        }
    }

    /// The clamped parameters.
    pub fn params(&self) -> &ReverbParams {
        &self.params
    }

    /// Sample rate the design was computed for.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Line lengths in samples.
    pub fn lengths(&self) -> &[usize; LINES] {
        &self.lengths
    }

    /// Per-line feedback gains.
    pub fn feedback(&self) -> &[f64; LINES] {
        &self.feedback
    }
}

/// FDN reverb.
///
/// All buffers are allocated by [`Reverb::new`] for the largest room and
/// deepest modulation at that sample rate. [`Reverb::apply`] never allocates.
///
/// # Example
///
/// ```rust
/// use strata_core::Effect;
/// use strata_effects::reverb::{Reverb, ReverbDesign, ReverbParams};
///
/// let mut verb = Reverb::new(48000.0);
/// verb.apply(&ReverbDesign::new(&ReverbParams { decay_s: 3.0, ..Default::default() }, 48000.0));
/// let (l, r) = verb.process_stereo(0.5, 0.5);
/// assert!(l.is_finite() && r.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct Reverb {
    design: ReverbDesign,
    matrix: FeedbackMatrix,
    lines: [DelayLine; LINES],
    damping: [OnePole; LINES],
    diffusers: [AllpassFilter; 4],
    predelay: DelayLine,
    mix: SmoothedParam,
    mod_phase: f64,
}

impl Reverb {
    /// Creates a reverb with default settings.
    pub fn new(sample_rate: f64) -> Self {
        Self::with_params(sample_rate, &ReverbParams::default())
    }

    /// Creates a reverb and allocates its buffers.
    pub fn with_params(sample_rate: f64, params: &ReverbParams) -> Self {
        let longest = line_lengths(1.0, sample_rate)[LINES - 1];
        let line_capacity = longest + ceil(ms_to_samples(MAX_MOD_DEPTH_MS, sample_rate)) as usize + 2;
        let rate = sample_rate / REFERENCE_RATE;
        let design = ReverbDesign::new(params, sample_rate);

        let mut verb = Self {
            design,
            matrix: FeedbackMatrix::hadamard8(),
            lines: core::array::from_fn(|_| DelayLine::new(line_capacity)),
            damping: core::array::from_fn(|_| OnePole::default()),
            diffusers: DIFFUSER_LENGTHS
                .map(|len| AllpassFilter::new((round(len as f64 * rate) as usize).max(1))),
            predelay: DelayLine::from_time(sample_rate, MAX_PREDELAY_MS / 1000.0),
            mix: SmoothedParam::with_config(design.params.mix, sample_rate, 10.0),
            mod_phase: 0.0,
        };
        verb.apply(&design);
        verb
    }

    /// Loads a design. Real-time safe.
    pub fn apply(&mut self, design: &ReverbDesign) {
        self.design = *design;

        // Keep lengths inside the buffers allocated at construction.
        let max_len = self.lines[0].capacity().saturating_sub(
            ceil(self.design.mod_depth_samples) as usize + 2,
        );
        for len in &mut self.design.lengths {
            *len = (*len).min(max_len).max(1);
        }
        self.design.predelay_samples = self.design.predelay_samples.min(self.predelay.capacity());

        for filter in &mut self.damping {
            filter.set_coefficient(design.damping_coeff);
        }
        for ap in &mut self.diffusers {
            ap.set_gain(design.params.diffusion);
        }
        self.mix.set_target(design.params.mix);
    }

    /// Current design.
    pub fn design(&self) -> &ReverbDesign {
        &self.design
    }

    /// Processes one frame in `f64`.
    #[inline]
    pub fn process_frame(&mut self, left: f64, right: f64) -> (f64, f64) {
        let d = &self.design;
        let input = (left + right) * 0.5;

        let mut x = if d.predelay_samples > 0 {
            self.predelay.tick(input, d.predelay_samples)
        } else {
            input
        };
        for ap in &mut self.diffusers {
            x = ap.process(x);
        }

        let mut reads = [0.0; LINES];
        if d.mod_depth_samples > 0.0 {
            for (k, r) in reads.iter_mut().enumerate() {
                let phase = self.mod_phase + k as f64 * TAU / LINES as f64;
                let offset = d.mod_depth_samples * 0.5 * (1.0 + sin(phase));
                *r = self.lines[k].read_fractional(d.lengths[k] as f64 + offset);
            }
            self.mod_phase += d.mod_increment;
            if self.mod_phase >= TAU {
                self.mod_phase -= TAU;
            }
        } else {
            for (k, r) in reads.iter_mut().enumerate() {
                *r = self.lines[k].read(d.lengths[k]);
            }
        }

        let mut wet_l = 0.0;
        let mut wet_r = 0.0;
        for k in 0..LINES {
            wet_l += TAPS_LEFT[k] * reads[k];
            wet_r += TAPS_RIGHT[k] * reads[k];
            reads[k] = self.damping[k].process(reads[k]);
        }

        let mixed = self.matrix.apply(&reads);
        for k in 0..LINES {
            let v = d.feedback[k] * mixed[k] + INPUT_GAIN * INPUT_SIGNS[k] * x;
            self.lines[k].write(flush_denormal(v));
        }

        let mix = self.mix.advance();
        (
            wet_dry_mix(left, wet_l * OUTPUT_SCALE, mix),
            wet_dry_mix(right, wet_r * OUTPUT_SCALE, mix),
        )
    }
}

impl Effect for Reverb {
    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let (l, r) = self.process_frame(f64::from(sanitize(left)), f64::from(sanitize(right)));
        (l as f32, r as f32)
    }

    /// Rebuilds the reverb at the new rate, reallocating every line.
    /// Not real-time safe.
    fn set_sample_rate(&mut self, sample_rate: f64) {
        let params = self.design.params;
        *self = Self::with_params(sample_rate, &params);
    }

    fn reset(&mut self) {
        for line in &mut self.lines {
            line.clear();
        }
        for filter in &mut self.damping {
            filter.reset();
        }
        for ap in &mut self.diffusers {
            ap.clear();
        }
        self.predelay.clear();
        self.mix.snap_to_target();
        self.mod_phase = 0.0;
    }
}
