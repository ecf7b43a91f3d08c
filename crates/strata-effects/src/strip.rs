//! Channel strip: EQ → compressor → reverb.

use strata_core::{Effect, LinearRamp, sanitize};

use crate::compressor::{Compressor, CompressorDesign, CompressorParams};
use crate::eq::{EqBank, EqBankDesign, EqBankParams, EqError};
use crate::reverb::{Reverb, ReverbDesign, ReverbParams};

/// Crossfade length when a processor is switched in or out.
pub const SECTION_FADE_MS: f64 = 5.0;

/// Settings of every processor in the strip.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StripParams {
    /// Equalizer.
    pub eq: EqBankParams,
    /// Compressor.
    pub compressor: CompressorParams,
    /// Reverb.
    pub reverb: ReverbParams,
    /// Run the equalizer.
    pub eq_enabled: bool,
    /// Run the compressor.
    pub compressor_enabled: bool,
    /// Run the reverb.
    pub reverb_enabled: bool,
}

impl Default for StripParams {
    fn default() -> Self {
        Self {
            eq: EqBankParams::new(),
            compressor: CompressorParams::default(),
            reverb: ReverbParams::default(),
            eq_enabled: true,
            compressor_enabled: false,
            reverb_enabled: false,
        }
    }
}

impl StripParams {
    /// Computes every coefficient of the strip at `sample_rate`.
    pub fn design(&self, sample_rate: f64) -> Result<StripDesign, EqError> {
        Ok(StripDesign {
            eq: self.eq.design(sample_rate)?,
            compressor: CompressorDesign::new(&self.compressor, sample_rate),
            reverb: ReverbDesign::new(&self.reverb, sample_rate),
            eq_enabled: self.eq_enabled,
            compressor_enabled: self.compressor_enabled,
            reverb_enabled: self.reverb_enabled,
            sample_rate,
        })
    }
}

/// Precomputed strip, ready to hand to the audio thread.
#[derive(Debug, Clone, PartialEq)]
pub struct StripDesign {
    /// Equalizer coefficients.
    pub eq: EqBankDesign,
    /// Compressor coefficients.
    pub compressor: CompressorDesign,
    /// Reverb coefficients.
    pub reverb: ReverbDesign,
    /// Run the equalizer.
    pub eq_enabled: bool,
    /// Run the compressor.
    pub compressor_enabled: bool,
    /// Run the reverb.
    pub reverb_enabled: bool,
    /// Rate the design was computed for.
    pub sample_rate: f64,
}

/// Real-time channel strip.
///
/// Switching a processor in or out crossfades over [`SECTION_FADE_MS`].
/// A switched-out EQ or reverb is cleared once its fade ends and then
/// skipped. The compressor keeps running so its lookahead line stays full.
///
/// # Example
///
/// ```rust
/// use strata_core::Effect;
/// use strata_effects::eq::BandParams;
/// use strata_effects::strip::{ChannelStrip, StripParams};
///
/// let mut params = StripParams::default();
/// params.eq.add_band(BandParams::low_cut(80.0, 18.0)).unwrap();
/// params.compressor_enabled = true;
///
/// let mut strip = ChannelStrip::new(48000.0);
/// strip.apply(&params.design(48000.0).unwrap());
///
/// let mut left = [0.1f32; 64];
/// let mut right = [0.1f32; 64];
/// strip.process_block_stereo(&mut left, &mut right);
/// ```
#[derive(Debug, Clone)]
pub struct ChannelStrip {
    eq: EqBank,
    compressor: Compressor,
    reverb: Reverb,
    eq_fade: LinearRamp,
    compressor_fade: LinearRamp,
    reverb_fade: LinearRamp,
    sample_rate: f64,
}

impl ChannelStrip {
    /// Allocates every processor for `sample_rate`. The EQ starts flat and
    /// the compressor and reverb start bypassed.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            eq: EqBank::new(sample_rate),
            compressor: Compressor::new(sample_rate),
            reverb: Reverb::new(sample_rate),
            eq_fade: LinearRamp::with_config(1.0, sample_rate, SECTION_FADE_MS),
            compressor_fade: LinearRamp::with_config(0.0, sample_rate, SECTION_FADE_MS),
            reverb_fade: LinearRamp::with_config(0.0, sample_rate, SECTION_FADE_MS),
            sample_rate,
        }
    }

    /// Allocates a strip at the design's rate with `design` already in
    /// place, without fading anything in.
    pub fn with_design(design: &StripDesign) -> Self {
        let mut strip = Self::new(design.sample_rate);
        strip.apply(design);
        strip.snap_fades();
        strip
    }

    /// Loads a design. Real-time safe.
    ///
    /// Processors switched in or out fade over the following
    /// [`SECTION_FADE_MS`].
    pub fn apply(&mut self, design: &StripDesign) {
        self.eq.apply(&design.eq);
        self.compressor.apply(&design.compressor);
        self.reverb.apply(&design.reverb);
        self.eq_fade.set_target(switch_gain(design.eq_enabled));
        self.compressor_fade
            .set_target(switch_gain(design.compressor_enabled));
        self.reverb_fade.set_target(switch_gain(design.reverb_enabled));
    }

    fn snap_fades(&mut self) {
        self.eq_fade.snap_to_target();
        self.compressor_fade.snap_to_target();
        self.reverb_fade.snap_to_target();
    }

    /// Sample rate the strip was built for.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Compressor gain reduction in dB, 0 when bypassed.
    pub fn gain_reduction_db(&self) -> f64 {
        if self.compressor_fade.get() > 0.0 {
            self.compressor.gain_reduction_db()
        } else {
            0.0
        }
    }

    /// The equalizer.
    pub fn eq(&self) -> &EqBank {
        &self.eq
    }

    /// The compressor.
    pub fn compressor(&self) -> &Compressor {
        &self.compressor
    }

    /// The reverb.
    pub fn reverb(&self) -> &Reverb {
        &self.reverb
    }

    /// Processes one frame.
    ///
    /// `key` is an external compressor sidechain. `None` keys the compressor
    /// from its own input.
    #[inline]
    pub fn process_frame(&mut self, left: f64, right: f64, key: Option<(f64, f64)>) -> (f64, f64) {
        let (mut l, mut r) = (left, right);
        if is_running(&self.eq_fade) {
            let wet = self.eq.process_frame(l, r);
            (l, r) = crossfade(self.eq_fade.advance(), (l, r), wet);
            if self.eq_fade.get() <= 0.0 {
                self.eq.reset();
            }
        }

        let (kl, kr) = key.unwrap_or((l, r));
        let wet = self.compressor.process_frame(l, r, kl, kr);
        (l, r) = crossfade(self.compressor_fade.advance(), (l, r), wet);

        if is_running(&self.reverb_fade) {
            let wet = self.reverb.process_frame(l, r);
            (l, r) = crossfade(self.reverb_fade.advance(), (l, r), wet);
            if self.reverb_fade.get() <= 0.0 {
                self.reverb.reset();
            }
        }
        (l, r)
    }

    /// Processes a block with an external compressor sidechain.
    ///
    /// The sidechain is used only when the compressor's
    /// `external_sidechain` is set.
    pub fn process_block_stereo_with_sidechain(
        &mut self,
        left: &mut [f32],
        right: &mut [f32],
        side_left: &[f32],
        side_right: &[f32],
    ) {
        let external = self.compressor.design().params().external_sidechain;
        for (i, (l, r)) in left.iter_mut().zip(right.iter_mut()).enumerate() {
            let key = match (external, side_left.get(i), side_right.get(i)) {
                (true, Some(&sl), Some(&sr)) => {
                    Some((f64::from(sanitize(sl)), f64::from(sanitize(sr))))
                }
                _ => None,
            };
            let (ol, or) =
                self.process_frame(f64::from(sanitize(*l)), f64::from(sanitize(*r)), key);
            *l = ol as f32;
            *r = or as f32;
        }
    }
}

impl Effect for ChannelStrip {
    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let (l, r) = self.process_frame(f64::from(sanitize(left)), f64::from(sanitize(right)), None);
        (l as f32, r as f32)
    }

    /// Rebuilds the compressor and reverb buffers for the new rate and clears
    /// the EQ. Allocates, so it belongs on the control plane. A full design
    /// for the new rate should be applied next.
    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.eq.set_sample_rate(sample_rate);
        self.compressor.set_sample_rate(sample_rate);
        self.reverb.set_sample_rate(sample_rate);
        for fade in [&mut self.eq_fade, &mut self.compressor_fade, &mut self.reverb_fade] {
            fade.set_sample_rate(sample_rate);
        }
        self.snap_fades();
    }

    fn reset(&mut self) {
        self.eq.reset();
        self.compressor.reset();
        self.reverb.reset();
        self.snap_fades();
    }

    fn latency_samples(&self) -> usize {
        if self.compressor_fade.target() > 0.0 {
            self.compressor.latency_samples()
        } else {
            0
        }
    }
}

fn switch_gain(enabled: bool) -> f64 {
    if enabled { 1.0 } else { 0.0 }
}

/// A section runs while it is switched in or still fading.
#[inline]
fn is_running(fade: &LinearRamp) -> bool {
    fade.get() > 0.0 || !fade.is_settled()
}

#[inline]
fn crossfade(g: f64, dry: (f64, f64), wet: (f64, f64)) -> (f64, f64) {
    if g >= 1.0 {
        wet
    } else if g <= 0.0 {
        dry
    } else {
        (dry.0 + (wet.0 - dry.0) * g, dry.1 + (wet.1 - dry.1) * g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eq::BandParams;

    const FS: f64 = 48000.0;

    #[test]
    fn test_default_strip_is_transparent() {
        let mut strip = ChannelStrip::new(FS);
        strip.apply(&StripParams::default().design(FS).expect("design"));
        for n in 0..512 {
            let x = (n as f32 * 0.01).sin() * 0.25;
            assert_eq!(strip.process_stereo(x, x * 0.5), (x, x * 0.5));
        }
    }

    #[test]
    fn test_latency_follows_compressor() {
        let mut params = StripParams::default();
        params.compressor.lookahead_ms = 2.0;
        let mut strip = ChannelStrip::new(FS);
        strip.apply(&params.design(FS).expect("design"));
        assert_eq!(strip.latency_samples(), 0);

        params.compressor_enabled = true;
        strip.apply(&params.design(FS).expect("design"));
        assert_eq!(strip.latency_samples(), 96);
    }

    #[test]
    fn test_order_is_eq_then_compressor() {
        // A deep cut ahead of the compressor keeps it from reacting.
        let mut params = StripParams::default();
        params.eq.add_band(BandParams::high_cut(200.0, 96.0)).expect("band");
        params.compressor = CompressorParams {
            threshold_db: -40.0,
            ratio: 10.0,
            ..CompressorParams::default()
        };
        params.compressor_enabled = true;

        let mut strip = ChannelStrip::new(FS);
        strip.apply(&params.design(FS).expect("design"));
        for n in 0..9600 {
            let x = 0.5 * libm::sin(core::f64::consts::TAU * 8000.0 * n as f64 / FS);
            strip.process_frame(x, x, None);
        }
        assert!(strip.gain_reduction_db() < 0.1, "{}", strip.gain_reduction_db());
    }

    #[test]
    fn test_block_sidechain_reaches_compressor() {
        let mut params = StripParams {
            compressor_enabled: true,
            ..StripParams::default()
        };
        params.compressor.threshold_db = -30.0;
        params.compressor.external_sidechain = true;
        let mut strip = ChannelStrip::new(FS);
        strip.apply(&params.design(FS).expect("design"));

        let mut left = vec![0.001f32; 2048];
        let mut right = left.clone();
        let key = vec![0.9f32; 2048];
        strip.process_block_stereo_with_sidechain(&mut left, &mut right, &key, &key);
        assert!(strip.gain_reduction_db() > 10.0);
    }

    #[test]
    fn test_disabled_reverb_fades_out_then_clears() {
        let mut params = StripParams {
            reverb_enabled: true,
            ..StripParams::default()
        };
        params.reverb.mix = 1.0;
        let mut strip = ChannelStrip::with_design(&params.design(FS).expect("design"));
        strip.process_frame(1.0, 1.0, None);
        for _ in 0..2400 {
            strip.process_frame(0.0, 0.0, None);
        }

        let mut held = strip.clone();
        params.reverb_enabled = false;
        strip.apply(&params.design(FS).expect("design"));

        let fade_len = (SECTION_FADE_MS / 1000.0 * FS) as usize;
        for n in 0..fade_len {
            let (tail, _) = held.process_frame(0.0, 0.0, None);
            let (out, _) = strip.process_frame(0.0, 0.0, None);
            let g = 1.0 - (n + 1) as f64 / fade_len as f64;
            assert!((out - tail * g).abs() < 1e-9, "sample {n}: {out} vs {}", tail * g);
        }
        for _ in 0..fade_len {
            assert_eq!(strip.process_frame(0.0, 0.0, None), (0.0, 0.0));
        }

        // Switched back in, the old tail is gone.
        params.reverb_enabled = true;
        strip.apply(&params.design(FS).expect("design"));
        for _ in 0..4800 {
            assert_eq!(strip.process_frame(0.0, 0.0, None), (0.0, 0.0));
        }
    }

    #[test]
    fn test_eq_switch_is_click_free() {
        let mut params = StripParams::default();
        params.eq.add_band(BandParams::bell(1000.0, 12.0, 1.0)).expect("band");
        let mut strip = ChannelStrip::with_design(&params.design(FS).expect("design"));
        let sine = |n: usize| 0.25 * libm::sin(core::f64::consts::TAU * 1000.0 * n as f64 / FS);

        let mut previous = 0.0;
        for n in 0..4800 {
            previous = strip.process_frame(sine(n), sine(n), None).0;
        }
        params.eq_enabled = false;
        strip.apply(&params.design(FS).expect("design"));
        // A 1 kHz sine of peak 1.0 moves at most ~0.13 per sample.
        for n in 4800..5280 {
            let (out, _) = strip.process_frame(sine(n), sine(n), None);
            assert!((out - previous).abs() < 0.2, "jump from {previous} to {out}");
            previous = out;
        }
        // Fully out: the dry signal passes untouched.
        for n in 5280..5400 {
            assert_eq!(strip.process_frame(sine(n), sine(n), None).0, sine(n));
        }
    }

    #[test]
    fn test_with_design_starts_without_fade() {
        let params = StripParams {
            compressor_enabled: true,
            ..StripParams::default()
        };
        let strip = ChannelStrip::with_design(&params.design(FS).expect("design"));
        assert!(strip.compressor_fade.is_settled());
        assert_eq!(strip.compressor_fade.get(), 1.0);
    }
}
