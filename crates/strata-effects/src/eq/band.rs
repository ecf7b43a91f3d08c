//! A single EQ band: filter shape, channel routing and optional dynamics.
//!
//! Parameters live in [`BandParams`]. [`BandDesign::new`] turns them into
//! coefficients on the control plane. [`EqBand`] runs a design on the audio
//! thread.
//!
//! # Filter Types
//!
//! | Type | Controls | Sections |
//! |------|----------|----------|
//! | Bell | frequency, gain, Q | 1 |
//! | LowShelf / HighShelf | frequency, gain, shelf slope | 1 |
//! | LowCut / HighCut | frequency, slope (6–96 dB/oct), Q (resonance) | 1–8 |
//! | Notch / BandPass / AllPass | frequency, Q | 1 |
//! | Tilt | frequency (pivot), gain | 1 |
//! | FlatTiltShelf | frequency (pivot), gain | 6 |
//!
//! # Dynamic Mode
//!
//! A band with [`DynamicParams`] listens to its own frequency region through a
//! band-pass detector. When the detected level crosses the threshold the
//! band's gain moves from `gain_db` toward `gain_db + range_db`. Gain is
//! re-derived every [`DYNAMIC_UPDATE_INTERVAL`] samples and coefficients are
//! only rebuilt when it moved by more than [`GAIN_EPSILON_DB`].

use core::f64::consts::FRAC_1_SQRT_2;

use strata_core::{
    BellPrototype, Biquad, Cascade, CascadeDesign, Coefficients, CutKind, MAX_CASCADE_STAGES,
    MatchedBellPrototype, ShelfKind, ShelfPrototype, TiltPrototype, allpass_coefficients,
    bandpass_coefficients, butterworth_qs, first_order_highpass_coefficients,
    first_order_lowpass_coefficients, highpass_coefficients, linear_to_db, lowpass_coefficients,
    ms_decode, ms_encode, notch_coefficients, single_pole_cut_coefficients, slope_to_order,
    time_constant_coeff,
};

use super::PhaseMode;
use crate::compressor::gain_reduction_db;

/// Samples between dynamic gain updates.
pub const DYNAMIC_UPDATE_INTERVAL: usize = 32;

/// Smallest gain change (dB) that triggers a coefficient rebuild.
pub const GAIN_EPSILON_DB: f64 = 0.01;

/// Knee width of the dynamic band detector curve.
pub const DYNAMIC_KNEE_DB: f64 = 6.0;

/// Number of tilt sections in a [`FilterType::FlatTiltShelf`].
pub const FLAT_TILT_SECTIONS: usize = 6;

/// Octave offsets of the flat-tilt pivots around the band frequency.
const FLAT_TILT_OFFSETS: [f64; FLAT_TILT_SECTIONS] = [-5.0, -3.0, -1.0, 1.0, 3.0, 5.0];

/// Frequency range accepted by a band, in Hz. Designs further clamp to Nyquist.
pub const FREQUENCY_RANGE: (f64, f64) = (10.0, 30000.0);

/// Gain range in dB (symmetric).
pub const GAIN_RANGE_DB: f64 = 30.0;

/// Q range.
pub const Q_RANGE: (f64, f64) = (0.025, 40.0);

/// Shelf slope range (cookbook `S`).
pub const SHELF_SLOPE_RANGE: (f64, f64) = (0.05, 1.0);

/// Filter shape of a band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FilterType {
    /// Peaking filter.
    #[default]
    Bell,
    /// Boost/cut below the corner.
    LowShelf,
    /// Boost/cut above the corner.
    HighShelf,
    /// High-pass with selectable slope.
    LowCut,
    /// Low-pass with selectable slope.
    HighCut,
    /// Band-reject.
    Notch,
    /// Band-pass with 0 dB peak.
    BandPass,
    /// First-order tilt around a pivot.
    Tilt,
    /// Unity-magnitude phase rotation.
    AllPass,
    /// Broad tilt spanning roughly ten octaves around the pivot.
    FlatTiltShelf,
}

impl FilterType {
    /// Every filter type, in declaration order.
    pub const ALL: [FilterType; 10] = [
        Self::Bell,
        Self::LowShelf,
        Self::HighShelf,
        Self::LowCut,
        Self::HighCut,
        Self::Notch,
        Self::BandPass,
        Self::Tilt,
        Self::AllPass,
        Self::FlatTiltShelf,
    ];

    /// True when the `gain_db` parameter affects this shape.
    pub fn has_gain(self) -> bool {
        matches!(
            self,
            Self::Bell | Self::LowShelf | Self::HighShelf | Self::Tilt | Self::FlatTiltShelf
        )
    }

    /// Stable lowercase name, used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bell => "bell",
            Self::LowShelf => "low_shelf",
            Self::HighShelf => "high_shelf",
            Self::LowCut => "low_cut",
            Self::HighCut => "high_cut",
            Self::Notch => "notch",
            Self::BandPass => "band_pass",
            Self::Tilt => "tilt",
            Self::AllPass => "all_pass",
            Self::FlatTiltShelf => "flat_tilt_shelf",
        }
    }
}

/// Which part of the stereo signal a band processes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ChannelMode {
    /// Both channels, independently filtered.
    #[default]
    Stereo,
    /// Left channel only.
    Left,
    /// Right channel only.
    Right,
    /// Mid (sum) component only.
    Mid,
    /// Side (difference) component only.
    Side,
}

impl ChannelMode {
    /// Every channel mode, in declaration order.
    pub const ALL: [ChannelMode; 5] = [
        Self::Stereo,
        Self::Left,
        Self::Right,
        Self::Mid,
        Self::Side,
    ];
}

/// Level-dependent gain for a band.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DynamicParams {
    /// Detector level where the gain starts to move, dB (−80..0).
    pub threshold_db: f64,
    /// Ratio of the detector curve (1..20).
    pub ratio: f64,
    /// Attack time, ms (0.1..500).
    pub attack_ms: f64,
    /// Release time, ms (1..5000).
    pub release_ms: f64,
    /// Maximum gain excursion, dB (−30..30). Negative cuts more when loud.
    pub range_db: f64,
}

impl Default for DynamicParams {
    fn default() -> Self {
        Self {
            threshold_db: -20.0,
            ratio: 2.0,
            attack_ms: 5.0,
            release_ms: 50.0,
            range_db: -6.0,
        }
    }
}

/// Parameters of one EQ band.
///
/// ## Parameter Ranges
///
/// | Field | Range | Default |
/// |-------|-------|---------|
/// | frequency_hz | 10–30000 Hz (designs clamp below Nyquist) | 1000 |
/// | gain_db | −30–30 dB | 0 |
/// | q | 0.025–40 | 0.7071 |
/// | slope_db_per_oct | 6–96, steps of 6 | 12 |
/// | shelf_slope | 0.05–1 | 1 |
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BandParams {
    /// Filter shape.
    pub filter_type: FilterType,
    /// Centre, corner or pivot frequency in Hz.
    pub frequency_hz: f64,
    /// Gain in dB (shapes with gain only).
    pub gain_db: f64,
    /// Bandwidth, or corner resonance for cuts.
    pub q: f64,
    /// Cut slope in dB/octave.
    pub slope_db_per_oct: f64,
    /// Shelf steepness `S`.
    pub shelf_slope: f64,
    /// Disabled bands pass audio untouched.
    pub enabled: bool,
    /// Stereo routing.
    pub channel_mode: ChannelMode,
    /// Optional dynamic gain.
    pub dynamic: Option<DynamicParams>,
}

impl Default for BandParams {
    fn default() -> Self {
        Self {
            filter_type: FilterType::Bell,
            frequency_hz: 1000.0,
            gain_db: 0.0,
            q: FRAC_1_SQRT_2,
            slope_db_per_oct: 12.0,
            shelf_slope: 1.0,
            enabled: true,
            channel_mode: ChannelMode::Stereo,
            dynamic: None,
        }
    }
}

impl BandParams {
    /// A bell band.
    pub fn bell(frequency_hz: f64, gain_db: f64, q: f64) -> Self {
        Self {
            filter_type: FilterType::Bell,
            frequency_hz,
            gain_db,
            q,
            ..Self::default()
        }
    }

    /// A low shelf.
    pub fn low_shelf(frequency_hz: f64, gain_db: f64) -> Self {
        Self {
            filter_type: FilterType::LowShelf,
            frequency_hz,
            gain_db,
            ..Self::default()
        }
    }

    /// A high shelf.
    pub fn high_shelf(frequency_hz: f64, gain_db: f64) -> Self {
        Self {
            filter_type: FilterType::HighShelf,
            frequency_hz,
            gain_db,
            ..Self::default()
        }
    }

    /// A Butterworth low cut (high-pass).
    pub fn low_cut(frequency_hz: f64, slope_db_per_oct: f64) -> Self {
        Self {
            filter_type: FilterType::LowCut,
            frequency_hz,
            slope_db_per_oct,
            ..Self::default()
        }
    }

    /// A Butterworth high cut (low-pass).
    pub fn high_cut(frequency_hz: f64, slope_db_per_oct: f64) -> Self {
        Self {
            filter_type: FilterType::HighCut,
            frequency_hz,
            slope_db_per_oct,
            ..Self::default()
        }
    }

    /// A notch.
    pub fn notch(frequency_hz: f64, q: f64) -> Self {
        Self {
            filter_type: FilterType::Notch,
            frequency_hz,
            q,
            ..Self::default()
        }
    }

    /// A band of any gainless type at `frequency_hz` with bandwidth `q`.
    pub fn of_type(filter_type: FilterType, frequency_hz: f64, q: f64) -> Self {
        Self {
            filter_type,
            frequency_hz,
            q,
            ..Self::default()
        }
    }

    /// Sets the routing.
    pub fn with_channel_mode(mut self, channel_mode: ChannelMode) -> Self {
        self.channel_mode = channel_mode;
        self
    }

    /// Enables dynamic gain.
    pub fn with_dynamic(mut self, dynamic: DynamicParams) -> Self {
        self.dynamic = Some(dynamic);
        self
    }

    /// Checks the parameters and returns a copy clamped into range.
    ///
    /// Non-finite values, a non-positive frequency or Q, and dynamics on a
    /// shape without gain are rejected.
    pub fn validated(&self) -> Result<Self, BandError> {
        check_finite("frequency_hz", self.frequency_hz)?;
        check_finite("gain_db", self.gain_db)?;
        check_finite("q", self.q)?;
        check_finite("slope_db_per_oct", self.slope_db_per_oct)?;
        check_finite("shelf_slope", self.shelf_slope)?;
        if self.frequency_hz <= 0.0 {
            return Err(BandError::NotPositive("frequency_hz"));
        }
        if self.q <= 0.0 {
            return Err(BandError::NotPositive("q"));
        }

        let dynamic = match self.dynamic {
            None => None,
            Some(_) if !self.filter_type.has_gain() => {
                return Err(BandError::DynamicWithoutGain(self.filter_type));
            }
            Some(d) => {
                check_finite("dynamic.threshold_db", d.threshold_db)?;
                check_finite("dynamic.ratio", d.ratio)?;
                check_finite("dynamic.attack_ms", d.attack_ms)?;
                check_finite("dynamic.release_ms", d.release_ms)?;
                check_finite("dynamic.range_db", d.range_db)?;
                Some(DynamicParams {
                    threshold_db: d.threshold_db.clamp(-80.0, 0.0),
                    ratio: d.ratio.clamp(1.0, 20.0),
                    attack_ms: d.attack_ms.clamp(0.1, 500.0),
                    release_ms: d.release_ms.clamp(1.0, 5000.0),
                    range_db: d.range_db.clamp(-GAIN_RANGE_DB, GAIN_RANGE_DB),
                })
            }
        };

        Ok(Self {
            filter_type: self.filter_type,
            frequency_hz: self.frequency_hz.clamp(FREQUENCY_RANGE.0, FREQUENCY_RANGE.1),
            gain_db: self.gain_db.clamp(-GAIN_RANGE_DB, GAIN_RANGE_DB),
            q: self.q.clamp(Q_RANGE.0, Q_RANGE.1),
            slope_db_per_oct: f64::from(slope_to_order(self.slope_db_per_oct) as u32) * 6.0,
            shelf_slope: self.shelf_slope.clamp(SHELF_SLOPE_RANGE.0, SHELF_SLOPE_RANGE.1),
            enabled: self.enabled,
            channel_mode: self.channel_mode,
            dynamic,
        })
    }
}

fn check_finite(field: &'static str, value: f64) -> Result<(), BandError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(BandError::NonFinite(field))
    }
}

/// Why a band configuration was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandError {
    /// The named field is NaN or infinite.
    NonFinite(&'static str),
    /// The named field must be greater than zero.
    NotPositive(&'static str),
    /// Dynamic mode requested on a shape that has no gain.
    DynamicWithoutGain(FilterType),
}

impl core::fmt::Display for BandError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NonFinite(field) => write!(f, "{field} must be finite"),
            Self::NotPositive(field) => write!(f, "{field} must be greater than zero"),
            Self::DynamicWithoutGain(t) => {
                write!(f, "dynamic mode needs a filter with gain, not {}", t.name())
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BandError {}

/// Cached trigonometry for rebuilding a gain-bearing shape.
#[derive(Debug, Clone, Copy, PartialEq)]
enum GainShape {
    Bell(BellPrototype),
    MatchedBell(MatchedBellPrototype),
    Shelf(ShelfPrototype),
    Tilt(TiltPrototype),
    FlatTilt([TiltPrototype; FLAT_TILT_SECTIONS]),
}

impl GainShape {
    fn build(&self, gain_db: f64) -> CascadeDesign {
        match self {
            Self::Bell(p) => CascadeDesign::single(p.coefficients(gain_db)),
            Self::MatchedBell(p) => CascadeDesign::single(p.coefficients(gain_db)),
            Self::Shelf(p) => CascadeDesign::single(p.coefficients(gain_db)),
            Self::Tilt(p) => CascadeDesign::single(p.coefficients(gain_db)),
            Self::FlatTilt(sections) => {
                let share = gain_db / FLAT_TILT_SECTIONS as f64;
                let mut design = CascadeDesign::empty();
                for p in sections {
                    design.push(p.coefficients(share));
                }
                design
            }
        }
    }

    /// Writes coefficients for `gain_db` straight into running cascades.
    #[inline]
    fn write(&self, gain_db: f64, cascades: &mut [Cascade; 2]) {
        match self {
            Self::Bell(p) => set_all(cascades, 0, p.coefficients(gain_db)),
            Self::MatchedBell(p) => set_all(cascades, 0, p.coefficients(gain_db)),
            Self::Shelf(p) => set_all(cascades, 0, p.coefficients(gain_db)),
            Self::Tilt(p) => set_all(cascades, 0, p.coefficients(gain_db)),
            Self::FlatTilt(sections) => {
                let share = gain_db / FLAT_TILT_SECTIONS as f64;
                for (i, p) in sections.iter().enumerate() {
                    set_all(cascades, i, p.coefficients(share));
                }
            }
        }
    }
}

#[inline]
fn set_all(cascades: &mut [Cascade; 2], index: usize, coeffs: Coefficients) {
    for cascade in cascades {
        cascade.set_stage(index, coeffs);
    }
}

/// Precomputed detector for a dynamic band.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DetectorDesign {
    params: DynamicParams,
    bandpass: Coefficients,
    attack_coeff: f64,
    release_coeff: f64,
}

/// Butterworth cut whose highest-Q section is scaled by `q / 0.7071`.
fn cut_design(kind: CutKind, freq: f64, slope_db: f64, q: f64, sample_rate: f64) -> CascadeDesign {
    let order = slope_to_order(slope_db);
    let mut qs = [0.0; MAX_CASCADE_STAGES];
    let pairs = butterworth_qs(order, &mut qs);
    if pairs > 0 {
        qs[pairs - 1] *= q / FRAC_1_SQRT_2;
    }

    let mut design = CascadeDesign::empty();
    if order == 1 {
        design.push(single_pole_cut_coefficients(kind, freq, sample_rate));
    } else if order % 2 == 1 {
        design.push(match kind {
            CutKind::LowCut => first_order_highpass_coefficients(freq, sample_rate),
            CutKind::HighCut => first_order_lowpass_coefficients(freq, sample_rate),
        });
    }
    for &stage_q in &qs[..pairs] {
        design.push(match kind {
            CutKind::LowCut => highpass_coefficients(freq, stage_q, sample_rate),
            CutKind::HighCut => lowpass_coefficients(freq, stage_q, sample_rate),
        });
    }
    design
}

/// Coefficients for one band, computed on the control plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandDesign {
    params: BandParams,
    cascade: CascadeDesign,
    shape: Option<GainShape>,
    detector: Option<DetectorDesign>,
}

impl BandDesign {
    /// Designs a band at `sample_rate`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use strata_effects::eq::{BandDesign, BandParams, PhaseMode};
    ///
    /// let design = BandDesign::new(&BandParams::bell(1000.0, 6.0, 1.0), 48000.0, PhaseMode::Minimum)
    ///     .expect("valid band");
    /// assert!((design.magnitude_db(1000.0, 48000.0) - 6.0).abs() < 1e-6);
    /// ```
    pub fn new(params: &BandParams, sample_rate: f64, phase: PhaseMode) -> Result<Self, BandError> {
        let p = params.validated()?;
        let fs = sample_rate;
        let f = p.frequency_hz;
        let q = p.q;
        let shape = match (p.filter_type, phase) {
            (FilterType::Bell, PhaseMode::Minimum) => {
                Some(GainShape::Bell(BellPrototype::new(f, q, fs)))
            }
            (FilterType::Bell, PhaseMode::Analog) => {
                Some(GainShape::MatchedBell(MatchedBellPrototype::new(f, q, fs)))
            }
            (FilterType::LowShelf, _) => Some(GainShape::Shelf(ShelfPrototype::new(
                ShelfKind::Low,
                f,
                p.shelf_slope,
                fs,
            ))),
            (FilterType::HighShelf, _) => Some(GainShape::Shelf(ShelfPrototype::new(
                ShelfKind::High,
                f,
                p.shelf_slope,
                fs,
            ))),
            (FilterType::Tilt, _) => Some(GainShape::Tilt(TiltPrototype::new(f, fs))),
            (FilterType::FlatTiltShelf, _) => Some(GainShape::FlatTilt(
                FLAT_TILT_OFFSETS.map(|octaves| TiltPrototype::new(f * libm::exp2(octaves), fs)),
            )),
            _ => None,
        };

        let cascade = match (p.filter_type, &shape) {
            (_, Some(shape)) => shape.build(p.gain_db),
            (FilterType::LowCut, None) => cut_design(CutKind::LowCut, f, p.slope_db_per_oct, p.q, fs),
            (FilterType::HighCut, None) => {
                cut_design(CutKind::HighCut, f, p.slope_db_per_oct, p.q, fs)
            }
            (FilterType::Notch, None) => CascadeDesign::single(notch_coefficients(f, q, fs)),
            (FilterType::BandPass, None) => CascadeDesign::single(bandpass_coefficients(f, q, fs)),
            (FilterType::AllPass, None) => CascadeDesign::single(allpass_coefficients(f, q, fs)),
            (_, None) => CascadeDesign::empty(),
        };

        let detector = p.dynamic.map(|d| {
            let detector_q = if p.filter_type == FilterType::Bell {
                p.q
            } else {
                FRAC_1_SQRT_2
            };
            DetectorDesign {
                params: d,
                bandpass: bandpass_coefficients(f, detector_q, fs),
                attack_coeff: time_constant_coeff(d.attack_ms, fs),
                release_coeff: time_constant_coeff(d.release_ms, fs),
            }
        });

        Ok(Self {
            params: p,
            cascade,
            shape,
            detector,
        })
    }

    /// The validated parameters this design was built from.
    pub fn params(&self) -> &BandParams {
        &self.params
    }

    /// The static (non-dynamic) coefficient cascade.
    pub fn cascade(&self) -> &CascadeDesign {
        &self.cascade
    }

    /// True when the band has dynamic gain.
    pub fn is_dynamic(&self) -> bool {
        self.detector.is_some()
    }

    /// Static magnitude response at `freq` in dB. Disabled bands are flat.
    pub fn magnitude_db(&self, freq: f64, sample_rate: f64) -> f64 {
        if self.params.enabled {
            self.cascade.magnitude_db(freq, sample_rate)
        } else {
            0.0
        }
    }
}

/// Phase of the dynamic gain state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DynamicStage {
    /// Detector below threshold, band at its static gain.
    #[default]
    Idle,
    /// Detector level rising.
    Attack,
    /// Detector level falling while gain is still displaced.
    Release,
}

/// Real-time state of one band: two cascades plus the dynamic detector.
///
/// Never allocates. Both cascades are always present; which of them runs
/// depends on the [`ChannelMode`].
#[derive(Debug, Clone)]
pub struct EqBand {
    design: Option<BandDesign>,
    cascades: [Cascade; 2],
    detectors: [Biquad; 2],
    envelope: f64,
    stage: DynamicStage,
    applied_gain_db: f64,
    countdown: usize,
}

impl Default for EqBand {
    fn default() -> Self {
        Self::new()
    }
}

impl EqBand {
    /// Creates an empty band (passthrough until a design is loaded).
    pub fn new() -> Self {
        Self {
            design: None,
            cascades: [Cascade::new(), Cascade::new()],
            detectors: [Biquad::new(), Biquad::new()],
            envelope: 0.0,
            stage: DynamicStage::Idle,
            applied_gain_db: 0.0,
            countdown: DYNAMIC_UPDATE_INTERVAL,
        }
    }

    /// Creates a band running `design`.
    pub fn with_design(design: &BandDesign) -> Self {
        let mut band = Self::new();
        band.set_design(design);
        band
    }

    /// Loads a new design.
    ///
    /// Filter state survives parameter changes. A change of filter type or
    /// channel routing is a discontinuity and clears the state.
    pub fn set_design(&mut self, design: &BandDesign) {
        let discontinuity = self.design.is_some_and(|old| {
            old.params.filter_type != design.params.filter_type
                || old.params.channel_mode != design.params.channel_mode
        });
        if discontinuity {
            self.reset();
        }

        for cascade in &mut self.cascades {
            cascade.set_design(&design.cascade);
        }
        self.applied_gain_db = design.params.gain_db;

        match &design.detector {
            Some(det) => {
                for detector in &mut self.detectors {
                    detector.set_coefficients(det.bandpass);
                }
                // Re-apply the displaced gain on the next sample.
                self.countdown = 1;
            }
            None => {
                self.envelope = 0.0;
                self.stage = DynamicStage::Idle;
            }
        }
        self.design = Some(*design);
    }

    /// Current dynamic stage.
    pub fn dynamic_stage(&self) -> DynamicStage {
        self.stage
    }

    /// Gain currently applied by the band, including dynamic movement.
    pub fn applied_gain_db(&self) -> f64 {
        self.applied_gain_db
    }

    /// Clears filter and detector state.
    pub fn reset(&mut self) {
        for cascade in &mut self.cascades {
            cascade.reset();
        }
        for detector in &mut self.detectors {
            detector.reset();
        }
        self.envelope = 0.0;
        self.stage = DynamicStage::Idle;
        self.countdown = DYNAMIC_UPDATE_INTERVAL;
        if let Some(design) = &self.design {
            if design.detector.is_some() {
                if let Some(shape) = &design.shape {
                    shape.write(design.params.gain_db, &mut self.cascades);
                }
            }
            self.applied_gain_db = design.params.gain_db;
        }
    }

    /// Processes one stereo frame.
    #[inline]
    pub fn process(&mut self, left: f64, right: f64) -> (f64, f64) {
        let Some(design) = &self.design else {
            return (left, right);
        };
        if !design.params.enabled {
            return (left, right);
        }
        let mode = design.params.channel_mode;

        if design.detector.is_some() {
            // Stereo bands key from the louder channel after the band-pass.
            let [d0, d1] = &mut self.detectors;
            let level = match mode {
                ChannelMode::Stereo => d0.process(left).abs().max(d1.process(right).abs()),
                ChannelMode::Mid => d0.process((left + right) * 0.5).abs(),
                ChannelMode::Left => d0.process(left).abs(),
                ChannelMode::Right => d0.process(right).abs(),
                ChannelMode::Side => d0.process((left - right) * 0.5).abs(),
            };
            self.track_dynamics(level);
        }

        let [c0, c1] = &mut self.cascades;
        match mode {
            ChannelMode::Stereo => (c0.process(left), c1.process(right)),
            ChannelMode::Left => (c0.process(left), right),
            ChannelMode::Right => (left, c1.process(right)),
            ChannelMode::Mid => {
                let (mid, side) = ms_encode(left, right);
                ms_decode(c0.process(mid), side)
            }
            ChannelMode::Side => {
                let (mid, side) = ms_encode(left, right);
                ms_decode(mid, c0.process(side))
            }
        }
    }

    #[inline]
    fn track_dynamics(&mut self, level: f64) {
        let Some(design) = &self.design else {
            return;
        };
        let Some(det) = &design.detector else {
            return;
        };

        let rising = level > self.envelope;
        let coeff = if rising {
            det.attack_coeff
        } else {
            det.release_coeff
        };
        self.envelope = strata_core::flush_denormal(level + coeff * (self.envelope - level));

        self.countdown -= 1;
        if self.countdown > 0 {
            return;
        }
        self.countdown = DYNAMIC_UPDATE_INTERVAL;

        let d = &det.params;
        let reduction = gain_reduction_db(linear_to_db(self.envelope), d.threshold_db, d.ratio, DYNAMIC_KNEE_DB);
        let movement = reduction.min(d.range_db.abs()) * d.range_db.signum();
        let target = design.params.gain_db + movement;

        self.stage = if reduction <= 0.0 {
            DynamicStage::Idle
        } else if rising {
            DynamicStage::Attack
        } else {
            DynamicStage::Release
        };

        if (target - self.applied_gain_db).abs() > GAIN_EPSILON_DB {
            if let Some(shape) = &design.shape {
                shape.write(target, &mut self.cascades);
            }
            self.applied_gain_db = target;
        }
    }
}
