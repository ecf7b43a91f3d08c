//! The EQ bank: an ordered list of up to [`MAX_BANDS`] bands.
//!
//! [`EqBankParams`] owns band parameters and their order on the control
//! plane. Each band gets a stable [`BandId`] and a fixed slot in the
//! real-time [`EqBank`], so reordering or editing bands never disturbs the
//! filter state of the others.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use strata_core::{Effect, SmoothedParam, db_to_linear, linear_to_db, sanitize};

use super::PhaseMode;
use super::band::{BandDesign, BandError, BandParams, EqBand};

/// Maximum number of live bands in one bank.
pub const MAX_BANDS: usize = 64;

/// Points used to evaluate the combined response for auto-gain.
pub const AUTO_GAIN_POINTS: usize = 64;

/// Limit on auto-gain compensation in either direction, dB.
pub const AUTO_GAIN_LIMIT_DB: f64 = 24.0;

/// Output gain range, dB.
pub const OUTPUT_GAIN_RANGE_DB: f64 = 24.0;

/// Smoothing time of the output gain.
const OUTPUT_SMOOTHING_MS: f64 = 10.0;

/// Stable identifier of a band, unique for the lifetime of an [`EqBankParams`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BandId(u32);

impl BandId {
    /// Raw identifier value.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for BandId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "band#{}", self.0)
    }
}

/// Configuration errors from the EQ control API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqError {
    /// The bank already holds [`MAX_BANDS`] bands.
    TooManyBands {
        /// The limit that was hit.
        max: usize,
    },
    /// No band with this id exists.
    UnknownBand(BandId),
    /// The band parameters were rejected.
    InvalidBand {
        /// Band being configured, `None` when adding.
        id: Option<BandId>,
        /// Why it was rejected.
        source: BandError,
    },
    /// A bank-level parameter was NaN or infinite.
    InvalidParameter(&'static str),
}

impl core::fmt::Display for EqError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TooManyBands { max } => write!(f, "eq bank is full ({max} bands)"),
            Self::UnknownBand(id) => write!(f, "no such band: {id}"),
            Self::InvalidBand { id: Some(id), source } => write!(f, "{id}: {source}"),
            Self::InvalidBand { id: None, source } => write!(f, "new band: {source}"),
            Self::InvalidParameter(name) => write!(f, "{name} must be finite"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EqError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidBand { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct BandEntry {
    id: BandId,
    slot: u8,
    params: BandParams,
}

/// Control-plane state of an EQ bank.
///
/// Bands run in the order they are listed. Every mutation validates its input
/// and leaves the bank untouched on error.
///
/// # Example
///
/// ```rust
/// use strata_effects::eq::{BandParams, EqBankParams};
///
/// let mut eq = EqBankParams::new();
/// let cut = eq.add_band(BandParams::low_cut(80.0, 24.0)).unwrap();
/// let presence = eq.add_band(BandParams::bell(3000.0, 2.5, 1.2)).unwrap();
/// eq.move_band(presence, 0).unwrap();
/// assert_eq!(eq.bands().next().map(|(id, _)| id), Some(presence));
/// eq.remove_band(cut).unwrap();
/// assert_eq!(eq.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "EqBankRecord", into = "EqBankRecord")
)]
pub struct EqBankParams {
    entries: Vec<BandEntry>,
    next_id: u32,
    phase_mode: PhaseMode,
    auto_gain: bool,
    output_gain_db: f64,
}

impl Default for EqBankParams {
    fn default() -> Self {
        Self::new()
    }
}

impl EqBankParams {
    /// Creates an empty bank: no bands, 0 dB output, auto-gain off.
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(MAX_BANDS),
            next_id: 0,
            phase_mode: PhaseMode::Minimum,
            auto_gain: false,
            output_gain_db: 0.0,
        }
    }

    /// Appends a band and returns its id.
    pub fn add_band(&mut self, params: BandParams) -> Result<BandId, EqError> {
        if self.entries.len() >= MAX_BANDS {
            return Err(EqError::TooManyBands { max: MAX_BANDS });
        }
        let params = params
            .validated()
            .map_err(|source| EqError::InvalidBand { id: None, source })?;

        let slot = self.free_slot();
        let id = BandId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.push(BandEntry { id, slot, params });

        #[cfg(feature = "tracing")]
        tracing::debug!(band = id.0, slot, filter = params.filter_type.name(), "eq band added");

        Ok(id)
    }

    /// Removes a band and returns its last parameters.
    pub fn remove_band(&mut self, id: BandId) -> Result<BandParams, EqError> {
        let index = self.index_of(id)?;
        let entry = self.entries.remove(index);

        #[cfg(feature = "tracing")]
        tracing::debug!(band = id.0, "eq band removed");

        Ok(entry.params)
    }

    /// Moves a band to `position` in the processing order.
    ///
    /// Positions past the end move the band last.
    pub fn move_band(&mut self, id: BandId, position: usize) -> Result<(), EqError> {
        let from = self.index_of(id)?;
        let entry = self.entries.remove(from);
        let to = position.min(self.entries.len());
        self.entries.insert(to, entry);
        Ok(())
    }

    /// Replaces the parameters of an existing band.
    pub fn set_band(&mut self, id: BandId, params: BandParams) -> Result<(), EqError> {
        let index = self.index_of(id)?;
        let params = params.validated().map_err(|source| EqError::InvalidBand {
            id: Some(id),
            source,
        })?;
        self.entries[index].params = params;
        Ok(())
    }

    /// Parameters of one band.
    pub fn band(&self, id: BandId) -> Result<&BandParams, EqError> {
        let index = self.index_of(id)?;
        Ok(&self.entries[index].params)
    }

    /// Bands in processing order.
    pub fn bands(&self) -> impl Iterator<Item = (BandId, &BandParams)> + '_ {
        self.entries.iter().map(|e| (e.id, &e.params))
    }

    /// Sets the output gain in dB, clamped to ±24.
    pub fn set_output_gain_db(&mut self, gain_db: f64) -> Result<(), EqError> {
        if !gain_db.is_finite() {
            return Err(EqError::InvalidParameter("output_gain_db"));
        }
        self.output_gain_db = gain_db.clamp(-OUTPUT_GAIN_RANGE_DB, OUTPUT_GAIN_RANGE_DB);
        Ok(())
    }

    /// Output gain in dB.
    pub fn output_gain_db(&self) -> f64 {
        self.output_gain_db
    }

    /// Enables loudness-matched compensation.
    pub fn set_auto_gain(&mut self, enabled: bool) -> Result<(), EqError> {
        self.auto_gain = enabled;
        Ok(())
    }

    /// Whether auto-gain is on.
    pub fn auto_gain(&self) -> bool {
        self.auto_gain
    }

    /// Selects how band coefficients are derived.
    pub fn set_phase_mode(&mut self, mode: PhaseMode) -> Result<(), EqError> {
        self.phase_mode = mode;
        Ok(())
    }

    /// Current phase mode.
    pub fn phase_mode(&self) -> PhaseMode {
        self.phase_mode
    }

    /// Number of bands.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the bank has no bands.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every band.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Computes coefficients for every band at `sample_rate`.
    pub fn design(&self, sample_rate: f64) -> Result<EqBankDesign, EqError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(EqError::InvalidParameter("sample_rate"));
        }

        let mut bands = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let design = BandDesign::new(&entry.params, sample_rate, self.phase_mode).map_err(
                |source| EqError::InvalidBand {
                    id: Some(entry.id),
                    source,
                },
            )?;
            bands.push(SlotDesign {
                id: entry.id,
                slot: entry.slot,
                design,
            });
        }

        let mut design = EqBankDesign {
            bands,
            sample_rate,
            output_gain_db: self.output_gain_db,
            auto_gain_db: 0.0,
        };
        if self.auto_gain {
            design.auto_gain_db = auto_gain_compensation_db(&design);
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(
            bands = design.bands.len(),
            sample_rate,
            auto_gain_db = design.auto_gain_db,
            "eq bank designed"
        );

        Ok(design)
    }

    fn index_of(&self, id: BandId) -> Result<usize, EqError> {
        self.entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(EqError::UnknownBand(id))
    }

    fn free_slot(&self) -> u8 {
        let mut used = [false; MAX_BANDS];
        for entry in &self.entries {
            used[entry.slot as usize] = true;
        }
        used.iter().position(|&u| !u).unwrap_or(0) as u8
    }
}

/// Serialized form of [`EqBankParams`]: bands in order, without ids.
#[cfg(feature = "serde")]
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
struct EqBankRecord {
    bands: Vec<BandParams>,
    phase_mode: PhaseMode,
    auto_gain: bool,
    output_gain_db: f64,
}

#[cfg(feature = "serde")]
impl Default for EqBankRecord {
    fn default() -> Self {
        Self {
            bands: Vec::new(),
            phase_mode: PhaseMode::Minimum,
            auto_gain: false,
            output_gain_db: 0.0,
        }
    }
}

#[cfg(feature = "serde")]
impl From<EqBankParams> for EqBankRecord {
    fn from(params: EqBankParams) -> Self {
        Self {
            bands: params.entries.iter().map(|e| e.params).collect(),
            phase_mode: params.phase_mode,
            auto_gain: params.auto_gain,
            output_gain_db: params.output_gain_db,
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<EqBankRecord> for EqBankParams {
    type Error = EqError;

    fn try_from(record: EqBankRecord) -> Result<Self, Self::Error> {
        let mut params = Self::new();
        for band in record.bands {
            params.add_band(band)?;
        }
        params.set_phase_mode(record.phase_mode)?;
        params.set_auto_gain(record.auto_gain)?;
        params.set_output_gain_db(record.output_gain_db)?;
        Ok(params)
    }
}

/// One band's design bound to its real-time slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotDesign {
    /// Band identity.
    pub id: BandId,
    /// Real-time slot index.
    pub slot: u8,
    /// Coefficients.
    pub design: BandDesign,
}

/// Coefficients for a whole bank, computed on the control plane.
#[derive(Debug, Clone, PartialEq)]
pub struct EqBankDesign {
    bands: Vec<SlotDesign>,
    sample_rate: f64,
    output_gain_db: f64,
    auto_gain_db: f64,
}

impl EqBankDesign {
    /// Band designs in processing order.
    pub fn bands(&self) -> &[SlotDesign] {
        &self.bands
    }

    /// Sample rate the design was computed for.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Auto-gain compensation in dB (0 when auto-gain is off).
    pub fn auto_gain_db(&self) -> f64 {
        self.auto_gain_db
    }

    /// Total output gain: user gain plus auto-gain, dB.
    pub fn total_output_gain_db(&self) -> f64 {
        self.output_gain_db + self.auto_gain_db
    }

    /// Static band-chain response at `freq`, excluding output gain.
    pub fn band_response_db(&self, freq: f64) -> f64 {
        self.bands
            .iter()
            .map(|b| b.design.magnitude_db(freq, self.sample_rate))
            .sum()
    }

    /// Static response of the whole bank at `freq`, dB.
    pub fn magnitude_db(&self, freq: f64) -> f64 {
        self.band_response_db(freq) + self.total_output_gain_db()
    }
}

/// Inverse of the band chain's average power over a log-spaced grid.
///
/// Log spacing weights every octave equally, which matches a pink spectrum.
fn auto_gain_compensation_db(design: &EqBankDesign) -> f64 {
    let low: f64 = 20.0;
    let high = 20000.0f64.min(design.sample_rate * 0.45);
    if design.bands.is_empty() || high <= low {
        return 0.0;
    }

    let ratio = high / low;
    let mut power = 0.0;
    for i in 0..AUTO_GAIN_POINTS {
        let t = i as f64 / (AUTO_GAIN_POINTS - 1) as f64;
        let freq = low * libm::pow(ratio, t);
        let gain = db_to_linear(design.band_response_db(freq));
        power += gain * gain;
    }
    let mean = power / AUTO_GAIN_POINTS as f64;
    (-linear_to_db(libm::sqrt(mean))).clamp(-AUTO_GAIN_LIMIT_DB, AUTO_GAIN_LIMIT_DB)
}

/// Real-time EQ bank.
///
/// Holds [`MAX_BANDS`] preallocated band slots. [`EqBank::apply`] swaps in a
/// new [`EqBankDesign`] without allocating: slots keep their state when the
/// same band stays in them, and start from silence when a different band
/// takes over.
///
/// # Example
///
/// ```rust
/// use strata_core::Effect;
/// use strata_effects::eq::{BandParams, EqBank, EqBankParams};
///
/// let mut params = EqBankParams::new();
/// params.add_band(BandParams::bell(1000.0, 6.0, 1.0)).unwrap();
///
/// let mut eq = EqBank::new(48000.0);
/// eq.apply(&params.design(48000.0).unwrap());
/// let (l, r) = eq.process_stereo(0.1, 0.1);
/// assert!(l.is_finite() && r.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct EqBank {
    bands: Vec<EqBand>,
    ids: [Option<BandId>; MAX_BANDS],
    order: [u8; MAX_BANDS],
    count: usize,
    output_gain: SmoothedParam,
    sample_rate: f64,
}

impl EqBank {
    /// Creates a flat bank.
    pub fn new(sample_rate: f64) -> Self {
        let mut bands = Vec::with_capacity(MAX_BANDS);
        bands.resize_with(MAX_BANDS, EqBand::new);
        Self {
            bands,
            ids: [None; MAX_BANDS],
            order: [0; MAX_BANDS],
            count: 0,
            output_gain: SmoothedParam::with_config(1.0, sample_rate, OUTPUT_SMOOTHING_MS),
            sample_rate,
        }
    }

    /// Loads a design. Real-time safe.
    pub fn apply(&mut self, design: &EqBankDesign) {
        debug_assert!(
            (design.sample_rate - self.sample_rate).abs() < 1e-6,
            "design computed for another sample rate"
        );
        let mut live = [false; MAX_BANDS];
        let mut count = 0;

        for sd in design.bands.iter().take(MAX_BANDS) {
            let slot = sd.slot as usize;
            if slot >= MAX_BANDS {
                continue;
            }
            if self.ids[slot] == Some(sd.id) {
                self.bands[slot].set_design(&sd.design);
            } else {
                self.bands[slot] = EqBand::with_design(&sd.design);
                self.ids[slot] = Some(sd.id);
            }
            live[slot] = true;
            self.order[count] = sd.slot;
            count += 1;
        }
        self.count = count;

        for (slot, is_live) in live.iter().enumerate() {
            if !is_live && self.ids[slot].is_some() {
                self.ids[slot] = None;
                self.bands[slot] = EqBand::new();
            }
        }

        self.output_gain
            .set_target(db_to_linear(design.total_output_gain_db()));
    }

    /// Number of active bands.
    pub fn active_bands(&self) -> usize {
        self.count
    }

    /// Real-time state of the band in `slot`.
    pub fn band_state(&self, slot: u8) -> Option<&EqBand> {
        let slot = slot as usize;
        (*self.ids.get(slot)?).map(|_| &self.bands[slot])
    }

    /// Processes one frame in `f64`.
    #[inline]
    pub fn process_frame(&mut self, left: f64, right: f64) -> (f64, f64) {
        let (mut l, mut r) = (left, right);
        for &slot in &self.order[..self.count] {
            (l, r) = self.bands[slot as usize].process(l, r);
        }
        let gain = self.output_gain.advance();
        (l * gain, r * gain)
    }
}

impl Effect for EqBank {
    #[inline]
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let (l, r) = self.process_frame(f64::from(sanitize(left)), f64::from(sanitize(right)));
        (l as f32, r as f32)
    }

    /// Clears every band. A design for the new rate must be applied next.
    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.output_gain.set_sample_rate(sample_rate);
        self.output_gain.set_immediate(1.0);
        for band in &mut self.bands {
            *band = EqBand::new();
        }
        self.ids = [None; MAX_BANDS];
        self.count = 0;
    }

    fn reset(&mut self) {
        for &slot in &self.order[..self.count] {
            self.bands[slot as usize].reset();
        }
        self.output_gain.snap_to_target();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eq::band::FilterType;

    const FS: f64 = 48000.0;

    fn params_with(bands: &[BandParams]) -> EqBankParams {
        let mut p = EqBankParams::new();
        for b in bands {
            p.add_band(*b).expect("valid band");
        }
        p
    }

    #[test]
    fn test_band_limit() {
        let mut p = EqBankParams::new();
        for i in 0..MAX_BANDS {
            p.add_band(BandParams::bell(100.0 + i as f64 * 10.0, 1.0, 1.0))
                .expect("room for band");
        }
        assert_eq!(
            p.add_band(BandParams::default()),
            Err(EqError::TooManyBands { max: MAX_BANDS })
        );
        assert_eq!(p.len(), MAX_BANDS);
    }

    #[test]
    fn test_unknown_band() {
        let mut p = params_with(&[BandParams::default()]);
        let ghost = BandId(99);
        assert_eq!(p.remove_band(ghost), Err(EqError::UnknownBand(ghost)));
        assert_eq!(p.move_band(ghost, 0), Err(EqError::UnknownBand(ghost)));
        assert_eq!(p.set_band(ghost, BandParams::default()), Err(EqError::UnknownBand(ghost)));
        assert!(p.band(ghost).is_err());
    }

    #[test]
    fn test_invalid_band_leaves_bank_untouched() {
        let mut p = params_with(&[BandParams::bell(500.0, 3.0, 1.0)]);
        let (id, before) = p.bands().next().map(|(id, b)| (id, *b)).expect("one band");
        let bad = BandParams::notch(500.0, 4.0).with_dynamic(Default::default());
        let err = p.set_band(id, bad).expect_err("notch cannot be dynamic");
        assert!(matches!(err, EqError::InvalidBand { id: Some(_), .. }));
        assert_eq!(p.band(id), Ok(&before));
    }

    #[test]
    fn test_ids_and_slots_are_reused_correctly() {
        let mut p = EqBankParams::new();
        let a = p.add_band(BandParams::default()).expect("add");
        let b = p.add_band(BandParams::default()).expect("add");
        p.remove_band(a).expect("remove");
        let c = p.add_band(BandParams::default()).expect("add");
        assert_ne!(c, a, "ids are never reused");
        // c takes a's freed slot
        assert_eq!(p.entries[1].slot, 0);
        assert_eq!(p.entries[0].id, b);
    }

    #[test]
    fn test_move_band_order() {
        let mut p = EqBankParams::new();
        let ids: Vec<_> = (0..4)
            .map(|i| p.add_band(BandParams::bell(100.0 * (i + 1) as f64, 1.0, 1.0)).expect("add"))
            .collect();
        p.move_band(ids[3], 0).expect("move");
        p.move_band(ids[0], 100).expect("move");
        let order: Vec<_> = p.bands().map(|(id, _)| id).collect();
        assert_eq!(order, vec![ids[3], ids[1], ids[2], ids[0]]);
    }

    #[test]
    fn test_output_gain_rejects_nan() {
        let mut p = EqBankParams::new();
        assert_eq!(
            p.set_output_gain_db(f64::NAN),
            Err(EqError::InvalidParameter("output_gain_db"))
        );
        p.set_output_gain_db(60.0).expect("finite gain clamps");
        assert_eq!(p.output_gain_db(), OUTPUT_GAIN_RANGE_DB);
    }

    #[test]
    fn test_auto_gain_compensates_boost() {
        let mut p = params_with(&[BandParams {
            filter_type: FilterType::HighShelf,
            frequency_hz: 1000.0,
            gain_db: 12.0,
            ..BandParams::default()
        }]);
        let plain = p.design(FS).expect("design");
        assert_eq!(plain.auto_gain_db(), 0.0);

        p.set_auto_gain(true).expect("toggle");
        let compensated = p.design(FS).expect("design");
        let g = compensated.auto_gain_db();
        assert!(g < -3.0 && g > -12.0, "compensation {g}");
    }

    #[test]
    fn test_flat_bank_is_identity() {
        let mut eq = EqBank::new(FS);
        eq.apply(&EqBankParams::new().design(FS).expect("design"));
        for i in 0..256 {
            let x = (i as f32 * 0.1).sin() * 0.5;
            let (l, r) = eq.process_stereo(x, -x);
            assert!((l - x).abs() < 1e-7 && (r + x).abs() < 1e-7);
        }
    }

    #[test]
    fn test_reorder_keeps_state() {
        let mut p = EqBankParams::new();
        let a = p.add_band(BandParams::bell(200.0, 6.0, 2.0)).expect("add");
        let _b = p.add_band(BandParams::bell(2000.0, -6.0, 2.0)).expect("add");
        let mut eq = EqBank::new(FS);
        eq.apply(&p.design(FS).expect("design"));
        for _ in 0..64 {
            eq.process_frame(0.5, 0.5);
        }

        p.move_band(a, 1).expect("move");
        eq.apply(&p.design(FS).expect("design"));
        assert_eq!(eq.active_bands(), 2);
        assert_eq!(eq.order[..2], [1, 0]);
        // Filter memory survives: silence in, ringing out.
        let (l, _) = eq.process_frame(0.0, 0.0);
        assert!(l.abs() > 1e-6, "state was cleared: {l}");
    }

    #[test]
    fn test_replaced_band_starts_silent() {
        let mut p = EqBankParams::new();
        let a = p.add_band(BandParams::bell(200.0, 6.0, 2.0)).expect("add");
        let mut eq = EqBank::new(FS);
        eq.apply(&p.design(FS).expect("design"));
        for _ in 0..64 {
            eq.process_frame(0.5, 0.5);
        }

        p.remove_band(a).expect("remove");
        let c = p.add_band(BandParams::bell(200.0, 6.0, 2.0)).expect("add");
        assert_ne!(a, c);
        eq.apply(&p.design(FS).expect("design"));
        assert_eq!(eq.process_frame(0.0, 0.0), (0.0, 0.0));
    }

    #[test]
    fn test_removed_slot_is_cleared() {
        let mut p = EqBankParams::new();
        let a = p.add_band(BandParams::bell(200.0, 6.0, 2.0)).expect("add");
        let mut eq = EqBank::new(FS);
        eq.apply(&p.design(FS).expect("design"));
        p.remove_band(a).expect("remove");
        eq.apply(&p.design(FS).expect("design"));
        assert!(eq.band_state(0).is_none());
        assert_eq!(eq.active_bands(), 0);
    }

    #[test]
    fn test_design_rejects_bad_rate() {
        assert_eq!(
            EqBankParams::new().design(0.0),
            Err(EqError::InvalidParameter("sample_rate"))
        );
    }

    #[test]
    fn test_output_gain_applied() {
        let mut p = EqBankParams::new();
        p.set_output_gain_db(-6.0).expect("gain");
        let mut eq = EqBank::new(FS);
        eq.apply(&p.design(FS).expect("design"));
        let mut out = 0.0;
        for _ in 0..4800 {
            out = eq.process_frame(1.0, 1.0).0;
        }
        assert!((out - db_to_linear(-6.0)).abs() < 1e-4, "{out}");
    }
}
