//! Flat named-field parameter records.
//!
//! Hosts and automation systems want every parameter as a `name → number`
//! pair rather than a nested document. [`flatten`] walks a [`StripParams`]
//! into a [`FlatRecord`]; [`unflatten`] rebuilds and validates one.
//!
//! # Keys
//!
//! | Key | Value |
//! |-----|-------|
//! | `eq.enabled` | 0 or 1 |
//! | `eq.phase_mode` | 0 minimum, 1 analog |
//! | `eq.auto_gain` | 0 or 1 |
//! | `eq.output_gain_db` | dB |
//! | `eq.<n>.type` | index into [`FilterType::ALL`] |
//! | `eq.<n>.frequency_hz`, `gain_db`, `q`, `slope_db_per_oct`, `shelf_slope` | band fields |
//! | `eq.<n>.enabled` | 0 or 1 |
//! | `eq.<n>.channel_mode` | index into [`ChannelMode::ALL`] |
//! | `eq.<n>.dynamic.threshold_db`, `ratio`, `attack_ms`, `release_ms`, `range_db` | present only for dynamic bands |
//! | `compressor.enabled`, `compressor.<field>` | compressor fields |
//! | `compressor.circuit` | index into [`CircuitModel::ALL`] |
//! | `compressor.detector` | 0 peak, 1 RMS, 2 circuit |
//! | `compressor.sidechain_hp_hz`, `sidechain_lp_hz` | present only when set |
//! | `reverb.enabled`, `reverb.<field>` | reverb fields |
//!
//! Bands are numbered in processing order from 0.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strata_effects::compressor::{CircuitModel, Detector};
use strata_effects::eq::{BandParams, ChannelMode, DynamicParams, FilterType, PhaseMode};
use strata_effects::{CompressorParams, ReverbParams, StripParams};

use crate::error::ConfigError;
use crate::validation::{COMPRESSOR_RANGES, REVERB_RANGES, compressor_values, reverb_values};

const DETECTORS: [Detector; 3] = [Detector::Peak, Detector::Rms, Detector::Circuit];
const PHASE_MODES: [PhaseMode; 2] = [PhaseMode::Minimum, PhaseMode::Analog];
const DYNAMIC_FIELDS: [&str; 5] = ["threshold_db", "ratio", "attack_ms", "release_ms", "range_db"];

/// Ordered `key → value` view of a strip.
///
/// Keys keep insertion order, which for [`flatten`] output is processing
/// order. Serializes as a plain map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct FlatRecord {
    entries: Vec<(String, f64)>,
}

impl From<BTreeMap<String, f64>> for FlatRecord {
    fn from(map: BTreeMap<String, f64>) -> Self {
        Self {
            entries: map.into_iter().collect(),
        }
    }
}

impl From<FlatRecord> for BTreeMap<String, f64> {
    fn from(record: FlatRecord) -> Self {
        record.entries.into_iter().collect()
    }
}

impl FlatRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|&(_, v)| v)
    }

    /// Set `key`, replacing an existing value in place.
    pub fn set(&mut self, key: impl Into<String>, value: f64) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Remove `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<f64> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Iterate over entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the record is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize to a JSON object.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a JSON object of numbers.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    fn flag(&mut self, key: impl Into<String>, on: bool) {
        self.set(key, if on { 1.0 } else { 0.0 });
    }
}

fn index_of<T: PartialEq>(all: &[T], value: &T) -> f64 {
    all.iter().position(|v| v == value).unwrap_or(0) as f64
}

/// Walks `params` into a flat record.
pub fn flatten(params: &StripParams) -> FlatRecord {
    let mut record = FlatRecord::new();

    record.flag("eq.enabled", params.eq_enabled);
    record.set("eq.phase_mode", index_of(&PHASE_MODES, &params.eq.phase_mode()));
    record.flag("eq.auto_gain", params.eq.auto_gain());
    record.set("eq.output_gain_db", params.eq.output_gain_db());
    for (i, (_, band)) in params.eq.bands().enumerate() {
        let p = format!("eq.{i}");
        record.set(format!("{p}.type"), index_of(&FilterType::ALL, &band.filter_type));
        record.set(format!("{p}.frequency_hz"), band.frequency_hz);
        record.set(format!("{p}.gain_db"), band.gain_db);
        record.set(format!("{p}.q"), band.q);
        record.set(format!("{p}.slope_db_per_oct"), band.slope_db_per_oct);
        record.set(format!("{p}.shelf_slope"), band.shelf_slope);
        record.flag(format!("{p}.enabled"), band.enabled);
        record.set(
            format!("{p}.channel_mode"),
            index_of(&ChannelMode::ALL, &band.channel_mode),
        );
        if let Some(d) = band.dynamic {
            let values = [d.threshold_db, d.ratio, d.attack_ms, d.release_ms, d.range_db];
            for (field, value) in DYNAMIC_FIELDS.iter().zip(values) {
                record.set(format!("{p}.dynamic.{field}"), value);
            }
        }
    }

    let c = &params.compressor;
    record.flag("compressor.enabled", params.compressor_enabled);
    for (r, value) in COMPRESSOR_RANGES.iter().zip(compressor_values(c)) {
        record.set(format!("compressor.{}", r.name), value);
    }
    record.set("compressor.circuit", index_of(&CircuitModel::ALL, &c.circuit));
    record.set("compressor.detector", index_of(&DETECTORS, &c.detector));
    record.flag("compressor.program_release", c.program_release);
    record.flag("compressor.external_sidechain", c.external_sidechain);
    if let Some(hz) = c.sidechain.high_pass_hz {
        record.set("compressor.sidechain_hp_hz", hz);
    }
    if let Some(hz) = c.sidechain.low_pass_hz {
        record.set("compressor.sidechain_lp_hz", hz);
    }

    record.flag("reverb.enabled", params.reverb_enabled);
    for (r, value) in REVERB_RANGES.iter().zip(reverb_values(&params.reverb)) {
        record.set(format!("reverb.{}", r.name), value);
    }

    record
}

fn flag(key: &str, value: f64) -> Result<bool, ConfigError> {
    if value == 0.0 {
        Ok(false)
    } else if value == 1.0 {
        Ok(true)
    } else {
        Err(ConfigError::invalid_value(key, value, "expected 0 or 1"))
    }
}

fn pick<T: Copy>(all: &[T], key: &str, value: f64) -> Result<T, ConfigError> {
    if value.fract() != 0.0 || value < 0.0 {
        return Err(ConfigError::invalid_value(key, value, "expected an index"));
    }
    all.get(value as usize)
        .copied()
        .ok_or_else(|| ConfigError::invalid_value(key, value, "index out of range"))
}

fn set_compressor_field(c: &mut CompressorParams, field: &str, value: f64) -> bool {
    let slot = match field {
        "threshold_db" => &mut c.threshold_db,
        "ratio" => &mut c.ratio,
        "attack_ms" => &mut c.attack_ms,
        "release_ms" => &mut c.release_ms,
        "knee_db" => &mut c.knee_db,
        "makeup_db" => &mut c.makeup_db,
        "mix" => &mut c.mix,
        "lookahead_ms" => &mut c.lookahead_ms,
        _ => return false,
    };
    *slot = value;
    true
}

fn set_reverb_field(r: &mut ReverbParams, field: &str, value: f64) -> bool {
    let slot = match field {
        "decay_s" => &mut r.decay_s,
        "room_size" => &mut r.room_size,
        "predelay_ms" => &mut r.predelay_ms,
        "damping" => &mut r.damping,
        "diffusion" => &mut r.diffusion,
        "mod_rate_hz" => &mut r.mod_rate_hz,
        "mod_depth_ms" => &mut r.mod_depth_ms,
        "mix" => &mut r.mix,
        _ => return false,
    };
    *slot = value;
    true
}

fn set_band_field(band: &mut BandParams, key: &str, field: &str, value: f64) -> Result<(), ConfigError> {
    match field {
        "type" => band.filter_type = pick(&FilterType::ALL, key, value)?,
        "frequency_hz" => band.frequency_hz = value,
        "gain_db" => band.gain_db = value,
        "q" => band.q = value,
        "slope_db_per_oct" => band.slope_db_per_oct = value,
        "shelf_slope" => band.shelf_slope = value,
        "enabled" => band.enabled = flag(key, value)?,
        "channel_mode" => band.channel_mode = pick(&ChannelMode::ALL, key, value)?,
        _ => {
            let sub = field
                .strip_prefix("dynamic.")
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
            let d = band.dynamic.get_or_insert_with(DynamicParams::default);
            match sub {
                "threshold_db" => d.threshold_db = value,
                "ratio" => d.ratio = value,
                "attack_ms" => d.attack_ms = value,
                "release_ms" => d.release_ms = value,
                "range_db" => d.range_db = value,
                _ => return Err(ConfigError::UnknownKey(key.to_string())),
            }
        }
    }
    Ok(())
}

/// Rebuilds strip settings from a flat record.
///
/// Missing keys keep their defaults. Bands are added in index order and go
/// through the usual EQ validation, so a record with an invalid band is
/// rejected as a whole. Unknown keys are errors.
pub fn unflatten(record: &FlatRecord) -> Result<StripParams, ConfigError> {
    let mut params = StripParams::default();
    let mut bands: BTreeMap<usize, BandParams> = BTreeMap::new();
    let mut phase_mode = PhaseMode::Minimum;
    let mut auto_gain = false;
    let mut output_gain_db = 0.0;

    for (key, value) in record.iter() {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let (section, rest) = key.split_once('.').ok_or_else(unknown)?;
        match (section, rest) {
            ("eq", "enabled") => params.eq_enabled = flag(key, value)?,
            ("eq", "phase_mode") => phase_mode = pick(&PHASE_MODES, key, value)?,
            ("eq", "auto_gain") => auto_gain = flag(key, value)?,
            ("eq", "output_gain_db") => output_gain_db = value,
            ("eq", band_key) => {
                let (index, field) = band_key.split_once('.').ok_or_else(unknown)?;
                let index: usize = index.parse().map_err(|_| unknown())?;
                let band = bands.entry(index).or_default();
                set_band_field(band, key, field, value)?;
            }
            ("compressor", "enabled") => params.compressor_enabled = flag(key, value)?,
            ("compressor", "circuit") => {
                params.compressor.circuit = pick(&CircuitModel::ALL, key, value)?;
            }
            ("compressor", "detector") => {
                params.compressor.detector = pick(&DETECTORS, key, value)?;
            }
            ("compressor", "program_release") => {
                params.compressor.program_release = flag(key, value)?;
            }
            ("compressor", "external_sidechain") => {
                params.compressor.external_sidechain = flag(key, value)?;
            }
            ("compressor", "sidechain_hp_hz") => {
                params.compressor.sidechain.high_pass_hz = Some(value);
            }
            ("compressor", "sidechain_lp_hz") => {
                params.compressor.sidechain.low_pass_hz = Some(value);
            }
            ("compressor", field) => {
                if !set_compressor_field(&mut params.compressor, field, value) {
                    return Err(unknown());
                }
            }
            ("reverb", "enabled") => params.reverb_enabled = flag(key, value)?,
            ("reverb", field) => {
                if !set_reverb_field(&mut params.reverb, field, value) {
                    return Err(unknown());
                }
            }
            _ => return Err(unknown()),
        }
    }

    for band in bands.into_values() {
        params.eq.add_band(band)?;
    }
    params.eq.set_phase_mode(phase_mode)?;
    params.eq.set_auto_gain(auto_gain)?;
    params.eq.set_output_gain_db(output_gain_db)?;
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_strip() -> StripParams {
        let mut strip = StripParams::default();
        strip.eq.add_band(BandParams::low_cut(80.0, 24.0)).unwrap();
        strip
            .eq
            .add_band(
                BandParams::bell(6500.0, 0.0, 4.0)
                    .with_channel_mode(ChannelMode::Mid)
                    .with_dynamic(DynamicParams {
                        threshold_db: -28.0,
                        range_db: -8.0,
                        ..DynamicParams::default()
                    }),
            )
            .unwrap();
        strip.eq.set_phase_mode(PhaseMode::Analog).unwrap();
        strip.eq.set_output_gain_db(-1.5).unwrap();
        strip.compressor = CompressorParams {
            lookahead_ms: 3.0,
            ..CompressorParams::with_circuit(CircuitModel::Opto)
        };
        strip.compressor.sidechain.high_pass_hz = Some(120.0);
        strip.compressor_enabled = true;
        strip.reverb.decay_s = 3.5;
        strip
    }

    #[test]
    fn test_keys_in_processing_order() {
        let record = flatten(&sample_strip());
        let keys: Vec<&str> = record.iter().map(|(k, _)| k).collect();
        let pos = |k: &str| keys.iter().position(|x| *x == k).unwrap();
        assert!(pos("eq.0.type") < pos("eq.1.type"));
        assert!(pos("eq.1.type") < pos("compressor.enabled"));
        assert!(pos("compressor.enabled") < pos("reverb.enabled"));
    }

    #[test]
    fn test_values_are_named() {
        let record = flatten(&sample_strip());
        assert_eq!(record.get("eq.0.type"), Some(3.0));
        assert_eq!(record.get("eq.0.frequency_hz"), Some(80.0));
        assert_eq!(record.get("eq.1.channel_mode"), Some(3.0));
        assert_eq!(record.get("eq.1.dynamic.range_db"), Some(-8.0));
        assert_eq!(record.get("eq.0.dynamic.range_db"), None);
        assert_eq!(record.get("eq.phase_mode"), Some(1.0));
        assert_eq!(record.get("compressor.circuit"), Some(3.0));
        assert_eq!(record.get("compressor.sidechain_hp_hz"), Some(120.0));
        assert_eq!(record.get("compressor.sidechain_lp_hz"), None);
        assert_eq!(record.get("reverb.decay_s"), Some(3.5));
        assert_eq!(record.get("reverb.enabled"), Some(0.0));
    }

    #[test]
    fn test_unflatten_restores_strip() {
        let strip = sample_strip();
        assert_eq!(unflatten(&flatten(&strip)).unwrap(), strip);
    }

    #[test]
    fn test_missing_keys_keep_defaults() {
        let mut record = FlatRecord::new();
        record.set("eq.0.frequency_hz", 250.0);
        record.set("eq.0.gain_db", -3.0);
        let strip = unflatten(&record).unwrap();
        let (_, band) = strip.eq.bands().next().unwrap();
        assert_eq!(band.filter_type, FilterType::Bell);
        assert_eq!(band.frequency_hz, 250.0);
        assert_eq!(strip.compressor, CompressorParams::default());
        assert!(strip.eq_enabled);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        for key in ["eq", "eq.0", "eq.x.q", "eq.0.colour", "compressor.speed", "delay.time"] {
            let mut record = FlatRecord::new();
            record.set(key, 1.0);
            assert!(
                matches!(unflatten(&record), Err(ConfigError::UnknownKey(k)) if k == key),
                "{key}"
            );
        }
    }

    #[test]
    fn test_bad_values_rejected() {
        for (key, value) in [
            ("eq.0.type", 10.0),
            ("eq.0.type", 1.5),
            ("eq.enabled", 0.5),
            ("compressor.detector", -1.0),
        ] {
            let mut record = FlatRecord::new();
            record.set(key, value);
            assert!(
                matches!(unflatten(&record), Err(ConfigError::InvalidValue { .. })),
                "{key} = {value}"
            );
        }
    }

    #[test]
    fn test_invalid_band_rejected() {
        let mut record = FlatRecord::new();
        record.set("eq.0.q", -1.0);
        assert!(matches!(unflatten(&record), Err(ConfigError::Eq(_))));
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut record = FlatRecord::new();
        record.set("a.x", 1.0);
        record.set("b.y", 2.0);
        record.set("a.x", 3.0);
        assert_eq!(record.iter().collect::<Vec<_>>(), vec![("a.x", 3.0), ("b.y", 2.0)]);
        assert_eq!(record.remove("a.x"), Some(3.0));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_json_exchange() {
        let strip = sample_strip();
        let json = flatten(&strip).to_json().unwrap();
        assert!(json.contains("\"eq.0.frequency_hz\": 80.0"));
        let back = FlatRecord::from_json(&json).unwrap();
        assert_eq!(unflatten(&back).unwrap(), strip);
    }
}
