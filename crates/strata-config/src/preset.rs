//! Preset file format and operations.

use serde::{Deserialize, Serialize};
use std::path::Path;
use strata_effects::StripParams;

use crate::error::ConfigError;
use crate::validation::{ValidationResult, validate};

/// A named channel strip setting.
///
/// # TOML Format
///
/// ```toml
/// name = "Warm Vocal"
/// description = "Low cut, presence lift, gentle opto"
/// sample_rate = 48000
///
/// [strip]
/// compressor_enabled = true
///
/// [[strip.eq.bands]]
/// filter_type = "low_cut"
/// frequency_hz = 90.0
/// slope_db_per_oct = 18.0
///
/// [[strip.eq.bands]]
/// filter_type = "bell"
/// frequency_hz = 3500.0
/// gain_db = 2.5
/// q = 0.9
///
/// [strip.compressor]
/// threshold_db = -22.0
/// ratio = 3.0
/// circuit = "opto"
/// detector = "circuit"
/// ```
///
/// Every field of `strip` is optional and falls back to its default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainPreset {
    /// Name of the preset.
    pub name: String,

    /// Optional description of the preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Sample rate the preset was tuned at (defaults to 48000).
    /// Settings are redesigned for whatever rate the engine runs at.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Strip settings.
    #[serde(default)]
    pub strip: StripParams,
}

fn default_sample_rate() -> u32 {
    48000
}

impl ChainPreset {
    /// Create a preset with the default strip.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            sample_rate: default_sample_rate(),
            strip: StripParams::default(),
        }
    }

    /// Create a preset with a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the sample rate hint.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set the strip settings.
    pub fn with_strip(mut self, strip: StripParams) -> Self {
        self.strip = strip;
        self
    }

    /// Load a preset from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load a preset from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the preset to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the preset to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check the strip against its documented ranges at `sample_rate`.
    pub fn validate(&self) -> ValidationResult<()> {
        validate(&self.strip, f64::from(self.sample_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_effects::compressor::CircuitModel;
    use strata_effects::eq::{BandParams, FilterType};

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let preset = ChainPreset::from_toml(r#"name = "Empty""#).unwrap();
        assert_eq!(preset, ChainPreset::new("Empty"));
        assert!(preset.strip.eq.is_empty());
    }

    #[test]
    fn test_parse_documented_format() {
        let toml = r#"
name = "Warm Vocal"
description = "Low cut, presence lift, gentle opto"
sample_rate = 44100

[strip]
compressor_enabled = true

[[strip.eq.bands]]
filter_type = "low_cut"
frequency_hz = 90.0
slope_db_per_oct = 18.0

[[strip.eq.bands]]
filter_type = "bell"
frequency_hz = 3500.0
gain_db = 2.5
q = 0.9

[strip.compressor]
threshold_db = -22.0
ratio = 3.0
circuit = "opto"
detector = "circuit"
"#;
        let preset = ChainPreset::from_toml(toml).unwrap();
        assert_eq!(preset.sample_rate, 44100);
        assert!(preset.strip.compressor_enabled);
        assert!(preset.strip.eq_enabled);
        let bands: Vec<_> = preset.strip.eq.bands().map(|(_, b)| *b).collect();
        assert_eq!(bands.len(), 2);
        assert_eq!(bands[0].filter_type, FilterType::LowCut);
        assert_eq!(bands[1].gain_db, 2.5);
        assert_eq!(preset.strip.compressor.circuit, CircuitModel::Opto);
        assert_eq!(preset.strip.compressor.attack_ms, 10.0);
        assert_eq!(preset.validate(), Ok(()));
    }

    #[test]
    fn test_invalid_band_fails_to_parse() {
        let toml = r#"
name = "Broken"

[[strip.eq.bands]]
filter_type = "notch"
q = -2.0
"#;
        assert!(matches!(
            ChainPreset::from_toml(toml),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut strip = StripParams::default();
        strip.eq.add_band(BandParams::high_shelf(9000.0, 2.0)).unwrap();
        let preset = ChainPreset::new("Air")
            .with_description("Top end lift")
            .with_sample_rate(96000)
            .with_strip(strip);
        let text = preset.to_toml().unwrap();
        assert!(text.contains("high_shelf"));
        assert_eq!(ChainPreset::from_toml(&text).unwrap(), preset);
    }
}
