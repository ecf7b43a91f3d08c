//! Factory presets bundled with the strata library.
//!
//! These presets are always available without external files and serve as
//! starting points for common strip setups.

use crate::ChainPreset;

/// Array of factory preset names for external access.
pub static FACTORY_PRESET_NAMES: &[&str] = &["vocal", "drum_bus", "plate"];

/// TOML content for factory presets, embedded at compile time.
static FACTORY_PRESETS_TOML: &[(&str, &str)] = &[
    ("vocal", VOCAL_PRESET),
    ("drum_bus", DRUM_BUS_PRESET),
    ("plate", PLATE_PRESET),
];

/// Vocal chain: rumble cut, mud dip, dynamic de-esser, opto levelling.
const VOCAL_PRESET: &str = r#"
name = "Vocal"
description = "Low cut, mud dip, dynamic de-esser and opto levelling"
sample_rate = 48000

[strip]
eq_enabled = true
compressor_enabled = true
reverb_enabled = false

[[strip.eq.bands]]
filter_type = "low_cut"
frequency_hz = 90.0
slope_db_per_oct = 18.0

[[strip.eq.bands]]
filter_type = "bell"
frequency_hz = 320.0
gain_db = -2.5
q = 1.2

[[strip.eq.bands]]
filter_type = "bell"
frequency_hz = 3200.0
gain_db = 2.0
q = 0.8

[[strip.eq.bands]]
filter_type = "bell"
frequency_hz = 6800.0
gain_db = 0.0
q = 3.0
channel_mode = "mid"

[strip.eq.bands.dynamic]
threshold_db = -30.0
ratio = 4.0
attack_ms = 1.0
release_ms = 60.0
range_db = -8.0

[strip.compressor]
threshold_db = -22.0
ratio = 3.0
attack_ms = 10.0
release_ms = 120.0
knee_db = 8.0
makeup_db = 3.0
circuit = "opto"
detector = "circuit"
program_release = true

[strip.compressor.sidechain]
high_pass_hz = 100.0
"#;

/// Drum bus: tight low end, broad air tilt, punchy VCA glue.
const DRUM_BUS_PRESET: &str = r#"
name = "Drum Bus"
description = "Sub cut, air tilt and VCA glue with parallel blend"
sample_rate = 48000

[strip]
eq_enabled = true
compressor_enabled = true
reverb_enabled = false

[strip.eq]
auto_gain = true

[[strip.eq.bands]]
filter_type = "low_cut"
frequency_hz = 35.0
slope_db_per_oct = 24.0

[[strip.eq.bands]]
filter_type = "low_shelf"
frequency_hz = 90.0
gain_db = 2.0
shelf_slope = 0.8

[[strip.eq.bands]]
filter_type = "bell"
frequency_hz = 450.0
gain_db = -3.0
q = 0.9

[[strip.eq.bands]]
filter_type = "flat_tilt_shelf"
frequency_hz = 1500.0
gain_db = 3.0

[strip.compressor]
threshold_db = -18.0
ratio = 4.0
attack_ms = 3.0
release_ms = 80.0
knee_db = 4.0
makeup_db = 4.0
mix = 0.6
circuit = "vca"
detector = "peak"

[strip.compressor.sidechain]
high_pass_hz = 80.0
"#;

/// Plate-style reverb on a lightly shaped send.
const PLATE_PRESET: &str = r#"
name = "Plate"
description = "Bright, dense plate-style reverb with mid/side shaping"
sample_rate = 48000

[strip]
eq_enabled = true
compressor_enabled = false
reverb_enabled = true

[[strip.eq.bands]]
filter_type = "low_cut"
frequency_hz = 180.0
slope_db_per_oct = 12.0

[[strip.eq.bands]]
filter_type = "high_shelf"
frequency_hz = 8000.0
gain_db = 1.5
channel_mode = "side"

[strip.reverb]
decay_s = 2.4
room_size = 0.35
predelay_ms = 20.0
damping = 0.25
diffusion = 0.85
mod_rate_hz = 0.8
mod_depth_ms = 0.5
mix = 0.35
"#;

/// Get all factory presets.
///
/// A preset that fails to parse is skipped.
pub fn factory_presets() -> Vec<ChainPreset> {
    FACTORY_PRESETS_TOML
        .iter()
        .filter_map(|(_, toml)| ChainPreset::from_toml(toml).ok())
        .collect()
}

/// Get a factory preset by name (case-insensitive).
pub fn get_factory_preset(name: &str) -> Option<ChainPreset> {
    let name_lower = name.to_lowercase();
    FACTORY_PRESETS_TOML
        .iter()
        .find(|(n, _)| *n == name_lower)
        .and_then(|(_, toml)| ChainPreset::from_toml(toml).ok())
}

/// Get the names of all factory presets.
pub fn factory_preset_names() -> &'static [&'static str] {
    FACTORY_PRESET_NAMES
}

/// Check if a name corresponds to a factory preset.
pub fn is_factory_preset(name: &str) -> bool {
    let name_lower = name.to_lowercase();
    FACTORY_PRESET_NAMES.contains(&name_lower.as_str())
}
