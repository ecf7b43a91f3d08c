//! Configuration and preset management for the strata channel strip.
//!
//! # Features
//!
//! - **Presets**: Load and save whole strip settings as TOML
//! - **Flat records**: Every parameter as a named number, for hosts and automation
//! - **Validation**: Range checks against the sample rate, or clamping instead
//! - **Factory Presets**: Built-in vocal, drum bus and plate settings
//!
//! # Example
//!
//! ```rust,no_run
//! use strata_config::{ChainPreset, flatten, get_factory_preset};
//! use strata_effects::eq::BandParams;
//!
//! let mut preset = get_factory_preset("vocal").unwrap();
//! preset.strip.eq.add_band(BandParams::high_shelf(12000.0, 1.5)).unwrap();
//! preset.validate().unwrap();
//! preset.save("presets/my_vocal.toml").unwrap();
//!
//! let record = flatten(&preset.strip);
//! println!("{}", record.to_json().unwrap());
//!
//! let loaded = ChainPreset::load("presets/my_vocal.toml").unwrap();
//! assert_eq!(loaded, preset);
//! ```

mod error;
mod preset;

/// Flat named-field parameter records.
pub mod flat;

/// Strip validation and clamping.
pub mod validation;

/// Factory presets bundled with the library.
pub mod factory_presets;

pub use error::ConfigError;
pub use factory_presets::{
    FACTORY_PRESET_NAMES, factory_preset_names, factory_presets, get_factory_preset,
    is_factory_preset,
};
pub use flat::{FlatRecord, flatten, unflatten};
pub use preset::ChainPreset;
pub use validation::{ValidationError, ValidationResult, clamp_to_ranges, validate};
