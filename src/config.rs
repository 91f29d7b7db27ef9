//! Codec configuration
//!
//! Every field has a default matching the reference token vocabulary, so an
//! empty YAML document (or no document at all) gives the standard codec.
//!
//! ```yaml
//! binary-grid: 0.125
//! noise-threshold: 0.04
//! max-note-duration: 8.0
//! default-tempo: 120
//! ```

use crate::error::CodecError;
use serde::Deserialize;
use std::path::Path;

/// Reference binary grid step (1/32 note, in quarter lengths)
pub const BINARY_GRID: f64 = 0.125;

/// Reference ternary grid step (1/32 triplet, in quarter lengths)
pub const TERNARY_GRID: f64 = 1.0 / 12.0;

/// Durations below this are treated as "no time elapsed"
pub const NOISE_THRESHOLD: f64 = 0.04;

/// Longest note the decoder will reconstruct, in quarter lengths
pub const MAX_NOTE_DURATION: f64 = 8.0;

/// Tempo used when a score carries no tempo marking
pub const DEFAULT_TEMPO: u16 = 120;

/// Pitch the augmentation window centers on (middle C)
pub const CENTER_PITCH: i32 = 60;

/// Grid settings used by the quantizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantizeConfig {
    pub binary_grid: f64,
    pub ternary_grid: f64,
    pub noise_threshold: f64,
}

impl Default for QuantizeConfig {
    fn default() -> Self {
        Self {
            binary_grid: BINARY_GRID,
            ternary_grid: TERNARY_GRID,
            noise_threshold: NOISE_THRESHOLD,
        }
    }
}

/// Full codec configuration
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct CodecConfig {
    pub binary_grid: f64,
    pub ternary_grid: f64,
    pub noise_threshold: f64,
    pub max_note_duration: f64,
    pub default_tempo: u16,
    pub center_pitch: i32,
    pub ticks_per_quarter: u16,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            binary_grid: BINARY_GRID,
            ternary_grid: TERNARY_GRID,
            noise_threshold: NOISE_THRESHOLD,
            max_note_duration: MAX_NOTE_DURATION,
            default_tempo: DEFAULT_TEMPO,
            center_pitch: CENTER_PITCH,
            ticks_per_quarter: 480,
        }
    }
}

impl CodecConfig {
    /// Parse and validate a YAML configuration document
    pub fn from_yaml_str(content: &str) -> Result<Self, CodecError> {
        let config: CodecConfig = if content.trim().is_empty() {
            CodecConfig::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| CodecError::Config(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML configuration file
    pub fn load(path: &Path) -> Result<Self, CodecError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CodecError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&content)
    }

    pub fn validate(&self) -> Result<(), CodecError> {
        let positive = [
            ("binary-grid", self.binary_grid),
            ("ternary-grid", self.ternary_grid),
            ("noise-threshold", self.noise_threshold),
            ("max-note-duration", self.max_note_duration),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(CodecError::Config(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        if self.default_tempo == 0 {
            return Err(CodecError::Config("default-tempo must be at least 1".to_string()));
        }
        // Metrical SMF timing stores ticks per quarter in 15 bits
        if self.ticks_per_quarter == 0 || self.ticks_per_quarter >= 0x8000 {
            return Err(CodecError::Config(format!(
                "ticks-per-quarter must be between 1 and 32767, got {}",
                self.ticks_per_quarter
            )));
        }
        Ok(())
    }

    pub fn quantize(&self) -> QuantizeConfig {
        QuantizeConfig {
            binary_grid: self.binary_grid,
            ternary_grid: self.ternary_grid,
            noise_threshold: self.noise_threshold,
        }
    }
}
