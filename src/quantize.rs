//! # Hybrid Quantizer
//!
//! Snaps a duration (in quarter lengths) to the nearer of two grids:
//! - **Binary**: multiples of 1/8 (a 1/32 note)
//! - **Ternary**: multiples of 1/12 (a 1/32 triplet)
//!
//! The grid with the smaller absolute error wins, ties go to the binary grid,
//! and the result is rounded to 3 decimals. Anything shorter than the noise
//! threshold (0.04) means no time elapsed and maps to `0.0`.
//!
//! ## Example
//! ```rust
//! use midi_tokens::quantize;
//!
//! assert_eq!(quantize(0.02), 0.0);
//! assert_eq!(quantize(0.125), 0.125);
//! assert_eq!(quantize(1.0 / 3.0), 0.333); // eighth triplet
//! assert_eq!(quantize(0.49), 0.5);
//! ```

use crate::config::QuantizeConfig;

/// Quantize with the reference grids.
pub fn quantize(duration: f64) -> f64 {
    Quantizer::default().quantize(duration)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Quantizer {
    config: QuantizeConfig,
}

impl Quantizer {
    pub fn new(config: QuantizeConfig) -> Self {
        Self { config }
    }

    /// Snap `duration` to the closest grid point.
    ///
    /// Total over all inputs: negative and NaN durations fall under the noise
    /// threshold and return `0.0`.
    pub fn quantize(&self, duration: f64) -> f64 {
        if !(duration >= self.config.noise_threshold) {
            return 0.0;
        }

        let snapped_bin = snap(duration, self.config.binary_grid);
        let snapped_ter = snap(duration, self.config.ternary_grid);

        if (duration - snapped_bin).abs() <= (duration - snapped_ter).abs() {
            round3(snapped_bin)
        } else {
            round3(snapped_ter)
        }
    }
}

fn snap(duration: f64, step: f64) -> f64 {
    (duration / step).round_ties_even() * step
}

/// Round to 3 decimals, half to even
fn round3(value: f64) -> f64 {
    (value * 1000.0).round_ties_even() / 1000.0
}
