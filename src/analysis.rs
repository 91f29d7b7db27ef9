//! # Pitch Center Analysis
//!
//! Picks the 12 transpositions used for data augmentation. The median pitch of
//! a piece is pulled toward middle C (MIDI 60), and the window of shifts is
//! built around that pull:
//!
//! ```text
//! shift  = clamp(60 - median, -6, +5)
//! window = shift-5 ..= shift+6        (12 semitones, one more step up than down)
//! ```
//!
//! ## Example
//! ```rust
//! use midi_tokens::analysis::transposition_window;
//!
//! let window = transposition_window(72);
//! assert_eq!(window.shift(), -6);
//! assert_eq!(window.iter().collect::<Vec<_>>(), (-11..=0).collect::<Vec<_>>());
//! ```

use crate::config::CENTER_PITCH;
use crate::event::RawEvent;
use std::ops::Range;

/// Lower bound of the window's central shift
const MIN_SHIFT: i32 = -6;

/// Upper bound of the window's central shift
const MAX_SHIFT: i32 = 5;

/// Median MIDI pitch over every pitch of every event.
///
/// With an even number of pitches the two middle values are averaged and the
/// result truncated. Returns 60 when there are no pitches at all.
pub fn median_pitch(events: &[RawEvent]) -> i32 {
    let mut pitches: Vec<i32> = events
        .iter()
        .flat_map(|event| event.pitches.iter().map(|&p| p as i32))
        .collect();

    if pitches.is_empty() {
        return CENTER_PITCH;
    }

    pitches.sort_unstable();
    let mid = pitches.len() / 2;
    if pitches.len() % 2 == 1 {
        pitches[mid]
    } else {
        (pitches[mid - 1] + pitches[mid]) / 2
    }
}

/// Twelve consecutive transpositions (in semitones) around a central shift
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranspositionWindow {
    shift: i32,
}

impl TranspositionWindow {
    /// Window pulling `median` toward `center`
    pub fn around(median: i32, center: i32) -> Self {
        Self {
            shift: (center - median).clamp(MIN_SHIFT, MAX_SHIFT),
        }
    }

    /// The clamped central shift
    pub fn shift(&self) -> i32 {
        self.shift
    }

    /// Window members in ascending order
    pub fn iter(&self) -> Range<i32> {
        (self.shift - 5)..(self.shift + 7)
    }

    pub fn contains(&self, semitones: i32) -> bool {
        self.iter().contains(&semitones)
    }
}

/// Window centering `median` on middle C
pub fn transposition_window(median: i32) -> TranspositionWindow {
    TranspositionWindow::around(median, CENTER_PITCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_rational::Rational64;

    fn chord(pitches: &[u8]) -> RawEvent {
        RawEvent::new(
            Rational64::from_integer(0),
            Rational64::from_integer(1),
            pitches.to_vec(),
        )
    }

    #[test]
    fn test_median_empty_defaults_to_middle_c() {
        assert_eq!(median_pitch(&[]), 60);
        assert_eq!(median_pitch(&[chord(&[])]), 60);
    }

    #[test]
    fn test_median_odd_count() {
        let events = vec![chord(&[48, 72]), chord(&[64])];
        assert_eq!(median_pitch(&events), 64);
    }

    #[test]
    fn test_median_even_count_truncates() {
        // (60 + 63) / 2 = 61.5 -> 61
        let events = vec![chord(&[60]), chord(&[63, 40, 90])];
        assert_eq!(median_pitch(&events), 61);
    }

    #[test]
    fn test_window_centered_on_middle_c() {
        let window = transposition_window(60);
        assert_eq!(window.shift(), 0);
        assert_eq!(window.iter().collect::<Vec<_>>(), (-5..=6).collect::<Vec<_>>());
    }

    #[test]
    fn test_window_clamps_high_median() {
        let window = transposition_window(72);
        assert_eq!(window.shift(), -6);
        assert_eq!(window.iter().collect::<Vec<_>>(), (-11..=0).collect::<Vec<_>>());
        assert!(window.contains(0));
    }

    #[test]
    fn test_window_clamps_low_median() {
        let window = transposition_window(40);
        assert_eq!(window.shift(), 5);
        assert_eq!(window.iter().collect::<Vec<_>>(), (0..=11).collect::<Vec<_>>());
    }

    #[test]
    fn test_window_always_twelve_wide() {
        for median in 0..=127 {
            let window = transposition_window(median);
            assert_eq!(window.iter().count(), 12);
            // A median within reach of middle C is always pulled onto it
            if (55..=66).contains(&median) {
                assert_eq!(median + window.shift(), 60);
            }
        }
    }
}
