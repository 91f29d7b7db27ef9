//! Raw event extraction
//!
//! Flattens a [`Score`] into `(offset, duration, pitches)` triples, the only
//! shape the encoder and the pitch analyzer work with.

use crate::score::{Score, ScoreElement};
use num_rational::Rational64;

/// A note or chord onset with its length and MIDI pitches
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub offset: Rational64,
    pub duration: Rational64,
    pub pitches: Vec<u8>,
}

impl RawEvent {
    pub fn new(offset: Rational64, duration: Rational64, pitches: Vec<u8>) -> Self {
        Self {
            offset,
            duration,
            pitches,
        }
    }

    pub fn end(&self) -> Rational64 {
        self.offset + self.duration
    }
}

/// Extract note and chord events from a score, in score order.
///
/// Rests are ignored. Chord constituents share the chord's offset and duration.
pub fn extract_raw_events(score: &Score) -> Vec<RawEvent> {
    score
        .elements
        .iter()
        .filter_map(|element| match element {
            ScoreElement::Note {
                offset,
                duration,
                pitch,
            } => Some(RawEvent::new(*offset, *duration, vec![*pitch])),
            ScoreElement::Chord {
                offset,
                duration,
                pitches,
            } => Some(RawEvent::new(*offset, *duration, pitches.clone())),
            ScoreElement::Rest { .. } => None,
        })
        .collect()
}
