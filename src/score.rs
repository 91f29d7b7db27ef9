//! # Score Model
//!
//! The boundary between the codec and the outside world. A [`ScoreReader`]
//! turns a source (a MIDI file, for [`crate::midi::MidiFileReader`]) into a
//! flat [`Score`]; a [`ScoreWriter`] persists decoded [`NoteInterval`]s.
//!
//! ## Type Hierarchy
//! ```text
//! Score
//!   ├── tempo: Option<u16> (first tempo marking, BPM)
//!   └── Vec<ScoreElement>
//!         ├── Note  { offset, duration, pitch }
//!         ├── Chord { offset, duration, pitches }
//!         └── Rest  { offset, duration }
//! ```
//!
//! Offsets and durations are exact rationals in quarter lengths.

use crate::error::CodecError;
use num_rational::Rational64;
use std::path::Path;

/// A single element of a flattened score
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreElement {
    Note {
        offset: Rational64,
        duration: Rational64,
        pitch: u8,
    },
    /// Several pitches sharing the same onset and length
    Chord {
        offset: Rational64,
        duration: Rational64,
        pitches: Vec<u8>,
    },
    Rest {
        offset: Rational64,
        duration: Rational64,
    },
}

impl ScoreElement {
    pub fn offset(&self) -> Rational64 {
        match self {
            ScoreElement::Note { offset, .. }
            | ScoreElement::Chord { offset, .. }
            | ScoreElement::Rest { offset, .. } => *offset,
        }
    }
}

/// A flattened score as produced by a reader
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Score {
    pub elements: Vec<ScoreElement>,
    pub tempo: Option<u16>,
}

/// A decoded note: MIDI pitch, start and length in quarter lengths
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteInterval {
    pub pitch: u8,
    pub start: f64,
    pub duration: f64,
}

impl NoteInterval {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Produces a [`Score`] from some source.
pub trait ScoreReader {
    fn read(&self, source: &Path) -> Result<Score, CodecError>;
}

/// Persists decoded notes to a playable representation.
///
/// Notes arrive sorted by start time; chord members sharing a start keep
/// their decoding order.
pub trait ScoreWriter {
    fn write(
        &self,
        tempo: u16,
        notes: &[NoteInterval],
        destination: &Path,
    ) -> Result<(), CodecError>;
}
