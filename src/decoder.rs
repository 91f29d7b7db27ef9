//! # Token Decoder
//!
//! Rebuilds note intervals from a token sequence.
//!
//! ## Per-token steps
//! 1. **OFF** - every listed pitch that is sounding is closed
//! 2. **ON** - a listed pitch that is already sounding is closed first
//!    (re-attack), then opened at the current time
//! 3. **DUR** - the clock moves forward
//!
//! Closed notes longer than the maximum note duration (8 quarter lengths by
//! default) are clamped; zero-length notes are dropped. Pitches still sounding
//! after the last token are closed at the final clock value.
//!
//! Malformed tokens are logged and skipped without touching the clock, so the
//! tokens around them keep their timing.
//!
//! ## Example
//! ```rust
//! use midi_tokens::decode;
//!
//! let decoded = decode(&[
//!     "ON=60,64;OFF=_;DUR=1.000",
//!     "ON=_;OFF=60,64;DUR=0.000",
//! ]);
//! assert_eq!(decoded.notes.len(), 2);
//! assert_eq!(decoded.notes[0].duration, 1.0);
//! assert!(decoded.errors.is_empty());
//! ```

use crate::config::{CodecConfig, MAX_NOTE_DURATION};
use crate::error::CodecError;
use crate::score::NoteInterval;
use crate::token::Token;
use std::collections::BTreeMap;

/// Result of decoding a token sequence
#[derive(Debug, Default)]
pub struct Decoded {
    /// Notes sorted by start time
    pub notes: Vec<NoteInterval>,
    /// One `CodecError::TokenParse` per skipped token
    pub errors: Vec<CodecError>,
}

/// Decode with the reference configuration.
pub fn decode<S: AsRef<str>>(tokens: &[S]) -> Decoded {
    Decoder::default().decode(tokens)
}

#[derive(Debug, Clone, Copy)]
pub struct Decoder {
    max_note_duration: f64,
}

impl Default for Decoder {
    fn default() -> Self {
        Self {
            max_note_duration: MAX_NOTE_DURATION,
        }
    }
}

/// Sounding pitches and the notes closed so far
struct DecodeState {
    max_note_duration: f64,
    now: f64,
    sounding: BTreeMap<u8, f64>,
    notes: Vec<NoteInterval>,
}

impl DecodeState {
    fn close(&mut self, pitch: u8) {
        if let Some(start) = self.sounding.remove(&pitch) {
            let duration = (self.now - start).min(self.max_note_duration);
            if duration > 0.0 {
                self.notes.push(NoteInterval {
                    pitch,
                    start,
                    duration,
                });
            }
        }
    }

    fn apply(&mut self, token: &Token) {
        for &pitch in token.off() {
            self.close(pitch);
        }
        for &pitch in token.on() {
            self.close(pitch);
            self.sounding.insert(pitch, self.now);
        }
        self.now += token.dur();
    }

    fn finish(mut self) -> Vec<NoteInterval> {
        let still_sounding: Vec<u8> = self.sounding.keys().copied().collect();
        for pitch in still_sounding {
            self.close(pitch);
        }
        // Stable: chord members sharing a start keep their order
        self.notes.sort_by(|a, b| a.start.total_cmp(&b.start));
        self.notes
    }
}

impl Decoder {
    pub fn new(config: &CodecConfig) -> Self {
        Self {
            max_note_duration: config.max_note_duration,
        }
    }

    pub fn decode<S: AsRef<str>>(&self, tokens: &[S]) -> Decoded {
        let mut state = DecodeState {
            max_note_duration: self.max_note_duration,
            now: 0.0,
            sounding: BTreeMap::new(),
            notes: Vec::new(),
        };
        let mut errors = Vec::new();

        for (index, text) in tokens.iter().enumerate() {
            let text = text.as_ref();
            match text.parse::<Token>() {
                Ok(token) => state.apply(&token),
                Err(source) => {
                    log::warn!("Skipping token #{}: {} -> {}", index, text, source);
                    errors.push(CodecError::TokenParse {
                        index,
                        token: text.to_string(),
                        source,
                    });
                }
            }
        }

        let notes = state.finish();
        log::debug!(
            "Decoded {} tokens into {} notes ({} skipped)",
            tokens.len(),
            notes.len(),
            errors.len()
        );
        Decoded { notes, errors }
    }
}
