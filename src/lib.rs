//! # midi-tokens
//!
//! A bidirectional codec between timed note events and a compact text token
//! sequence for training sequence models.
//!
//! ## Pipeline
//! ```text
//! MIDI file ──reader──> Score ──extract──> RawEvents ──encode──> Tokens
//!                                             │          (quantize)
//!                                   median pitch → transposition window
//!
//! Tokens ──decode──> NoteIntervals ──writer──> MIDI file
//! ```
//!
//! ## Example
//! ```rust
//! use midi_tokens::{decode, encode, RawEvent};
//! use num_rational::Rational64;
//!
//! let events = vec![
//!     RawEvent::new(Rational64::from_integer(0), Rational64::from_integer(1), vec![60, 64]),
//!     RawEvent::new(Rational64::from_integer(1), Rational64::new(1, 2), vec![67]),
//! ];
//! let tokens = encode(&events, 0);
//! let texts: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
//! assert_eq!(texts, vec![
//!     "ON=60,64;OFF=_;DUR=1.000",
//!     "ON=67;OFF=60,64;DUR=0.500",
//!     "ON=_;OFF=67;DUR=0.000",
//! ]);
//!
//! let decoded = decode(&texts);
//! assert_eq!(decoded.notes.len(), 3);
//! ```

pub mod analysis;
pub mod api;
pub mod config;
pub mod decoder;
pub mod document;
pub mod encoder;
pub mod error;
pub mod event;
pub mod midi;
pub mod quantize;
pub mod score;
pub mod token;

pub use api::*;
pub use config::CodecConfig;
pub use decoder::{decode, Decoded, Decoder};
pub use document::{Metadata, TokenDocument};
pub use encoder::{encode, Encoder};
pub use error::*;
pub use event::{extract_raw_events, RawEvent};
pub use midi::{MidiFileReader, MidiFileWriter};
pub use quantize::{quantize, Quantizer};
pub use score::{NoteInterval, Score, ScoreElement, ScoreReader, ScoreWriter};
pub use token::Token;
