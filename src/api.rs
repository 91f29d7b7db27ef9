//! # Public API
//!
//! Entry points tying readers, the codec and writers together.
//!
//! ## Encoding
//! - [`encode_source()`] - read a source and encode it, logging read failures
//! - [`try_encode_source()`] - same, returning the read failure
//! - [`encode_score()`] - encode an already read score
//! - [`encode_augmented()`] - encode every transposition of the window
//!
//! ## Decoding
//! - [`decode_tokens()`] - decode tokens and hand the notes to a writer
//!
//! ## Typical Usage
//!
//! ```rust,no_run
//! use midi_tokens::{encode_source, MidiFileReader};
//! use std::path::Path;
//!
//! let variants = encode_source(&MidiFileReader, Path::new("song.mid"), true);
//! for (tokens, metadata) in &variants {
//!     println!("{} tokens at {} BPM", tokens.len(), metadata.tempo);
//! }
//! ```

use crate::analysis::{median_pitch, TranspositionWindow};
use crate::config::CodecConfig;
use crate::decoder::{Decoded, Decoder};
use crate::document::Metadata;
use crate::encoder::Encoder;
use crate::error::CodecError;
use crate::event::{extract_raw_events, RawEvent};
use crate::score::{Score, ScoreReader, ScoreWriter};
use crate::token::Token;
use std::path::Path;

/// Token sequences paired with their metadata
pub type Encoded = Vec<(Vec<Token>, Metadata)>;

/// Read `source` and encode it with the reference configuration.
///
/// A read failure is logged and yields an empty result; nothing is partially
/// encoded.
pub fn encode_source<R: ScoreReader + ?Sized>(reader: &R, source: &Path, augment: bool) -> Encoded {
    match try_encode_source(reader, source, augment, &CodecConfig::default()) {
        Ok(encoded) => encoded,
        Err(e) => {
            log::error!("{}", e);
            Vec::new()
        }
    }
}

/// Read `source` and encode it.
///
/// # Errors
/// Returns [`CodecError::SourceRead`] if the reader fails.
pub fn try_encode_source<R: ScoreReader + ?Sized>(
    reader: &R,
    source: &Path,
    augment: bool,
    config: &CodecConfig,
) -> Result<Encoded, CodecError> {
    let score = reader.read(source)?;
    log::info!(
        "Read {} elements from {}",
        score.elements.len(),
        source.display()
    );
    Ok(encode_score(&score, augment, config))
}

/// Encode a score.
///
/// Without augmentation the result has exactly one entry (no transposition),
/// even for an empty score. With augmentation there is one entry per window
/// member that still has pitches in MIDI range, in ascending transposition
/// order.
pub fn encode_score(score: &Score, augment: bool, config: &CodecConfig) -> Encoded {
    let events = extract_raw_events(score);
    let metadata = Metadata {
        tempo: score.tempo.unwrap_or(config.default_tempo),
    };

    if !augment {
        let tokens = Encoder::new(config).encode(&events, 0);
        return vec![(tokens, metadata)];
    }

    encode_augmented(&events, config)
        .into_iter()
        .map(|(_, tokens)| (tokens, metadata))
        .collect()
}

/// Encode each transposition of the augmentation window.
///
/// Returns `(semitones, tokens)` pairs in window order; transpositions that
/// leave no pitch in range are dropped.
pub fn encode_augmented(events: &[RawEvent], config: &CodecConfig) -> Vec<(i32, Vec<Token>)> {
    let median = median_pitch(events);
    let window = TranspositionWindow::around(median, config.center_pitch);
    let encoder = Encoder::new(config);

    let variants: Vec<(i32, Vec<Token>)> = window
        .iter()
        .map(|semitones| (semitones, encoder.encode(events, semitones)))
        .filter(|(semitones, tokens)| {
            if tokens.is_empty() {
                log::debug!("Dropping transposition {:+}: no pitch in range", semitones);
            }
            !tokens.is_empty()
        })
        .collect();

    log::debug!(
        "Median pitch {} -> window {:+}..={:+}, {} variants kept",
        median,
        window.shift() - 5,
        window.shift() + 6,
        variants.len()
    );
    variants
}

/// Decode `tokens` and write the notes to `destination` with `writer`.
///
/// Malformed tokens are skipped and reported in [`Decoded::errors`]; the
/// tempo in `metadata` is passed through to the writer untouched.
///
/// # Errors
/// Returns [`CodecError::Write`] if the writer fails. The write is not retried.
pub fn decode_tokens<S, W>(
    tokens: &[S],
    metadata: &Metadata,
    destination: &Path,
    writer: &W,
    config: &CodecConfig,
) -> Result<Decoded, CodecError>
where
    S: AsRef<str>,
    W: ScoreWriter + ?Sized,
{
    let decoded = Decoder::new(config).decode(tokens);
    writer.write(metadata.tempo, &decoded.notes, destination)?;
    log::info!(
        "Wrote {} notes at {} BPM to {}",
        decoded.notes.len(),
        metadata.tempo,
        destination.display()
    );
    Ok(decoded)
}
