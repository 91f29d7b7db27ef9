//! # Error Types
//!
//! This module defines all error types for the token codec.
//!
//! ## Error Types
//! - `SourceRead` - the score reader could not produce a score
//! - `TokenParse` - a single malformed token met during decoding (with its index)
//! - `Write` - the score writer could not persist the decoded notes
//! - `Config` - invalid codec configuration
//! - `Metadata` - invalid frontmatter in a token document
//!
//! Empty inputs and transpositions that push every pitch out of MIDI range are
//! not errors; they produce empty token lists.
//!
//! ## Usage
//! ```rust
//! use midi_tokens::{decode, CodecError};
//!
//! let decoded = decode(&["ON=60;OFF=_;DUR=1.000", "ON=_;OFF=60;DUR=zero"]);
//! for err in &decoded.errors {
//!     if let CodecError::TokenParse { index, token, .. } = err {
//!         eprintln!("Skipped token #{}: {}", index, token);
//!     }
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    /// The score reader failed; encoding is aborted with no partial output.
    ///
    /// # Example
    /// ```
    /// # use midi_tokens::CodecError;
    /// let err = CodecError::SourceRead {
    ///     path: "song.mid".to_string(),
    ///     message: "unexpected end of file".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "Error reading score 'song.mid': unexpected end of file");
    /// ```
    #[error("Error reading score '{path}': {message}")]
    SourceRead { path: String, message: String },

    /// A malformed token in a sequence being decoded.
    ///
    /// Decoding skips the token and carries on with the next one.
    #[error("Error in token #{index} '{token}': {source}")]
    TokenParse {
        index: usize,
        token: String,
        #[source]
        source: TokenError,
    },

    /// The score writer failed. Never retried.
    #[error("Error writing score '{path}': {message}")]
    Write { path: String, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Invalid YAML frontmatter in a token document.
    ///
    /// # Example
    /// ```
    /// # use midi_tokens::CodecError;
    /// let err = CodecError::Metadata("tempo must be a positive integer".to_string());
    /// assert_eq!(err.to_string(), "Invalid metadata: tempo must be a positive integer");
    /// ```
    #[error("Invalid metadata: {0}")]
    Metadata(String),
}

/// Syntax errors in a single `ON=..;OFF=..;DUR=..` token.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenError {
    #[error("expected 3 fields separated by ';', found {0}")]
    FieldCount(usize),

    #[error("expected field '{expected}=', found '{found}'")]
    FieldName {
        expected: &'static str,
        found: String,
    },

    #[error("invalid pitch '{0}' (expected an integer 0-127)")]
    Pitch(String),

    #[error("invalid duration '{0}' (expected a non-negative number)")]
    Duration(String),
}
