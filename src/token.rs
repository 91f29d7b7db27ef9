//! # Token Wire Format
//!
//! One token describes what happens at one point of the timeline and how long
//! until the next token:
//!
//! ```text
//! ON=<p1,p2,...|_>;OFF=<p1,p2,...|_>;DUR=<d.ddd>
//! ```
//!
//! - `ON` - pitches starting now (ascending, `_` when empty)
//! - `OFF` - pitches ending now (ascending, `_` when empty)
//! - `DUR` - quantized time to the next token, always 3 decimals
//!
//! A pitch is never in both sets: when a pitch ends and restarts at the same
//! instant only the ON is kept.
//!
//! ## Example
//! ```rust
//! use midi_tokens::Token;
//!
//! let token: Token = "ON=64,60;OFF=_;DUR=0.5".parse().unwrap();
//! assert_eq!(token.to_string(), "ON=60,64;OFF=_;DUR=0.500");
//! ```

use crate::error::TokenError;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Marker for an empty pitch set
const EMPTY: &str = "_";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Token {
    on: BTreeSet<u8>,
    off: BTreeSet<u8>,
    dur: f64,
}

impl Token {
    /// Build a token; pitches present in both sets are kept only in `on`.
    pub fn new(on: BTreeSet<u8>, mut off: BTreeSet<u8>, dur: f64) -> Self {
        off.retain(|p| !on.contains(p));
        Self { on, off, dur }
    }

    pub fn on(&self) -> &BTreeSet<u8> {
        &self.on
    }

    pub fn off(&self) -> &BTreeSet<u8> {
        &self.off
    }

    pub fn dur(&self) -> f64 {
        self.dur
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ON={};OFF={};DUR={:.3}",
            format_pitches(&self.on),
            format_pitches(&self.off),
            self.dur
        )
    }
}

impl FromStr for Token {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.trim().split(';').collect();
        if fields.len() != 3 {
            return Err(TokenError::FieldCount(fields.len()));
        }

        let on = parse_pitches(field_value(fields[0], "ON")?)?;
        let off = parse_pitches(field_value(fields[1], "OFF")?)?;

        let dur_text = field_value(fields[2], "DUR")?;
        let dur: f64 = dur_text
            .parse()
            .map_err(|_| TokenError::Duration(dur_text.to_string()))?;
        if !(dur.is_finite() && dur >= 0.0) {
            return Err(TokenError::Duration(dur_text.to_string()));
        }

        Ok(Token::new(on, off, dur))
    }
}

fn field_value<'a>(field: &'a str, name: &'static str) -> Result<&'a str, TokenError> {
    field
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix('='))
        .ok_or_else(|| TokenError::FieldName {
            expected: name,
            found: field.to_string(),
        })
}

fn parse_pitches(text: &str) -> Result<BTreeSet<u8>, TokenError> {
    if text == EMPTY {
        return Ok(BTreeSet::new());
    }
    text.split(',')
        .map(|part| match part.parse::<u8>() {
            Ok(pitch) if pitch <= 127 => Ok(pitch),
            _ => Err(TokenError::Pitch(part.to_string())),
        })
        .collect()
}

fn format_pitches(pitches: &BTreeSet<u8>) -> String {
    if pitches.is_empty() {
        return EMPTY.to_string();
    }
    pitches
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
