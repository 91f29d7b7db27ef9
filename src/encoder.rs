//! # Token Encoder
//!
//! Turns raw note events into a time-ordered token sequence.
//!
//! ## Algorithm
//!
//! ### 1. Transposition
//! Every pitch is shifted; pitches leaving 0-127 are dropped, and an event
//! with no pitch left contributes nothing.
//!
//! ### 2. Timeline
//! Onsets and releases are collected into two maps keyed by exact rational
//! time. Their union, sorted, is the list of time points to visit.
//!
//! ### 3. Sweep
//! At each time point:
//! - releases decrement a per-pitch voice counter; a pitch is only marked OFF
//!   when its counter reaches zero, so overlapping copies of one pitch sustain
//!   until the last one ends
//! - onsets increment the counter and mark the pitch ON
//! - a pitch marked both ON and OFF keeps only the ON (re-attack)
//! - the time to the *next* point, measured from the last emitted token, is
//!   quantized; a token is emitted once that gap is non-zero
//!
//! Gaps that quantize to zero merge their events into the following token. The
//! final point always emits `ON=_` with `DUR=0.000` to flush trailing OFFs.

use crate::config::CodecConfig;
use crate::event::RawEvent;
use crate::quantize::Quantizer;
use crate::token::Token;
use num_rational::Rational64;
use std::collections::{BTreeMap, BTreeSet, HashMap};

const MIDI_RANGE: std::ops::RangeInclusive<i32> = 0..=127;

/// Encode with the reference configuration.
pub fn encode(events: &[RawEvent], transpose: i32) -> Vec<Token> {
    Encoder::default().encode(events, transpose)
}

#[derive(Debug, Clone, Default)]
pub struct Encoder {
    quantizer: Quantizer,
}

/// Onsets and releases keyed by time point
#[derive(Debug, Default)]
struct Timeline {
    starts: BTreeMap<Rational64, Vec<u8>>,
    ends: BTreeMap<Rational64, Vec<u8>>,
}

impl Timeline {
    fn build(events: &[RawEvent], transpose: i32) -> Self {
        let mut timeline = Timeline::default();
        for event in events {
            let end = event.end();
            for pitch in transpose_pitches(&event.pitches, transpose) {
                timeline.starts.entry(event.offset).or_default().push(pitch);
                timeline.ends.entry(end).or_default().push(pitch);
            }
        }
        timeline
    }

    fn time_points(&self) -> Vec<Rational64> {
        self.starts
            .keys()
            .chain(self.ends.keys())
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn transpose_pitches(pitches: &[u8], transpose: i32) -> impl Iterator<Item = u8> + '_ {
    pitches.iter().filter_map(move |&p| {
        let shifted = p as i32 + transpose;
        MIDI_RANGE.contains(&shifted).then_some(shifted as u8)
    })
}

fn to_f64(time: Rational64) -> f64 {
    *time.numer() as f64 / *time.denom() as f64
}

impl Encoder {
    pub fn new(config: &CodecConfig) -> Self {
        Self {
            quantizer: Quantizer::new(config.quantize()),
        }
    }

    /// Encode `events` shifted by `transpose` semitones.
    ///
    /// Returns an empty sequence when no pitch survives the shift.
    pub fn encode(&self, events: &[RawEvent], transpose: i32) -> Vec<Token> {
        let timeline = Timeline::build(events, transpose);
        let times = timeline.time_points();
        let Some(&first) = times.first() else {
            return Vec::new();
        };

        let mut tokens = Vec::new();
        let mut voices: HashMap<u8, i32> = HashMap::new();
        let mut pending_on: BTreeSet<u8> = BTreeSet::new();
        let mut pending_off: BTreeSet<u8> = BTreeSet::new();
        let mut last_emitted = first;

        for (i, t) in times.iter().enumerate() {
            if let Some(ending) = timeline.ends.get(t) {
                for &p in ending {
                    let count = voices.entry(p).or_insert(0);
                    *count -= 1;
                    if *count == 0 {
                        pending_off.insert(p);
                    }
                }
            }

            if let Some(starting) = timeline.starts.get(t) {
                for &p in starting {
                    *voices.entry(p).or_insert(0) += 1;
                    pending_on.insert(p);
                }
            }

            pending_off.retain(|p| !pending_on.contains(p));

            let next = times.get(i + 1).copied();
            let dur = match next {
                Some(next) => self.quantizer.quantize(to_f64(next - last_emitted)),
                None => 0.0,
            };
            let is_last = next.is_none();

            if dur > 0.0 || is_last {
                if !pending_on.is_empty() || !pending_off.is_empty() || dur > 0.0 {
                    let on = if is_last {
                        BTreeSet::new()
                    } else {
                        std::mem::take(&mut pending_on)
                    };
                    tokens.push(Token::new(on, std::mem::take(&mut pending_off), dur));
                    pending_on.clear();
                }
                if let Some(next) = next {
                    last_emitted = next;
                }
            }
        }

        log::debug!(
            "Encoded {} events (transpose {:+}) into {} tokens over {} time points",
            events.len(),
            transpose,
            tokens.len(),
            times.len()
        );
        tokens
    }
}
