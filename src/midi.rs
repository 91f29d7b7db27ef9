// MIDI file reading and writing.
//
// MidiFileReader flattens a Standard MIDI File into a Score: notes are paired
// per (track, channel, key) in first-in first-out order, times are kept as
// exact fractions of a quarter note, and notes in one track sharing onset and
// length are grouped into chords. Only metrical (ticks per quarter) timing is
// supported.
//
// MidiFileWriter renders decoded notes as SMF Format 1: a tempo track plus a
// single piano track.
//
// Uses the `midly` crate for parsing and writing.

use crate::error::CodecError;
use crate::score::{NoteInterval, Score, ScoreElement, ScoreReader, ScoreWriter};
use midly::{
    num::{u15, u24, u28, u4, u7},
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};
use num_rational::Rational64;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::Path;

/// Ticks per quarter note in MIDI output unless configured otherwise.
pub const DEFAULT_TICKS_PER_QUARTER: u16 = 480;

/// Velocity of every written note
const NOTE_VELOCITY: u8 = 80;

const MICROSECONDS_PER_MINUTE: u32 = 60_000_000;

#[derive(Debug, Clone, Copy, Default)]
pub struct MidiFileReader;

impl ScoreReader for MidiFileReader {
    fn read(&self, source: &Path) -> Result<Score, CodecError> {
        let read_error = |message: String| CodecError::SourceRead {
            path: source.display().to_string(),
            message,
        };
        let data = std::fs::read(source).map_err(|e| read_error(e.to_string()))?;
        let smf = Smf::parse(&data).map_err(|e| read_error(e.to_string()))?;
        smf_to_score(&smf).map_err(read_error)
    }
}

/// A note waiting for its note-off
struct OpenNote {
    tick: u64,
}

/// Convert a parsed SMF into a flat score.
fn smf_to_score(smf: &Smf) -> Result<Score, String> {
    let ticks_per_quarter = match smf.header.timing {
        Timing::Metrical(tpq) if tpq.as_int() > 0 => tpq.as_int() as i64,
        Timing::Metrical(_) => return Err("ticks per quarter note is zero".to_string()),
        Timing::Timecode(..) => {
            return Err("SMPTE timecode timing is not supported".to_string());
        }
    };
    let to_quarters = |tick: u64| Rational64::new(tick as i64, ticks_per_quarter);

    let mut tempo: Option<(u64, u16)> = None;
    let mut elements = Vec::new();

    for track in &smf.tracks {
        let mut tick: u64 = 0;
        let mut open: HashMap<(u8, u8), VecDeque<OpenNote>> = HashMap::new();
        // (onset, end) -> pitches, so simultaneous equal notes form chords
        let mut grouped: BTreeMap<(u64, u64), Vec<u8>> = BTreeMap::new();

        for event in track {
            tick += event.delta.as_int() as u64;
            match event.kind {
                TrackEventKind::Meta(MetaMessage::Tempo(us_per_quarter)) => {
                    let us = us_per_quarter.as_int().max(1);
                    let bpm = (MICROSECONDS_PER_MINUTE / us).min(u16::MAX as u32) as u16;
                    // Earliest marking wins, across tracks
                    if tempo.map_or(true, |(at, _)| tick < at) {
                        tempo = Some((tick, bpm));
                    }
                }
                TrackEventKind::Midi { channel, message } => {
                    let channel = channel.as_int();
                    match message {
                        MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                            open.entry((channel, key.as_int()))
                                .or_default()
                                .push_back(OpenNote { tick });
                        }
                        MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                            let pitch = key.as_int();
                            if let Some(note) =
                                open.get_mut(&(channel, pitch)).and_then(|q| q.pop_front())
                            {
                                grouped.entry((note.tick, tick)).or_default().push(pitch);
                            }
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        // Notes never released end with their track
        for ((_, pitch), notes) in open {
            for note in notes {
                grouped.entry((note.tick, tick)).or_default().push(pitch);
            }
        }

        for ((start, end), mut pitches) in grouped {
            pitches.sort_unstable();
            pitches.dedup();
            let offset = to_quarters(start);
            let duration = to_quarters(end) - offset;
            let element = if pitches.len() == 1 {
                ScoreElement::Note {
                    offset,
                    duration,
                    pitch: pitches[0],
                }
            } else {
                ScoreElement::Chord {
                    offset,
                    duration,
                    pitches,
                }
            };
            elements.push(element);
        }
    }

    // Stable: per-track order is kept for equal offsets
    elements.sort_by_key(|element| element.offset());

    Ok(Score {
        elements,
        tempo: tempo.map(|(_, bpm)| bpm),
    })
}

#[derive(Debug, Clone, Copy)]
pub struct MidiFileWriter {
    ticks_per_quarter: u16,
}

impl Default for MidiFileWriter {
    fn default() -> Self {
        Self::new(DEFAULT_TICKS_PER_QUARTER)
    }
}

impl MidiFileWriter {
    /// `ticks_per_quarter` must fit in 15 bits; larger values are capped.
    pub fn new(ticks_per_quarter: u16) -> Self {
        Self {
            ticks_per_quarter: ticks_per_quarter.clamp(1, 0x7FFF),
        }
    }
}

impl ScoreWriter for MidiFileWriter {
    fn write(
        &self,
        tempo: u16,
        notes: &[NoteInterval],
        destination: &Path,
    ) -> Result<(), CodecError> {
        let write_error = |message: String| CodecError::Write {
            path: destination.display().to_string(),
            message,
        };
        let smf = notes_to_smf(tempo, notes, self.ticks_per_quarter).map_err(write_error)?;
        let mut buf = Vec::new();
        smf.write(&mut buf).map_err(|e| write_error(e.to_string()))?;
        std::fs::write(destination, &buf).map_err(|e| write_error(e.to_string()))?;
        Ok(())
    }
}

/// Tick of a time in quarter notes; negative times are pinned to zero.
fn quarters_to_tick(quarters: f64, ticks_per_quarter: u16) -> Result<u64, String> {
    let ticks = (quarters.max(0.0) * ticks_per_quarter as f64).round();
    // NaN fails the range check too
    if !(0.0..u64::MAX as f64).contains(&ticks) {
        return Err(format!("time {} is beyond the MIDI time range", quarters));
    }
    Ok(ticks as u64)
}

/// Convert decoded notes to an in-memory SMF.
///
/// Fails when a note time cannot be expressed as a 28-bit tick delta.
fn notes_to_smf(
    tempo: u16,
    notes: &[NoteInterval],
    ticks_per_quarter: u16,
) -> Result<Smf<'static>, String> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(ticks_per_quarter)),
    ));

    // Track 0: tempo track
    let mut tempo_track: Track<'static> = Vec::new();
    // Tempo meta events hold 24 bits
    let us_per_quarter = (MICROSECONDS_PER_MINUTE / tempo.max(1) as u32).min(0xFF_FFFF);
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(us_per_quarter))),
    });
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(tempo_track);

    let channel = u4::new(0);

    // (tick, is_on, pitch): sorting puts note-offs before note-ons on a tick,
    // so a re-attacked pitch is released before it sounds again
    let mut events: Vec<(u64, bool, u8)> = Vec::with_capacity(notes.len() * 2);
    for note in notes {
        let start = quarters_to_tick(note.start, ticks_per_quarter)?;
        let end = quarters_to_tick(note.end(), ticks_per_quarter)?.max(start.saturating_add(1));
        events.push((start, true, note.pitch));
        events.push((end, false, note.pitch));
    }
    events.sort();

    let mut track: Track<'static> = Vec::new();
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TrackName("Piano".as_bytes())),
    });
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Midi {
            channel,
            message: MidiMessage::ProgramChange { program: u7::new(0) },
        },
    });

    let mut last_tick: u64 = 0;
    for (tick, is_on, pitch) in events {
        let delta = u32::try_from(tick - last_tick)
            .ok()
            .and_then(u28::try_from)
            .ok_or_else(|| format!("note at tick {} is beyond the MIDI time range", tick))?;
        let message = if is_on {
            MidiMessage::NoteOn {
                key: u7::new(pitch),
                vel: u7::new(NOTE_VELOCITY),
            }
        } else {
            MidiMessage::NoteOff {
                key: u7::new(pitch),
                vel: u7::new(0),
            }
        };
        track.push(TrackEvent {
            delta,
            kind: TrackEventKind::Midi { channel, message },
        });
        last_tick = tick;
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(track);

    Ok(smf)
}
