//! Integration tests for the token codec
//!
//! Tests the full pipeline: events -> tokens -> notes, and MIDI files through
//! the reader and writer.

use midi_tokens::{
    decode, decode_tokens, encode, encode_source, quantize, CodecConfig, Metadata, MidiFileReader,
    MidiFileWriter, NoteInterval, RawEvent, ScoreReader, ScoreWriter, Token, TokenDocument,
};
use num_rational::Rational64;

fn q(numer: i64, denom: i64) -> Rational64 {
    Rational64::new(numer, denom)
}

fn ev(offset: Rational64, duration: Rational64, pitches: &[u8]) -> RawEvent {
    RawEvent::new(offset, duration, pitches.to_vec())
}

fn to_f64(r: Rational64) -> f64 {
    *r.numer() as f64 / *r.denom() as f64
}

fn texts(tokens: &[Token]) -> Vec<String> {
    tokens.iter().map(|t| t.to_string()).collect()
}

/// (pitch, start, duration) sorted for set comparison
fn interval_set(notes: &[NoteInterval]) -> Vec<(u8, f64, f64)> {
    let mut set: Vec<(u8, f64, f64)> = notes
        .iter()
        .map(|n| (n.pitch, n.start, n.duration))
        .collect();
    set.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));
    set
}

#[test]
fn test_round_trip_without_shared_pitches() {
    // Melody over a bass line, with a triplet figure and a rest
    let third = q(1, 3);
    let events = vec![
        ev(q(0, 1), q(1, 1), &[60]),
        ev(q(1, 1), third, &[62]),
        ev(q(4, 3), third, &[64]),
        ev(q(5, 3), third, &[65]),
        ev(q(3, 1), q(1, 2), &[67]),
        ev(q(0, 1), q(2, 1), &[48]),
        ev(q(2, 1), q(2, 1), &[43]),
    ];

    let tokens = encode(&events, 0);
    let decoded = decode(&texts(&tokens));
    assert!(decoded.errors.is_empty());

    let expected: Vec<(u8, f64, f64)> = {
        let mut set: Vec<(u8, f64, f64)> = events
            .iter()
            .map(|e| (e.pitches[0], to_f64(e.offset), to_f64(e.duration)))
            .collect();
        set.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));
        set
    };
    let actual = interval_set(&decoded.notes);

    assert_eq!(actual.len(), expected.len());
    for (got, want) in actual.iter().zip(&expected) {
        assert_eq!(got.0, want.0);
        // Start times accumulate 3-decimal durations
        assert!((got.1 - want.1).abs() < 0.01, "start {:?} vs {:?}", got, want);
        assert!((got.2 - quantize(want.2)).abs() < 0.01, "duration {:?} vs {:?}", got, want);
        assert!(got.2 <= 8.0);
    }
}

#[test]
fn test_contiguous_repeated_note_decodes_to_two_notes() {
    let events = vec![ev(q(0, 1), q(1, 1), &[60]), ev(q(1, 1), q(1, 1), &[60])];
    let tokens = texts(&encode(&events, 0));

    // No OFF/ON pair at the shared instant
    assert_eq!(tokens[1], "ON=60;OFF=_;DUR=1.000");
    assert!(tokens.iter().filter(|t| t.contains("OFF=60")).count() == 1);

    let decoded = decode(&tokens);
    assert_eq!(interval_set(&decoded.notes), vec![(60, 0.0, 1.0), (60, 1.0, 1.0)]);
}

#[test]
fn test_unison_instances_merge_into_one_note() {
    // Two copies of the same pitch starting together sustain as one note
    let events = vec![ev(q(0, 1), q(1, 1), &[60]), ev(q(0, 1), q(2, 1), &[60])];
    let tokens = texts(&encode(&events, 0));
    assert_eq!(
        tokens,
        vec!["ON=60;OFF=_;DUR=1.000", "ON=_;OFF=_;DUR=1.000", "ON=_;OFF=60;DUR=0.000"]
    );

    let decoded = decode(&tokens);
    assert_eq!(interval_set(&decoded.notes), vec![(60, 0.0, 2.0)]);
}

#[test]
fn test_ending_and_restarting_pitch_never_in_off() {
    // A chord's C ends exactly as a new C starts, together with other changes
    let events = vec![
        ev(q(0, 1), q(1, 1), &[60, 64]),
        ev(q(1, 1), q(1, 1), &[60, 67]),
    ];
    for token in encode(&events, 0).iter().take(2) {
        assert!(!token.off().contains(&60), "60 in OFF of {}", token);
    }
    let tokens = texts(&encode(&events, 0));
    assert_eq!(tokens[1], "ON=60,67;OFF=64;DUR=1.000");
}

#[test]
fn test_malformed_token_mid_sequence_keeps_clock() {
    let tokens = vec![
        "ON=60;OFF=_;DUR=0.500",
        "ON=200;OFF=_;DUR=abc",
        "ON=64;OFF=60;DUR=0.500",
        "ON=_;OFF=64;DUR=0.000",
    ];
    let decoded = decode(&tokens);
    assert_eq!(decoded.errors.len(), 1);
    assert!(decoded.errors[0].to_string().contains("#1"));
    assert_eq!(interval_set(&decoded.notes), vec![(60, 0.0, 0.5), (64, 0.5, 0.5)]);
}

#[test]
fn test_midi_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let original = dir.path().join("original.mid");
    let rebuilt = dir.path().join("rebuilt.mid");

    let notes = vec![
        NoteInterval { pitch: 48, start: 0.0, duration: 2.0 },
        NoteInterval { pitch: 60, start: 0.0, duration: 1.0 },
        NoteInterval { pitch: 64, start: 1.0, duration: 0.5 },
        NoteInterval { pitch: 67, start: 1.5, duration: 0.5 },
    ];
    MidiFileWriter::default().write(96, &notes, &original).unwrap();

    let encoded = encode_source(&MidiFileReader, &original, false);
    assert_eq!(encoded.len(), 1);
    let (tokens, metadata) = &encoded[0];
    assert_eq!(metadata.tempo, 96);
    assert_eq!(
        texts(tokens),
        vec![
            "ON=48,60;OFF=_;DUR=1.000",
            "ON=64;OFF=60;DUR=0.500",
            "ON=67;OFF=64;DUR=0.500",
            "ON=_;OFF=48,67;DUR=0.000",
        ]
    );

    // Through the on-disk document and back to MIDI
    let text = TokenDocument::new(*metadata, tokens).to_string();
    let document = TokenDocument::parse(&text).unwrap();
    let decoded = decode_tokens(
        &document.tokens,
        &document.metadata,
        &rebuilt,
        &MidiFileWriter::default(),
        &CodecConfig::default(),
    )
    .unwrap();
    assert!(decoded.errors.is_empty());

    let score = MidiFileReader.read(&rebuilt).unwrap();
    assert_eq!(score.tempo, Some(96));
    let reencoded = encode_source(&MidiFileReader, &rebuilt, false);
    assert_eq!(reencoded[0].0, *tokens);
}

#[test]
fn test_augmented_midi_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("high.mid");
    let notes = vec![
        NoteInterval { pitch: 72, start: 0.0, duration: 1.0 },
        NoteInterval { pitch: 74, start: 1.0, duration: 1.0 },
        NoteInterval { pitch: 72, start: 2.0, duration: 1.0 },
    ];
    MidiFileWriter::default().write(120, &notes, &path).unwrap();

    // Median 72 -> window -11..=0, the original key last
    let encoded = encode_source(&MidiFileReader, &path, true);
    assert_eq!(encoded.len(), 12);
    assert_eq!(encoded[0].0[0].to_string(), "ON=61;OFF=_;DUR=1.000");
    assert_eq!(encoded[11].0[0].to_string(), "ON=72;OFF=_;DUR=1.000");
    assert!(encoded.iter().all(|(_, m)| *m == Metadata { tempo: 120 }));
}

#[test]
fn test_unreadable_source_gives_empty_result() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("not_midi.mid");
    std::fs::write(&path, b"definitely not a midi file").unwrap();
    assert!(encode_source(&MidiFileReader, &path, false).is_empty());
    assert!(encode_source(&MidiFileReader, &path, true).is_empty());
}

#[test]
fn test_decode_far_onset_reports_write_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("far.mid");
    let config = CodecConfig::default();

    // Parses cleanly, but the onset is past the largest MIDI tick delta
    let far = [
        "ON=_;OFF=_;DUR=600000.000",
        "ON=60;OFF=_;DUR=1.000",
        "ON=_;OFF=60;DUR=0.000",
    ];
    let writer = MidiFileWriter::default();
    let result = decode_tokens(&far, &Metadata::default(), &path, &writer, &config);
    assert!(matches!(result, Err(midi_tokens::CodecError::Write { .. })));

    let huge = ["ON=_;OFF=_;DUR=1e10", "ON=60;OFF=_;DUR=1.000"];
    let result = decode_tokens(&huge, &Metadata::default(), &path, &writer, &config);
    assert!(matches!(result, Err(midi_tokens::CodecError::Write { .. })));
}
