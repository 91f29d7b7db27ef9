use midi_tokens::{
    decode_tokens, try_encode_source, CodecConfig, MidiFileReader, MidiFileWriter, TokenDocument,
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

const USAGE: &str = concat!(
    "Usage: midi-tokens encode <input.mid> [output.tokens] [--augment] [--config <file.yaml>]\n",
    "       midi-tokens decode <input.tokens> <output.mid> [--config <file.yaml>]",
);

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();

    // Parse flags
    let mut augment = false;
    let mut config_path: Option<&String> = None;
    let mut positional: Vec<&String> = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--augment" => augment = true,
            "--config" => match iter.next() {
                Some(path) => config_path = Some(path),
                None => usage_error(),
            },
            "-h" | "--help" => {
                println!("{}", USAGE);
                return;
            }
            _ => positional.push(arg),
        }
    }

    let config = match config_path {
        Some(path) => match CodecConfig::load(Path::new(path)) {
            Ok(config) => config,
            Err(e) => fail(&e.to_string()),
        },
        None => CodecConfig::default(),
    };

    match positional.as_slice() {
        [command, input] if command.as_str() == "encode" => {
            run_encode(Path::new(input), None, augment, &config)
        }
        [command, input, output] if command.as_str() == "encode" => {
            run_encode(Path::new(input), Some(Path::new(output)), augment, &config)
        }
        [command, input, output] if command.as_str() == "decode" && !augment => {
            run_decode(Path::new(input), Path::new(output), &config)
        }
        _ => usage_error(),
    }
}

fn run_encode(input: &Path, output: Option<&Path>, augment: bool, config: &CodecConfig) {
    let encoded = match try_encode_source(&MidiFileReader, input, augment, config) {
        Ok(encoded) => encoded,
        Err(e) => fail(&e.to_string()),
    };

    let documents: Vec<TokenDocument> = encoded
        .iter()
        .map(|(tokens, metadata)| TokenDocument::new(*metadata, tokens))
        .collect();

    // Output
    match output {
        Some(path) if augment => {
            for (i, document) in documents.iter().enumerate() {
                let path = variant_path(path, i);
                write_or_fail(&path, &document.to_string());
            }
            eprintln!("Wrote {} variants next to {}", documents.len(), path.display());
        }
        Some(path) => {
            let text = documents.first().map(|d| d.to_string()).unwrap_or_default();
            write_or_fail(path, &text);
            eprintln!("Wrote tokens to {}", path.display());
        }
        None => {
            for document in &documents {
                print!("{}", document);
            }
        }
    }
}

fn run_decode(input: &Path, output: &Path, config: &CodecConfig) {
    let source = match fs::read_to_string(input) {
        Ok(content) => content,
        Err(e) => fail(&format!("Error reading file '{}': {}", input.display(), e)),
    };
    let document = match TokenDocument::parse(&source) {
        Ok(document) => document,
        Err(e) => fail(&e.to_string()),
    };

    let writer = MidiFileWriter::new(config.ticks_per_quarter);
    match decode_tokens(&document.tokens, &document.metadata, output, &writer, config) {
        Ok(decoded) => {
            if !decoded.errors.is_empty() {
                eprintln!("Skipped {} malformed tokens", decoded.errors.len());
            }
            eprintln!("Wrote {} notes to {}", decoded.notes.len(), output.display());
        }
        Err(e) => fail(&e.to_string()),
    }
}

/// `song.tokens` -> `song.3.tokens`
fn variant_path(path: &Path, index: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}.{}.{}", stem, index, ext.to_string_lossy()),
        None => format!("{}.{}", stem, index),
    };
    path.with_file_name(name)
}

fn write_or_fail(path: &Path, content: &str) {
    if let Err(e) = fs::write(path, content) {
        fail(&format!("Error writing to '{}': {}", path.display(), e));
    }
}

fn usage_error() -> ! {
    eprintln!("{}", USAGE);
    process::exit(1);
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    process::exit(1);
}
