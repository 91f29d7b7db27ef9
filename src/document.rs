//! # Token Documents
//!
//! The on-disk form of an encoded piece: newline-delimited tokens, optionally
//! preceded by YAML frontmatter carrying the metadata.
//!
//! ```text
//! ---
//! tempo: 96
//! ---
//! ON=60;OFF=_;DUR=1.000
//! ON=_;OFF=60;DUR=0.000
//! ```
//!
//! Without frontmatter the default tempo (120) applies. Blank lines are
//! ignored. Token lines are kept as text; they are validated when decoded so
//! that a bad line is reported with its index instead of rejecting the file.

use crate::config::DEFAULT_TEMPO;
use crate::error::CodecError;
use crate::token::Token;
use serde::{Deserialize, Serialize};
use std::fmt;

const FRONTMATTER_DELIMITER: &str = "---";

/// Side information travelling with a token sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Metadata {
    /// Beats (quarter notes) per minute
    pub tempo: u16,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            tempo: DEFAULT_TEMPO,
        }
    }
}

/// Raw frontmatter for YAML deserialization
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case")]
struct RawMetadata {
    tempo: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TokenDocument {
    pub metadata: Metadata,
    pub tokens: Vec<String>,
}

impl TokenDocument {
    pub fn new(metadata: Metadata, tokens: &[Token]) -> Self {
        Self {
            metadata,
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn parse(source: &str) -> Result<Self, CodecError> {
        let mut lines = source.lines().peekable();
        while lines.peek().is_some_and(|line| line.trim().is_empty()) {
            lines.next();
        }

        let mut metadata = Metadata::default();
        if lines.peek().map(|line| line.trim()) == Some(FRONTMATTER_DELIMITER) {
            lines.next();
            let mut yaml = String::new();
            let mut closed = false;
            for line in lines.by_ref() {
                if line.trim() == FRONTMATTER_DELIMITER {
                    closed = true;
                    break;
                }
                yaml.push_str(line);
                yaml.push('\n');
            }
            if !closed {
                return Err(CodecError::Metadata(
                    "frontmatter is missing its closing '---'".to_string(),
                ));
            }
            metadata = parse_metadata(&yaml)?;
        }

        let tokens = lines
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self { metadata, tokens })
    }
}

fn parse_metadata(yaml: &str) -> Result<Metadata, CodecError> {
    if yaml.trim().is_empty() {
        return Ok(Metadata::default());
    }
    let raw: RawMetadata =
        serde_yaml::from_str(yaml).map_err(|e| CodecError::Metadata(e.to_string()))?;
    match raw.tempo {
        Some(0) => Err(CodecError::Metadata("tempo must be at least 1".to_string())),
        Some(tempo) => Ok(Metadata { tempo }),
        None => Ok(Metadata::default()),
    }
}

impl fmt::Display for TokenDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let yaml = serde_yaml::to_string(&self.metadata).map_err(|_| fmt::Error)?;
        writeln!(f, "{}", FRONTMATTER_DELIMITER)?;
        write!(f, "{}", yaml)?;
        writeln!(f, "{}", FRONTMATTER_DELIMITER)?;
        for token in &self.tokens {
            writeln!(f, "{}", token)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_frontmatter() {
        let source = r#"---
tempo: 96
---
ON=60;OFF=_;DUR=1.000

ON=_;OFF=60;DUR=0.000
"#;
        let doc = TokenDocument::parse(source).unwrap();
        assert_eq!(doc.metadata.tempo, 96);
        assert_eq!(doc.tokens, vec!["ON=60;OFF=_;DUR=1.000", "ON=_;OFF=60;DUR=0.000"]);
    }

    #[test]
    fn test_parse_without_frontmatter() {
        let doc = TokenDocument::parse("ON=60;OFF=_;DUR=1.000\n").unwrap();
        assert_eq!(doc.metadata, Metadata::default());
        assert_eq!(doc.metadata.tempo, 120);
        assert_eq!(doc.tokens.len(), 1);
    }

    #[test]
    fn test_malformed_tokens_kept_as_text() {
        let doc = TokenDocument::parse("ON=60;OFF=_;DUR=abc\n").unwrap();
        assert_eq!(doc.tokens, vec!["ON=60;OFF=_;DUR=abc"]);
    }

    #[test]
    fn test_invalid_frontmatter() {
        let result = TokenDocument::parse("---\ntempo: fast\n---\n");
        assert!(matches!(result, Err(CodecError::Metadata(_))));

        let result = TokenDocument::parse("---\ntempo: 0\n---\n");
        assert!(matches!(result, Err(CodecError::Metadata(_))));

        let result = TokenDocument::parse("---\ntempo: 90\nON=60;OFF=_;DUR=1.000\n");
        if let Err(CodecError::Metadata(message)) = result {
            assert!(message.contains("closing"));
        } else {
            panic!("Expected Metadata error but got: {:?}", result);
        }
    }

    #[test]
    fn test_display_then_parse() {
        let tokens: Vec<Token> = ["ON=60,64;OFF=_;DUR=0.500", "ON=_;OFF=60,64;DUR=0.000"]
            .iter()
            .map(|t| t.parse().unwrap())
            .collect();
        let doc = TokenDocument::new(Metadata { tempo: 72 }, &tokens);
        let text = doc.to_string();
        assert!(text.starts_with("---\ntempo: 72\n---\n"));
        assert_eq!(TokenDocument::parse(&text).unwrap(), doc);
    }

    #[test]
    fn test_frontmatter_is_metadata_yaml() {
        let doc = TokenDocument::new(Metadata { tempo: 140 }, &[]);
        let text = doc.to_string();
        let frontmatter = text
            .strip_prefix("---\n")
            .and_then(|rest| rest.strip_suffix("---\n"))
            .unwrap();
        let metadata: Metadata = serde_yaml::from_str(frontmatter).unwrap();
        assert_eq!(metadata, Metadata { tempo: 140 });
        assert_eq!(frontmatter, "tempo: 140\n");
    }
}
