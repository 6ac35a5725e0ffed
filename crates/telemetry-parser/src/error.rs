//! Parse-time failures (spec §7 "Parser error taxonomy").

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("schema version {found} does not match the parser's expected version {expected}")]
    SchemaVersionMismatch { expected: u32, found: u32 },

    #[error("declared schema hash {declared} does not match the recomputed hash {computed}")]
    SchemaHashMismatch { declared: u64, computed: u64 },

    #[error("malformed schema line {line_number}: {line:?}")]
    MalformedLine { line_number: usize, line: String },

    #[error("expected a \"MSG: <name>\" line after a \"===\" separator, found {line:?}")]
    ExpectedMessageHeader { line: String },

    #[error("buffer overflow decoding field {field_name:?}: needed {needed} bytes, {remaining} left")]
    BufferOverflow { field_name: String, needed: usize, remaining: usize },
}
