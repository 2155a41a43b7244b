//! Error taxonomy for the two-pass conversion core (spec.md §7).

use thiserror::Error;

/// A line/column pair attached to errors that can point at a specific
/// place in the input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub col: usize,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.col)
    }
}

impl From<(usize, usize)> for Location {
    fn from((line, col): (usize, usize)) -> Self {
        Location { line, col }
    }
}

/// Errors the conversion core can raise internally. `InflateFailed` never
/// reaches this enum: a failed inflate-init is always treated as "this
/// isn't gzip" and the decompressor falls back to pass-through (§4.1).
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("unsupported document format")]
    UnsupportedFormat,

    #[error("malformed XML stream at {location}: {source}")]
    MalformedStream {
        #[source]
        source: quick_xml::Error,
        location: Location,
    },

    #[error("parser appears stuck at {0}, no forward progress after an error")]
    Stuck(Location),

    #[error("document structure could not be repaired at {location}: {message}")]
    UnexpectedStructure { message: String, location: Location },

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl From<quick_xml::Error> for ConvertError {
    fn from(source: quick_xml::Error) -> Self {
        ConvertError::MalformedStream {
            source,
            location: Location { line: 0, col: 0 },
        }
    }
}
