//! Error types shared by the reader and writer crates.
//!
//! Read and write failures are terminal for a conversion; [`SkipReason`] is the
//! recoverable, per-feature counterpart that writers report instead of failing.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// A position within the input document.
///
/// Line numbers are 1-based, byte offsets 0-based, record numbers 1-based
/// (the n-th element of the `features` array).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePosition {
    pub line: Option<u64>,
    pub byte_offset: Option<u64>,
    pub record: Option<u64>,
}

impl SourcePosition {
    /// Returns true when the position does not contain any location metadata.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.line.is_none() && self.byte_offset.is_none() && self.record.is_none()
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        if let Some(line) = self.line {
            parts.push(format!("line {line}"));
        }
        if let Some(byte) = self.byte_offset {
            parts.push(format!("byte {byte}"));
        }
        if let Some(record) = self.record {
            parts.push(format!("feature {record}"));
        }

        if parts.is_empty() {
            write!(f, "unknown position")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

/// Errors raised while traversing the input feature sequence.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The underlying reader failed.
    #[error("I/O error while reading {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The bytes are not a well-formed feature collection.
    #[error("Parse error at {position}: {message}")]
    Parse {
        message: String,
        position: SourcePosition,
    },
}

impl ReadError {
    #[must_use]
    pub fn parse(message: impl Into<String>, position: SourcePosition) -> Self {
        Self::Parse {
            message: message.into(),
            position,
        }
    }

    /// Returns `true` when the input itself is at fault.
    #[must_use]
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

/// Result type alias that uses [`ReadError`].
pub type ReadResult<T> = Result<T, ReadError>;

/// Errors that prevent an output container from being produced.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The output could not be created.
    #[error("Failed to create {format} output '{path}': {message}")]
    Create {
        format: &'static str,
        path: PathBuf,
        message: String,
    },

    /// Plain I/O failure on an output file.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The shapefile library rejected a write.
    #[error("Shapefile error on '{path}': {message}")]
    Shapefile { path: PathBuf, message: String },

    /// SQLite rejected a statement outside of a single-row insert.
    #[error("SQLite error on '{path}': {message}")]
    Sqlite { path: PathBuf, message: String },

    /// A geometry could not be encoded.
    #[error("Failed to encode geometry: {0}")]
    Encode(String),

    /// The container could not be completed.
    #[error("Failed to finalize {format} output '{path}': {message}")]
    Finalize {
        format: &'static str,
        path: PathBuf,
        message: String,
    },
}

/// Result type alias that uses [`WriteError`].
pub type WriteResult<T> = Result<T, WriteError>;

/// Why a single feature was excluded from the output.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error("no geometry")]
    MissingGeometry,

    #[error("geometry type {found} does not match target family {target}")]
    GeometryMismatch {
        found: &'static str,
        target: &'static str,
    },

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("value {value} does not fit column '{column}'")]
    ValueOutOfRange { column: String, value: String },

    #[error("record rejected: {0}")]
    RecordRejected(String),
}
