//! Error type shared by every layer of the crate.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::FieldKind;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CbzError>;

#[derive(Debug, Error)]
pub enum CbzError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to open archive {}: {source}", path.display())]
    ArchiveOpen {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("archive entry '{entry}' could not be processed: {source}")]
    Archive {
        entry: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("failed to decode ComicInfo.xml: {reason}")]
    MetadataDecode { reason: Box<str> },

    #[error("failed to encode ComicInfo.xml: {reason}")]
    MetadataEncode { reason: Box<str> },

    #[error("field {field} has unparsable value '{value}' in ComicInfo.xml")]
    InvalidFieldValue { field: String, value: String },

    #[error("failed to decode image '{entry}': {source}")]
    ImageDecode {
        entry: String,
        #[source]
        source: image::ImageError,
    },

    #[error("double-page inference needs at least one page")]
    EmptyPageSequence,

    #[error("invalid value for {field}: '{value}'")]
    Validation { field: String, value: String },

    #[error("field {field} has invalid value '{value}': {reason}")]
    Conversion {
        field: String,
        value: String,
        reason: Box<str>,
    },

    #[error("malformed field assignment '{operand}', expected Name=Value")]
    MalformedAssignment { operand: String },

    #[error("ComicInfo has no field named {field}")]
    UnknownField { field: String },

    #[error("field {field} has unsupported data type: expected {expected}, got {actual}")]
    UnsupportedType {
        field: String,
        expected: FieldKind,
        actual: FieldKind,
    },

    #[error("step #{index} ({step}) failed: {source}")]
    StepFailed {
        index: usize,
        step: String,
        #[source]
        source: Box<CbzError>,
    },

    #[error("transaction on {} failed: {reason}", path.display())]
    Transaction { path: PathBuf, reason: Box<str> },

    #[error("failed updating comic archive '{}': {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: Box<CbzError>,
    },
}

impl CbzError {
    /// Walks through `StepFailed` and `File` wrappers to the error that started it.
    #[must_use]
    pub fn root_cause(&self) -> &CbzError {
        match self {
            Self::StepFailed { source, .. } | Self::File { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub(crate) fn in_file(self, path: impl Into<PathBuf>) -> Self {
        Self::File {
            path: path.into(),
            source: Box::new(self),
        }
    }
}
