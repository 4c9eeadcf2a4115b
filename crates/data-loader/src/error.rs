//! Error types for the data-loader crate.
//!
//! Everything here is fatal for snapshot construction: a dataset that cannot
//! be read as a table, or that lacks one of the required columns, never
//! produces a partially cleaned result.

use thiserror::Error;

/// Errors that can occur while reading and cleaning the interaction dataset
///
/// The `#[derive(Error)]` macro from thiserror implements `std::error::Error`
/// and `Display` from the `#[error(...)]` attributes.
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Input could not be parsed as a table
    #[error("Parse error at line {line}: {reason}")]
    ParseError { line: usize, reason: String },

    /// A row carries more cells than the header declares
    #[error("Expected {expected} fields but found {found} in line {line}")]
    FieldCountMismatch {
        expected: usize,
        found: usize,
        line: usize,
    },

    /// One of UserID, ProdID or Rating is absent from the header
    #[error("Required column missing: {column}")]
    MissingColumn { column: String },

    /// No header row at all
    #[error("Input contains no header row")]
    EmptyInput,
}

impl DataLoadError {
    /// True for the schema/format failures that abort a snapshot build.
    pub fn is_data_error(&self) -> bool {
        !matches!(self, Self::FileNotFound { .. } | Self::IoError(_))
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
