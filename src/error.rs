//! Error types for metadiff operations.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for reconciliation and overlay operations.
#[derive(Debug, Error)]
pub enum MetadiffError {
    /// Bad or absent columns, duplicate or empty sample keys.
    #[error("schema error: {0}")]
    Schema(String),

    /// A cell that should hold a number but does not parse as one.
    /// The engine never coerces bad data into "no difference".
    #[error("cannot parse {value:?} as a number{}", location(.sample, .column))]
    Format {
        value: String,
        sample: Option<String>,
        column: Option<String>,
    },

    /// A selector matched no samples and is not a known key.
    #[error("{0}")]
    Selection(String),

    /// Lookup of a sample key that is not in the table.
    #[error("no sample named {0:?}")]
    MissingKey(String),

    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid sample pattern.
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl MetadiffError {
    /// Attach sample/column context to a `Format` error raised where only
    /// the raw value was known.
    pub fn with_location(self, sample: &str, column: &str) -> Self {
        match self {
            MetadiffError::Format { value, .. } => MetadiffError::Format {
                value,
                sample: Some(sample.to_string()),
                column: Some(column.to_string()),
            },
            other => other,
        }
    }
}

fn location(sample: &Option<String>, column: &Option<String>) -> String {
    match (sample, column) {
        (Some(s), Some(c)) => format!(" (sample '{s}', column '{c}')"),
        (Some(s), None) => format!(" (sample '{s}')"),
        (None, Some(c)) => format!(" (column '{c}')"),
        (None, None) => String::new(),
    }
}

/// Result type alias for metadiff operations.
pub type Result<T> = std::result::Result<T, MetadiffError>;
