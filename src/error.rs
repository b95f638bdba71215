//! Error types for the tsclust library.

use thiserror::Error;

/// Main error type for the library.
///
/// Variants fall into three groups: storage failures (the database could not
/// be read), shape failures (the database is internally inconsistent) and
/// invalid parameters (the caller asked for something the database cannot
/// answer). Degenerate computations such as empty subsets or zero totals are
/// not errors and never surface here.
#[derive(Error, Debug)]
pub enum TsclustError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Dataset '{0}' not found")]
    MissingDataset(String),

    #[error("Attribute '{attr}' not found on dataset '{dataset}'")]
    MissingAttribute { dataset: String, attr: String },

    #[error("Unsupported database format: {0}")]
    UnsupportedFormat(String),

    #[error("Storage backend error: {0}")]
    Store(String),

    #[error("Shape mismatch in '{array}': expected {expected}, got {actual}")]
    ShapeMismatch {
        array: String,
        expected: usize,
        actual: usize,
    },

    #[error("Short read from '{array}' at offset {offset}: requested {requested}, got {read}")]
    ShortRead {
        array: String,
        offset: usize,
        requested: usize,
        read: usize,
    },

    #[error("Invalid CSR structure in '{array}': {reason}")]
    InvalidCsr { array: String, reason: String },

    #[error("Epsilon {value} is not on the sweep grid [{min}, {max}] with step {step}")]
    InvalidEpsilon {
        value: f64,
        min: f64,
        max: f64,
        step: f64,
    },

    #[error("Unknown taxonomic rank: {0}")]
    UnknownRank(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl TsclustError {
    /// True for failures caused by the caller's arguments rather than the data.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidEpsilon { .. } | Self::UnknownRank(_) | Self::InvalidParameter(_)
        )
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, TsclustError>;
