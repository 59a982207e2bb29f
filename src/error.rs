//! Error types for BRIK/HEAD operations

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for BRIK/HEAD operations
#[derive(Error, Debug)]
pub enum BrikError {
    #[error("IO error on {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed attribute header at byte {offset}: {reason}")]
    ParseStructure { offset: usize, reason: String },

    #[error("Unsupported attribute type '{kind}' for {name}")]
    UnsupportedAttributeType { name: String, kind: String },

    #[error("Failed to parse contents for {name}: expected {expected}, found {found}")]
    ValueCountMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Attribute {name} is {found}, expected {expected}")]
    AttributeTypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Missing required attribute: {0}")]
    MissingRequiredAttribute(String),

    #[error("Bricks with different data types are not supported: {0:?}")]
    HeterogeneousBrickTypes(Vec<i64>),

    #[error("Unknown data type (BRICK_TYPES={0})")]
    UnknownBrickType(i64),

    #[error("BRIK size is {actual} bytes but {expected} were expected")]
    SizeMismatch { actual: usize, expected: usize },

    #[error("BRICK_FLOAT_FACS defines {factors} factors for {bricks} sub-bricks")]
    FactorCountExceedsBricks { factors: usize, bricks: usize },

    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Decompression error: {0}")]
    Decompression(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BrikError {
    /// Attach the offending file path to an I/O error
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BrikError::File {
            path: path.into(),
            source,
        }
    }
}

/// Specialized Result type for BRIK/HEAD operations
pub type Result<T> = std::result::Result<T, BrikError>;
