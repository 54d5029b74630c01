//! Error types for SVM implementation

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SVMError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("Classification needs at least 2 classes, found {0}")]
    TooFewClasses(usize),

    #[error("Empty problem: a binary sub-problem must contain at least one sample")]
    EmptyProblem,

    #[error("Invalid label: {0}")]
    InvalidLabel(f64),

    #[error("Sparse vector is not terminated by a sentinel node (index -1)")]
    MissingSentinel,

    #[error("Feature indices must be non-negative and strictly increasing (node {position})")]
    UnsortedIndices { position: usize },

    #[error("Duplicate feature index: {0}")]
    DuplicateIndex(usize),

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Empty dataset")]
    EmptyDataset,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, SVMError>;
