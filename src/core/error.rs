//! Error types shared by the decompositions, the SMO solver and RANSAC

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Matrix is singular")]
    SingularMatrix,

    #[error("Matrix is not symmetric positive definite")]
    NotPositiveDefinite,

    #[error("Matrix is rank deficient: rank {rank}, required {required}")]
    RankDeficient { rank: usize, required: usize },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Iteration did not converge after {iterations} iterations")]
    ConvergenceFailure { iterations: usize },

    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid label: expected -1 or +1, got {0}")]
    InvalidLabel(f64),

    #[error("Empty dataset")]
    EmptyDataset,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, Error>;
