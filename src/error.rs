use std::io;

use thiserror::Error;

use crate::{Algorithm, Operation};

pub type Result<T, E = BenchError> = std::result::Result<T, E>;

/// Failure of a benchmark run or a report render. Every variant aborts the
/// current entry point.
#[derive(Debug, Error)]
pub enum BenchError {
    /// Invalid trial count, warmup count or algorithm selection.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The signature library refused an operation.
    #[error("{algorithm} {operation} failed: {reason}")]
    CryptoOperation {
        algorithm: Algorithm,
        operation: Operation,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    /// A results table is empty, malformed, or lacks an expected group.
    #[error("data integrity: {0}")]
    DataIntegrity(String),
}

impl BenchError {
    pub(crate) fn crypto(
        algorithm: Algorithm,
        operation: Operation,
        reason: impl ToString,
    ) -> Self {
        BenchError::CryptoOperation {
            algorithm,
            operation,
            reason: reason.to_string(),
        }
    }
}
