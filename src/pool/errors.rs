//! # Pool Errors
//!
//! Registration errors only. Task failures are never pool errors; they
//! become the failing task's own result.

use thiserror::Error;

/// Result type for pool operations
pub type PoolResult<T> = Result<T, PoolError>;

/// Worker pool errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// Task ids must be unique within one run
    #[error("Task \"{0}\" is already registered")]
    DuplicateTask(String),

    /// At least one worker is required
    #[error("Worker count must be at least 1, got {0}")]
    InvalidWorkerCount(usize),
}

impl PoolError {
    /// Returns the string code of this error
    pub fn code(&self) -> &'static str {
        match self {
            PoolError::DuplicateTask(_) => "CSV_POOL_DUPLICATE_TASK",
            PoolError::InvalidWorkerCount(_) => "CSV_POOL_INVALID_WORKER_COUNT",
        }
    }
}
