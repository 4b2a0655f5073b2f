//! Worker pool for validating many files concurrently
//!
//! Tasks share no mutable state: each owns its schema and validator.
//! There is no cancellation and no timeout; `run` returns once every task
//! has produced a result.

mod errors;
mod worker;

pub use errors::{PoolError, PoolResult};
pub use worker::{Task, WorkerPool, TASK_FAILURE_RULE};
