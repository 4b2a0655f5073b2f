//! Worker Pool Tests
//!
//! - Results are keyed by task id regardless of completion order
//! - Up to `max_workers` tasks run at once
//! - A failing task never affects its siblings

use std::thread;
use std::time::{Duration, Instant};

use csvaudit::pool::{WorkerPool, TASK_FAILURE_RULE};
use csvaudit::report::{ErrorSuite, ValidationError};
use csvaudit::validator::ValidateError;

// =============================================================================
// Helper Functions
// =============================================================================

const TASK_DELAY: Duration = Duration::from_millis(200);

fn slow_pool(workers: usize) -> WorkerPool {
    let mut pool = WorkerPool::new(workers).unwrap();
    for id in ["a", "b", "c"] {
        pool.add_task(id, move || {
            thread::sleep(TASK_DELAY);
            let mut suite = ErrorSuite::new(id);
            suite.push(ValidationError::new("num_min", "too small", "0:n", 2));
            Ok(suite)
        })
        .unwrap();
    }
    pool
}

// =============================================================================
// Concurrency Tests
// =============================================================================

/// One worker runs tasks back to back, three workers overlap them.
#[test]
fn test_parallel_faster_than_sequential() {
    let started = Instant::now();
    let sequential = slow_pool(1).run();
    let sequential_elapsed = started.elapsed();

    let started = Instant::now();
    let parallel = slow_pool(3).run();
    let parallel_elapsed = started.elapsed();

    assert!(sequential_elapsed >= TASK_DELAY * 3);
    assert!(parallel_elapsed < TASK_DELAY * 3);

    let keys: Vec<&String> = sequential.keys().collect();
    assert_eq!(keys, parallel.keys().collect::<Vec<_>>());
    assert_eq!(keys, ["a", "b", "c"]);
    assert_eq!(sequential, parallel);
}

/// More tasks than workers still all complete.
#[test]
fn test_more_tasks_than_workers() {
    let mut pool = WorkerPool::new(2).unwrap();
    for i in 0..10 {
        let id = format!("file-{}.csv", i);
        let subject = id.clone();
        pool.add_task(id, move || Ok(ErrorSuite::new(subject))).unwrap();
    }
    let results = pool.run();
    assert_eq!(results.len(), 10);
    assert!(results.iter().all(|(id, suite)| suite.subject() == id));
}

// =============================================================================
// Failure Isolation Tests
// =============================================================================

/// Errors and panics become failure suites under their own id.
#[test]
fn test_failures_isolated() {
    let mut pool = WorkerPool::new(2).unwrap();
    pool.add_task("good", || Ok(ErrorSuite::new("good"))).unwrap();
    pool.add_task("missing", || {
        Err(ValidateError::Io {
            path: "missing.csv".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        })
    })
    .unwrap();
    pool.add_task("panics", || panic!("worker exploded")).unwrap();

    let results = pool.run();
    assert_eq!(results.len(), 3);
    assert!(results["good"].is_empty());
    assert_eq!(results["missing"][0].rule(), TASK_FAILURE_RULE);
    assert!(results["missing"][0].message().contains("CSV_VALIDATE_IO"));
    assert_eq!(results["panics"][0].rule(), TASK_FAILURE_RULE);
    assert!(results["panics"][0].message().contains("worker exploded"));
}

/// An empty pool returns an empty map.
#[test]
fn test_empty_pool() {
    let pool = WorkerPool::new(4).unwrap();
    assert!(pool.is_empty());
    assert!(pool.run().is_empty());
}
