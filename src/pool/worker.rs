//! Bounded worker pool over rayon
//!
//! Tasks are registered under unique ids and all dispatched by [`WorkerPool::run`],
//! which blocks until every task has produced a result. A task that returns
//! an error or panics yields a failure suite under its own id; no other task
//! sees it.
//!
//! With one worker, or when a thread pool cannot be built, tasks run
//! in-process one after another, in registration order.

use std::any::Any;
use std::collections::{BTreeMap, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;

use rayon::ThreadPoolBuilder;

use super::errors::{PoolError, PoolResult};
use crate::observability::{log_event_with_fields, Event};
use crate::report::ErrorSuite;
use crate::validator::ValidateError;

/// Rule code of the synthetic error in a failed task's suite.
pub const TASK_FAILURE_RULE: &str = "task.failure";

/// A unit of work producing exactly one suite.
pub type Task = Box<dyn FnOnce() -> Result<ErrorSuite, ValidateError> + Send>;

pub struct WorkerPool {
    max_workers: usize,
    ids: HashSet<String>,
    tasks: Vec<(String, Task)>,
}

impl WorkerPool {
    pub fn new(max_workers: usize) -> PoolResult<Self> {
        if max_workers == 0 {
            return Err(PoolError::InvalidWorkerCount(max_workers));
        }
        Ok(Self {
            max_workers,
            ids: HashSet::new(),
            tasks: Vec::new(),
        })
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Registers a task under a unique id.
    pub fn add_task<F>(&mut self, id: impl Into<String>, task: F) -> PoolResult<()>
    where
        F: FnOnce() -> Result<ErrorSuite, ValidateError> + Send + 'static,
    {
        let id = id.into();
        if !self.ids.insert(id.clone()) {
            return Err(PoolError::DuplicateTask(id));
        }
        self.tasks.push((id, Box::new(task)));
        Ok(())
    }

    /// Runs every task and returns the results keyed by task id.
    pub fn run(self) -> BTreeMap<String, ErrorSuite> {
        let total = self.tasks.len().to_string();
        let workers = self.max_workers.to_string();
        log_event_with_fields(
            Event::PoolStart,
            &[("tasks", total.as_str()), ("workers", workers.as_str())],
        );

        let results = if self.max_workers == 1 || self.tasks.len() <= 1 {
            run_sequential(self.tasks)
        } else {
            match ThreadPoolBuilder::new().num_threads(self.max_workers).build() {
                Ok(pool) => {
                    let (sender, receiver) = mpsc::channel();
                    pool.scope(move |scope| {
                        for (id, task) in self.tasks {
                            let sender = sender.clone();
                            scope.spawn(move |_| {
                                let suite = execute(&id, task);
                                // The receiver outlives the scope
                                let _ = sender.send((id, suite));
                            });
                        }
                    });
                    receiver.into_iter().collect()
                }
                Err(e) => {
                    log_event_with_fields(
                        Event::PoolSequentialFallback,
                        &[("reason", e.to_string().as_str())],
                    );
                    run_sequential(self.tasks)
                }
            }
        };

        log_event_with_fields(Event::PoolComplete, &[("tasks", total.as_str())]);
        results
    }
}

fn run_sequential(tasks: Vec<(String, Task)>) -> BTreeMap<String, ErrorSuite> {
    tasks
        .into_iter()
        .map(|(id, task)| {
            let suite = execute(&id, task);
            (id, suite)
        })
        .collect()
}

/// Runs one task, converting errors and panics into a failure suite.
fn execute(id: &str, task: Task) -> ErrorSuite {
    let message = match catch_unwind(AssertUnwindSafe(task)) {
        Ok(Ok(suite)) => return suite,
        Ok(Err(e)) => format!("{}: {}", e.code(), e),
        Err(payload) => format!("Task panicked: {}", panic_message(payload.as_ref())),
    };
    log_event_with_fields(
        Event::TaskFailed,
        &[("task", id), ("reason", message.as_str())],
    );
    ErrorSuite::failure(id, TASK_FAILURE_RULE, message)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ValidationError;

    fn suite_with(subject: &str, errors: usize) -> ErrorSuite {
        let mut suite = ErrorSuite::new(subject);
        for i in 0..errors {
            suite.push(ValidationError::new("num_min", "too small", "0:n", i as u64 + 2));
        }
        suite
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert_eq!(
            WorkerPool::new(0).err(),
            Some(PoolError::InvalidWorkerCount(0))
        );
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut pool = WorkerPool::new(2).unwrap();
        pool.add_task("a", || Ok(ErrorSuite::new("a"))).unwrap();
        let err = pool.add_task("a", || Ok(ErrorSuite::new("a"))).unwrap_err();
        assert_eq!(err.code(), "CSV_POOL_DUPLICATE_TASK");
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_results_keyed_by_id() {
        for workers in [1, 4] {
            let mut pool = WorkerPool::new(workers).unwrap();
            for (id, errors) in [("a.csv", 0), ("b.csv", 2), ("c.csv", 1)] {
                pool.add_task(id, move || Ok(suite_with(id, errors))).unwrap();
            }
            let results = pool.run();
            assert_eq!(results.len(), 3);
            assert_eq!(results["a.csv"].count(), 0);
            assert_eq!(results["b.csv"].count(), 2);
            assert_eq!(results["c.csv"].subject(), "c.csv");
        }
    }

    #[test]
    fn test_failures_isolated() {
        let mut pool = WorkerPool::new(3).unwrap();
        pool.add_task("ok", || Ok(suite_with("ok", 0))).unwrap();
        pool.add_task("err", || {
            Err(ValidateError::Encoding {
                path: "err.csv".into(),
                encoding: "utf-8".into(),
            })
        })
        .unwrap();
        pool.add_task("panic", || panic!("boom")).unwrap();

        let results = pool.run();
        assert!(results["ok"].is_empty());

        assert_eq!(results["err"].count(), 1);
        assert_eq!(results["err"][0].rule(), TASK_FAILURE_RULE);
        assert!(results["err"][0].message().contains("CSV_VALIDATE_ENCODING"));

        assert_eq!(results["panic"].count(), 1);
        assert!(results["panic"][0].message().contains("boom"));
    }
}
