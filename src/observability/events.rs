//! Observable lifecycle events
//!
//! Events are explicit and typed.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Run configuration loaded
    ConfigLoaded,
    /// Schema file decoded into a tree
    SchemaLoaded,
    /// Preset alias resolved (first use only, later uses are memoized)
    PresetResolved,
    /// Fatal schema problem
    SchemaRejected,

    /// Worker pool dispatch begins
    PoolStart,
    /// Worker pool finished every task
    PoolComplete,
    /// Parallel execution unavailable, running tasks in-process
    PoolSequentialFallback,
    /// A task failed and was converted into a failure suite
    TaskFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SchemaLoaded => "SCHEMA_LOADED",
            Event::PresetResolved => "PRESET_RESOLVED",
            Event::SchemaRejected => "SCHEMA_REJECTED",
            Event::PoolStart => "POOL_BEGIN",
            Event::PoolComplete => "POOL_COMPLETE",
            Event::PoolSequentialFallback => "POOL_SEQUENTIAL_FALLBACK",
            Event::TaskFailed => "TASK_FAILED",
        }
    }

    /// Returns true if this event indicates a failed unit of work
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::SchemaRejected | Event::TaskFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_events() {
        assert!(Event::TaskFailed.is_failure());
        assert!(!Event::PoolStart.is_failure());
    }

    #[test]
    fn test_event_names_are_upper_snake() {
        for event in [Event::ConfigLoaded, Event::PresetResolved, Event::PoolSequentialFallback] {
            assert!(event.as_str().chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }
}
