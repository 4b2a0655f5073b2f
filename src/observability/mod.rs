//! Observability for csvaudit
//!
//! - Structured logging (JSON lines on stderr)
//! - Lifecycle event tracing
//! - Scope-based begin/complete logging
//!
//! Observability is read-only: it never influences validation results.
//!
//! # Usage
//!
//! ```ignore
//! use csvaudit::observability::{Logger, Event, ObservationScope};
//!
//! Logger::info("SCHEMA_LOADED", &[("path", "users.yml")]);
//!
//! let scope = ObservationScope::new("CSV_VALIDATION");
//! // ... do work ...
//! scope.complete();
//! ```

mod events;
mod logger;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use scope::ObservationScope;

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_failure() {
        Severity::Error
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}
