//! Observability subsystem
//!
//! - Structured logging (JSON lines on stderr)
//! - Per-store counters
//! - Begin/complete scopes around store operations
//!
//! Observability never changes what an operation does or returns.
//!
//! ```ignore
//! use dynadown::observability::{log_event_with_fields, Event, ObservationScope};
//!
//! log_event_with_fields(Event::StoreOpen, &[("location", "records$!")]);
//!
//! let scope = ObservationScope::new("BATCH");
//! // ... do work ...
//! scope.complete();
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::ObservationScope;

/// Log a typed event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a typed event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
