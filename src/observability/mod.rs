//! Observability for storyshelf
//!
//! - Structured JSON line logging with typed event names
//! - Monotonic counters exposed over `/metrics`
//! - Begin/complete scopes for multi-step work
//!
//! ```ignore
//! use storyshelf::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::ConfigLoaded, &[("path", "./storyshelf.json")]);
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::{ObservationScope, Timer};

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event_severity(event), event.as_str(), fields);
}

fn event_severity(event: Event) -> Severity {
    if event.is_fatal() {
        Severity::Fatal
    } else {
        Severity::Info
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    fn render_event(event: Event, fields: &[(&str, &str)]) -> Value {
        let line = Logger::render(
            event_severity(event),
            event.as_str(),
            fields,
            "2024-01-01T00:00:00.000Z",
        );
        serde_json::from_str(&line).unwrap()
    }

    #[test]
    fn test_lifecycle_event_line() {
        let parsed = render_event(Event::ConfigLoaded, &[("path", "/tmp/storyshelf.json")]);

        assert_eq!(parsed["event"], "CONFIG_LOADED");
        assert_eq!(parsed["severity"], "INFO");
        assert_eq!(parsed["path"], "/tmp/storyshelf.json");
        assert_eq!(
            parsed.as_object().unwrap().keys().collect::<Vec<_>>(),
            vec!["event", "severity", "ts", "path"]
        );
    }

    #[test]
    fn test_catalog_failure_logged_as_fatal() {
        let parsed = render_event(Event::CatalogLoadFailed, &[("reason", "missing")]);
        assert_eq!(parsed["event"], "CATALOG_LOAD_FAILED");
        assert_eq!(parsed["severity"], "FATAL");
    }
}
