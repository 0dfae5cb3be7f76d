//! Begin/complete logging around a unit of work

use std::time::Instant;

use super::logger::Logger;

/// Logs `{name}_BEGIN` on creation and `{name}_COMPLETE` or `{name}_FAILED`
/// when finished. Dropping an unfinished scope logs `{name}_INCOMPLETE`.
pub struct ObservationScope {
    name: &'static str,
    fields: Vec<(&'static str, String)>,
    timer: Timer,
    finished: bool,
}

impl ObservationScope {
    pub fn new(name: &'static str) -> Self {
        Self::with_fields(name, &[])
    }

    pub fn with_fields(name: &'static str, fields: &[(&'static str, &str)]) -> Self {
        Logger::info(&format!("{}_BEGIN", name), fields);
        Self {
            name,
            fields: fields.iter().map(|(k, v)| (*k, v.to_string())).collect(),
            timer: Timer::new(),
            finished: false,
        }
    }

    /// Logs `{name}_COMPLETE` with the scope's fields, any extra fields and
    /// the elapsed time.
    pub fn complete(mut self, extra_fields: &[(&str, &str)]) {
        self.finished = true;
        let elapsed = self.timer.elapsed_ms();
        let mut fields: Vec<(&str, &str)> =
            self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
        fields.extend(extra_fields.iter().copied());
        fields.push(("duration_ms", &elapsed));
        Logger::info(&format!("{}_COMPLETE", self.name), &fields);
    }

    pub fn fail(mut self, reason: &str) {
        self.finished = true;
        let mut fields: Vec<(&str, &str)> =
            self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
        fields.push(("reason", reason));
        Logger::error(&format!("{}_FAILED", self.name), &fields);
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.finished {
            Logger::warn(
                &format!("{}_INCOMPLETE", self.name),
                &[("reason", "scope dropped without completion")],
            );
        }
    }
}

/// Wall-clock duration timer for log fields
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed milliseconds as a string
    pub fn elapsed_ms(&self) -> String {
        self.start.elapsed().as_millis().to_string()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_complete() {
        let scope = ObservationScope::with_fields("TEST", &[("path", "/tmp/seed.json")]);
        assert!(!scope.is_finished());
        scope.complete(&[("stories", "3")]);
    }

    #[test]
    fn test_scope_fail() {
        let scope = ObservationScope::new("TEST");
        scope.fail("seed file missing");
    }

    #[test]
    fn test_scope_drop_without_complete() {
        let scope = ObservationScope::new("TEST");
        drop(scope);
    }

    #[test]
    fn test_timer_elapsed_is_numeric() {
        let timer = Timer::new();
        assert!(timer.elapsed_ms().parse::<u128>().is_ok());
    }
}
