//! Structured JSON line logger
//!
//! - One log line = one event
//! - `event` and `severity` first, then `ts`, then fields sorted by key
//! - Synchronous, no buffering
//! - Lines below the process-wide minimum severity are dropped

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Per-request detail
    Debug = 0,
    /// Normal operations
    Info = 1,
    /// Recoverable issues
    Warn = 2,
    /// Operation failures
    Error = 3,
    /// Unrecoverable, process exits
    Fatal = 4,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Severity::Debug,
            1 => Severity::Info,
            2 => Severity::Warn,
            3 => Severity::Error,
            _ => Severity::Fatal,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" | "trace" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warn" | "warning" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            "fatal" => Ok(Severity::Fatal),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

static MIN_SEVERITY: AtomicU8 = AtomicU8::new(Severity::Info as u8);

/// Structured logger writing JSON lines to stdout (stderr for errors)
pub struct Logger;

impl Logger {
    /// Set the process-wide minimum severity
    pub fn set_min_severity(severity: Severity) {
        MIN_SEVERITY.store(severity as u8, Ordering::Relaxed);
    }

    pub fn min_severity() -> Severity {
        Severity::from_u8(MIN_SEVERITY.load(Ordering::Relaxed))
    }

    pub fn enabled(severity: Severity) -> bool {
        severity >= Self::min_severity()
    }

    /// Log an event with the given severity and fields
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if !Self::enabled(severity) {
            return;
        }
        let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let line = Self::render(severity, event, fields, &ts);
        if severity >= Severity::Error {
            Self::write_line(&line, &mut io::stderr());
        } else {
            Self::write_line(&line, &mut io::stdout());
        }
    }

    fn write_line<W: Write>(line: &str, writer: &mut W) {
        // Logging must never fail the caller
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }

    /// Render one log line, newline included
    pub(crate) fn render(severity: Severity, event: &str, fields: &[(&str, &str)], ts: &str) -> String {
        let mut object = Map::new();
        object.insert("event".to_string(), Value::from(event));
        object.insert("severity".to_string(), Value::from(severity.as_str()));
        object.insert("ts".to_string(), Value::from(ts));

        let mut sorted: Vec<_> = fields.iter().collect();
        sorted.sort_by_key(|(k, _)| *k);
        for (key, value) in sorted {
            object.insert((*key).to_string(), Value::from(*value));
        }

        let mut line = Value::Object(object).to_string();
        line.push('\n');
        line
    }

    pub fn debug(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Debug, event, fields);
    }

    pub fn info(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Info, event, fields);
    }

    pub fn warn(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, event, fields);
    }

    pub fn error(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Error, event, fields);
    }

    pub fn fatal(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Fatal, event, fields);
    }
}

#[cfg(test)]
fn capture_log(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    Logger::render(severity, event, fields, "2024-01-01T00:00:00.000Z")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!("info".parse::<Severity>().unwrap(), Severity::Info);
        assert_eq!("WARNING".parse::<Severity>().unwrap(), Severity::Warn);
        assert_eq!("trace".parse::<Severity>().unwrap(), Severity::Debug);
        assert!("loud".parse::<Severity>().is_err());
    }

    #[test]
    fn test_log_json_format() {
        let output = capture_log(Severity::Info, "TEST_EVENT", &[]);

        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["event"], "TEST_EVENT");
        assert_eq!(parsed["severity"], "INFO");
        assert_eq!(parsed["ts"], "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_log_deterministic_ordering() {
        let output1 = capture_log(
            Severity::Info,
            "TEST",
            &[("zebra", "1"), ("apple", "2"), ("mango", "3")],
        );
        let output2 = capture_log(
            Severity::Info,
            "TEST",
            &[("apple", "2"), ("mango", "3"), ("zebra", "1")],
        );

        assert_eq!(output1, output2);

        let apple_pos = output1.find("apple").unwrap();
        let mango_pos = output1.find("mango").unwrap();
        let zebra_pos = output1.find("zebra").unwrap();
        assert!(output1.find("event").unwrap() < apple_pos);
        assert!(apple_pos < mango_pos);
        assert!(mango_pos < zebra_pos);
    }

    #[test]
    fn test_log_escapes_special_chars() {
        let output = capture_log(
            Severity::Warn,
            "TEST",
            &[("search", "say \"hi\"\nand\tleave")],
        );

        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["search"], "say \"hi\"\nand\tleave");
        assert_eq!(output.chars().filter(|c| *c == '\n').count(), 1);
        assert!(output.ends_with('\n'));
    }
}
