//! JSON I/O handling for CLI
//!
//! - Output: single JSON object per line on stdout
//! - Success: `{"status": "ok", "data": ...}`
//! - Failure: `{"status": "error", "code": ..., "message": ...}`

use std::io::{self, Read, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::{json, Value};

use super::errors::CliResult;

/// Read a whole document from `path`, or stdin when absent
pub fn read_document(path: Option<&Path>) -> CliResult<String> {
    match path {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut text = String::new();
            io::stdin().lock().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

pub fn success_envelope(data: impl Serialize) -> CliResult<Value> {
    Ok(json!({
        "status": "ok",
        "data": serde_json::to_value(data)?
    }))
}

pub fn error_envelope(code: &str, message: &str) -> Value {
    json!({
        "status": "error",
        "code": code,
        "message": message
    })
}

/// Write a success response to stdout
pub fn write_response(data: impl Serialize) -> CliResult<()> {
    write_line(&success_envelope(data)?)
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_line(&error_envelope(code, message))
}

fn write_line(value: &Value) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}
