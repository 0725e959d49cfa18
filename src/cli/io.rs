//! JSON line I/O for `serve`
//!
//! - Input: one JSON request per stdin line
//! - Output: one JSON response per stdout line
//! - UTF-8 only

use std::io::{self, Write};

use serde_json::{json, Value as JsonValue};

use super::errors::CliResult;

fn write_line<W: Write>(writer: &mut W, response: &JsonValue) -> CliResult<()> {
    serde_json::to_writer(&mut *writer, response)
        .map_err(|e| super::errors::CliError::io_error(format!("JSON error: {}", e)))?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

pub(crate) fn ok_response(data: JsonValue) -> JsonValue {
    json!({
        "status": "ok",
        "data": data
    })
}

pub(crate) fn error_response(code: &str, message: &str) -> JsonValue {
    json!({
        "status": "error",
        "code": code,
        "message": message
    })
}

/// Write a success response to stdout
pub fn write_response(data: JsonValue) -> CliResult<()> {
    write_line(&mut io::stdout(), &ok_response(data))
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_line(&mut io::stdout(), &error_response(code, message))
}
