//! JSON output for CLI commands
//!
//! Each command prints exactly one JSON object on stdout. Logs go to
//! stderr so stdout stays machine-readable.

use std::io::{self, Write};

use serde_json::Value;

use super::errors::CliResult;

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_envelope(&serde_json::json!({
        "status": "ok",
        "data": data
    }))
}

/// Write a response for a command that ran but did not succeed
pub fn write_failure(code: &str, data: Value) -> CliResult<()> {
    write_envelope(&serde_json::json!({
        "status": "error",
        "code": code,
        "data": data
    }))
}

fn write_envelope(response: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}
