use std::io::{self, Write};

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::CliError;

/// What a command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Json(Value),
    Text(String),
}

pub fn render(output: &Rendered, compact: bool) -> Result<(), CliError> {
    match output {
        Rendered::Json(value) => write_json(value, compact),
        Rendered::Text(text) => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            if !text.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
            Ok(())
        }
    }
}

/// Failures are reported on stdout as `{"error": ..., "ticker": ...}` so
/// callers parsing JSON always get JSON.
pub fn render_error(error: &CliError, ticker: Option<&str>) -> Result<(), CliError> {
    write_json(&error_body(error, ticker), true)
}

pub fn error_body(error: &CliError, ticker: Option<&str>) -> Value {
    match ticker {
        Some(ticker) => json!({ "error": error.to_string(), "ticker": ticker }),
        None => json!({ "error": error.to_string() }),
    }
}

fn write_json<T: Serialize>(value: &T, compact: bool) -> Result<(), CliError> {
    let payload = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{payload}")?;
    Ok(())
}
