use serde_json::Value;
use std::error::Error;
use std::io::{self, Read};

/// Loan inputs piped on stdin; `None` when stdin is a terminal or carries
/// nothing but whitespace.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn Error>> {
    if atty::is(atty::Stream::Stdin) {
        log::debug!("stdin is a terminal, falling back to flags");
        return Ok(None);
    }
    read_payload(io::stdin().lock())
}

fn read_payload<R: Read>(mut reader: R) -> Result<Option<Value>, Box<dyn Error>> {
    let mut raw = String::new();
    reader.read_to_string(&mut raw)?;
    parse_payload(&raw)
}

/// A single JSON object (one calculation) or array (scenarios to compare).
fn parse_payload(raw: &str) -> Result<Option<Value>, Box<dyn Error>> {
    let body = raw.trim_start_matches('\u{feff}').trim();
    if body.is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(body).map_err(|e| {
        format!(
            "stdin is not valid JSON (line {}, column {}): {e}",
            e.line(),
            e.column()
        )
    })?;

    match value {
        Value::Object(_) | Value::Array(_) => {
            log::debug!("read {} bytes of JSON input from stdin", body.len());
            Ok(Some(value))
        }
        other => Err(format!("stdin must hold a JSON object or array, got {other}").into()),
    }
}
