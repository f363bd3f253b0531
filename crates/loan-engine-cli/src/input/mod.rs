pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Raw JSON from `--input <file>` or piped stdin; `None` when neither was given.
pub fn read_value(path: Option<&str>) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        log::debug!("reading input from {path}");
        return file::read_json_value(path).map(Some);
    }
    stdin::read_stdin()
}

/// Typed input from `--input <file>` or piped stdin; `None` when neither was given.
pub fn read_input<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        log::debug!("reading input from {path}");
        return file::read_json(path).map(Some);
    }
    match stdin::read_stdin()? {
        Some(data) => Ok(Some(serde_json::from_value(data)?)),
        None => Ok(None),
    }
}
