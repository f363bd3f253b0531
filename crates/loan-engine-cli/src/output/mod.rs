pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Scalar columns of a row, with nested objects flattened one level as
/// `parent.child`. Arrays are dropped.
pub(crate) fn flatten_row(map: &Map<String, Value>) -> Vec<(String, Value)> {
    let mut columns = Vec::with_capacity(map.len());
    for (key, val) in map {
        match val {
            Value::Array(_) => {}
            Value::Object(inner) => {
                for (child, child_val) in inner {
                    if !child_val.is_array() && !child_val.is_object() {
                        columns.push((format!("{key}.{child}"), child_val.clone()));
                    }
                }
            }
            _ => columns.push((key.clone(), val.clone())),
        }
    }
    columns
}

/// The first field of `map` holding a non-empty array of objects, such as an
/// amortization schedule.
pub(crate) fn find_row_array(map: &Map<String, Value>) -> Option<(&str, &[Value])> {
    map.iter().find_map(|(key, val)| match val {
        Value::Array(rows) if rows.first().is_some_and(Value::is_object) => {
            Some((key.as_str(), rows.as_slice()))
        }
        _ => None,
    })
}
