use serde_json::{Map, Value};
use std::io;

use super::{find_row_array, flatten_row};

/// Write output as CSV to stdout.
///
/// A result carrying a row array (a loan's amortization schedule) is written
/// as that table; other objects become two-column field/value CSV.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => match find_row_array(result) {
                Some((_, rows)) => write_array_csv(&mut wtr, rows),
                None => write_field_value_csv(&mut wtr, result),
            },
            Some(Value::Array(results)) => write_array_csv(&mut wtr, results),
            _ => write_field_value_csv(&mut wtr, map),
        },
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    if let Err(e) = wtr.flush() {
        log::warn!("failed to flush CSV output: {e}");
    }
}

fn write_field_value_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in flatten_row(map) {
        let _ = wtr.write_record([key.as_str(), &format_csv_value(&val)]);
    }
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = flatten_row(first).into_iter().map(|(k, _)| k).collect();
        let _ = wtr.write_record(&headers);

        for map in arr.iter().filter_map(Value::as_object) {
            let columns = flatten_row(map);
            let row: Vec<String> = headers
                .iter()
                .map(|h| {
                    columns
                        .iter()
                        .find(|(k, _)| k == h)
                        .map(|(_, v)| format_csv_value(v))
                        .unwrap_or_default()
                })
                .collect();
            let _ = wtr.write_record(&row);
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
