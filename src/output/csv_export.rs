//! Tabular export of the record log
//!
//! Each record becomes one CSV row. Nested groups are flattened with
//! `_`-joined keys (`rooms_kitchen_installed`), lists are written as a JSON
//! array string and missing values as `NULL`. The columns come from the
//! record schema itself, so every export has the same header whatever the
//! records contain.

use crate::output::{OutputError, OutputResult};
use crate::record::Record;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Marker written for absent values
pub const NULL_MARKER: &str = "NULL";

/// Converts the JSON-lines record log into a CSV file
///
/// Unreadable lines (such as a torn last line of an interrupted crawl) are
/// skipped with a warning.
///
/// # Arguments
///
/// * `records_path` - The append-only record log
/// * `csv_path` - Destination file, overwritten if present
///
/// # Returns
///
/// * `Ok(usize)` - Number of rows written
/// * `Err(OutputError)` - The log could not be read or the CSV written
pub fn export_csv(records_path: impl AsRef<Path>, csv_path: impl AsRef<Path>) -> OutputResult<usize> {
    let records_path = records_path.as_ref();
    let csv_path = csv_path.as_ref();

    let reader = BufReader::new(File::open(records_path)?);

    if let Some(parent) = csv_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(csv_path)?;

    let header = columns()?;
    writer.write_record(&header)?;

    let mut rows = 0;
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record: Record = match serde_json::from_str(&line) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(
                    "Skipping unreadable line {} of {}: {}",
                    number + 1,
                    records_path.display(),
                    e
                );
                continue;
            }
        };

        writer.write_record(flatten_record(&record)?.into_iter().map(|(_, value)| value))?;
        rows += 1;
    }

    writer.flush()?;
    tracing::info!("Exported {} records to {}", rows, csv_path.display());
    Ok(rows)
}

/// Column names, in schema declaration order
pub fn columns() -> OutputResult<Vec<String>> {
    Ok(flatten_record(&Record::stub(""))?
        .into_iter()
        .map(|(name, _)| name)
        .collect())
}

/// Flattens one record into `(column, cell)` pairs
pub fn flatten_record(record: &Record) -> OutputResult<Vec<(String, String)>> {
    let value = serde_json::to_value(record).map_err(OutputError::Json)?;
    let mut cells = Vec::new();
    flatten_into(&value, None, &mut cells);
    Ok(cells)
}

fn flatten_into(value: &Value, prefix: Option<&str>, cells: &mut Vec<(String, String)>) {
    match value {
        Value::Object(fields) => {
            for (key, field) in fields {
                let name = match prefix {
                    Some(prefix) => format!("{}_{}", prefix, key),
                    None => key.clone(),
                };
                flatten_into(field, Some(&name), cells);
            }
        }
        leaf => cells.push((prefix.unwrap_or_default().to_string(), cell(leaf))),
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => NULL_MARKER.to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
