//! Delimited tabular input: one key column and one numeric value column.

use crate::error::{Error, Result};
use csv::ReaderBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabularRow {
    pub key: String,
    pub value: f64,
}

impl TabularRow {
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Where the key and value live in a delimited file.
#[derive(Debug, Clone)]
pub struct TableLayout {
    pub delimiter: u8,
    pub key_column: String,
    pub value_column: String,
}

pub fn load_rows(path: &Path, layout: &TableLayout) -> Result<Vec<TabularRow>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let rows = read_rows(file, layout)?;
    tracing::info!(path = %path.display(), rows = rows.len(), "loaded dataset");
    Ok(rows)
}

/// Parse rows from any reader. Rows with an empty key, an empty value or a `NaN`
/// value are skipped; any other value that is not a finite number is an error
/// naming the row (1-based, header excluded).
pub fn read_rows<R: Read>(reader: R, layout: &TableLayout) -> Result<Vec<TabularRow>> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(layout.delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    };
    let key_idx = column(&layout.key_column)?;
    let value_idx = column(&layout.value_column)?;

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let key = record.get(key_idx).unwrap_or("");
        if key.is_empty() {
            tracing::debug!(row = i + 1, "skipping row with empty key");
            continue;
        }
        let raw = record.get(value_idx).unwrap_or("");
        let value = match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            // Blank and NaN cells are missing data: the feature stays without a value.
            Ok(v) if v.is_nan() => {
                tracing::warn!(row = i + 1, key, "skipping row with NaN value");
                continue;
            }
            _ if raw.is_empty() => {
                tracing::warn!(row = i + 1, key, "skipping row with empty value");
                continue;
            }
            _ => {
                return Err(Error::NotNumeric {
                    row: i + 1,
                    column: layout.value_column.clone(),
                    value: raw.to_string(),
                })
            }
        };
        rows.push(TabularRow::new(key, value));
    }
    Ok(rows)
}
