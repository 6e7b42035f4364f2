//! Turns the raw member export into canonical user records

use crate::field_schema::{
    column_field, custom_field, multi_valued_fields, CUSTOM_FIELDS_COLUMN, CUSTOM_FIELD_SEPARATOR,
};
use crate::user_record::{FieldValue, UserRecord};
use std::fmt;
use tracing::debug;

/// Raw export row, position-addressed by the header row
pub type RawRow = Vec<String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// The export had no header row
    MissingHeader,
    /// A data row's cell count differs from the header's
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },
    /// The export text is not readable as CSV
    Csv(String),
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeError::MissingHeader => write!(f, "Export has no header row"),
            ShapeError::RowLength {
                row,
                expected,
                found,
            } => write!(f, "Row {row} has {found} cells, header has {expected}"),
            ShapeError::Csv(msg) => write!(f, "Unreadable export: {msg}"),
        }
    }
}

impl std::error::Error for ShapeError {}

/// Split export text into rows, header first
pub fn parse_csv(text: &str) -> Result<Vec<RawRow>, ShapeError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(str::to_string).collect::<RawRow>())
                .map_err(|e| ShapeError::Csv(e.to_string()))
        })
        .collect()
}

/// Build one record per data row.
///
/// `rows[0]` is the header. Segment `i` of the `custom_fields` cell belongs to
/// `custom_labels[i]`; missing segments read as empty strings. Columns and
/// labels without a canonical field are dropped.
pub fn parse(rows: &[RawRow], custom_labels: &[String]) -> Result<Vec<UserRecord>, ShapeError> {
    let (header, data) = rows.split_first().ok_or(ShapeError::MissingHeader)?;

    let mut records = Vec::with_capacity(data.len());
    for (index, row) in data.iter().enumerate() {
        if row.len() != header.len() {
            return Err(ShapeError::RowLength {
                row: index + 1,
                expected: header.len(),
                found: row.len(),
            });
        }
        records.push(parse_row(header, row, custom_labels));
    }

    debug!(
        "Parsed {} records from {} columns and {} custom labels",
        records.len(),
        header.len(),
        custom_labels.len()
    );
    Ok(records)
}

fn parse_row(header: &[String], row: &[String], custom_labels: &[String]) -> UserRecord {
    let mut record = UserRecord::new();

    for (name, cell) in header.iter().zip(row) {
        if name == CUSTOM_FIELDS_COLUMN {
            let segments: Vec<&str> = cell.split(CUSTOM_FIELD_SEPARATOR).collect();
            for (position, label) in custom_labels.iter().enumerate() {
                if let Some(field) = custom_field(label) {
                    let value = segments.get(position).copied().unwrap_or_default();
                    record.set(field, value);
                }
            }
        } else if let Some(field) = column_field(name) {
            record.set(field, cell.as_str());
        }
    }

    for field in multi_valued_fields() {
        let raw = record.remove(field);
        let items = match raw {
            Some(FieldValue::Text(text)) => split_list(&text),
            Some(FieldValue::List(items)) => items,
            None => Vec::new(),
        };
        record.set(field, items);
    }

    record
}

/// Comma-separated list with every element trimmed. Blank input and blank
/// elements (as in `"a,,b"`) produce no entries.
pub fn split_list(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
