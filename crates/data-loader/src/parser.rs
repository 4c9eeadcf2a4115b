//! Parser for the comma-separated interaction dataset.
//!
//! The export format is plain CSV with a header row:
//! - fields separated by `,`
//! - fields optionally wrapped in `"`; a doubled `""` inside a quoted field is a literal quote
//! - quoted fields may span several physical lines (product descriptions often do)
//! - `\n` or `\r\n` line endings
//!
//! Parsing only produces untyped cells (`RawTable`); numeric coercion and
//! validation belong to the cleaner.

use crate::error::{DataLoadError, Result};
use crate::types::RawTable;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Read a CSV file from disk into a `RawTable`
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected; the
/// dataset mixes encodings in free-text columns.
pub fn read_table(path: &Path) -> Result<RawTable> {
    if !path.exists() {
        return Err(DataLoadError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let mut file = File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let content = String::from_utf8_lossy(&bytes);
    let table = parse_csv(&content)?;

    debug!(
        "Read {} rows x {} columns from {}",
        table.len(),
        table.headers.len(),
        path.display()
    );
    Ok(table)
}

/// Parse CSV text into a `RawTable`
///
/// Blank lines are skipped. Rows shorter than the header are padded with
/// empty cells (which the cleaner treats as missing); rows longer than the
/// header are rejected.
pub fn parse_csv(text: &str) -> Result<RawTable> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut records = split_records(text)?.into_iter();

    let (_, headers) = records.next().ok_or(DataLoadError::EmptyInput)?;
    let mut table = RawTable::new(headers);
    let width = table.headers.len();

    for (line, mut row) in records {
        if row.len() > width {
            return Err(DataLoadError::FieldCountMismatch {
                expected: width,
                found: row.len(),
                line,
            });
        }
        row.resize(width, String::new());
        table.push_row(row);
    }

    Ok(table)
}

/// Split text into records, each tagged with the line it starts on
fn split_records(text: &str) -> Result<Vec<(usize, Vec<String>)>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                push_record(&mut records, std::mem::take(&mut record), record_line);
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(DataLoadError::ParseError {
            line: record_line,
            reason: "unterminated quoted field".to_string(),
        });
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        push_record(&mut records, record, record_line);
    }

    Ok(records)
}

fn push_record(records: &mut Vec<(usize, Vec<String>)>, record: Vec<String>, line: usize) {
    // A blank line parses as a single empty field
    if record.len() == 1 && record[0].is_empty() {
        return;
    }
    records.push((line, record));
}
