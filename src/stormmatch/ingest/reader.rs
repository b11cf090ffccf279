//! CSV stream ingestion.
//!
//! Loads a delimited-text file with a header row into an [`EventTable`],
//! applying the stream profile's header renames and inferring field types
//! per cell. Structural problems (unreadable file, missing header) are
//! [`IngestError`]s; malformed cell values degrade to `Null` and never
//! abort the load.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::stormmatch::error::IngestError;
use crate::stormmatch::model::{EventTable, FieldValue, StreamProfile};

/// CSV dialect settings.
#[derive(Debug, Clone)]
pub struct CsvFormat {
    pub delimiter: char,
    pub quote: char,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
        }
    }
}

/// Load an event stream from a CSV file on disk.
pub fn read_csv_file<P: AsRef<Path>>(
    path: P,
    profile: &StreamProfile,
    format: &CsvFormat,
) -> Result<EventTable, IngestError> {
    let path_str = path.as_ref().display().to_string();
    let file = File::open(&path).map_err(|source| IngestError::Io {
        path: path_str.clone(),
        source,
    })?;
    read_csv_table(BufReader::new(file), &path_str, profile, format)
}

/// Load an event stream from any buffered reader.
///
/// `label` names the source in errors and logs (a path for file input).
pub fn read_csv_table<R: BufRead>(
    reader: R,
    label: &str,
    profile: &StreamProfile,
    format: &CsvFormat,
) -> Result<EventTable, IngestError> {
    let mut lines = reader.lines();

    let header_line = match lines.next() {
        Some(Ok(line)) => line,
        Some(Err(source)) => {
            return Err(IngestError::Io {
                path: label.to_string(),
                source,
            });
        }
        None => {
            return Err(IngestError::MissingHeader {
                path: label.to_string(),
            });
        }
    };

    let columns: Vec<String> = parse_csv_fields(&header_line, format)
        .into_iter()
        .map(|h| profile.rename(&h))
        .collect();

    let mut rows: Vec<HashMap<String, FieldValue>> = Vec::new();
    for (line_number, line) in lines.enumerate() {
        let line = line.map_err(|source| IngestError::Io {
            path: label.to_string(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let cells = parse_csv_fields(&line, format);
        if cells.len() != columns.len() {
            log::debug!(
                "{}: line {} has {} cells, header has {} columns",
                label,
                line_number + 2,
                cells.len(),
                columns.len()
            );
        }

        let mut fields = HashMap::with_capacity(columns.len());
        for (i, cell) in cells.iter().enumerate() {
            // Surplus cells beyond the header keep a positional name.
            let name = columns
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("column_{}", i));
            fields.insert(name, FieldValue::from_csv_field(cell));
        }
        // Short rows leave the remaining columns absent.
        for name in columns.iter().skip(cells.len()) {
            fields.insert(name.clone(), FieldValue::Null);
        }
        rows.push(fields);
    }

    log::info!("{}: loaded {} rows for stream '{}'", label, rows.len(), profile.tag);
    Ok(EventTable::from_rows(profile, columns, rows))
}

/// RFC 4180 field splitting: quoted fields may contain the delimiter, and
/// a doubled quote inside a quoted field is a literal quote.
pub fn parse_csv_fields(line: &str, format: &CsvFormat) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            c if c == format.quote => {
                if in_quotes {
                    if chars.peek() == Some(&format.quote) {
                        current.push(format.quote);
                        chars.next();
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            c if c == format.delimiter && !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            c => current.push(c),
        }
    }
    fields.push(current.trim().to_string());

    fields
}
