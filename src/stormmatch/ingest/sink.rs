//! CSV persistence of the joined table.
//!
//! Serializes the assembled (optionally normalized) table as delimited
//! text with a header row. Absent values serialize as empty cells; fields
//! containing the delimiter, a quote, or a newline are quoted with
//! doubled-quote escaping.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::stormmatch::correlate::assembler::JoinedTable;
use crate::stormmatch::error::IngestError;
use crate::stormmatch::ingest::reader::CsvFormat;
use crate::stormmatch::model::FieldValue;

/// Write the joined table to a CSV file on disk.
pub fn write_csv_file<P: AsRef<Path>>(
    path: P,
    table: &JoinedTable,
    format: &CsvFormat,
) -> Result<(), IngestError> {
    let path_str = path.as_ref().display().to_string();
    let file = File::create(&path).map_err(|source| IngestError::WriteFailed {
        path: path_str.clone(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    write_csv(&mut writer, table, format).map_err(|source| IngestError::WriteFailed {
        path: path_str.clone(),
        source,
    })?;
    log::info!("{}: wrote {} rows", path_str, table.rows.len());
    Ok(())
}

/// Write the joined table to any writer.
pub fn write_csv<W: Write>(
    writer: &mut W,
    table: &JoinedTable,
    format: &CsvFormat,
) -> std::io::Result<()> {
    let header: Vec<String> = table
        .columns
        .iter()
        .map(|c| escape_field(c, format))
        .collect();
    writeln!(writer, "{}", header.join(&format.delimiter.to_string()))?;

    for row in &table.rows {
        let cells: Vec<String> = table
            .columns
            .iter()
            .map(|col| {
                let value = row.fields.get(col).unwrap_or(&FieldValue::Null);
                escape_field(&value.to_string(), format)
            })
            .collect();
        writeln!(writer, "{}", cells.join(&format.delimiter.to_string()))?;
    }
    writer.flush()
}

/// Quote a field when it contains the delimiter, a quote, or a newline.
fn escape_field(field: &str, format: &CsvFormat) -> String {
    if field.contains(format.delimiter) || field.contains(format.quote) || field.contains('\n') {
        let doubled = field.replace(
            format.quote,
            &format!("{}{}", format.quote, format.quote),
        );
        format!("{}{}{}", format.quote, doubled, format.quote)
    } else {
        field.to_string()
    }
}
