//! Intensity normalization for visualization.
//!
//! Min-max scales configured numeric columns of the joined table into
//! [0, 1], appending a `{column}_scaled` column per input. Absent values
//! stay absent; a column whose present values are all equal scales every
//! present value to 0.5. Runs strictly after assembly and never affects
//! join correctness.

use crate::stormmatch::correlate::assembler::JoinedTable;
use crate::stormmatch::error::ConfigError;
use crate::stormmatch::model::FieldValue;

/// Suffix appended to scaled column names.
pub const SCALED_SUFFIX: &str = "_scaled";

/// Min-max scale one value sequence.
///
/// Non-numeric and `Null` entries stay `Null`. Returns all-`Null` output
/// when no numeric value is present.
pub fn min_max_scale(values: &[FieldValue]) -> Vec<FieldValue> {
    let present: Vec<f64> = values.iter().filter_map(FieldValue::as_f64).collect();
    if present.is_empty() {
        return vec![FieldValue::Null; values.len()];
    }

    let min = present.iter().copied().fold(f64::INFINITY, f64::min);
    let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    values
        .iter()
        .map(|v| match v.as_f64() {
            // All present values equal: midpoint, not a division by zero.
            Some(_) if min == max => FieldValue::Float(0.5),
            Some(x) => FieldValue::Float((x - min) / (max - min)),
            None => FieldValue::Null,
        })
        .collect()
}

/// Append `{column}_scaled` for each configured column.
///
/// A configured column missing from the table yields an all-`Null` scaled
/// column with a warning, mirroring the residual-tolerant data contract.
/// Empty column names are a configuration error, rejected eagerly.
pub fn add_intensity_scales(
    table: &mut JoinedTable,
    columns: &[String],
) -> Result<(), ConfigError> {
    for column in columns {
        if column.is_empty() {
            return Err(ConfigError::EmptyScaleColumn);
        }
    }

    for column in columns {
        let scaled_name = format!("{}{}", column, SCALED_SUFFIX);
        if table.columns.iter().any(|c| c == column) {
            let scaled = min_max_scale(&table.column_values(column));
            table.push_column(&scaled_name, scaled);
        } else {
            log::warn!("scale: column '{}' not found, emitting all-null", column);
            let nulls = vec![FieldValue::Null; table.rows.len()];
            table.push_column(&scaled_name, nulls);
        }
    }
    Ok(())
}
