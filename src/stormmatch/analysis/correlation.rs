//! Physical correlation analysis.
//!
//! Compares the satellite energy column against the ground-network peak
//! current column on a log scale: both are clamped away from non-positive
//! input, log10-transformed, and the Pearson and Spearman coefficients
//! are computed over rows where both values are present. Degenerate
//! input (no valid rows, zero variance after transform) is an explicit
//! no-result outcome, never a failure.

use serde::Serialize;

use crate::stormmatch::correlate::assembler::JoinedTable;

/// Lower clamp for the energy column before log10.
pub const ENERGY_LOG_FLOOR: f64 = 1e-16;
/// Lower clamp for the current column before log10.
pub const CURRENT_LOG_FLOOR: f64 = 1e-1;

/// Correlation coefficients over the valid log-transformed sample.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CorrelationReport {
    pub pearson: f64,
    pub spearman: f64,
    /// Rows where both transformed values were present.
    pub sample_count: usize,
}

/// Analyze the joined table's energy/current relationship.
///
/// `use_absolute_current` takes the current's magnitude before the log
/// transform, treating positive and negative peaks as intensity only.
/// Returns `None` when no valid rows remain or when either transformed
/// column has zero variance.
pub fn analyze_physical_correlation(
    table: &JoinedTable,
    energy_column: &str,
    current_column: &str,
    use_absolute_current: bool,
) -> Option<CorrelationReport> {
    if !table.columns.iter().any(|c| c == energy_column)
        || !table.columns.iter().any(|c| c == current_column)
    {
        log::warn!(
            "correlation: columns '{}' and/or '{}' not found",
            energy_column,
            current_column
        );
        return None;
    }

    let energies = table.column_values(energy_column);
    let currents = table.column_values(current_column);

    let mut log_energy = Vec::new();
    let mut log_current = Vec::new();
    for (e, c) in energies.iter().zip(currents.iter()) {
        let (e, c) = match (e.as_f64(), c.as_f64()) {
            (Some(e), Some(c)) => (e, c),
            _ => continue,
        };
        let c = if use_absolute_current { c.abs() } else { c };
        log_energy.push(e.max(ENERGY_LOG_FLOOR).log10());
        log_current.push(c.max(CURRENT_LOG_FLOOR).log10());
    }

    if log_energy.is_empty() {
        log::warn!("correlation: no valid rows (all values absent)");
        return None;
    }

    let pearson_val = pearson(&log_energy, &log_current)?;
    let spearman_val = pearson(&average_ranks(&log_energy), &average_ranks(&log_current))?;

    Some(CorrelationReport {
        pearson: pearson_val,
        spearman: spearman_val,
        sample_count: log_energy.len(),
    })
}

/// Pearson product-moment coefficient. `None` when either side has zero
/// variance (the coefficient is undefined there).
fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        log::warn!("correlation: zero variance, coefficient undefined");
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Average ranks (1-based); ties share the mean of their rank span.
fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // Positions i..=j hold equal values; each gets the mean rank.
        let mean_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = mean_rank;
        }
        i = j + 1;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stormmatch::correlate::assembler::JoinedRow;
    use crate::stormmatch::model::FieldValue;
    use std::collections::HashMap;

    fn table(pairs: Vec<(Option<f64>, Option<f64>)>) -> JoinedTable {
        let rows = pairs
            .into_iter()
            .map(|(e, c)| {
                let mut fields = HashMap::new();
                fields.insert(
                    "energy".to_string(),
                    e.map(FieldValue::Float).unwrap_or(FieldValue::Null),
                );
                fields.insert(
                    "current".to_string(),
                    c.map(FieldValue::Float).unwrap_or(FieldValue::Null),
                );
                JoinedRow { fields }
            })
            .collect();
        JoinedTable {
            columns: vec!["energy".to_string(), "current".to_string()],
            rows,
        }
    }

    #[test]
    fn test_perfect_monotone_relationship() {
        let t = table(vec![
            (Some(1e-14), Some(10.0)),
            (Some(1e-13), Some(100.0)),
            (Some(1e-12), Some(1000.0)),
        ]);
        let report = analyze_physical_correlation(&t, "energy", "current", true).unwrap();
        assert!((report.pearson - 1.0).abs() < 1e-9);
        assert!((report.spearman - 1.0).abs() < 1e-9);
        assert_eq!(report.sample_count, 3);
    }

    #[test]
    fn test_inverse_relationship() {
        let t = table(vec![
            (Some(1e-12), Some(10.0)),
            (Some(1e-13), Some(100.0)),
            (Some(1e-14), Some(1000.0)),
        ]);
        let report = analyze_physical_correlation(&t, "energy", "current", true).unwrap();
        assert!((report.spearman + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_absolute_current_folds_sign() {
        let t = table(vec![
            (Some(1e-14), Some(-10.0)),
            (Some(1e-13), Some(100.0)),
            (Some(1e-12), Some(-1000.0)),
        ]);
        let report = analyze_physical_correlation(&t, "energy", "current", true).unwrap();
        assert!((report.pearson - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rows_with_absent_values_dropped() {
        let t = table(vec![
            (Some(1e-14), Some(10.0)),
            (None, Some(100.0)),
            (Some(1e-13), None),
            (Some(1e-12), Some(1000.0)),
        ]);
        let report = analyze_physical_correlation(&t, "energy", "current", true).unwrap();
        assert_eq!(report.sample_count, 2);
    }

    #[test]
    fn test_all_absent_is_no_result() {
        let t = table(vec![(None, None), (None, Some(1.0))]);
        assert!(analyze_physical_correlation(&t, "energy", "current", true).is_none());
    }

    #[test]
    fn test_missing_column_is_no_result() {
        let t = table(vec![(Some(1.0), Some(1.0))]);
        assert!(analyze_physical_correlation(&t, "nope", "current", true).is_none());
    }

    #[test]
    fn test_constant_column_is_no_result() {
        // Sub-floor currents all clamp to the same value: zero variance.
        let t = table(vec![
            (Some(1e-14), Some(0.01)),
            (Some(1e-13), Some(0.001)),
        ]);
        assert!(analyze_physical_correlation(&t, "energy", "current", true).is_none());
    }

    #[test]
    fn test_average_ranks_with_ties() {
        let ranks = average_ranks(&[10.0, 20.0, 20.0, 30.0]);
        assert_eq!(ranks, vec![1.0, 2.5, 2.5, 4.0]);
    }
}
