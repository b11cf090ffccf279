//! Join assembly.
//!
//! Folds match candidates and both residual sets into the unified output
//! table. Secondary residuals are computed by set-subtraction on the
//! consumed source ids. The final ordering — (primary timestamp,
//! secondary timestamp) ascending with absent timestamps first, stable
//! for equal keys — is a presentation contract for output compatibility
//! and has no bearing on which rows exist.

use std::collections::HashMap;

use crate::stormmatch::correlate::matcher::{MatchCandidate, MatchSet};
use crate::stormmatch::model::{EventTable, FieldValue, SensorEvent};

/// Output column holding the absolute time difference in seconds.
pub const TIME_DIFF_COLUMN: &str = "time_diff_s";
/// Output column holding the great-circle distance in km.
pub const DISTANCE_COLUMN: &str = "dist_km";

/// One flattened output row. Fields are keyed by prefixed column name;
/// absent cells are `Null` (or simply missing, which serializes the same).
#[derive(Debug, Clone)]
pub struct JoinedRow {
    pub fields: HashMap<String, FieldValue>,
}

/// The assembled output table with its deterministic column layout:
/// primary-prefixed columns, secondary-prefixed columns, `time_diff_s`,
/// `dist_km`.
#[derive(Debug, Clone)]
pub struct JoinedTable {
    pub columns: Vec<String>,
    pub rows: Vec<JoinedRow>,
}

impl JoinedTable {
    /// Values of one column across all rows, `Null` for missing cells.
    pub fn column_values(&self, column: &str) -> Vec<FieldValue> {
        self.rows
            .iter()
            .map(|row| row.fields.get(column).cloned().unwrap_or(FieldValue::Null))
            .collect()
    }

    /// Append a derived column with one value per row.
    ///
    /// Values beyond the row count are ignored; rows beyond the value
    /// count get `Null`.
    pub fn push_column(&mut self, name: &str, values: Vec<FieldValue>) {
        self.columns.push(name.to_string());
        let mut values = values.into_iter();
        for row in &mut self.rows {
            let value = values.next().unwrap_or(FieldValue::Null);
            row.fields.insert(name.to_string(), value);
        }
    }
}

/// Builds the output table from a [`MatchSet`] and the two streams.
pub struct JoinAssembler<'a> {
    primary: &'a EventTable,
    secondary: &'a EventTable,
}

impl<'a> JoinAssembler<'a> {
    pub fn new(primary: &'a EventTable, secondary: &'a EventTable) -> Self {
        Self { primary, secondary }
    }

    /// Assemble match rows, primary residuals, and secondary residuals,
    /// then sort by (primary timestamp, secondary timestamp) with absent
    /// first.
    pub fn assemble(&self, set: &MatchSet) -> JoinedTable {
        let columns = self.output_columns();

        // Sort keys ride alongside each row; Option's ordering puts
        // None before Some, which is exactly absent-first.
        let mut keyed: Vec<(Option<i64>, Option<i64>, JoinedRow)> = Vec::with_capacity(
            set.candidates.len() + set.primary_residuals.len() + self.secondary.len(),
        );

        for candidate in &set.candidates {
            let p = &self.primary.events[candidate.primary_pos];
            let s = &self.secondary.events[candidate.secondary_pos];
            keyed.push((
                p.epoch_second(),
                s.epoch_second(),
                self.match_row(p, s, candidate),
            ));
        }

        for &pos in &set.primary_residuals {
            let p = &self.primary.events[pos];
            keyed.push((p.epoch_second(), None, self.one_sided_row(p, true)));
        }

        for s in &self.secondary.events {
            if !set.consumed_secondary.contains(&s.source_id) {
                keyed.push((None, s.epoch_second(), self.one_sided_row(s, false)));
            }
        }

        keyed.sort_by_key(|(p_ts, s_ts, _)| (*p_ts, *s_ts));

        JoinedTable {
            columns,
            rows: keyed.into_iter().map(|(_, _, row)| row).collect(),
        }
    }

    fn output_columns(&self) -> Vec<String> {
        let mut columns = Vec::with_capacity(
            self.primary.columns.len() + self.secondary.columns.len() + 2,
        );
        for col in &self.primary.columns {
            columns.push(prefixed(&self.primary.tag, col));
        }
        for col in &self.secondary.columns {
            columns.push(prefixed(&self.secondary.tag, col));
        }
        columns.push(TIME_DIFF_COLUMN.to_string());
        columns.push(DISTANCE_COLUMN.to_string());
        columns
    }

    fn match_row(
        &self,
        p: &SensorEvent,
        s: &SensorEvent,
        candidate: &MatchCandidate,
    ) -> JoinedRow {
        let mut fields = HashMap::with_capacity(
            self.primary.columns.len() + self.secondary.columns.len() + 2,
        );
        copy_side(&mut fields, &self.primary.tag, &self.primary.columns, p);
        copy_side(&mut fields, &self.secondary.tag, &self.secondary.columns, s);
        fields.insert(
            TIME_DIFF_COLUMN.to_string(),
            FieldValue::Integer(candidate.time_diff_secs),
        );
        fields.insert(
            DISTANCE_COLUMN.to_string(),
            FieldValue::Float(candidate.distance_km),
        );
        JoinedRow { fields }
    }

    /// A residual row: one side populated, the counterpart left absent.
    fn one_sided_row(&self, event: &SensorEvent, is_primary: bool) -> JoinedRow {
        let mut fields = HashMap::new();
        if is_primary {
            copy_side(&mut fields, &self.primary.tag, &self.primary.columns, event);
        } else {
            copy_side(
                &mut fields,
                &self.secondary.tag,
                &self.secondary.columns,
                event,
            );
        }
        JoinedRow { fields }
    }
}

fn prefixed(tag: &str, column: &str) -> String {
    format!("{}_{}", tag, column)
}

fn copy_side(
    fields: &mut HashMap<String, FieldValue>,
    tag: &str,
    columns: &[String],
    event: &SensorEvent,
) {
    for col in columns {
        let value = event.fields.get(col).cloned().unwrap_or(FieldValue::Null);
        fields.insert(prefixed(tag, col), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stormmatch::correlate::matcher::Matcher;
    use crate::stormmatch::correlate::CorrelationConfig;
    use crate::stormmatch::model::StreamProfile;
    use chrono::NaiveDateTime;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn make_table(
        tag: &str,
        intensity_col: &str,
        entries: Vec<(Option<&str>, Option<f64>, Option<f64>, f64)>,
    ) -> EventTable {
        let profile = StreamProfile::new(tag, "t", "lat", "lon", intensity_col);
        let rows: Vec<HashMap<String, FieldValue>> = entries
            .iter()
            .map(|(_, _, _, intensity)| {
                HashMap::from([(intensity_col.to_string(), FieldValue::Float(*intensity))])
            })
            .collect();
        let mut table = EventTable::from_rows(&profile, vec![intensity_col.to_string()], rows);
        for (event, (ts, lat, lon, _)) in table.events.iter_mut().zip(entries) {
            event.timestamp = ts.map(dt);
            event.latitude = lat;
            event.longitude = lon;
        }
        table
    }

    fn run(
        primary: &EventTable,
        secondary: &EventTable,
        time_secs: i64,
        dist_km: f64,
    ) -> JoinedTable {
        let cfg = CorrelationConfig::default()
            .with_time_tolerance_secs(time_secs)
            .with_distance_tolerance_km(dist_km);
        let set = Matcher::new(primary, secondary, &cfg).run();
        JoinAssembler::new(primary, secondary).assemble(&set)
    }

    #[test]
    fn test_column_layout() {
        let primary = make_table("glm", "energy", vec![]);
        let secondary = make_table("entln", "current", vec![]);
        let table = run(&primary, &secondary, 30, 10.0);

        assert_eq!(
            table.columns,
            vec![
                "glm_glm_idx",
                "glm_energy",
                "entln_entln_idx",
                "entln_current",
                "time_diff_s",
                "dist_km"
            ]
        );
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_match_row_carries_both_sides() {
        let primary = make_table(
            "glm",
            "energy",
            vec![(Some("2022-02-15 12:00:00"), Some(0.0), Some(0.0), 5.0)],
        );
        let secondary = make_table(
            "entln",
            "current",
            vec![(Some("2022-02-15 12:00:10"), Some(0.0), Some(0.05), 20.0)],
        );
        let table = run(&primary, &secondary, 30, 10.0);

        assert_eq!(table.rows.len(), 1);
        let row = &table.rows[0];
        assert_eq!(row.fields.get("glm_energy"), Some(&FieldValue::Float(5.0)));
        assert_eq!(
            row.fields.get("entln_current"),
            Some(&FieldValue::Float(20.0))
        );
        assert_eq!(
            row.fields.get(TIME_DIFF_COLUMN),
            Some(&FieldValue::Integer(10))
        );
        match row.fields.get(DISTANCE_COLUMN) {
            Some(FieldValue::Float(d)) => assert!((d - 5.56).abs() < 0.01),
            other => panic!("unexpected distance cell: {:?}", other),
        }
    }

    #[test]
    fn test_residual_rows_have_absent_counterparts() {
        let primary = make_table(
            "glm",
            "energy",
            vec![(Some("2022-02-15 12:00:00"), Some(0.0), Some(0.0), 5.0)],
        );
        let secondary = make_table(
            "entln",
            "current",
            vec![(Some("2022-02-15 12:00:10"), Some(0.0), Some(0.05), 20.0)],
        );
        // 5 s tolerance: no match, two residual rows.
        let table = run(&primary, &secondary, 5, 10.0);

        assert_eq!(table.rows.len(), 2);
        let secondary_residual = table
            .rows
            .iter()
            .find(|r| !r.fields.contains_key("glm_energy"))
            .expect("secondary residual present");
        assert_eq!(
            secondary_residual.fields.get("entln_current"),
            Some(&FieldValue::Float(20.0))
        );
        assert!(!secondary_residual.fields.contains_key(TIME_DIFF_COLUMN));

        let primary_residual = table
            .rows
            .iter()
            .find(|r| r.fields.contains_key("glm_energy"))
            .expect("primary residual present");
        assert!(!primary_residual.fields.contains_key("entln_current"));
        assert!(!primary_residual.fields.contains_key(DISTANCE_COLUMN));
    }

    #[test]
    fn test_consumed_secondary_never_a_residual() {
        let primary = make_table(
            "glm",
            "energy",
            vec![(Some("2022-02-15 12:00:00"), Some(0.0), Some(0.0), 5.0)],
        );
        let secondary = make_table(
            "entln",
            "current",
            vec![
                (Some("2022-02-15 12:00:05"), Some(0.0), Some(0.01), 20.0),
                (Some("2022-02-15 12:00:10"), Some(0.0), Some(0.02), 30.0),
            ],
        );
        let table = run(&primary, &secondary, 30, 10.0);

        // Two match rows sharing the primary, no residuals at all.
        assert_eq!(table.rows.len(), 2);
        for row in &table.rows {
            assert_eq!(row.fields.get("glm_energy"), Some(&FieldValue::Float(5.0)));
            assert!(row.fields.contains_key(DISTANCE_COLUMN));
        }
    }

    #[test]
    fn test_sort_absent_timestamps_first() {
        let primary = make_table(
            "glm",
            "energy",
            vec![
                (Some("2022-02-15 13:00:00"), Some(0.0), Some(0.0), 1.0),
                (None, Some(0.0), Some(0.0), 2.0),
            ],
        );
        let secondary = make_table(
            "entln",
            "current",
            vec![(Some("2022-02-15 06:00:00"), Some(50.0), Some(50.0), 3.0)],
        );
        let table = run(&primary, &secondary, 1, 1.0);

        // Absent sorts first: the timestampless primary residual has key
        // (None, None), the secondary residual (None, Some), and the
        // timestamped primary residual (Some, None).
        assert_eq!(table.rows.len(), 3);
        assert_eq!(
            table.rows[0].fields.get("glm_energy"),
            Some(&FieldValue::Float(2.0))
        );
        assert_eq!(
            table.rows[1].fields.get("entln_current"),
            Some(&FieldValue::Float(3.0))
        );
        assert_eq!(
            table.rows[2].fields.get("glm_energy"),
            Some(&FieldValue::Float(1.0))
        );
    }

    #[test]
    fn test_push_column() {
        let primary = make_table("glm", "energy", vec![]);
        let secondary = make_table("entln", "current", vec![]);
        let mut table = run(&primary, &secondary, 30, 10.0);
        table.push_column("extra", vec![]);
        assert_eq!(table.columns.last().map(String::as_str), Some("extra"));
    }
}
