//! Sensor event model.
//!
//! Events are constructed once from immutable input rows and never mutated
//! afterward except for timestamp canonicalization, which runs as a batch
//! pass before matching. The `source_id` assigned here (zero-based load
//! position) is the identity used for consumed-tracking during the join;
//! it stays stable for the lifetime of the run regardless of later
//! filtering or column renames.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::stormmatch::model::types::FieldValue;

/// One event from either sensor stream.
///
/// An absent timestamp or an absent coordinate disqualifies the event from
/// matching; the event still exists and surfaces as an unmatched residual.
#[derive(Debug, Clone)]
pub struct SensorEvent {
    /// Zero-based position within the origin collection, assigned at load.
    pub source_id: usize,
    /// Canonical UTC instant, rounded to the second. None when unparseable.
    pub timestamp: Option<NaiveDateTime>,
    /// Latitude in degrees. None when absent or unparseable.
    pub latitude: Option<f64>,
    /// Longitude in degrees. None when absent or unparseable.
    pub longitude: Option<f64>,
    /// Full row payload, opaque to matching, carried through to output.
    pub fields: HashMap<String, FieldValue>,
}

impl SensorEvent {
    /// Canonical timestamp as whole seconds since the Unix epoch.
    pub fn epoch_second(&self) -> Option<i64> {
        self.timestamp.map(|t| t.and_utc().timestamp())
    }

    /// True when both coordinates are present.
    pub fn has_position(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// Per-stream ingestion profile: source tag, the columns that carry the
/// event's time/position/intensity, and the header rename map applied at
/// load time.
#[derive(Debug, Clone)]
pub struct StreamProfile {
    /// Source tag used to prefix output columns (e.g. `glm`).
    pub tag: String,
    /// Column holding the event time (post-rename name).
    pub time_field: String,
    /// Column holding latitude in degrees (post-rename name).
    pub latitude_field: String,
    /// Column holding longitude in degrees (post-rename name).
    pub longitude_field: String,
    /// Column holding the intensity measurement (post-rename name).
    pub intensity_field: String,
    /// Header renames applied at load: (original, renamed) pairs.
    pub renames: Vec<(String, String)>,
}

impl StreamProfile {
    /// Create a profile with no renames.
    pub fn new(tag: &str, time: &str, lat: &str, lon: &str, intensity: &str) -> Self {
        Self {
            tag: tag.to_string(),
            time_field: time.to_string(),
            latitude_field: lat.to_string(),
            longitude_field: lon.to_string(),
            intensity_field: intensity.to_string(),
            renames: Vec::new(),
        }
    }

    /// Add a header rename pair.
    pub fn with_rename(mut self, from: &str, to: &str) -> Self {
        self.renames.push((from.to_string(), to.to_string()));
        self
    }

    /// Satellite stream preset (GLM flash files).
    pub fn glm() -> Self {
        Self::new("glm", "glm_time", "glm_lat", "glm_lon", "glm_energy")
            .with_rename("flash_lat", "glm_lat")
            .with_rename("flash_lon", "glm_lon")
            .with_rename("flash_energy", "glm_energy")
            .with_rename("product_time", "glm_time")
    }

    /// Ground-network stream preset (ENTLN flash files).
    pub fn entln() -> Self {
        Self::new(
            "entln",
            "datahora",
            "entln_lat",
            "entln_lon",
            "pico_corrente",
        )
        .with_rename("id", "entln_id")
        .with_rename("tipo", "entln_tipo")
        .with_rename("latitude", "entln_lat")
        .with_rename("longitude", "entln_lon")
    }

    /// Name of the synthesized source-index column for this stream.
    pub fn idx_column(&self) -> String {
        format!("{}_idx", self.tag)
    }

    /// Apply the rename map to a header name.
    pub fn rename(&self, header: &str) -> String {
        for (from, to) in &self.renames {
            if from == header {
                return to.clone();
            }
        }
        header.to_string()
    }
}

/// A loaded event stream: source tag, deterministic column order, events.
///
/// The column list starts with the synthesized `{tag}_idx` column followed
/// by the input columns post-rename; output rows reproduce this order.
#[derive(Debug, Clone)]
pub struct EventTable {
    pub tag: String,
    pub columns: Vec<String>,
    pub events: Vec<SensorEvent>,
}

impl EventTable {
    /// Build a table from typed rows.
    ///
    /// Assigns `source_id` by position, extracts coordinates from the
    /// profile's columns (unparseable cells degrade to absent), and
    /// synthesizes the `{tag}_idx` field. Timestamps stay unset until the
    /// canonicalization pass runs.
    pub fn from_rows(
        profile: &StreamProfile,
        input_columns: Vec<String>,
        rows: Vec<HashMap<String, FieldValue>>,
    ) -> Self {
        let idx_column = profile.idx_column();
        let mut columns = Vec::with_capacity(input_columns.len() + 1);
        columns.push(idx_column.clone());
        columns.extend(input_columns);

        let events = rows
            .into_iter()
            .enumerate()
            .map(|(source_id, mut fields)| {
                let latitude = fields
                    .get(&profile.latitude_field)
                    .and_then(FieldValue::as_f64);
                let longitude = fields
                    .get(&profile.longitude_field)
                    .and_then(FieldValue::as_f64);
                fields.insert(idx_column.clone(), FieldValue::Integer(source_id as i64));
                SensorEvent {
                    source_id,
                    timestamp: None,
                    latitude,
                    longitude,
                    fields,
                }
            })
            .collect();

        Self {
            tag: profile.tag.clone(),
            columns,
            events,
        }
    }

    /// Number of events currently in the table.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when the table holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: Vec<(&str, FieldValue)>) -> HashMap<String, FieldValue> {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_from_rows_assigns_source_ids_and_idx_column() {
        let profile = StreamProfile::new("glm", "glm_time", "glm_lat", "glm_lon", "glm_energy");
        let rows = vec![
            row(vec![
                ("glm_lat", FieldValue::Float(1.0)),
                ("glm_lon", FieldValue::Float(2.0)),
            ]),
            row(vec![
                ("glm_lat", FieldValue::Null),
                ("glm_lon", FieldValue::Float(2.0)),
            ]),
        ];
        let table = EventTable::from_rows(
            &profile,
            vec!["glm_lat".to_string(), "glm_lon".to_string()],
            rows,
        );

        assert_eq!(table.columns[0], "glm_idx");
        assert_eq!(table.events[0].source_id, 0);
        assert_eq!(table.events[1].source_id, 1);
        assert_eq!(
            table.events[1].fields.get("glm_idx"),
            Some(&FieldValue::Integer(1))
        );
        assert!(table.events[0].has_position());
        assert!(!table.events[1].has_position());
    }

    #[test]
    fn test_integer_coordinates_are_accepted() {
        let profile = StreamProfile::new("glm", "t", "lat", "lon", "e");
        let rows = vec![row(vec![
            ("lat", FieldValue::Integer(10)),
            ("lon", FieldValue::Integer(-45)),
        ])];
        let table =
            EventTable::from_rows(&profile, vec!["lat".to_string(), "lon".to_string()], rows);
        assert_eq!(table.events[0].latitude, Some(10.0));
        assert_eq!(table.events[0].longitude, Some(-45.0));
    }

    #[test]
    fn test_profile_rename() {
        let profile = StreamProfile::entln();
        assert_eq!(profile.rename("latitude"), "entln_lat");
        assert_eq!(profile.rename("pico_corrente"), "pico_corrente");
    }

    #[test]
    fn test_glm_preset() {
        let profile = StreamProfile::glm();
        assert_eq!(profile.tag, "glm");
        assert_eq!(profile.rename("flash_energy"), "glm_energy");
        assert_eq!(profile.time_field, "glm_time");
        assert_eq!(profile.idx_column(), "glm_idx");
    }
}
