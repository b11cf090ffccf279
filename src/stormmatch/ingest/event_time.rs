//! Timestamp canonicalization.
//!
//! Input streams carry heterogeneous time representations: seconds since
//! the epoch (integer or fractional) and two datetime string layouts, with
//! and without subsecond digits. Parsing is a prioritized sequence of
//! strategies, first success wins, exhaustion yields absent. Results are
//! rounded to the nearest second, the engine's canonical resolution.

use chrono::{DateTime, NaiveDateTime, Timelike};

use crate::stormmatch::model::{EventTable, FieldValue};

/// Rows canonicalized per progress-log line.
pub const DEFAULT_BATCH_SIZE: usize = 100_000;

/// One parse strategy in the priority ladder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeStrategy {
    /// Seconds since the Unix epoch, integer or fractional.
    EpochSeconds,
    /// A chrono format string, e.g. `%Y-%m-%d %H:%M:%S%.f`.
    Format(String),
}

/// Multi-format timestamp parser.
///
/// Strategies are tried in order; the first that succeeds wins.
#[derive(Debug, Clone)]
pub struct TimestampParser {
    strategies: Vec<TimeStrategy>,
}

impl Default for TimestampParser {
    fn default() -> Self {
        Self {
            strategies: vec![
                TimeStrategy::EpochSeconds,
                TimeStrategy::Format("%Y-%m-%d %H:%M:%S%.f".to_string()),
                TimeStrategy::Format("%Y-%m-%d %H:%M:%S".to_string()),
            ],
        }
    }
}

impl TimestampParser {
    /// Build a parser with an explicit strategy ladder.
    pub fn new(strategies: Vec<TimeStrategy>) -> Self {
        Self { strategies }
    }

    /// Parse a field value into a canonical instant.
    ///
    /// Numeric values are always epoch seconds; strings walk the strategy
    /// ladder. Returns `None` when every strategy is exhausted — absence,
    /// not an error.
    pub fn parse(&self, value: &FieldValue) -> Option<NaiveDateTime> {
        match value {
            FieldValue::Integer(secs) => epoch_to_datetime(*secs as f64),
            FieldValue::Float(secs) => epoch_to_datetime(*secs),
            FieldValue::Timestamp(dt) => Some(round_to_second(*dt)),
            FieldValue::String(s) => self.parse_str(s),
            FieldValue::Boolean(_) | FieldValue::Null => None,
        }
    }

    fn parse_str(&self, s: &str) -> Option<NaiveDateTime> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return None;
        }
        for strategy in &self.strategies {
            let parsed = match strategy {
                TimeStrategy::EpochSeconds => {
                    trimmed.parse::<f64>().ok().and_then(epoch_to_datetime)
                }
                TimeStrategy::Format(fmt) => NaiveDateTime::parse_from_str(trimmed, fmt)
                    .ok()
                    .map(round_to_second),
            };
            if parsed.is_some() {
                return parsed;
            }
        }
        None
    }
}

/// Convert fractional epoch seconds to an instant rounded to the second.
fn epoch_to_datetime(secs: f64) -> Option<NaiveDateTime> {
    if !secs.is_finite() {
        return None;
    }
    let rounded = secs.round();
    if rounded < i64::MIN as f64 || rounded > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp(rounded as i64, 0).map(|dt| dt.naive_utc())
}

/// Round an instant to the nearest second (>= 500 ms rounds up).
fn round_to_second(dt: NaiveDateTime) -> NaiveDateTime {
    let truncated = dt.with_nanosecond(0).expect("zero nanosecond is valid");
    if dt.nanosecond() >= 500_000_000 {
        truncated + chrono::Duration::seconds(1)
    } else {
        truncated
    }
}

/// Canonicalize a table's time column in batches.
///
/// Each event's configured time field is parsed into the event timestamp
/// and the field itself is replaced with the canonical `Timestamp` value
/// (or `Null` when unparseable). Progress is logged per batch.
pub fn canonicalize_event_times(
    table: &mut EventTable,
    time_field: &str,
    parser: &TimestampParser,
    batch_size: usize,
) {
    let total = table.events.len();
    let batch_size = batch_size.max(1);
    let mut parsed_count = 0usize;

    for (batch_index, batch) in table.events.chunks_mut(batch_size).enumerate() {
        let start = batch_index * batch_size;
        log::info!(
            "canonicalizing '{}' rows {} to {}",
            time_field,
            start,
            (start + batch.len()).saturating_sub(1)
        );
        for event in batch {
            let parsed = event.fields.get(time_field).and_then(|v| parser.parse(v));
            event.timestamp = parsed;
            let canonical = match parsed {
                Some(dt) => {
                    parsed_count += 1;
                    FieldValue::Timestamp(dt)
                }
                None => FieldValue::Null,
            };
            event.fields.insert(time_field.to_string(), canonical);
        }
    }

    if parsed_count < total {
        log::warn!(
            "'{}': {} of {} rows have unparseable timestamps",
            time_field,
            total - parsed_count,
            total
        );
    }
}
