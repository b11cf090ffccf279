//! Batch date-range filtering.
//!
//! Restricts a loaded stream to a start/end window at day or hour
//! granularity before matching. Granularity and boundary dates are
//! validated eagerly; events with absent timestamps are dropped by the
//! filter (they cannot fall inside any window).

use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::stormmatch::error::ConfigError;
use crate::stormmatch::model::EventTable;

/// Granularity of the filter window boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterGranularity {
    /// Whole days: 00:00:00 through 23:59:59.
    Day,
    /// Whole hours: start through start + 59 min 59 s.
    Hour,
}

impl FromStr for FilterGranularity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "day" => Ok(FilterGranularity::Day),
            "hour" => Ok(FilterGranularity::Hour),
            other => Err(ConfigError::UnknownGranularity(other.to_string())),
        }
    }
}

/// A resolved inclusive time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRangeFilter {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRangeFilter {
    /// Resolve a window from boundary strings and a granularity.
    ///
    /// `start` accepts `%Y-%m-%d` (midnight) or `%Y-%m-%d %H:%M:%S`;
    /// `end` is optional and defaults to one granularity unit after the
    /// start. Day windows run through 23:59:59 of the end date; hour
    /// windows run through the 59th second of the end's minute.
    pub fn resolve(
        start: &str,
        end: Option<&str>,
        granularity: FilterGranularity,
    ) -> Result<Self, ConfigError> {
        let start_dt = parse_boundary(start)?;
        let end_dt = match granularity {
            FilterGranularity::Day => {
                let end_date = match end {
                    Some(e) => parse_boundary(e)?.date(),
                    None => start_dt.date(),
                };
                day_end(end_date)
            }
            FilterGranularity::Hour => match end {
                Some(e) => parse_boundary(e)? + Duration::seconds(59),
                None => start_dt + Duration::hours(1) - Duration::seconds(1),
            },
        };

        if end_dt < start_dt {
            return Err(ConfigError::EmptyFilterWindow {
                start: start_dt.to_string(),
                end: end_dt.to_string(),
            });
        }

        Ok(Self {
            start: start_dt,
            end: end_dt,
        })
    }

    /// True when the instant falls inside the window, bounds inclusive.
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        instant >= self.start && instant <= self.end
    }

    /// Drop events outside the window (or with absent timestamps).
    pub fn apply(&self, table: &mut EventTable) {
        let before = table.events.len();
        table
            .events
            .retain(|e| e.timestamp.map(|t| self.contains(t)).unwrap_or(false));
        log::info!(
            "stream '{}': {} of {} rows inside [{} .. {}]",
            table.tag,
            table.events.len(),
            before,
            self.start,
            self.end
        );
    }
}

fn parse_boundary(s: &str) -> Result<NaiveDateTime, ConfigError> {
    let trimmed = s.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(d.and_hms_opt(0, 0, 0).expect("midnight is valid"));
    }
    Err(ConfigError::InvalidFilterDate {
        value: trimmed.to_string(),
    })
}

fn day_end(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(23, 59, 59).expect("23:59:59 is valid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stormmatch::model::StreamProfile;
    use std::collections::HashMap;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_granularity_parse() {
        assert_eq!(
            "day".parse::<FilterGranularity>().unwrap(),
            FilterGranularity::Day
        );
        assert_eq!(
            "HOUR".parse::<FilterGranularity>().unwrap(),
            FilterGranularity::Hour
        );
        assert!(matches!(
            "week".parse::<FilterGranularity>(),
            Err(ConfigError::UnknownGranularity(_))
        ));
    }

    #[test]
    fn test_day_window_defaults_to_single_day() {
        let f = DateRangeFilter::resolve("2022-02-15", None, FilterGranularity::Day).unwrap();
        assert_eq!(f.start, dt("2022-02-15 00:00:00"));
        assert_eq!(f.end, dt("2022-02-15 23:59:59"));
        assert!(f.contains(dt("2022-02-15 23:59:59")));
        assert!(!f.contains(dt("2022-02-16 00:00:00")));
    }

    #[test]
    fn test_day_window_with_end_date() {
        let f = DateRangeFilter::resolve(
            "2022-02-15",
            Some("2022-02-16"),
            FilterGranularity::Day,
        )
        .unwrap();
        assert_eq!(f.end, dt("2022-02-16 23:59:59"));
    }

    #[test]
    fn test_hour_window_defaults_to_single_hour() {
        let f = DateRangeFilter::resolve(
            "2022-02-15 12:00:00",
            None,
            FilterGranularity::Hour,
        )
        .unwrap();
        assert_eq!(f.start, dt("2022-02-15 12:00:00"));
        assert_eq!(f.end, dt("2022-02-15 12:59:59"));
    }

    #[test]
    fn test_inverted_window_rejected() {
        let err = DateRangeFilter::resolve(
            "2022-02-16",
            Some("2022-02-15"),
            FilterGranularity::Day,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyFilterWindow { .. }));
    }

    #[test]
    fn test_apply_drops_outside_and_absent() {
        let profile = StreamProfile::new("t", "when", "lat", "lon", "x");
        let rows = vec![HashMap::new(), HashMap::new(), HashMap::new()];
        let mut table = EventTable::from_rows(&profile, vec![], rows);
        table.events[0].timestamp = Some(dt("2022-02-15 10:00:00"));
        table.events[1].timestamp = Some(dt("2022-02-16 10:00:00"));
        table.events[2].timestamp = None;

        let f = DateRangeFilter::resolve("2022-02-15", None, FilterGranularity::Day).unwrap();
        f.apply(&mut table);

        assert_eq!(table.events.len(), 1);
        // The surviving event keeps its load-time identity.
        assert_eq!(table.events[0].source_id, 0);
    }
}
