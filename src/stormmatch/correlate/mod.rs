//! The correlation engine: tolerance configuration, time-window index,
//! geodesic distance gate, matcher, and join assembler.

pub mod assembler;
pub mod geo;
pub mod matcher;
pub mod time_index;

pub use assembler::{JoinAssembler, JoinedRow, JoinedTable, DISTANCE_COLUMN, TIME_DIFF_COLUMN};
pub use geo::{haversine_km, EARTH_RADIUS_KM};
pub use matcher::{MatchCandidate, MatchSet, MatchStats, Matcher};
pub use time_index::TimeWindowIndex;

use serde::Serialize;

use crate::stormmatch::error::ConfigError;
use crate::stormmatch::model::EventTable;

/// Tolerances for the fuzzy join and the analyzer's current handling.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationConfig {
    /// Half-width of the matching time window, in seconds.
    pub time_tolerance_secs: i64,
    /// Inclusive distance gate, in km.
    pub distance_tolerance_km: f64,
    /// Whether the correlation analyzer takes the current's magnitude
    /// before the log transform.
    pub use_absolute_current: bool,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            time_tolerance_secs: 30,
            distance_tolerance_km: 10.0,
            use_absolute_current: true,
        }
    }
}

impl CorrelationConfig {
    /// Set the time tolerance in seconds.
    pub fn with_time_tolerance_secs(mut self, secs: i64) -> Self {
        self.time_tolerance_secs = secs;
        self
    }

    /// Set the distance tolerance in km.
    pub fn with_distance_tolerance_km(mut self, km: f64) -> Self {
        self.distance_tolerance_km = km;
        self
    }

    /// Set whether the analyzer uses the current's absolute value.
    pub fn with_absolute_current(mut self, use_abs: bool) -> Self {
        self.use_absolute_current = use_abs;
        self
    }

    /// Reject invalid tolerances before any matching work begins.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_tolerance_secs <= 0 {
            return Err(ConfigError::NonPositiveTimeTolerance(
                self.time_tolerance_secs,
            ));
        }
        if !(self.distance_tolerance_km > 0.0 && self.distance_tolerance_km.is_finite()) {
            return Err(ConfigError::InvalidDistanceTolerance(
                self.distance_tolerance_km,
            ));
        }
        Ok(())
    }
}

/// Run the full fuzzy outer join: validate the configuration, index the
/// secondary stream, sweep the primary stream, assemble the output table.
pub fn correlate(
    primary: &EventTable,
    secondary: &EventTable,
    config: &CorrelationConfig,
) -> Result<JoinedTable, ConfigError> {
    config.validate()?;

    log::info!(
        "correlating '{}' ({} events) against '{}' ({} events), tolerance {} s / {} km",
        primary.tag,
        primary.len(),
        secondary.tag,
        secondary.len(),
        config.time_tolerance_secs,
        config.distance_tolerance_km
    );

    let set = Matcher::new(primary, secondary, config).run();
    Ok(JoinAssembler::new(primary, secondary).assemble(&set))
}
