//! Candidate matching.
//!
//! For each primary event the matcher queries the time-window index, gates
//! candidates by geodesic distance, and emits every qualifying pair.
//! Multiplicity is unbounded in both directions: a primary event may match
//! many secondary events and a secondary event stays in candidacy after
//! its first match.
//!
//! The sweep is data-parallel across the primary stream. Each worker
//! produces a self-contained outcome for its primary event; consumed
//! secondary ids and candidate lists are merged afterward in primary
//! order, so the result is deterministic and no shared mutable state
//! exists during the sweep.

use std::collections::HashSet;

use rayon::prelude::*;

use crate::stormmatch::correlate::geo::haversine_km;
use crate::stormmatch::correlate::time_index::TimeWindowIndex;
use crate::stormmatch::correlate::CorrelationConfig;
use crate::stormmatch::model::{EventTable, SensorEvent};

/// A qualifying pair. Positions index into the current tables' event
/// vectors; the assembler resolves them back to events.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    /// Position of the primary event in its table.
    pub primary_pos: usize,
    /// Position of the secondary event in its table.
    pub secondary_pos: usize,
    /// Absolute time difference in whole seconds.
    pub time_diff_secs: i64,
    /// Great-circle distance in km.
    pub distance_km: f64,
}

/// Aggregated counters for one matching run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MatchStats {
    /// Primary events scanned.
    pub primaries_scanned: usize,
    /// Candidate pairs that reached the distance gate.
    pub candidates_examined: usize,
    /// Pairs that passed both gates.
    pub matches_found: usize,
    /// Primary events with zero matches.
    pub primary_residuals: usize,
    /// Distinct secondary events consumed by at least one match.
    pub secondaries_consumed: usize,
}

/// Result of a matching run: every qualifying pair, the primary events
/// with no matches, and the set of consumed secondary source ids.
#[derive(Debug, Default)]
pub struct MatchSet {
    pub candidates: Vec<MatchCandidate>,
    /// Positions of primary events with zero matches, in primary order.
    pub primary_residuals: Vec<usize>,
    /// Source ids of secondary events consumed by at least one match.
    pub consumed_secondary: HashSet<usize>,
    pub stats: MatchStats,
}

/// Per-primary sweep outcome, local to one worker.
#[derive(Debug)]
struct PrimarySweep {
    primary_pos: usize,
    candidates: Vec<MatchCandidate>,
    examined: usize,
}

/// Matches one primary stream against an indexed secondary stream.
pub struct Matcher<'a> {
    primary: &'a EventTable,
    secondary: &'a EventTable,
    index: TimeWindowIndex,
    config: &'a CorrelationConfig,
}

impl<'a> Matcher<'a> {
    /// Build the matcher, indexing the secondary stream.
    pub fn new(
        primary: &'a EventTable,
        secondary: &'a EventTable,
        config: &'a CorrelationConfig,
    ) -> Self {
        let index = TimeWindowIndex::build(&secondary.events);
        Self {
            primary,
            secondary,
            index,
            config,
        }
    }

    /// Run the full sweep and merge worker outcomes.
    pub fn run(&self) -> MatchSet {
        let sweeps: Vec<PrimarySweep> = self
            .primary
            .events
            .par_iter()
            .enumerate()
            .map(|(pos, event)| self.sweep_primary(pos, event))
            .collect();

        let mut set = MatchSet::default();
        set.stats.primaries_scanned = sweeps.len();

        for sweep in sweeps {
            set.stats.candidates_examined += sweep.examined;
            if sweep.candidates.is_empty() {
                set.primary_residuals.push(sweep.primary_pos);
            } else {
                for candidate in &sweep.candidates {
                    let consumed_id = self.secondary.events[candidate.secondary_pos].source_id;
                    set.consumed_secondary.insert(consumed_id);
                }
                set.candidates.extend(sweep.candidates);
            }
        }

        set.stats.matches_found = set.candidates.len();
        set.stats.primary_residuals = set.primary_residuals.len();
        set.stats.secondaries_consumed = set.consumed_secondary.len();

        log::info!(
            "matcher: {} primaries, {} candidates examined, {} matches, {} primary residuals, {} secondaries consumed",
            set.stats.primaries_scanned,
            set.stats.candidates_examined,
            set.stats.matches_found,
            set.stats.primary_residuals,
            set.stats.secondaries_consumed
        );

        set
    }

    /// Enumerate matches for a single primary event.
    ///
    /// An absent timestamp yields no candidates; an absent coordinate is a
    /// hard disqualifier even when time alone would qualify.
    fn sweep_primary(&self, primary_pos: usize, event: &SensorEvent) -> PrimarySweep {
        let mut sweep = PrimarySweep {
            primary_pos,
            candidates: Vec::new(),
            examined: 0,
        };

        let instant = match event.epoch_second() {
            Some(s) => s,
            None => return sweep,
        };
        let (lat, lon) = match (event.latitude, event.longitude) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => return sweep,
        };

        for secondary_pos in self.index.query(instant, self.config.time_tolerance_secs) {
            let candidate = &self.secondary.events[secondary_pos];
            let (c_lat, c_lon) = match (candidate.latitude, candidate.longitude) {
                (Some(c_lat), Some(c_lon)) => (c_lat, c_lon),
                _ => continue,
            };
            sweep.examined += 1;

            let distance_km = haversine_km(lat, lon, c_lat, c_lon);
            if distance_km <= self.config.distance_tolerance_km {
                // Indexed events always carry a timestamp.
                let candidate_second = match candidate.epoch_second() {
                    Some(s) => s,
                    None => continue,
                };
                sweep.candidates.push(MatchCandidate {
                    primary_pos,
                    secondary_pos,
                    time_diff_secs: (instant - candidate_second).abs(),
                    distance_km,
                });
            }
        }

        sweep
    }
}
