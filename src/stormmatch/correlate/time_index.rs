//! Time-window index over the secondary stream.
//!
//! Events are bucketed by epoch second in a `BTreeMap`, giving
//! O(log n + m) inclusive window queries instead of the full scan a
//! nested-loop join would pay per primary event. Events with absent
//! timestamps are never indexed. The index is read-only after
//! construction and is shared across matching workers without locking.

use std::collections::BTreeMap;

use crate::stormmatch::model::SensorEvent;

/// Index from epoch second to the positions of the secondary events at
/// that second.
#[derive(Debug, Default)]
pub struct TimeWindowIndex {
    slots: BTreeMap<i64, Vec<usize>>,
    indexed: usize,
}

impl TimeWindowIndex {
    /// Build the index from the secondary stream.
    pub fn build(events: &[SensorEvent]) -> Self {
        let mut slots: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        let mut indexed = 0usize;

        for (position, event) in events.iter().enumerate() {
            if let Some(second) = event.epoch_second() {
                slots.entry(second).or_default().push(position);
                indexed += 1;
            }
        }

        let skipped = events.len() - indexed;
        if skipped > 0 {
            log::debug!("time index: skipped {} events without timestamps", skipped);
        }

        Self { slots, indexed }
    }

    /// Positions of every indexed event whose second `t` satisfies
    /// `instant - tolerance <= t <= instant + tolerance`, both ends
    /// inclusive. Order is unspecified.
    pub fn query(
        &self,
        instant: i64,
        tolerance_secs: i64,
    ) -> impl Iterator<Item = usize> + '_ {
        let lower = instant.saturating_sub(tolerance_secs);
        let upper = instant.saturating_add(tolerance_secs);
        self.slots
            .range(lower..=upper)
            .flat_map(|(_, bucket)| bucket.iter().copied())
    }

    /// Number of indexed events.
    pub fn len(&self) -> usize {
        self.indexed
    }

    /// True when nothing was indexed.
    pub fn is_empty(&self) -> bool {
        self.indexed == 0
    }
}
