//! Error types.
//!
//! Two failure classes exist: invalid configuration is rejected eagerly
//! before any matching work, and structural ingest problems (unreadable
//! file, missing header) abort the load. Per-row data problems are never
//! errors; malformed fields degrade to absent and flow through matching
//! as "no match".

use thiserror::Error;

/// Configuration rejected at validation time, before any matching work.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Time tolerance must be a positive number of seconds.
    #[error("time tolerance must be positive, got {0} s")]
    NonPositiveTimeTolerance(i64),

    /// Distance tolerance must be positive and finite.
    #[error("distance tolerance must be positive and finite, got {0} km")]
    InvalidDistanceTolerance(f64),

    /// Date-range filter granularity must be 'day' or 'hour'.
    #[error("unknown filter granularity '{0}' (expected 'day' or 'hour')")]
    UnknownGranularity(String),

    /// Filter boundary date failed to parse.
    #[error("invalid filter date '{value}': expected '%Y-%m-%d' or '%Y-%m-%d %H:%M:%S'")]
    InvalidFilterDate { value: String },

    /// Filter window end precedes its start.
    #[error("filter window end {end} precedes start {start}")]
    EmptyFilterWindow { start: String, end: String },

    /// Scaling was requested for an empty column name.
    #[error("scale column name must not be empty")]
    EmptyScaleColumn,
}

/// Structural failure while loading an input stream.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Underlying I/O failure.
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The input had no header row.
    #[error("input '{path}' is empty (missing header row)")]
    MissingHeader { path: String },

    /// The output file could not be written.
    #[error("failed to write '{path}': {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
