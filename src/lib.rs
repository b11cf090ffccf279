//! # stormmatch
//!
//! A fuzzy spatio-temporal full-outer-join engine for correlating two
//! independent lightning event streams: a satellite-derived stream (GLM
//! flashes) and a ground-network stream (ENTLN flashes). Events pair when
//! they fall within a time tolerance and a geodesic distance tolerance;
//! unmatched events from either side are preserved as residual rows.
//!
//! ## Pipeline
//!
//! ```rust,no_run
//! use stormmatch::stormmatch::{analysis, correlate, ingest};
//! use stormmatch::{CorrelationConfig, StreamProfile};
//! use stormmatch::stormmatch::ingest::{CsvFormat, TimestampParser};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let format = CsvFormat::default();
//!     let glm_profile = StreamProfile::glm();
//!     let entln_profile = StreamProfile::entln();
//!
//!     let mut glm = ingest::read_csv_file("glm_flashes.csv", &glm_profile, &format)?;
//!     let mut entln = ingest::read_csv_file("entln_flashes.csv", &entln_profile, &format)?;
//!
//!     let parser = TimestampParser::default();
//!     ingest::canonicalize_event_times(&mut glm, &glm_profile.time_field, &parser, 100_000);
//!     ingest::canonicalize_event_times(&mut entln, &entln_profile.time_field, &parser, 100_000);
//!
//!     let config = CorrelationConfig::default()
//!         .with_time_tolerance_secs(1)
//!         .with_distance_tolerance_km(10.0);
//!     let mut joined = correlate::correlate(&glm, &entln, &config)?;
//!
//!     analysis::add_intensity_scales(
//!         &mut joined,
//!         &["glm_glm_energy".to_string(), "entln_pico_corrente".to_string()],
//!     )?;
//!     if let Some(report) = analysis::analyze_physical_correlation(
//!         &joined,
//!         "glm_glm_energy",
//!         "entln_pico_corrente",
//!         config.use_absolute_current,
//!     ) {
//!         println!("pearson={:.4} spearman={:.4}", report.pearson, report.spearman);
//!     }
//!
//!     ingest::write_csv_file("joined.csv", &joined, &format)?;
//!     Ok(())
//! }
//! ```

pub mod stormmatch;

// Re-export main API at crate root for easy access
pub use crate::stormmatch::correlate::{correlate, CorrelationConfig, JoinedTable};
pub use crate::stormmatch::error::{ConfigError, IngestError};
pub use crate::stormmatch::model::{EventTable, FieldValue, SensorEvent, StreamProfile};
