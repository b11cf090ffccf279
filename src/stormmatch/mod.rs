// Lightning event correlation engine for stormmatch
// Fuzzy full outer join of satellite and ground-network event streams

pub mod analysis;
pub mod correlate;
pub mod error;
pub mod ingest;
pub mod model;

// Re-export main API
pub use analysis::{add_intensity_scales, analyze_physical_correlation, CorrelationReport};
pub use correlate::{correlate, CorrelationConfig, JoinedTable};
pub use error::{ConfigError, IngestError};
pub use ingest::{
    canonicalize_event_times, read_csv_file, write_csv_file, CsvFormat, DateRangeFilter,
    FilterGranularity, TimestampParser,
};
pub use model::{EventTable, FieldValue, SensorEvent, StreamProfile};
