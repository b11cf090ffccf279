//! Event and value model shared by every stage of the pipeline.

pub mod event;
pub mod types;

pub use event::{EventTable, SensorEvent, StreamProfile};
pub use types::{FieldValue, TIMESTAMP_FORMAT};
