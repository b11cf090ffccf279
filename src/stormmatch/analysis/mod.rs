//! Post-assembly analysis: intensity normalization and physical
//! correlation reporting. Both consume the assembled table and never
//! affect join correctness.

pub mod correlation;
pub mod scale;

pub use correlation::{
    analyze_physical_correlation, CorrelationReport, CURRENT_LOG_FLOOR, ENERGY_LOG_FLOOR,
};
pub use scale::{add_intensity_scales, min_max_scale, SCALED_SUFFIX};
