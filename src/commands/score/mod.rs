//! Life-score computation.
//!
//! Each entity type is scored against its own population only: metro
//! percentiles never mix with state percentiles, so composites are not
//! comparable across types.

mod composite;
mod engine;
mod extract;
mod grade;
mod percentile;
mod run;
pub(crate) mod types;
mod write;

pub use run::run;
