//! Analysis modules.
//!
//! Pure grade aggregation; everything that talks to the outside world
//! lives in `store`, `llm` and `report`.

pub mod aggregator;

pub use aggregator::*;
