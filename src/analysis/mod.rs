//! Report computation over loaded cohort datasets.

pub mod aggregator;

pub use aggregator::*;
