//! Analysis modules.
//!
//! Significance ordering and the cross-source summary.

pub mod aggregator;

pub use aggregator::*;
