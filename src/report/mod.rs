//! Report output.
//!
//! Every pipeline table is written as a TSV file under the output prefix.

pub mod writer;

pub use writer::{write_tsv, OutputPaths};
