//! Gene list input and identifier normalization.
//!
//! This module reads identifier files and rewrites bare mitochondrial
//! symbols to their canonical `MT-` form.

pub mod input;
pub mod normalizer;

pub use input::read_gene_list;
pub use normalizer::{unique_symbols, AliasTable, Normalizer, MITOCHONDRIAL_ALIASES};
