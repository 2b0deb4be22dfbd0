//! Data models for the enrichment pipeline.
//!
//! This module contains the tables exchanged between pipeline stages:
//! normalized identifiers, ID mapping records, enrichment results and the
//! merged summary rows. Every table serializes to one tab-separated file,
//! with `None` written as an empty field.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A gene identifier as read from the input file and after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneIdentifier {
    /// Token exactly as it appeared in the input file.
    #[serde(rename = "gene_input")]
    pub raw: String,
    /// Canonical symbol after alias substitution.
    #[serde(rename = "gene_normalized")]
    pub normalized: String,
}

impl GeneIdentifier {
    /// Returns true if normalization rewrote the raw token.
    pub fn was_rewritten(&self) -> bool {
        self.raw != self.normalized
    }
}

/// One row of the gene-metadata lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MappingRecord {
    /// Symbol that was sent to the metadata service.
    pub query_in: String,
    /// Official gene symbol.
    pub symbol: Option<String>,
    /// Full gene name.
    pub name: Option<String>,
    /// NCBI Entrez gene id.
    pub entrezgene: Option<String>,
    /// Ensembl gene id (first one if the service reports several).
    pub ensembl_gene: Option<String>,
    /// NCBI taxonomy id.
    pub taxid: Option<u32>,
    /// Set when the service could not match the query.
    pub notfound: Option<bool>,
}

impl MappingRecord {
    /// Creates an empty record for a queried symbol.
    pub fn new(query_in: impl Into<String>) -> Self {
        Self {
            query_in: query_in.into(),
            symbol: None,
            name: None,
            entrezgene: None,
            ensembl_gene: None,
            taxid: None,
            notfound: None,
        }
    }

    /// Returns true if the service resolved this query.
    pub fn is_found(&self) -> bool {
        !self.notfound.unwrap_or(false) && self.symbol.is_some()
    }
}

/// One enriched term reported by one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    /// Provenance: library name or secondary data source.
    pub source: String,
    pub term: Option<String>,
    pub p_value: Option<f64>,
    pub adj_p: Option<f64>,
    pub combined_score: Option<f64>,
    pub odds_ratio: Option<f64>,
    /// Overlap as `k/n` (query genes in term / term size).
    pub overlap: Option<String>,
    /// Overlapping genes, `;`-separated.
    pub overlap_genes: Option<String>,
}

impl EnrichmentResult {
    /// Creates a result with only the provenance set.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            term: None,
            p_value: None,
            adj_p: None,
            combined_score: None,
            odds_ratio: None,
            overlap: None,
            overlap_genes: None,
        }
    }
}

/// One row of the merged, provenance-tagged summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub source: String,
    pub term: Option<String>,
    pub adj_p: Option<f64>,
    pub p_value: Option<f64>,
    pub combined_score: Option<f64>,
    pub odds_ratio: Option<f64>,
    pub overlap: Option<String>,
    pub overlap_genes: Option<String>,
}

impl SummaryRow {
    /// Tags an enrichment result with a summary source label.
    pub fn tagged(label: &str, result: &EnrichmentResult) -> Self {
        Self {
            source: label.to_string(),
            term: result.term.clone(),
            adj_p: result.adj_p,
            p_value: result.p_value,
            combined_score: result.combined_score,
            odds_ratio: result.odds_ratio,
            overlap: result.overlap.clone(),
            overlap_genes: result.overlap_genes.clone(),
        }
    }
}

/// Outcome of querying a single annotation library.
#[derive(Debug, Clone, PartialEq)]
pub enum LibraryOutcome {
    /// Significance-sorted results.
    Success(Vec<EnrichmentResult>),
    /// The library produced nothing; carries the reason.
    Failure(String),
}

impl LibraryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LibraryOutcome::Success(_))
    }
}

impl fmt::Display for LibraryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryOutcome::Success(rows) => write!(f, "{} terms", rows.len()),
            LibraryOutcome::Failure(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Result tables keyed by library name, in configured library order.
///
/// A library that failed has no entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryTables {
    entries: Vec<(String, Vec<EnrichmentResult>)>,
}

impl LibraryTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a table; libraries keep insertion order.
    pub fn insert(&mut self, library: impl Into<String>, rows: Vec<EnrichmentResult>) {
        self.entries.push((library.into(), rows));
    }

    #[cfg(test)]
    pub fn get(&self, library: &str) -> Option<&[EnrichmentResult]> {
        self.entries
            .iter()
            .find(|(name, _)| name == library)
            .map(|(_, rows)| rows.as_slice())
    }

    pub fn libraries(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[EnrichmentResult])> {
        self.entries
            .iter()
            .map(|(name, rows)| (name.as_str(), rows.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
