//! Significance ordering and multi-source summary.
//!
//! Each source keeps its own ranking: the summary is the top rows of every
//! source, block by block, with no re-ranking across sources since p-values
//! from different tests are not comparable.

use crate::models::{EnrichmentResult, LibraryTables, SummaryRow};
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Source type prefix for Enrichr library blocks.
pub const ENRICHR_SOURCE: &str = "enrichr";

/// Source label of the g:Profiler block.
pub const GPROFILER_SOURCE: &str = "gprofiler";

/// Default rows per source in the summary.
pub const DEFAULT_TOP_N: usize = 10;

/// Summary label for an Enrichr library, e.g. `enrichr:KEGG_2021_Human`.
pub fn library_label(library: &str) -> String {
    format!("{}:{}", ENRICHR_SOURCE, library)
}

/// Ascending order with missing values last.
fn cmp_nullable(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sort by adjusted p-value if any row has one, else by raw p-value if any
/// row has one, else leave the order alone. The sort is stable.
pub fn sort_by_significance(rows: &mut [EnrichmentResult]) {
    if rows.iter().any(|r| r.adj_p.is_some()) {
        rows.sort_by(|a, b| cmp_nullable(a.adj_p, b.adj_p));
    } else if rows.iter().any(|r| r.p_value.is_some()) {
        sort_by_p_value(rows);
    }
}

/// Stable sort by raw p-value, missing values last.
pub fn sort_by_p_value(rows: &mut [EnrichmentResult]) {
    rows.sort_by(|a, b| cmp_nullable(a.p_value, b.p_value));
}

/// Builds the ranked summary from every source's results.
#[derive(Debug, Clone)]
pub struct SummaryAggregator {
    top_n: usize,
}

impl Default for SummaryAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_N)
    }
}

impl SummaryAggregator {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    /// Merge library blocks (in library order) and then the g:Profiler block.
    ///
    /// Library tables are expected to be sorted already. The secondary table
    /// is re-sorted by raw p-value. Returns `None` when no source has rows.
    pub fn summarize(
        &self,
        per_library: &LibraryTables,
        secondary: &[EnrichmentResult],
    ) -> Option<Vec<SummaryRow>> {
        let mut summary = Vec::new();
        let mut blocks = 0;

        for (library, rows) in per_library.iter() {
            if rows.is_empty() {
                continue;
            }
            let label = library_label(library);
            summary.extend(
                rows.iter()
                    .take(self.top_n)
                    .map(|row| SummaryRow::tagged(&label, row)),
            );
            blocks += 1;
        }

        if !secondary.is_empty() {
            let mut sorted = secondary.to_vec();
            sort_by_p_value(&mut sorted);
            summary.extend(
                sorted
                    .iter()
                    .take(self.top_n)
                    .map(|row| SummaryRow::tagged(GPROFILER_SOURCE, row)),
            );
            blocks += 1;
        }

        if blocks == 0 {
            warn!("No enrichment results to summarize");
            return None;
        }

        debug!("Summary has {} rows from {} sources", summary.len(), blocks);
        Some(summary)
    }
}
