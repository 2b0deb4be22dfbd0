//! Per-library Enrichr runs with failure isolation.

use super::{number_value, text_value};
use crate::analysis::sort_by_significance;
use crate::models::{EnrichmentResult, LibraryOutcome, LibraryTables};
use crate::services::{EnrichmentService, RawRecord};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

/// Rename a raw Enrichr row into the canonical schema.
///
/// Columns missing from the raw row stay `None`.
pub fn to_enrichment_result(library: &str, raw: &RawRecord) -> EnrichmentResult {
    let text = |column: &str| raw.get(column).and_then(text_value);
    let number = |column: &str| raw.get(column).and_then(number_value);

    EnrichmentResult {
        term: text("Term"),
        adj_p: number("Adjusted P-value"),
        p_value: number("P-value"),
        odds_ratio: number("Odds Ratio"),
        combined_score: number("Combined Score"),
        overlap: text("Overlap"),
        overlap_genes: text("Genes"),
        ..EnrichmentResult::new(library)
    }
}

/// Outcome of one library, tagged with its name.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryReport {
    pub library: String,
    pub outcome: LibraryOutcome,
}

/// Every library's outcome, in configured order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentRun {
    pub reports: Vec<LibraryReport>,
}

impl EnrichmentRun {
    /// Successful tables keyed by library. Failed libraries are absent.
    pub fn tables(&self) -> LibraryTables {
        let mut tables = LibraryTables::new();
        for report in &self.reports {
            if let LibraryOutcome::Success(rows) = &report.outcome {
                tables.insert(report.library.clone(), rows.clone());
            }
        }
        tables
    }

    /// (library, reason) for every failed library.
    pub fn failures(&self) -> Vec<(&str, &str)> {
        self.reports
            .iter()
            .filter_map(|report| match &report.outcome {
                LibraryOutcome::Failure(reason) => Some((report.library.as_str(), reason.as_str())),
                LibraryOutcome::Success(_) => None,
            })
            .collect()
    }

    pub fn succeeded(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_success()).count()
    }
}

/// Runs one Enrichr query per configured library.
pub struct EnrichmentRunner {
    service: Box<dyn EnrichmentService>,
    libraries: Vec<String>,
    organism: String,
    cutoff: f64,
    concurrency: usize,
}

impl EnrichmentRunner {
    pub fn new(service: Box<dyn EnrichmentService>, libraries: Vec<String>, organism: &str) -> Self {
        Self {
            service,
            libraries,
            organism: organism.to_string(),
            cutoff: 1.0,
            concurrency: 1,
        }
    }

    /// Significance cutoff sent with each query.
    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = cutoff;
        self
    }

    /// Libraries in flight at once. Output order is unaffected.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Query every library. One library failing never affects another.
    pub async fn run(&self, symbols: &[String]) -> EnrichmentRun {
        let reports: Vec<LibraryReport> = stream::iter(self.libraries.iter())
            .map(move |library| async move {
                LibraryReport {
                    library: library.clone(),
                    outcome: self.run_library(symbols, library).await,
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let run = EnrichmentRun { reports };
        info!(
            "Enrichr: {}/{} libraries returned results",
            run.succeeded(),
            self.libraries.len()
        );
        run
    }

    async fn run_library(&self, symbols: &[String], library: &str) -> LibraryOutcome {
        debug!("Querying Enrichr library {}", library);

        let raw = match self
            .service
            .enrich(symbols, library, &self.organism, self.cutoff)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Enrichr library {} failed: {}", library, e);
                return LibraryOutcome::Failure(e.to_string());
            }
        };

        if raw.is_empty() {
            warn!("Enrichr library {} returned no results", library);
            return LibraryOutcome::Failure("empty result set".to_string());
        }

        let mut rows: Vec<EnrichmentResult> = raw
            .iter()
            .map(|record| to_enrichment_result(library, record))
            .collect();
        sort_by_significance(&mut rows);

        debug!("Enrichr library {}: {} terms", library, rows.len());
        LibraryOutcome::Success(rows)
    }
}
