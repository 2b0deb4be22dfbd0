//! Secondary enrichment through g:Profiler.

use super::{number_value, text_value};
use crate::analysis::{sort_by_p_value, GPROFILER_SOURCE};
use crate::models::EnrichmentResult;
use crate::services::{ProfilingService, RawRecord};
use serde_json::Value;
use tracing::{info, warn};

/// Runs one unfiltered g:Profiler query for the whole gene set.
pub struct ProfilingRunner {
    service: Box<dyn ProfilingService>,
    organism: String,
    threshold: f64,
}

impl ProfilingRunner {
    pub fn new(service: Box<dyn ProfilingService>, organism: &str) -> Self {
        Self {
            service,
            organism: organism.to_string(),
            threshold: 1.0,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Profile the symbols; failures are logged and yield an empty table.
    pub async fn run(&self, symbols: &[String]) -> Vec<EnrichmentResult> {
        let raw = match self
            .service
            .profile(symbols, &self.organism, self.threshold)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!("g:Profiler failed, continuing without it: {}", e);
                return Vec::new();
            }
        };

        if raw.is_empty() {
            warn!("g:Profiler returned no results");
            return Vec::new();
        }

        let mut rows: Vec<EnrichmentResult> = raw
            .iter()
            .map(|record| to_enrichment_result(record, symbols))
            .collect();
        sort_by_p_value(&mut rows);

        info!("g:Profiler: {} terms", rows.len());
        rows
    }
}

/// Reshape a g:Profiler row into the canonical schema.
///
/// The term comes from `name`, or `term_name` in older responses.
/// Overlapping genes are read from `intersections`, which holds one
/// evidence list per query gene in query order.
pub fn to_enrichment_result(raw: &RawRecord, symbols: &[String]) -> EnrichmentResult {
    let source = raw
        .get("source")
        .and_then(text_value)
        .unwrap_or_else(|| GPROFILER_SOURCE.to_string());

    let term = raw
        .get("name")
        .and_then(text_value)
        .or_else(|| raw.get("term_name").and_then(text_value));

    let overlap = match (
        raw.get("intersection_size").and_then(Value::as_u64),
        raw.get("term_size").and_then(Value::as_u64),
    ) {
        (Some(k), Some(n)) => Some(format!("{}/{}", k, n)),
        _ => None,
    };

    EnrichmentResult {
        term,
        p_value: raw.get("p_value").and_then(number_value),
        overlap,
        overlap_genes: raw
            .get("intersections")
            .and_then(|v| intersecting_genes(v, symbols)),
        ..EnrichmentResult::new(source)
    }
}

fn intersecting_genes(intersections: &Value, symbols: &[String]) -> Option<String> {
    let per_gene = intersections.as_array()?;
    if per_gene.len() != symbols.len() {
        return None;
    }

    let genes: Vec<&str> = per_gene
        .iter()
        .zip(symbols)
        .filter(|(evidence, _)| evidence.as_array().is_some_and(|codes| !codes.is_empty()))
        .map(|(_, symbol)| symbol.as_str())
        .collect();

    if genes.is_empty() {
        None
    } else {
        Some(genes.join(";"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mock::{record, MockProfilingService};
    use serde_json::json;

    fn symbols() -> Vec<String> {
        vec!["MT-ND1".to_string(), "MT-CO1".to_string(), "TP53".to_string()]
    }

    #[test]
    fn test_reshape_row() {
        let raw = record(&[
            ("source", json!("GO:BP")),
            ("name", json!("mitochondrial electron transport")),
            ("p_value", json!(1e-8)),
            ("intersection_size", json!(2)),
            ("term_size", json!(40)),
            ("intersections", json!([["IEA"], ["IDA", "IMP"], []])),
        ]);

        let result = to_enrichment_result(&raw, &symbols());
        assert_eq!(result.source, "GO:BP");
        assert_eq!(result.term.as_deref(), Some("mitochondrial electron transport"));
        assert_eq!(result.p_value, Some(1e-8));
        assert_eq!(result.adj_p, None);
        assert_eq!(result.overlap.as_deref(), Some("2/40"));
        assert_eq!(result.overlap_genes.as_deref(), Some("MT-ND1;MT-CO1"));
    }

    #[test]
    fn test_term_name_fallback() {
        let raw = record(&[("term_name", json!("respiratory chain")), ("p_value", json!(0.2))]);

        let result = to_enrichment_result(&raw, &symbols());
        assert_eq!(result.source, GPROFILER_SOURCE);
        assert_eq!(result.term.as_deref(), Some("respiratory chain"));
        assert_eq!(result.overlap, None);
        assert_eq!(result.overlap_genes, None);
    }

    #[tokio::test]
    async fn test_run_sorts_by_p_value() {
        let service = MockProfilingService::with_rows(vec![
            record(&[("name", json!("b")), ("p_value", json!(0.03))]),
            record(&[("name", json!("a")), ("p_value", json!(0.001))]),
            record(&[("name", json!("c")), ("p_value", json!(0.5))]),
        ]);
        let runner = ProfilingRunner::new(Box::new(service), "hsapiens");

        let rows = runner.run(&symbols()).await;
        let terms: Vec<&str> = rows.iter().filter_map(|r| r.term.as_deref()).collect();
        assert_eq!(terms, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_run_failure_is_empty() {
        let runner = ProfilingRunner::new(Box::new(MockProfilingService::unreachable()), "hsapiens");
        assert!(runner.run(&symbols()).await.is_empty());

        let runner = ProfilingRunner::new(Box::new(MockProfilingService::with_rows(vec![])), "hsapiens");
        assert!(runner.run(&symbols()).await.is_empty());
    }
}
