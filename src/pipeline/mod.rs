//! The annotation pipeline.
//!
//! Reads the gene list, normalizes it, fans out to the three services and
//! writes every table under the output prefix. Only problems with the
//! input file or the output directory abort a run; each service failure
//! just leaves its tables out.

pub mod enrichment;
pub mod profiling;
pub mod resolver;

pub use enrichment::EnrichmentRunner;
pub use profiling::ProfilingRunner;
pub use resolver::IdentifierResolver;

use crate::analysis::SummaryAggregator;
use crate::config::Config;
use crate::genes::{read_gene_list, unique_symbols, AliasTable, Normalizer};
use crate::report::{write_tsv, OutputPaths};
use crate::services::{EnrichrClient, GprofilerClient, MyGeneClient};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Non-empty text from a string, number or list-of-strings value.
pub(crate) fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(";"))
            }
        }
        _ => None,
    }
}

/// Float from a JSON number or a numeric string.
pub(crate) fn number_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// What a run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub duration_seconds: f64,
    /// Tokens read from the input file.
    pub identifiers: usize,
    /// Tokens changed by alias normalization.
    pub rewritten: usize,
    /// Distinct symbols sent to the services.
    pub symbols: usize,
    pub mapped: usize,
    pub libraries_ok: usize,
    pub libraries_failed: usize,
    pub gprofiler_terms: usize,
    pub summary_rows: usize,
    /// Every file written, in write order.
    pub files: Vec<PathBuf>,
}

/// Wires the normalizer, the three service runners and the aggregator.
pub struct Pipeline {
    normalizer: Normalizer,
    resolver: IdentifierResolver,
    enrichment: EnrichmentRunner,
    profiling: ProfilingRunner,
    aggregator: SummaryAggregator,
}

impl Pipeline {
    pub fn new(
        normalizer: Normalizer,
        resolver: IdentifierResolver,
        enrichment: EnrichmentRunner,
        profiling: ProfilingRunner,
        aggregator: SummaryAggregator,
    ) -> Self {
        Self {
            normalizer,
            resolver,
            enrichment,
            profiling,
            aggregator,
        }
    }

    /// Build a pipeline backed by the real HTTP services.
    pub fn from_config(config: &Config) -> Result<Self> {
        let services = &config.services;
        let enrichment = &config.enrichment;

        let resolver =
            IdentifierResolver::new(Box::new(MyGeneClient::new(services)?), &enrichment.species);

        let enrichr = EnrichmentRunner::new(
            Box::new(EnrichrClient::new(services)?),
            enrichment.libraries.clone(),
            &enrichment.species,
        )
        .with_cutoff(enrichment.cutoff)
        .with_concurrency(config.general.concurrency);

        let profiling = ProfilingRunner::new(
            Box::new(GprofilerClient::new(services)?),
            &enrichment.gprofiler_organism,
        )
        .with_threshold(enrichment.cutoff);

        let aliases = AliasTable::from(&config.normalization.aliases);
        if aliases.is_empty() {
            warn!("Alias table is empty, identifiers will pass through unchanged");
        } else {
            debug!("Alias table has {} entries", aliases.len());
        }

        Ok(Self::new(
            Normalizer::new(aliases),
            resolver,
            enrichr,
            profiling,
            SummaryAggregator::new(enrichment.top_n),
        ))
    }

    /// Read the gene list at `input` and run on it.
    pub async fn run_file(&self, input: &Path, paths: &OutputPaths) -> Result<RunSummary> {
        let raw = read_gene_list(input)?;
        info!("Read {} identifiers from {}", raw.len(), input.display());
        self.run(raw, paths).await
    }

    /// Run on already-tokenized identifiers.
    pub async fn run(&self, raw: Vec<String>, paths: &OutputPaths) -> Result<RunSummary> {
        let started_at = Utc::now();
        let start_time = Instant::now();
        let mut files = Vec::new();

        paths.ensure_parent_dir()?;

        // Step 1: normalize and save the clean gene table
        let identifiers = self.normalizer.identify(raw);
        let rewritten = identifiers.iter().filter(|id| id.was_rewritten()).count();
        info!(
            "Normalized {} identifiers ({} mitochondrial aliases fixed)",
            identifiers.len(),
            rewritten
        );

        let clean_path = paths.genes_clean();
        write_tsv(&clean_path, &identifiers)?;
        files.push(clean_path);

        let symbols = unique_symbols(&identifiers);
        debug!("Querying services with {} distinct symbols", symbols.len());

        // Step 2: the three services are independent
        let (mapping, enrichr, profile) = tokio::join!(
            self.resolver.resolve(&symbols),
            self.enrichment.run(&symbols),
            self.profiling.run(&symbols),
        );

        // Step 3: write whatever each source produced
        if !mapping.is_empty() {
            let path = paths.mapping();
            write_tsv(&path, &mapping)?;
            files.push(path);
        }

        let tables = enrichr.tables();
        if tables.is_empty() {
            warn!("No Enrichr library returned results");
        } else {
            debug!(
                "{} Enrichr tables: {}",
                tables.len(),
                tables.libraries().join(", ")
            );
        }
        for (library, rows) in tables.iter() {
            let path = paths.enrichr(library);
            write_tsv(&path, rows)?;
            files.push(path);
        }

        if !profile.is_empty() {
            let path = paths.gprofiler();
            write_tsv(&path, &profile)?;
            files.push(path);
        }

        // Step 4: merged summary
        let summary = self.aggregator.summarize(&tables, &profile);
        let summary_rows = summary.as_ref().map_or(0, Vec::len);
        if let Some(rows) = summary {
            let path = paths.summary();
            write_tsv(&path, &rows)?;
            files.push(path);
        }

        Ok(RunSummary {
            started_at,
            duration_seconds: start_time.elapsed().as_secs_f64(),
            identifiers: identifiers.len(),
            rewritten,
            symbols: symbols.len(),
            mapped: mapping.iter().filter(|r| r.is_found()).count(),
            libraries_ok: enrichr.succeeded(),
            libraries_failed: enrichr.failures().len(),
            gprofiler_terms: profile.len(),
            summary_rows,
            files,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EnrichmentResult, GeneIdentifier, MappingRecord, SummaryRow};
    use crate::report::writer::read_tsv;
    use crate::config::ServicesConfig;
    use crate::services::mock::{
        hanging_server, record, MockEnrichmentService, MockMetadataService, MockProfilingService,
    };
    use serde_json::json;
    use tempfile::TempDir;

    const LIBRARIES: [&str; 2] = ["KEGG_2021_Human", "Reactome_2022"];

    fn pipeline(
        metadata: MockMetadataService,
        enrichr: MockEnrichmentService,
        profiling: MockProfilingService,
    ) -> Pipeline {
        Pipeline::new(
            Normalizer::default(),
            IdentifierResolver::new(Box::new(metadata), "human"),
            EnrichmentRunner::new(
                Box::new(enrichr),
                LIBRARIES.iter().map(|s| s.to_string()).collect(),
                "human",
            ),
            ProfilingRunner::new(Box::new(profiling), "hsapiens"),
            SummaryAggregator::default(),
        )
    }

    fn write_input(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("genes.txt");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_text_value() {
        assert_eq!(text_value(&json!("MT-ND1")), Some("MT-ND1".to_string()));
        assert_eq!(text_value(&json!(4535)), Some("4535".to_string()));
        assert_eq!(text_value(&json!(["A", "B"])), Some("A;B".to_string()));
        assert_eq!(text_value(&json!("  ")), None);
        assert_eq!(text_value(&json!(null)), None);
    }

    #[test]
    fn test_number_value() {
        assert_eq!(number_value(&json!(0.05)), Some(0.05));
        assert_eq!(number_value(&json!("1e-3")), Some(1e-3));
        assert_eq!(number_value(&json!("n/a")), None);
        assert_eq!(number_value(&json!(true)), None);
    }

    #[tokio::test]
    async fn test_all_services_unreachable() {
        let temp_dir = TempDir::new().unwrap();
        let input = write_input(&temp_dir, "ND1\nCO1\n# comment\n\nATP6");
        let paths = OutputPaths::new(temp_dir.path().join("out/run").to_string_lossy());

        let pipeline = pipeline(
            MockMetadataService::unreachable(),
            MockEnrichmentService::new()
                .failing(LIBRARIES[0])
                .failing(LIBRARIES[1]),
            MockProfilingService::unreachable(),
        );
        let summary = pipeline.run_file(&input, &paths).await.unwrap();

        let clean: Vec<GeneIdentifier> = read_tsv(&paths.genes_clean()).unwrap();
        let normalized: Vec<&str> = clean.iter().map(|g| g.normalized.as_str()).collect();
        assert_eq!(normalized, vec!["MT-ND1", "MT-CO1", "MT-ATP6"]);

        assert!(!paths.mapping().exists());
        for library in LIBRARIES {
            assert!(!paths.enrichr(library).exists());
        }
        assert!(!paths.gprofiler().exists());
        assert!(!paths.summary().exists());

        assert_eq!(summary.files, vec![paths.genes_clean()]);
        assert_eq!(summary.libraries_failed, 2);
        assert_eq!(summary.summary_rows, 0);
    }

    #[tokio::test]
    async fn test_full_run_writes_every_table() {
        let temp_dir = TempDir::new().unwrap();
        let input = write_input(&temp_dir, "nd1, co1\nTP53 nd1\n");
        let paths = OutputPaths::new(temp_dir.path().join("run").to_string_lossy());

        let metadata = MockMetadataService::with_hits(vec![
            json!({"query": "MT-ND1", "symbol": "MT-ND1", "ensembl": {"gene": "ENSG00000198888"}, "taxid": 9606}),
            json!({"query": "MT-CO1", "symbol": "MT-CO1", "ensembl": [{"gene": "ENSG00000198804"}], "taxid": 9606}),
            json!({"query": "TP53", "notfound": true}),
        ]);
        let enrichr = MockEnrichmentService::new()
            .with_library(
                "KEGG_2021_Human",
                vec![
                    record(&[("Term", json!("Parkinson disease")), ("Adjusted P-value", json!(0.02))]),
                    record(&[("Term", json!("Oxidative phosphorylation")), ("Adjusted P-value", json!(0.001))]),
                ],
            )
            .failing("Reactome_2022");
        let profiling = MockProfilingService::with_rows(vec![record(&[
            ("source", json!("GO:CC")),
            ("name", json!("respiratory chain complex")),
            ("p_value", json!(1e-5)),
        ])]);

        let summary = pipeline(metadata, enrichr, profiling)
            .run_file(&input, &paths)
            .await
            .unwrap();

        assert_eq!(summary.identifiers, 4);
        assert_eq!(summary.rewritten, 3);
        assert_eq!(summary.symbols, 3);
        assert_eq!(summary.mapped, 2);
        assert_eq!(summary.libraries_ok, 1);
        assert_eq!(summary.libraries_failed, 1);

        let clean: Vec<GeneIdentifier> = read_tsv(&paths.genes_clean()).unwrap();
        assert_eq!(clean.len(), 4);

        let mapping: Vec<MappingRecord> = read_tsv(&paths.mapping()).unwrap();
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping[1].ensembl_gene.as_deref(), Some("ENSG00000198804"));

        let kegg: Vec<EnrichmentResult> = read_tsv(&paths.enrichr("KEGG_2021_Human")).unwrap();
        assert_eq!(kegg[0].term.as_deref(), Some("Oxidative phosphorylation"));
        assert!(!paths.enrichr("Reactome_2022").exists());

        let gprofiler: Vec<EnrichmentResult> = read_tsv(&paths.gprofiler()).unwrap();
        assert_eq!(gprofiler[0].source, "GO:CC");

        let resumen: Vec<SummaryRow> = read_tsv(&paths.summary()).unwrap();
        let sources: Vec<&str> = resumen.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(
            sources,
            vec!["enrichr:KEGG_2021_Human", "enrichr:KEGG_2021_Human", "gprofiler"]
        );
        assert_eq!(summary.summary_rows, 3);
    }

    #[tokio::test]
    async fn test_hanging_service_only_drops_its_tables() {
        let temp_dir = TempDir::new().unwrap();
        let input = write_input(&temp_dir, "ND1\nCO1\n");
        let paths = OutputPaths::new(temp_dir.path().join("run").to_string_lossy());

        let services = ServicesConfig {
            gprofiler_url: hanging_server().await,
            timeout_seconds: 1,
            ..ServicesConfig::default()
        };
        let enrichr = MockEnrichmentService::new()
            .with_library(
                "KEGG_2021_Human",
                vec![record(&[
                    ("Term", json!("Oxidative phosphorylation")),
                    ("Adjusted P-value", json!(0.001)),
                ])],
            )
            .failing("Reactome_2022");

        let pipeline = Pipeline::new(
            Normalizer::default(),
            IdentifierResolver::new(Box::new(MockMetadataService::unreachable()), "human"),
            EnrichmentRunner::new(
                Box::new(enrichr),
                LIBRARIES.iter().map(|s| s.to_string()).collect(),
                "human",
            ),
            ProfilingRunner::new(Box::new(GprofilerClient::new(&services).unwrap()), "hsapiens"),
            SummaryAggregator::default(),
        );
        let summary = pipeline.run_file(&input, &paths).await.unwrap();

        assert_eq!(summary.gprofiler_terms, 0);
        assert!(!paths.gprofiler().exists());
        assert!(paths.enrichr("KEGG_2021_Human").exists());

        let resumen: Vec<SummaryRow> = read_tsv(&paths.summary()).unwrap();
        assert_eq!(resumen.len(), 1);
        assert_eq!(resumen[0].source, "enrichr:KEGG_2021_Human");
    }

    #[tokio::test]
    async fn test_empty_input_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let input = write_input(&temp_dir, "# nothing here\n\n");
        let paths = OutputPaths::new(temp_dir.path().join("run").to_string_lossy());

        let pipeline = pipeline(
            MockMetadataService::unreachable(),
            MockEnrichmentService::new(),
            MockProfilingService::unreachable(),
        );
        let err = pipeline.run_file(&input, &paths).await.unwrap_err();

        assert!(err.to_string().contains("no valid gene identifiers"));
        assert!(!paths.genes_clean().exists());
    }

    #[test]
    fn test_from_config() {
        assert!(Pipeline::from_config(&Config::default()).is_ok());
    }
}
