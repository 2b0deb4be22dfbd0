//! In-memory service doubles for pipeline tests.

use super::{
    EnrichmentService, GeneMetadataService, MetadataQuery, ProfilingService, RawRecord,
    ServiceError, MAX_QUERY_TERMS,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tokio::net::TcpListener;

fn unreachable_error(service: &'static str) -> ServiceError {
    ServiceError::Connect {
        service,
        url: "http://127.0.0.1:9".to_string(),
    }
}

/// Base URL of a local server that accepts connections and never answers.
pub async fn hanging_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    format!("http://{}", addr)
}

/// Build a raw record from column/value pairs.
pub fn record(pairs: &[(&str, Value)]) -> RawRecord {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

// ── Gene metadata ──────────────────────────────────────────────────────────

enum MetadataBehavior {
    Hits(Vec<Value>),
    Echo,
    Unreachable,
}

pub struct MockMetadataService {
    behavior: MetadataBehavior,
}

impl MockMetadataService {
    pub fn with_hits(hits: Vec<Value>) -> Self {
        Self {
            behavior: MetadataBehavior::Hits(hits),
        }
    }

    /// Answers every symbol with a matching hit and rejects oversized
    /// batches the way MyGene.info does.
    pub fn echoing() -> Self {
        Self {
            behavior: MetadataBehavior::Echo,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            behavior: MetadataBehavior::Unreachable,
        }
    }
}

#[async_trait]
impl GeneMetadataService for MockMetadataService {
    async fn query_many(
        &self,
        symbols: &[String],
        _query: &MetadataQuery,
    ) -> Result<Vec<Value>, ServiceError> {
        match &self.behavior {
            MetadataBehavior::Hits(hits) => Ok(hits.clone()),
            MetadataBehavior::Echo if symbols.len() > MAX_QUERY_TERMS => Err(ServiceError::Status {
                service: "MyGene.info",
                status: 400,
                body: format!("batch of {} terms exceeds {}", symbols.len(), MAX_QUERY_TERMS),
            }),
            MetadataBehavior::Echo => Ok(symbols
                .iter()
                .map(|s| json!({"query": s, "symbol": s}))
                .collect()),
            MetadataBehavior::Unreachable => Err(unreachable_error("MyGene.info")),
        }
    }
}

// ── Enrichment ─────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockEnrichmentService {
    tables: HashMap<String, Vec<RawRecord>>,
    failing: HashSet<String>,
    calls: Mutex<Vec<(String, String, f64)>>,
}

impl MockEnrichmentService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_library(mut self, library: &str, rows: Vec<RawRecord>) -> Self {
        self.tables.insert(library.to_string(), rows);
        self
    }

    pub fn failing(mut self, library: &str) -> Self {
        self.failing.insert(library.to_string());
        self
    }

    /// (library, organism, cutoff) per call, in call order.
    pub fn calls(&self) -> Vec<(String, String, f64)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EnrichmentService for MockEnrichmentService {
    async fn enrich(
        &self,
        _symbols: &[String],
        library: &str,
        organism: &str,
        cutoff: f64,
    ) -> Result<Vec<RawRecord>, ServiceError> {
        self.calls
            .lock()
            .unwrap()
            .push((library.to_string(), organism.to_string(), cutoff));

        if self.failing.contains(library) {
            return Err(unreachable_error("Enrichr"));
        }
        Ok(self.tables.get(library).cloned().unwrap_or_default())
    }
}

// ── Profiling ──────────────────────────────────────────────────────────────

pub struct MockProfilingService {
    rows: Option<Vec<RawRecord>>,
}

impl MockProfilingService {
    pub fn with_rows(rows: Vec<RawRecord>) -> Self {
        Self { rows: Some(rows) }
    }

    pub fn unreachable() -> Self {
        Self { rows: None }
    }
}

#[async_trait]
impl ProfilingService for MockProfilingService {
    async fn profile(
        &self,
        _symbols: &[String],
        _organism: &str,
        _threshold: f64,
    ) -> Result<Vec<RawRecord>, ServiceError> {
        self.rows.clone().ok_or_else(|| unreachable_error("g:Profiler"))
    }
}
