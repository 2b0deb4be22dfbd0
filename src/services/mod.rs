//! Clients for the external annotation services.
//!
//! Each service sits behind an async trait so the pipeline can be driven
//! by in-memory doubles in tests. The HTTP clients only fetch and reshape
//! payloads; every policy decision lives in `crate::pipeline`.

pub mod enrichr;
pub mod gprofiler;
pub mod mygene;

#[cfg(test)]
pub mod mock;

pub use enrichr::EnrichrClient;
pub use gprofiler::GprofilerClient;
pub use mygene::{MyGeneClient, MAX_QUERY_TERMS};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

/// One result row keyed by the service's own column names.
pub type RawRecord = Map<String, Value>;

/// A failed call to an external service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{service} request timed out after {seconds}s")]
    Timeout { service: &'static str, seconds: u64 },

    #[error("cannot connect to {service} at {url}")]
    Connect { service: &'static str, url: String },

    #[error("{service} API error {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} request failed: {source}")]
    Request {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed {service} response: {reason}")]
    Decode { service: &'static str, reason: String },

    #[error("{service} does not support organism '{organism}'")]
    UnsupportedOrganism {
        service: &'static str,
        organism: String,
    },
}

/// Lookup options for the gene-metadata service.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataQuery {
    pub species: String,
    pub scopes: Vec<String>,
    pub fields: Vec<String>,
}

impl MetadataQuery {
    /// Symbol/alias/name lookup returning the fields of a mapping record.
    pub fn for_species(species: impl Into<String>) -> Self {
        Self {
            species: species.into(),
            scopes: ["symbol", "alias", "name"].map(String::from).to_vec(),
            fields: ["symbol", "name", "entrezgene", "ensembl.gene", "taxid"]
                .map(String::from)
                .to_vec(),
        }
    }
}

/// Batch gene identifier lookup (MyGene.info).
#[async_trait]
pub trait GeneMetadataService: Send + Sync {
    /// One JSON hit per matched (or explicitly unmatched) query.
    async fn query_many(
        &self,
        symbols: &[String],
        query: &MetadataQuery,
    ) -> Result<Vec<Value>, ServiceError>;
}

/// Per-library over-representation analysis (Enrichr).
#[async_trait]
pub trait EnrichmentService: Send + Sync {
    /// Rows use Enrichr's column names (`Term`, `P-value`, ...).
    async fn enrich(
        &self,
        symbols: &[String],
        library: &str,
        organism: &str,
        cutoff: f64,
    ) -> Result<Vec<RawRecord>, ServiceError>;
}

/// Functional profiling across all annotation sources (g:Profiler).
#[async_trait]
pub trait ProfilingService: Send + Sync {
    /// Rows use g:Profiler's column names (`name`, `p_value`, ...).
    async fn profile(
        &self,
        symbols: &[String],
        organism: &str,
        threshold: f64,
    ) -> Result<Vec<RawRecord>, ServiceError>;
}

/// Build the shared HTTP client with a bounded request timeout.
pub fn build_http_client(timeout_seconds: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(concat!("mitoenrich/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")
}

/// Map a transport error to a service error.
pub(crate) fn request_error(
    service: &'static str,
    url: &str,
    timeout_seconds: u64,
    e: reqwest::Error,
) -> ServiceError {
    if e.is_timeout() {
        ServiceError::Timeout {
            service,
            seconds: timeout_seconds,
        }
    } else if e.is_connect() {
        ServiceError::Connect {
            service,
            url: url.to_string(),
        }
    } else if e.is_decode() {
        ServiceError::Decode {
            service,
            reason: e.to_string(),
        }
    } else {
        ServiceError::Request { service, source: e }
    }
}

/// Fail on non-success HTTP status, keeping the response body for the message.
pub(crate) async fn ensure_success(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ServiceError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Status {
        service,
        status,
        body,
    })
}
