//! Enrichr REST client.
//!
//! A query is two calls: `POST addList` uploads the gene set and returns a
//! `userListId`, then `GET export` runs it against one library and answers
//! with a tab-separated table:
//!
//! ```text
//! Term  Overlap  P-value  Adjusted P-value  Old P-value  Old Adjusted P-value
//! Odds Ratio  Combined Score  Genes
//! ```
//!
//! Each line becomes a record keyed by those column names.

use super::{ensure_success, request_error, EnrichmentService, RawRecord, ServiceError};
use crate::config::ServicesConfig;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::multipart::Form;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

const SERVICE: &str = "Enrichr";

/// Column every export table starts with.
const TERM_COLUMN: &str = "Term";

#[derive(Debug, Deserialize)]
struct AddListResponse {
    #[serde(rename = "userListId")]
    user_list_id: u64,
}

/// Client for the Enrichr API family.
pub struct EnrichrClient {
    http_client: reqwest::Client,
    host: String,
    timeout_seconds: u64,
}

impl EnrichrClient {
    pub fn new(config: &ServicesConfig) -> Result<Self> {
        Ok(Self {
            http_client: super::build_http_client(config.timeout_seconds)?,
            host: config.enrichr_url.trim_end_matches('/').to_string(),
            timeout_seconds: config.timeout_seconds,
        })
    }

    /// Base URL of the Enrichr flavor serving an organism.
    pub fn organism_url(&self, organism: &str) -> Result<String, ServiceError> {
        let flavor = match organism.to_lowercase().as_str() {
            "human" | "mouse" => "Enrichr",
            "fly" => "FlyEnrichr",
            "yeast" => "YeastEnrichr",
            "worm" => "WormEnrichr",
            "fish" => "FishEnrichr",
            _ => {
                return Err(ServiceError::UnsupportedOrganism {
                    service: SERVICE,
                    organism: organism.to_string(),
                })
            }
        };
        Ok(format!("{}/{}", self.host, flavor))
    }

    async fn add_list(&self, base_url: &str, symbols: &[String]) -> Result<u64, ServiceError> {
        let url = format!("{}/addList", base_url);
        let form = Form::new()
            .text("list", symbols.join("\n"))
            .text("description", "mitoenrich");

        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| request_error(SERVICE, &url, self.timeout_seconds, e))?;

        let response = ensure_success(SERVICE, response).await?;
        let added: AddListResponse = response
            .json()
            .await
            .map_err(|e| request_error(SERVICE, &url, self.timeout_seconds, e))?;

        debug!("Uploaded {} genes as user list {}", symbols.len(), added.user_list_id);
        Ok(added.user_list_id)
    }
}

/// Turn an export table into named records.
///
/// Empty fields are left out of the record. Rows whose adjusted p-value
/// exceeds `cutoff` are dropped.
pub fn parse_export_response(body: &str, cutoff: f64) -> Result<Vec<RawRecord>, ServiceError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let decode = |e: csv::Error| ServiceError::Decode {
        service: SERVICE,
        reason: e.to_string(),
    };

    let headers = reader.headers().map_err(decode)?.clone();
    if headers.get(0).map(str::trim) != Some(TERM_COLUMN) {
        return Err(ServiceError::Decode {
            service: SERVICE,
            reason: format!(
                "unexpected export header: {}",
                headers.iter().collect::<Vec<_>>().join(", ")
            ),
        });
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(decode)?;

        let record: RawRecord = headers
            .iter()
            .zip(row.iter())
            .map(|(column, field)| (column.trim(), field.trim()))
            .filter(|(_, field)| !field.is_empty())
            .map(|(column, field)| (column.to_string(), Value::String(field.to_string())))
            .collect();

        let adjusted = record
            .get("Adjusted P-value")
            .and_then(Value::as_str)
            .and_then(|p| p.parse::<f64>().ok());
        if adjusted.map_or(true, |p| p <= cutoff) {
            records.push(record);
        }
    }

    Ok(records)
}

#[async_trait]
impl EnrichmentService for EnrichrClient {
    async fn enrich(
        &self,
        symbols: &[String],
        library: &str,
        organism: &str,
        cutoff: f64,
    ) -> Result<Vec<RawRecord>, ServiceError> {
        let base_url = self.organism_url(organism)?;
        let list_id = self.add_list(&base_url, symbols).await?;

        let url = format!("{}/export", base_url);
        let list_id = list_id.to_string();
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("userListId", list_id.as_str()),
                ("filename", library),
                ("backgroundType", library),
            ])
            .send()
            .await
            .map_err(|e| request_error(SERVICE, &url, self.timeout_seconds, e))?;

        let response = ensure_success(SERVICE, response).await?;
        let body = response
            .text()
            .await
            .map_err(|e| request_error(SERVICE, &url, self.timeout_seconds, e))?;

        parse_export_response(&body, cutoff)
    }
}
