//! MyGene.info batch query client.

use super::{ensure_success, request_error, GeneMetadataService, MetadataQuery, ServiceError};
use crate::config::ServicesConfig;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

const SERVICE: &str = "MyGene.info";

/// Most terms MyGene.info accepts in one batch query.
pub const MAX_QUERY_TERMS: usize = 1000;

/// Client for `POST /query` batch lookups.
pub struct MyGeneClient {
    http_client: reqwest::Client,
    base_url: String,
    timeout_seconds: u64,
}

impl MyGeneClient {
    pub fn new(config: &ServicesConfig) -> Result<Self> {
        Ok(Self {
            http_client: super::build_http_client(config.timeout_seconds)?,
            base_url: config.mygene_url.trim_end_matches('/').to_string(),
            timeout_seconds: config.timeout_seconds,
        })
    }
}

/// Accept the batch response, which must be a JSON array of hits.
pub fn parse_query_response(body: Value) -> Result<Vec<Value>, ServiceError> {
    match body {
        Value::Array(hits) => Ok(hits),
        Value::Object(obj) if obj.contains_key("error") => Err(ServiceError::Decode {
            service: SERVICE,
            reason: obj["error"].to_string(),
        }),
        other => Err(ServiceError::Decode {
            service: SERVICE,
            reason: format!("expected an array of hits, got {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait]
impl GeneMetadataService for MyGeneClient {
    async fn query_many(
        &self,
        symbols: &[String],
        query: &MetadataQuery,
    ) -> Result<Vec<Value>, ServiceError> {
        let url = format!("{}/query", self.base_url);
        debug!("Querying {} for {} symbols", SERVICE, symbols.len());

        let form = [
            ("q", symbols.join(",")),
            ("scopes", query.scopes.join(",")),
            ("fields", query.fields.join(",")),
            ("species", query.species.clone()),
        ];

        let response = self
            .http_client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| request_error(SERVICE, &url, self.timeout_seconds, e))?;

        let response = ensure_success(SERVICE, response).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| request_error(SERVICE, &url, self.timeout_seconds, e))?;

        parse_query_response(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_array_response() {
        let hits = parse_query_response(json!([
            {"query": "MT-ND1", "symbol": "MT-ND1", "taxid": 9606},
            {"query": "FOO", "notfound": true}
        ]))
        .unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_parse_error_object() {
        let err = parse_query_response(json!({"success": false, "error": "bad scopes"}))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Decode { .. }));
        assert!(err.to_string().contains("bad scopes"));
    }

    #[test]
    fn test_parse_unexpected_shape() {
        let err = parse_query_response(json!("nope")).unwrap_err();
        assert!(err.to_string().contains("a string"));
    }

    #[test]
    fn test_client_trims_base_url() {
        let config = ServicesConfig {
            mygene_url: "http://localhost:9000/v3/".to_string(),
            ..ServicesConfig::default()
        };
        let client = MyGeneClient::new(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:9000/v3");
    }
}
