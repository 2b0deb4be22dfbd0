//! g:Profiler g:GOSt client.

use super::{ensure_success, request_error, ProfilingService, RawRecord, ServiceError};
use crate::config::ServicesConfig;
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

const SERVICE: &str = "g:Profiler";

/// g:GOSt profile request.
#[derive(Debug, Serialize)]
struct ProfileRequest<'a> {
    organism: &'a str,
    query: &'a [String],
    user_threshold: f64,
    all_results: bool,
    no_evidences: bool,
}

/// Client for `POST /api/gost/profile/`.
pub struct GprofilerClient {
    http_client: reqwest::Client,
    base_url: String,
    timeout_seconds: u64,
}

impl GprofilerClient {
    pub fn new(config: &ServicesConfig) -> Result<Self> {
        Ok(Self {
            http_client: super::build_http_client(config.timeout_seconds)?,
            base_url: config.gprofiler_url.trim_end_matches('/').to_string(),
            timeout_seconds: config.timeout_seconds,
        })
    }
}

/// Extract the `result` rows of a profile response.
pub fn parse_profile_response(body: Value) -> Result<Vec<RawRecord>, ServiceError> {
    let rows = match body {
        Value::Object(mut obj) => match obj.remove("result") {
            Some(Value::Array(rows)) => rows,
            Some(Value::Null) | None => return Ok(Vec::new()),
            Some(_) => {
                return Err(ServiceError::Decode {
                    service: SERVICE,
                    reason: "'result' is not a list".to_string(),
                })
            }
        },
        _ => {
            return Err(ServiceError::Decode {
                service: SERVICE,
                reason: "expected a JSON object".to_string(),
            })
        }
    };

    rows.into_iter()
        .map(|row| match row {
            Value::Object(record) => Ok(record),
            other => Err(ServiceError::Decode {
                service: SERVICE,
                reason: format!("unexpected result row: {}", other),
            }),
        })
        .collect()
}

#[async_trait]
impl ProfilingService for GprofilerClient {
    async fn profile(
        &self,
        symbols: &[String],
        organism: &str,
        threshold: f64,
    ) -> Result<Vec<RawRecord>, ServiceError> {
        let url = format!("{}/api/gost/profile/", self.base_url);
        debug!("Profiling {} symbols with {} ({})", symbols.len(), SERVICE, organism);

        let request = ProfileRequest {
            organism,
            query: symbols,
            user_threshold: threshold,
            all_results: true,
            no_evidences: false,
        };

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| request_error(SERVICE, &url, self.timeout_seconds, e))?;

        let response = ensure_success(SERVICE, response).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| request_error(SERVICE, &url, self.timeout_seconds, e))?;

        parse_profile_response(body)
    }
}
