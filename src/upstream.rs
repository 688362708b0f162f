//! # Upstream Client Module
//!
//! ## Purpose
//! HTTP client for the Yargıtay public decision-search backend. Wraps the
//! two upstream operations (paginated keyword search, document fetch by id)
//! and normalizes the backend's response envelope into domain types.
//!
//! ## Input/Output Specification
//! - **Input**: Normalized search requests, decision ids
//! - **Output**: Parsed decision pages and document content strings
//! - **Rate Limits**: Every call, successful or not, consumes one slot from
//!   the shared [`RateLimiter`] before the request is sent
//!
//! ## Upstream Protocol
//! - `POST /aramalist` with `{"data": {"aranan", "arananKelime", "pageSize",
//!   "pageNumber"}}`; rows arrive under `data.data` with page totals in
//!   `data.recordsTotal` / `data.recordsFiltered`
//! - `GET /getDokuman?id=<id>`; content arrives under `data` with the status
//!   in `metadata.FMTY` (`SUCCESS` or `ERROR` with a message in `FMTE`)

use crate::config::UpstreamConfig;
use crate::errors::{Result, SearchError};
use crate::params::SearchRequest;
use crate::rate_limit::RateLimiter;
use crate::Decision;
use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// One page of upstream search results with pass-through record counts
#[derive(Debug, Clone)]
pub struct DecisionPage {
    pub decisions: Vec<Decision>,
    pub total_records: u64,
    pub filtered_records: u64,
}

/// Seam between the orchestrator and the upstream backend.
///
/// The production implementation is [`YargitayClient`]; tests substitute a
/// stub so orchestration logic can be exercised without the network.
#[async_trait]
pub trait DecisionSource: Send + Sync {
    /// Run one search query against the upstream backend
    async fn search(&self, request: &SearchRequest) -> Result<DecisionPage>;

    /// Fetch the full document content for one decision id
    async fn fetch_content(&self, decision_id: &str) -> Result<String>;
}

/// Search response envelope: `{data: {data: [...], recordsTotal, recordsFiltered}, metadata}`
#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    data: Option<SearchData>,
    metadata: Option<EnvelopeMetadata>,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    #[serde(default)]
    data: Option<Vec<Decision>>,
    #[serde(default, rename = "recordsTotal")]
    records_total: Option<u64>,
    #[serde(default, rename = "recordsFiltered")]
    records_filtered: Option<u64>,
}

/// Document response envelope: `{data: "<html>", metadata: {FMTY, FMTE}}`
#[derive(Debug, Deserialize)]
struct ContentEnvelope {
    data: Option<String>,
    metadata: Option<EnvelopeMetadata>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeMetadata {
    #[serde(default, rename = "FMTY")]
    status: Option<String>,
    #[serde(default, rename = "FMTE")]
    message: Option<String>,
}

impl EnvelopeMetadata {
    fn is_error(&self) -> bool {
        matches!(self.status.as_deref(), Some("ERROR"))
    }

    fn message(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| "unknown upstream error".to_string())
    }
}

/// HTTP client for the Yargıtay decision backend
pub struct YargitayClient {
    config: UpstreamConfig,
    client: Client,
    rate_limiter: Arc<RateLimiter>,
}

impl YargitayClient {
    /// Create a new upstream client sharing the given rate limiter
    pub fn new(config: UpstreamConfig, rate_limiter: Arc<RateLimiter>) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json, text/plain, */*"),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SearchError::Config {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            config,
            client,
            rate_limiter,
        })
    }

    /// Map throttle and transport-level HTTP statuses before body parsing
    fn check_status(response: Response) -> Result<Response> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_seconds = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(SearchError::UpstreamRateLimited {
                retry_after_seconds,
            });
        }

        if !status.is_success() {
            return Err(SearchError::UpstreamUnavailable {
                details: format!("HTTP {}", status),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl DecisionSource for YargitayClient {
    async fn search(&self, request: &SearchRequest) -> Result<DecisionPage> {
        self.rate_limiter.acquire().await;

        let url = format!("{}/aramalist", self.config.base_url);
        let payload = json!({
            "data": {
                "aranan": request.keyword(),
                "arananKelime": request.keyword(),
                "pageSize": request.page_size(),
                "pageNumber": request.page_number(),
            }
        });

        debug!(
            keyword = request.keyword(),
            page_number = request.page_number(),
            page_size = request.page_size(),
            "Searching upstream decisions"
        );

        let response = self.client.post(&url).json(&payload).send().await?;
        let response = Self::check_status(response)?;
        let envelope: SearchEnvelope = response.json().await?;

        if let Some(metadata) = &envelope.metadata {
            if metadata.is_error() {
                return Err(SearchError::UpstreamMalformed {
                    details: format!("upstream reported search error: {}", metadata.message()),
                });
            }
        }

        let data = envelope.data.ok_or_else(|| SearchError::UpstreamMalformed {
            details: "missing data envelope in search response".to_string(),
        })?;
        let decisions = data.data.ok_or_else(|| SearchError::UpstreamMalformed {
            details: "missing result rows in search response".to_string(),
        })?;

        // Record counts are opaque upstream metadata, passed through verbatim
        let total_records = data.records_total.unwrap_or(decisions.len() as u64);
        let filtered_records = data.records_filtered.unwrap_or(decisions.len() as u64);

        info!(
            keyword = request.keyword(),
            results = decisions.len(),
            total_records = total_records,
            "Upstream search completed"
        );

        Ok(DecisionPage {
            decisions,
            total_records,
            filtered_records,
        })
    }

    async fn fetch_content(&self, decision_id: &str) -> Result<String> {
        self.rate_limiter.acquire().await;

        let url = format!("{}/getDokuman", self.config.base_url);

        debug!(decision_id = decision_id, "Fetching decision content");

        let response = self
            .client
            .get(&url)
            .query(&[("id", decision_id)])
            .send()
            .await?;
        let response = Self::check_status(response)?;
        let envelope: ContentEnvelope = response.json().await?;

        match envelope.metadata {
            Some(metadata) if metadata.is_error() => Err(SearchError::ContentNotFound {
                decision_id: decision_id.to_string(),
            }),
            Some(metadata) if metadata.status.as_deref() == Some("SUCCESS") => {
                let content = envelope.data.unwrap_or_default();
                info!(
                    decision_id = decision_id,
                    content_length = content.chars().count(),
                    "Decision content fetched"
                );
                Ok(content)
            }
            _ => Err(SearchError::UpstreamMalformed {
                details: "unexpected document response envelope".to_string(),
            }),
        }
    }
}
