//! # Yargıtay Decision Search Proxy
//!
//! ## Overview
//! This library implements a client-side access layer over the Turkish
//! Supreme Court (Yargıtay) public decision-search backend. The backend is
//! rate limited, paginated and occasionally flaky, so every outbound call is
//! spaced by a shared rate limiter and wrapped with exponential-backoff
//! retries before results are normalized into a stable shape.
//!
//! ## Architecture
//! The system is composed of several key modules:
//! - `params`: Validation and coercion of caller-supplied search parameters
//! - `rate_limit`: Randomized spacing of all outbound upstream calls
//! - `upstream`: HTTP client for the decision search and document endpoints
//! - `retry`: Exponential-backoff retry wrapper around upstream operations
//! - `search`: Orchestration of normalize, search, content enrichment
//! - `api`: REST API endpoints
//! - `config`: Configuration management and settings
//! - `errors`: Centralized error handling and types
//!
//! ## Usage
//! ```rust,no_run
//! use yargitay_search::{config::Config, params::RawSearchParams, search::SearchService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config.toml")?;
//!     let service = SearchService::from_config(&config)?;
//!     let params = RawSearchParams {
//!         keyword: Some("işveren".to_string()),
//!         ..Default::default()
//!     };
//!     let result = service.search(&params).await?;
//!     println!("Found {} decisions", result.total_in_page);
//!     Ok(())
//! }
//! ```

// Core modules
pub mod api;
pub mod config;
pub mod errors;
pub mod params;
pub mod rate_limit;
pub mod retry;
pub mod search;
pub mod upstream;

// Re-exports for convenience
pub use config::Config;
pub use errors::{Result, SearchError};
pub use search::{SearchResult, SearchService};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One Yargıtay decision row as returned by the upstream search endpoint.
///
/// Field names follow the upstream wire format so that rows pass through to
/// API consumers unchanged. `document_content` is populated only when content
/// enrichment was requested and the fetch for this row succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// Upstream document identifier
    pub id: String,
    /// Chamber that issued the decision
    #[serde(default)]
    pub daire: String,
    /// Case number (esas)
    #[serde(default, rename = "esasNo")]
    pub esas_no: String,
    /// Decision number (karar)
    #[serde(default, rename = "kararNo")]
    pub karar_no: String,
    /// Decision date
    #[serde(default, rename = "kararTarihi")]
    pub karar_tarihi: String,
    /// Keyword the row matched
    #[serde(default, rename = "arananKelime")]
    pub aranan_kelime: String,
    /// Relevance rank index
    #[serde(default)]
    pub index: String,
    /// 1-based position within the page
    #[serde(default, rename = "siraNo")]
    pub sira_no: u64,
    /// Full document content, when fetched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_content: Option<String>,
}

/// Document content for a single decision
#[derive(Debug, Clone, Serialize)]
pub struct ContentResult {
    pub decision_id: String,
    pub content: String,
    pub content_length: usize,
}

impl ContentResult {
    /// Build a content result; `content_length` always equals the character
    /// count of `content`.
    pub fn new(decision_id: impl Into<String>, content: String) -> Self {
        let content_length = content.chars().count();
        Self {
            decision_id: decision_id.into(),
            content,
            content_length,
        }
    }
}

/// Application state shared across API handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Config>,
    pub search_service: Arc<search::SearchService>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_length_matches_content() {
        let result = ContentResult::new("1", "karar metni".to_string());
        assert_eq!(result.content_length, 11);

        let empty = ContentResult::new("2", String::new());
        assert_eq!(empty.content_length, 0);

        // Multi-byte Turkish characters count as single characters
        let turkish = ContentResult::new("3", "işçi ücreti".to_string());
        assert_eq!(turkish.content_length, "işçi ücreti".chars().count());
    }

    #[test]
    fn test_decision_serializes_with_upstream_field_names() {
        let decision = Decision {
            id: "111".to_string(),
            daire: "9. Hukuk Dairesi".to_string(),
            esas_no: "2021/100".to_string(),
            karar_no: "2022/200".to_string(),
            karar_tarihi: "01.02.2022".to_string(),
            aranan_kelime: "işveren".to_string(),
            index: "1".to_string(),
            sira_no: 1,
            document_content: None,
        };

        let value = serde_json::to_value(&decision).unwrap();
        assert_eq!(value["esasNo"], "2021/100");
        assert_eq!(value["kararTarihi"], "01.02.2022");
        assert_eq!(value["siraNo"], 1);
        assert!(value.get("document_content").is_none());
    }

    #[test]
    fn test_decision_tolerates_missing_fields() {
        let decision: Decision = serde_json::from_str(r#"{"id": "42"}"#).unwrap();
        assert_eq!(decision.id, "42");
        assert_eq!(decision.daire, "");
        assert_eq!(decision.sira_no, 0);
        assert!(decision.document_content.is_none());
    }
}
