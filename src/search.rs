//! # Search Orchestration Module
//!
//! ## Purpose
//! Top-level entry point combining parameter normalization, retries and the
//! upstream client into a single search operation, optionally enriching each
//! result row with its full document content.
//!
//! ## Input/Output Specification
//! - **Input**: Raw caller parameters, decision ids
//! - **Output**: Aggregated [`SearchResult`] / [`ContentResult`]
//! - **Flow**: normalize → search → (content enrichment)* → aggregate
//!
//! ## Failure Policy
//! A search-step failure aborts the whole call. Content-enrichment failures
//! are per-item only: the affected row keeps `document_content` unset and the
//! aggregate result still reports success.

use crate::config::Config;
use crate::errors::{Result, SearchError};
use crate::params::{normalize, RawSearchParams, SearchRequest};
use crate::rate_limit::RateLimiter;
use crate::retry::RetryingExecutor;
use crate::upstream::{DecisionSource, YargitayClient};
use crate::{ContentResult, Decision};
use std::sync::Arc;
use tracing::{info, warn};

/// Aggregated outcome of one search call
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The normalized request the result was produced for
    pub request: SearchRequest,
    /// Decisions in page order
    pub decisions: Vec<Decision>,
    /// Number of decisions in this page
    pub total_in_page: usize,
    /// Total record count reported by upstream, passed through verbatim
    pub total_records: u64,
    /// Filtered record count reported by upstream, passed through verbatim
    pub filtered_records: u64,
}

/// Orchestrates searches against the upstream decision backend
pub struct SearchService {
    source: Arc<dyn DecisionSource>,
    executor: RetryingExecutor,
}

impl SearchService {
    pub fn new(source: Arc<dyn DecisionSource>, executor: RetryingExecutor) -> Self {
        Self { source, executor }
    }

    /// Wire up the production service: one shared rate limiter behind the
    /// upstream client, with the configured retry policy around it.
    pub fn from_config(config: &Config) -> Result<Self> {
        let rate_limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        let client = YargitayClient::new(config.upstream.clone(), rate_limiter)?;
        Ok(Self::new(
            Arc::new(client),
            RetryingExecutor::from_config(&config.retry),
        ))
    }

    /// Run one search call end to end.
    ///
    /// Normalization failures surface before any network call is made.
    pub async fn search(&self, raw: &RawSearchParams) -> Result<SearchResult> {
        let request = normalize(raw)?;

        let page = self
            .executor
            .execute(|| self.source.search(&request))
            .await?;

        let mut decisions = page.decisions;
        if request.fetch_content() {
            self.enrich_with_content(&mut decisions).await;
        }

        let total_in_page = decisions.len();
        info!(
            keyword = request.keyword(),
            page_number = request.page_number(),
            total_in_page = total_in_page,
            total_records = page.total_records,
            "Search completed"
        );

        Ok(SearchResult {
            request,
            decisions,
            total_in_page,
            total_records: page.total_records,
            filtered_records: page.filtered_records,
        })
    }

    /// Fetch the full document content for a single decision
    pub async fn get_content(&self, decision_id: &str) -> Result<ContentResult> {
        let decision_id = decision_id.trim();
        if decision_id.is_empty() {
            return Err(SearchError::InvalidParameter {
                field: "decision_id".to_string(),
                reason: "decision_id is required".to_string(),
            });
        }

        let content = self
            .executor
            .execute(|| self.source.fetch_content(decision_id))
            .await?;

        Ok(ContentResult::new(decision_id, content))
    }

    /// Fetch document content for each decision in the page, sequentially.
    ///
    /// Sequential on purpose: every fetch funnels through the same shared
    /// rate-limit gate, so parallelism would buy nothing. A failed fetch only
    /// leaves that row's `document_content` unset.
    async fn enrich_with_content(&self, decisions: &mut [Decision]) {
        for decision in decisions.iter_mut() {
            let result = self
                .executor
                .execute(|| self.source.fetch_content(&decision.id))
                .await;

            match result {
                Ok(content) => decision.document_content = Some(content),
                Err(err) => {
                    warn!(
                        decision_id = %decision.id,
                        category = err.category(),
                        error = %err,
                        "Content fetch failed, leaving document_content unset"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::DecisionPage;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn decision(id: &str, sira_no: u64) -> Decision {
        Decision {
            id: id.to_string(),
            daire: "9. Hukuk Dairesi".to_string(),
            esas_no: format!("2021/{}", id),
            karar_no: format!("2022/{}", id),
            karar_tarihi: "01.02.2022".to_string(),
            aranan_kelime: "işveren".to_string(),
            index: sira_no.to_string(),
            sira_no,
            document_content: None,
        }
    }

    struct StubSource {
        page: DecisionPage,
        failing_content_ids: HashSet<String>,
        transient_search_failures: AtomicU32,
        search_calls: AtomicU32,
        content_calls: AtomicU32,
    }

    impl StubSource {
        fn with_rows(rows: usize, total: u64) -> Self {
            Self {
                page: DecisionPage {
                    decisions: (1..=rows)
                        .map(|i| decision(&i.to_string(), i as u64))
                        .collect(),
                    total_records: total,
                    filtered_records: total,
                },
                failing_content_ids: HashSet::new(),
                transient_search_failures: AtomicU32::new(0),
                search_calls: AtomicU32::new(0),
                content_calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl DecisionSource for StubSource {
        async fn search(&self, _request: &SearchRequest) -> Result<DecisionPage> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            if self
                .transient_search_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(SearchError::UpstreamRateLimited {
                    retry_after_seconds: None,
                });
            }
            Ok(self.page.clone())
        }

        async fn fetch_content(&self, decision_id: &str) -> Result<String> {
            self.content_calls.fetch_add(1, Ordering::SeqCst);
            if self.failing_content_ids.contains(decision_id) {
                return Err(SearchError::ContentNotFound {
                    decision_id: decision_id.to_string(),
                });
            }
            Ok(format!("karar metni {}", decision_id))
        }
    }

    fn service(stub: Arc<StubSource>) -> SearchService {
        SearchService::new(
            stub,
            RetryingExecutor::new(4, Duration::from_millis(1), Duration::from_millis(4)),
        )
    }

    fn raw(keyword: &str, fetch_content: bool) -> RawSearchParams {
        RawSearchParams {
            keyword: Some(keyword.to_string()),
            fetch_content: fetch_content.then(|| crate::params::RawFlag::Bool(true)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_invalid_keyword_makes_no_upstream_call() {
        let stub = Arc::new(StubSource::with_rows(0, 0));
        let service = service(stub.clone());

        let result = service.search(&RawSearchParams::default()).await;
        assert!(matches!(result, Err(SearchError::InvalidParameter { .. })));
        assert_eq!(stub.search_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_counts_pass_through_verbatim() {
        let stub = Arc::new(StubSource::with_rows(5, 307_417));
        let service = service(stub.clone());

        let result = service.search(&raw("işveren", false)).await.unwrap();
        assert_eq!(result.total_in_page, 5);
        assert_eq!(result.decisions.len(), 5);
        assert_eq!(result.total_records, 307_417);
        assert_eq!(result.filtered_records, 307_417);
        assert!(result.decisions.iter().all(|d| d.document_content.is_none()));
        assert_eq!(stub.content_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transient_search_failure_is_retried() {
        let stub = Arc::new(StubSource::with_rows(2, 2));
        stub.transient_search_failures.store(2, Ordering::SeqCst);
        let service = service(stub.clone());

        let result = service.search(&raw("kira", false)).await.unwrap();
        assert_eq!(result.total_in_page, 2);
        assert_eq!(stub.search_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_enrichment_fetches_every_row() {
        let stub = Arc::new(StubSource::with_rows(3, 3));
        let service = service(stub.clone());

        let result = service.search(&raw("işveren", true)).await.unwrap();
        assert_eq!(stub.content_calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            result.decisions[0].document_content.as_deref(),
            Some("karar metni 1")
        );
    }

    #[tokio::test]
    async fn test_enrichment_failure_is_per_item_only() {
        let mut stub = StubSource::with_rows(3, 3);
        stub.failing_content_ids.insert("2".to_string());
        let service = service(Arc::new(stub));

        let result = service.search(&raw("işveren", true)).await.unwrap();

        assert_eq!(result.total_in_page, 3);
        assert!(result.decisions[0].document_content.is_some());
        assert!(result.decisions[1].document_content.is_none());
        assert!(result.decisions[2].document_content.is_some());
    }

    #[tokio::test]
    async fn test_get_content_requires_id() {
        let service = service(Arc::new(StubSource::with_rows(0, 0)));
        let result = service.get_content("   ").await;
        assert!(matches!(result, Err(SearchError::InvalidParameter { .. })));
    }

    #[tokio::test]
    async fn test_get_content_length_matches() {
        let service = service(Arc::new(StubSource::with_rows(1, 1)));
        let content = service.get_content("7").await.unwrap();
        assert_eq!(content.decision_id, "7");
        assert_eq!(content.content_length, content.content.chars().count());
    }

    #[tokio::test]
    async fn test_get_content_not_found_propagates() {
        let mut stub = StubSource::with_rows(1, 1);
        stub.failing_content_ids.insert("404".to_string());
        let service = service(Arc::new(stub));

        let result = service.get_content("404").await;
        assert!(matches!(result, Err(SearchError::ContentNotFound { .. })));
    }
}
