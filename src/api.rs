//! # API Server Module
//!
//! ## Purpose
//! REST API server exposing the decision search and document content
//! operations over HTTP, with validation and structured error responses.
//!
//! ## Input/Output Specification
//! - **Input**: HTTP requests with search parameters or decision ids, via
//!   query string (GET) or JSON body (POST)
//! - **Output**: JSON responses, `{success: true, ...}` or `{error: ...}`
//! - **Endpoints**: `/search`, `/content`, `/health`, `/`
//!
//! ## Key Features
//! - Identical GET and POST surfaces for both operations
//! - CORS support for web frontends
//! - Error-kind to HTTP-status mapping
//! - Structured request logging

use crate::errors::{Result, SearchError};
use crate::params::RawSearchParams;
use crate::search::SearchResult;
use crate::{AppState, ContentResult, Decision};
use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::middleware::Condition;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use serde::{Deserialize, Serialize};

/// API server wrapping the shared application state
pub struct ApiServer {
    app_state: AppState,
}

/// Parameters for the content endpoints
#[derive(Debug, Deserialize)]
pub struct ContentParams {
    pub decision_id: String,
}

/// Search success payload
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub keyword: String,
    pub page_number: u32,
    pub page_size: u32,
    pub total_results: usize,
    pub total_records: u64,
    pub filtered_records: u64,
    pub decisions: Vec<Decision>,
}

impl From<SearchResult> for SearchResponse {
    fn from(result: SearchResult) -> Self {
        Self {
            success: true,
            keyword: result.request.keyword().to_string(),
            page_number: result.request.page_number(),
            page_size: result.request.page_size(),
            total_results: result.total_in_page,
            total_records: result.total_records,
            filtered_records: result.filtered_records,
            decisions: result.decisions,
        }
    }
}

/// Content success payload
#[derive(Debug, Serialize)]
pub struct ContentResponse {
    pub success: bool,
    pub decision_id: String,
    pub content: String,
    pub content_length: usize,
}

impl From<ContentResult> for ContentResponse {
    fn from(result: ContentResult) -> Self {
        Self {
            success: true,
            decision_id: result.decision_id,
            content: result.content,
            content_length: result.content_length,
        }
    }
}

/// Map an error kind to the HTTP status it surfaces as
fn status_for(err: &SearchError) -> StatusCode {
    match err {
        SearchError::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
        SearchError::ContentNotFound { .. } => StatusCode::NOT_FOUND,
        SearchError::UpstreamRateLimited { .. }
        | SearchError::UpstreamUnavailable { .. }
        | SearchError::RetriesExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
        SearchError::UpstreamMalformed { .. } => StatusCode::BAD_GATEWAY,
        SearchError::Config { .. } | SearchError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(err: &SearchError) -> HttpResponse {
    tracing::error!(category = err.category(), error = %err, "Request failed");
    HttpResponse::build(status_for(err)).json(serde_json::json!({
        "error": err.to_string(),
    }))
}

impl ApiServer {
    pub fn new(app_state: AppState) -> Self {
        Self { app_state }
    }

    /// Run the API server until it is stopped
    pub async fn run(self) -> Result<()> {
        let bind_addr = format!(
            "{}:{}",
            self.app_state.config.server.host, self.app_state.config.server.port
        );
        let enable_cors = self.app_state.config.server.enable_cors;

        tracing::info!("Starting API server on {}", bind_addr);

        // The HttpServer builder is not Send; finish with it before the first
        // await so the returned future can be spawned onto a worker thread.
        let server = HttpServer::new(move || {
            App::new()
                .wrap(Condition::new(enable_cors, Cors::permissive()))
                .app_data(web::Data::new(self.app_state.clone()))
                .route("/search", web::get().to(search_get_handler))
                .route("/search", web::post().to(search_post_handler))
                .route("/content", web::get().to(content_get_handler))
                .route("/content", web::post().to(content_post_handler))
                .route("/health", web::get().to(health_handler))
                .route("/", web::get().to(index_handler))
        })
        .bind(&bind_addr)
        .map_err(|e| SearchError::Internal {
            message: format!("Failed to bind server to {}: {}", bind_addr, e),
        })?
        .run();

        server.await.map_err(|e| SearchError::Internal {
            message: format!("Server error: {}", e),
        })?;

        Ok(())
    }
}

async fn run_search(app_state: &AppState, params: &RawSearchParams) -> HttpResponse {
    match app_state.search_service.search(params).await {
        Ok(result) => HttpResponse::Ok().json(SearchResponse::from(result)),
        Err(err) => error_response(&err),
    }
}

async fn run_content(app_state: &AppState, params: &ContentParams) -> HttpResponse {
    match app_state.search_service.get_content(&params.decision_id).await {
        Ok(result) => HttpResponse::Ok().json(ContentResponse::from(result)),
        Err(err) => error_response(&err),
    }
}

/// Search via query parameters
async fn search_get_handler(
    app_state: web::Data<AppState>,
    params: web::Query<RawSearchParams>,
) -> ActixResult<HttpResponse> {
    Ok(run_search(&app_state, &params).await)
}

/// Search via JSON body
async fn search_post_handler(
    app_state: web::Data<AppState>,
    params: web::Json<RawSearchParams>,
) -> ActixResult<HttpResponse> {
    Ok(run_search(&app_state, &params).await)
}

/// Document content via query parameters
async fn content_get_handler(
    app_state: web::Data<AppState>,
    params: web::Query<ContentParams>,
) -> ActixResult<HttpResponse> {
    Ok(run_content(&app_state, &params).await)
}

/// Document content via JSON body
async fn content_post_handler(
    app_state: web::Data<AppState>,
    params: web::Json<ContentParams>,
) -> ActixResult<HttpResponse> {
    Ok(run_content(&app_state, &params).await)
}

/// Health check endpoint handler
async fn health_handler() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now(),
    })))
}

/// Index page handler
async fn index_handler() -> ActixResult<HttpResponse> {
    let html = r#"
    <!DOCTYPE html>
    <html>
    <head>
        <title>Yargıtay Decision Search</title>
        <style>
            body { font-family: Arial, sans-serif; margin: 40px; }
            .header { color: #2c3e50; }
            .endpoint { margin: 20px 0; padding: 15px; background: #f8f9fa; border-radius: 5px; }
            .method { font-weight: bold; color: #27ae60; }
        </style>
    </head>
    <body>
        <h1 class="header">Yargıtay Decision Search API</h1>
        <p>Rate-limited search proxy for Turkish Supreme Court decisions.</p>

        <h2>Available Endpoints</h2>

        <div class="endpoint">
            <span class="method">GET | POST</span> /search
            <p>Search decisions by keyword with pagination. Set fetch_content=true to include document text.</p>
        </div>

        <div class="endpoint">
            <span class="method">GET | POST</span> /content
            <p>Fetch the full document content for one decision id.</p>
        </div>

        <div class="endpoint">
            <span class="method">GET</span> /health
            <p>Check the health status of the service.</p>
        </div>

        <h2>Example Search Request</h2>
        <pre>{
  "keyword": "işveren",
  "page_number": 1,
  "page_size": 10,
  "fetch_content": false
}</pre>
    </body>
    </html>
    "#;

    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::params::SearchRequest;
    use crate::retry::RetryingExecutor;
    use crate::search::SearchService;
    use crate::upstream::{DecisionPage, DecisionSource};
    use actix_web::{test, App};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    struct StubSource;

    #[async_trait]
    impl DecisionSource for StubSource {
        async fn search(&self, request: &SearchRequest) -> crate::Result<DecisionPage> {
            Ok(DecisionPage {
                decisions: vec![Decision {
                    id: "1".to_string(),
                    daire: "9. Hukuk Dairesi".to_string(),
                    esas_no: "2021/1".to_string(),
                    karar_no: "2022/1".to_string(),
                    karar_tarihi: "01.02.2022".to_string(),
                    aranan_kelime: request.keyword().to_string(),
                    index: "1".to_string(),
                    sira_no: 1,
                    document_content: None,
                }],
                total_records: 42,
                filtered_records: 42,
            })
        }

        async fn fetch_content(&self, decision_id: &str) -> crate::Result<String> {
            if decision_id == "404" {
                return Err(SearchError::ContentNotFound {
                    decision_id: decision_id.to_string(),
                });
            }
            Ok("karar metni".to_string())
        }
    }

    fn test_state() -> AppState {
        let service = SearchService::new(
            Arc::new(StubSource),
            RetryingExecutor::new(2, Duration::from_millis(1), Duration::from_millis(2)),
        );
        AppState {
            config: Arc::new(Config::default()),
            search_service: Arc::new(service),
        }
    }

    #[actix_web::test]
    async fn test_search_get_success_payload() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .route("/search", web::get().to(search_get_handler)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/search?keyword=i%C5%9Fveren&page_size=30")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["keyword"], "işveren");
        assert_eq!(body["page_size"], 25); // 30 snapped to the nearest valid size
        assert_eq!(body["total_records"], 42);
        assert_eq!(body["decisions"][0]["esasNo"], "2021/1");
    }

    #[actix_web::test]
    async fn test_search_post_missing_keyword_is_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .route("/search", web::post().to(search_post_handler)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/search")
            .set_json(serde_json::json!({"page_size": 10}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("keyword"));
    }

    #[actix_web::test]
    async fn test_content_post_success_payload() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .route("/content", web::post().to(content_post_handler)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/content")
            .set_json(serde_json::json!({"decision_id": "12345"}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["decision_id"], "12345");
        assert_eq!(body["content"], "karar metni");
        assert_eq!(body["content_length"], "karar metni".chars().count());
    }

    #[actix_web::test]
    async fn test_content_get_not_found_status() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .route("/content", web::get().to(content_get_handler)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/content?decision_id=404")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[::core::prelude::v1::test]
    fn test_run_future_is_send() {
        // The server future must be spawnable onto a multi-threaded runtime;
        // the future is lazy, so nothing binds here.
        fn assert_send<F: std::future::Future + Send>(_: F) {}
        let server = ApiServer::new(test_state());
        assert_send(server.run());
    }

    #[actix_web::test]
    async fn test_status_mapping() {
        assert_eq!(
            status_for(&SearchError::RetriesExhausted {
                attempts: 4,
                last_error: "rate limited".to_string()
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&SearchError::UpstreamMalformed {
                details: String::new()
            }),
            StatusCode::BAD_GATEWAY
        );
    }
}
