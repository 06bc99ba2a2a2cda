//! # API REST
//!
//! REST surface for the tongue advisor.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON error envelopes, CORS, body limits,
//!   per-IP rate limiting)
//!
//! Core behaviour (prompting, provider calls, session slots, compression)
//! lives in `advisor-core`; this crate only maps it onto HTTP.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod limit;
pub mod routes;

use advisor_core::{AdvisorResult, AnalysisService, Config, SessionStore};
use advisor_imaging::ImageCompressor;
use advisor_types::report;
use axum::{
    extract::DefaultBodyLimit,
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use limit::RateLimiter;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Request body ceiling: generous enough for an uncompressed phone photo.
pub const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Application state shared across handlers.
///
/// Everything here is cheap to clone; the request-independent pieces sit
/// behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub analysis: AnalysisService,
    pub compressor: ImageCompressor,
    pub limiter: Arc<RateLimiter>,
    pub allowed_origins: Vec<String>,
}

impl AppState {
    /// Builds the state from startup configuration.
    ///
    /// # Errors
    /// Fails if the session data directory cannot be created.
    pub fn new(cfg: &Config) -> AdvisorResult<Self> {
        Ok(Self {
            sessions: Arc::new(SessionStore::new(cfg.data_dir())?),
            analysis: AnalysisService::new(cfg.provider()),
            compressor: ImageCompressor::new(),
            limiter: Arc::new(RateLimiter::new()),
            allowed_origins: cfg.allowed_origins().to_vec(),
        })
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health,
        routes::api_status,
        routes::analyze,
        routes::put_feeling,
        routes::put_tongue_image,
        routes::get_session,
        routes::clear_session,
    ),
    components(schemas(
        report::AnalyzeRequest,
        report::FeelingRequest,
        report::AnalysisReport,
        report::PatientOverview,
        report::HerbalFormula,
        report::HerbEntry,
        report::ApiMessage,
        report::StatusRes,
        report::SessionSnapshot,
        report::StoredImageRes,
    ))
)]
pub struct ApiDoc;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.allowed_origins);

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/status", get(routes::api_status))
        .route("/api/analyze", post(routes::analyze))
        .route("/api/session/feeling", post(routes::put_feeling))
        .route("/api/session/tongue-image", post(routes::put_tongue_image))
        .route(
            "/api/session",
            get(routes::get_session).delete(routes::clear_session),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            limit::rate_limit,
        ))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors)
        .with_state(state)
}

/// CORS from the configured origin list. A literal `*` in the list opens the
/// surface up entirely, which the original deployment did for curl and mobile
/// clients.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
}
