use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::{BlobStore, ComplaintLifecycleEngine};
use shared::jwt::{JwtError, TokenVerifier};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{complaints, dashboard, health, uploads};

#[derive(Clone)]
pub struct AppState {
    pub engine: ComplaintLifecycleEngine,
    pub blobs: Arc<dyn BlobStore>,
    pub verifier: Arc<TokenVerifier>,
    pub config: Arc<Config>,
    /// Present when complaints are stored in PostgreSQL.
    pub pool: Option<PgPool>,
}

impl AppState {
    /// Builds the state, deriving the token verifier from `config.auth`.
    pub fn new(
        config: Config,
        engine: ComplaintLifecycleEngine,
        blobs: Arc<dyn BlobStore>,
        pool: Option<PgPool>,
    ) -> Result<Self, JwtError> {
        let verifier = TokenVerifier::from_parts(
            &config.auth.algorithm,
            &config.auth.secret,
            &config.auth.public_key,
            config.auth.leeway_secs,
        )?;

        Ok(Self {
            engine,
            blobs,
            verifier: Arc::new(verifier),
            config: Arc::new(config),
            pool,
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Every complaint route authenticates through the ActorAuth extractor.
    let complaint_routes = Router::new()
        .route(
            "/api/v1/complaints",
            post(complaints::submit_complaint).get(complaints::list_complaints),
        )
        .route("/api/v1/complaints/:id", get(complaints::get_complaint))
        .route(
            "/api/v1/complaints/:id/urgency",
            post(complaints::assign_urgency),
        )
        .route("/api/v1/complaints/:id/reject", post(complaints::reject_complaint))
        .route(
            "/api/v1/complaints/:id/respond",
            post(complaints::respond_to_complaint),
        )
        .route(
            "/api/v1/complaints/:id/resolve",
            post(complaints::resolve_complaint),
        )
        .route("/api/v1/complaints/:id/extend", post(complaints::extend_deadline))
        .route("/api/v1/complaints/:id/upvote", post(complaints::toggle_upvote))
        .route(
            "/api/v1/complaints/:id/confirm",
            post(complaints::confirm_resolution),
        )
        .route("/api/v1/complaints/:id/flag", post(complaints::flag_complaint))
        .route("/api/v1/dashboard", get(dashboard::get_dashboard))
        .layer(DefaultBodyLimit::max(config.server.max_body_size));

    let upload_routes = Router::new()
        .route("/api/v1/uploads", post(uploads::upload_blob))
        .route("/api/v1/uploads/:reference", get(uploads::fetch_blob))
        .layer(DefaultBodyLimit::max(config.uploads.max_bytes));

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(complaint_routes)
        .merge(upload_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
