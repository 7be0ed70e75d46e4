use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::audit::{AuditRecorder, PostgresAuditSink};
use crate::config::AppConfig;
use crate::handlers::{public, resources};
use crate::middleware::actor_middleware;
use crate::query::QueryLimits;

/// Shared per-request dependencies.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub audit: AuditRecorder,
    pub limits: QueryLimits,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    /// Wire a pool to the PostgreSQL audit sink using the given settings.
    pub fn new(pool: PgPool, config: &AppConfig) -> Self {
        let audit = AuditRecorder::new(Arc::new(PostgresAuditSink::new(pool.clone())))
            .enabled(config.security.enable_audit_logging);

        Self {
            pool,
            audit,
            limits: config.query_limits(),
            jwt_secret: Arc::from(config.security.jwt_secret.as_str()),
        }
    }
}

pub fn app(state: AppState, config: &AppConfig) -> Router {
    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(resource_routes(state.clone()))
        // Global middleware
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(cors_layer(&config.security.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Everything that needs a caller resolved from the bearer token.
fn resource_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/:resource",
            get(resources::schema_get).post(resources::schema_post),
        )
        .route(
            "/api/:resource/:id",
            get(resources::record_get)
                .put(resources::record_put)
                .delete(resources::record_delete),
        )
        .route_layer(from_fn_with_state(state, actor_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}
