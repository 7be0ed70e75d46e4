use axum::extract::State;
use serde_json::{json, Value};

use crate::config;
use crate::database::DatabaseManager;
use crate::middleware::{ApiResponse, ApiResult};
use crate::resources::RESOURCES;
use crate::server::AppState;

/// GET / - service info
pub async fn root() -> ApiResponse<Value> {
    let resources: Vec<&str> = RESOURCES.iter().map(|r| r.table).collect();

    ApiResponse::success(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "environment": config::config().environment,
        "resources": resources,
    }))
}

/// GET /health - database ping
pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    DatabaseManager::health_check(&state.pool).await?;
    Ok(ApiResponse::success(json!({ "status": "ok", "database": "connected" })))
}
