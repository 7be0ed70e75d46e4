pub mod record;
pub mod schema;

pub use record::delete as record_delete;
pub use record::get as record_get;
pub use record::put as record_put;
pub use schema::get as schema_get;
pub use schema::post as schema_post;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query,
    },
    Extension, Json,
};
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::permission::{self, Action, Actor};
use crate::query::FilterSet;
use crate::resources::{self, ResourceSpec};

fn resolve(name: &str) -> Result<&'static ResourceSpec, ApiError> {
    resources::lookup(name).ok_or_else(|| ApiError::not_found(format!("Unknown resource: {}", name)))
}

fn require_actor(actor: Option<Extension<Actor>>) -> Result<Actor, ApiError> {
    actor
        .map(|Extension(actor)| actor)
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))
}

fn parse_id(id: &str) -> Result<i64, ApiError> {
    id.parse::<i64>()
        .map_err(|_| ApiError::bad_request(format!("Invalid id: {}", id)))
}

fn ensure(actor: &Actor, action: Action, spec: &ResourceSpec, data: Option<&Map<String, Value>>) -> Result<(), ApiError> {
    if permission::allow(Some(actor), action, spec.entity, data) {
        return Ok(());
    }

    tracing::info!(
        actor_id = actor.id,
        role = %actor.role,
        action = %action,
        entity_type = %spec.entity,
        "Permission denied"
    );
    Err(ApiError::forbidden(format!("Not allowed to {} {}", action, spec.table)))
}

fn body_object(body: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, ApiError> {
    match body {
        Ok(Json(Value::Object(map))) => Ok(map),
        Ok(Json(_)) => Err(ApiError::bad_request("Request body must be a JSON object")),
        Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
    }
}

fn filter_set(query: Result<Query<FilterSet>, QueryRejection>) -> Result<FilterSet, ApiError> {
    query
        .map(|Query(filters)| filters)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

fn entity_id(row: &Map<String, Value>) -> String {
    match row.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
