use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    Extension, Json,
};
use serde_json::Value;

use crate::audit::{AuditRecord, RequestMeta};
use crate::database::Repository;
use crate::middleware::{ApiResponse, ApiResult};
use crate::permission::{Action, Actor};
use crate::server::AppState;

use super::{body_object, ensure, parse_id, require_actor, resolve};

/// GET /api/:resource/:id
pub async fn get(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    actor: Option<Extension<Actor>>,
) -> ApiResult<Value> {
    let spec = resolve(&resource)?;
    let actor = require_actor(actor)?;
    let id = parse_id(&id)?;

    let row = Repository::new(spec, state.pool.clone()).select_404(id).await?;
    ensure(&actor, Action::Read, spec, Some(&row))?;

    Ok(ApiResponse::success(Value::Object(row)))
}

/// PUT /api/:resource/:id - partial update
///
/// Permission is checked against the stored row and again against the row as
/// it would look after the patch, so ownership columns cannot be reassigned
/// to someone else.
pub async fn put(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    actor: Option<Extension<Actor>>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let spec = resolve(&resource)?;
    let actor = require_actor(actor)?;
    let id = parse_id(&id)?;
    let patch = body_object(body)?;

    let repo = Repository::new(spec, state.pool.clone());
    let existing = repo.select_404(id).await?;
    ensure(&actor, Action::Update, spec, Some(&existing))?;

    let mut merged = existing.clone();
    merged.extend(patch.iter().map(|(k, v)| (k.clone(), v.clone())));
    ensure(&actor, Action::Update, spec, Some(&merged))?;

    let values = spec.prepare_update(&patch, &merged)?;
    let row = repo.update(id, &values).await?;
    tracing::info!(entity_type = %spec.entity, id, actor_id = actor.id, "Updated record");

    state
        .audit
        .record(
            AuditRecord::new(Some(actor.id), Action::Update, spec.entity, id.to_string())
                .old_values(Some(Value::Object(existing)))
                .new_values(Some(Value::Object(row.clone())))
                .request(&RequestMeta::from_headers(&headers)),
        )
        .await;

    Ok(ApiResponse::success(Value::Object(row)))
}

/// DELETE /api/:resource/:id
pub async fn delete(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    actor: Option<Extension<Actor>>,
    headers: HeaderMap,
) -> ApiResult<Value> {
    let spec = resolve(&resource)?;
    let actor = require_actor(actor)?;
    let id = parse_id(&id)?;

    let repo = Repository::new(spec, state.pool.clone());
    let existing = repo.select_404(id).await?;
    ensure(&actor, Action::Delete, spec, Some(&existing))?;

    let deleted = repo.delete(id).await?;
    tracing::info!(entity_type = %spec.entity, id, actor_id = actor.id, "Deleted record");

    state
        .audit
        .record(
            AuditRecord::new(Some(actor.id), Action::Delete, spec.entity, id.to_string())
                .old_values(Some(Value::Object(deleted.clone())))
                .request(&RequestMeta::from_headers(&headers)),
        )
        .await;

    Ok(ApiResponse::success(Value::Object(deleted)))
}
