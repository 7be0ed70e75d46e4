use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::HeaderMap,
    Extension, Json,
};
use serde_json::Value;

use crate::audit::{AuditRecord, RequestMeta};
use crate::config;
use crate::database::Repository;
use crate::middleware::{ApiResponse, ApiResult, Page};
use crate::permission::{self, Action, Actor};
use crate::query::{FilterSet, QueryBuilder};
use crate::server::AppState;

use super::{body_object, ensure, entity_id, filter_set, require_actor, resolve};

/// GET /api/:resource - filtered, sorted, paginated list
pub async fn get(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    actor: Option<Extension<Actor>>,
    filters: Result<Query<FilterSet>, QueryRejection>,
) -> ApiResult<Page<Value>> {
    let spec = resolve(&resource)?;
    let actor = require_actor(actor)?;
    ensure(&actor, Action::Read, spec, None)?;
    let filters = filter_set(filters)?;

    let built = QueryBuilder::new(&spec.query)?
        .with_limits(state.limits)
        .apply(&filters)?
        .scope(permission::read_scope(&actor, spec.entity))?
        .finish();

    if config::config().query.debug_logging {
        tracing::debug!(
            resource = spec.table,
            where_clause = %built.where_clause,
            params = ?built.params,
            "Built list query"
        );
    }

    let (items, total) = Repository::new(spec, state.pool.clone())
        .select_page(&built)
        .await?;

    Ok(ApiResponse::success(Page::new(items, &built.pagination, total)))
}

/// POST /api/:resource - create a row
pub async fn post(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    actor: Option<Extension<Actor>>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let spec = resolve(&resource)?;
    let actor = require_actor(actor)?;
    let mut payload = body_object(body)?;

    if let Some((column, owner)) = permission::owner_default(&actor, spec.entity) {
        if payload.get(column).map_or(true, Value::is_null) {
            payload.insert(column.to_string(), Value::from(owner));
        }
    }

    ensure(&actor, Action::Create, spec, Some(&payload))?;
    let values = spec.prepare_create(&mut payload)?;

    let row = Repository::new(spec, state.pool.clone()).insert(&values).await?;
    tracing::info!(entity_type = %spec.entity, id = %entity_id(&row), actor_id = actor.id, "Created record");

    state
        .audit
        .record(
            AuditRecord::new(Some(actor.id), Action::Create, spec.entity, entity_id(&row))
                .new_values(Some(Value::Object(row.clone())))
                .request(&RequestMeta::from_headers(&headers)),
        )
        .await;

    Ok(ApiResponse::created(Value::Object(row)))
}
