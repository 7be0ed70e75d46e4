use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::decode_jwt;
use crate::error::ApiError;
use crate::permission::Actor;
use crate::server::AppState;

/// Resolves the bearer token into an `Actor` extension.
///
/// No `Authorization` header leaves the request anonymous; handlers decide
/// what that means. A header that is present but malformed, badly signed, or
/// expired is rejected here with 401.
pub async fn actor_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    match extract_bearer(&headers) {
        Ok(None) => {}
        Ok(Some(token)) => match decode_jwt(token, &state.jwt_secret) {
            Ok(claims) => {
                let actor = Actor::from(claims);
                tracing::debug!(actor_id = actor.id, role = %actor.role, "Authenticated request");
                request.extensions_mut().insert(actor);
            }
            Err(err) => return ApiError::from(err).into_response(),
        },
        Err(msg) => return ApiError::unauthorized(msg).into_response(),
    }

    next.run(request).await
}

fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, &'static str> {
    let Some(value) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim())),
        Some(_) => Err("Empty JWT token"),
        None => Err("Authorization header must use Bearer token format"),
    }
}
