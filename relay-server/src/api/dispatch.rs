//! Dispatch API Handler
//!
//! HTTP endpoint that runs a cached route on the remote job service.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header},
};
use relay_core::domain::run::OrchestrationResult;
use relay_core::dto::document::DispatchRequest;
use uuid::Uuid;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::{ApiJson, ApiPath};
use crate::service::dispatch_service;

/// POST /documents/{id}/dispatch
/// Launch a run for a cached route and wait for it to finish
///
/// The caller's bearer token is forwarded to the job service.
pub async fn dispatch_route(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<DispatchRequest>,
) -> ApiResult<Json<OrchestrationResult>> {
    let auth_token = bearer_token(&headers)?;

    let result = dispatch_service::dispatch_route(
        state.cache.as_ref(),
        &state.orchestrator,
        state.poll_defaults,
        id,
        auth_token,
        req,
        state.shutdown.child_token(),
    )
    .await?;

    Ok(Json(result))
}

/// Extract the token of an `Authorization: Bearer <token>` header
fn bearer_token(headers: &HeaderMap) -> ApiResult<String> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| ApiError::Unauthorized("Malformed Authorization header".to_string()))?;

    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(ApiError::Unauthorized(
            "Authorization header must carry a bearer token".to_string(),
        ));
    }

    Ok(token.to_string())
}
