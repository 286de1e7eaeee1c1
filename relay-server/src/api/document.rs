//! Document API Handlers
//!
//! HTTP endpoints for ingesting API descriptions and reading cached routes.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
};
use relay_core::domain::document::{DocumentSummary, Route};
use relay_core::dto::document::RouteQuery;
use uuid::Uuid;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::{ApiPath, ApiQuery};
use crate::service::document_service::{self, DocumentFormat};

/// POST /documents
/// Ingest an API description (JSON or YAML) and cache its routes
pub async fn ingest_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<DocumentSummary>)> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| ApiError::BadRequest("Content-Type is not valid text".to_string()))
        })
        .transpose()?;

    tracing::info!(
        "Ingesting document ({} bytes, content type {:?})",
        body.len(),
        content_type
    );

    let format = DocumentFormat::from_content_type(content_type)?;
    let document = document_service::parse_document(format, &body)?;
    let summary = document_service::ingest_document(state.cache.as_ref(), document).await?;

    Ok((StatusCode::CREATED, Json(summary)))
}

/// GET /documents/{id}
/// Get the summary of an ingested document
pub async fn get_document(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<DocumentSummary>> {
    tracing::debug!("Getting document: {}", id);

    let summary = document_service::get_document(state.cache.as_ref(), id).await?;
    Ok(Json(summary))
}

/// GET /documents/{id}/route?method=..&path=..
/// Get one cached route of a document
pub async fn get_route(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<RouteQuery>,
) -> ApiResult<Json<Route>> {
    tracing::debug!("Getting route {} {} of document {}", query.method, query.path, id);

    let route =
        document_service::get_route(state.cache.as_ref(), id, &query.method, &query.path).await?;
    Ok(Json(route))
}
