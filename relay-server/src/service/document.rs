//! Document Service
//!
//! Business logic for ingesting API descriptions: content negotiation,
//! normalization and caching of the resulting routes.

use relay_core::domain::document::{DocumentSummary, Route};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::repository::{RouteCache, route_repository};
use crate::service::normalizer::{self, NormalizeError};

/// Service error type
#[derive(Debug)]
pub enum DocumentError {
    NotFound(Uuid),
    RouteNotFound { method: String, path: String },
    UnsupportedMediaType(String),
    ValidationError(String),
    SerializationError(serde_json::Error),
}

impl From<serde_json::Error> for DocumentError {
    fn from(err: serde_json::Error) -> Self {
        DocumentError::SerializationError(err)
    }
}

impl From<NormalizeError> for DocumentError {
    fn from(err: NormalizeError) -> Self {
        DocumentError::ValidationError(err.to_string())
    }
}

/// Body formats an API description may be sent in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Pick the format from a `Content-Type` header value
    ///
    /// Returns `Ok(None)` when no content type was sent, meaning the body
    /// should be sniffed.
    pub fn from_content_type(content_type: Option<&str>) -> Result<Option<Self>, DocumentError> {
        let Some(content_type) = content_type else {
            return Ok(None);
        };

        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "application/json" => Ok(Some(DocumentFormat::Json)),
            m if m.ends_with("+json") => Ok(Some(DocumentFormat::Json)),
            "application/yaml" | "application/x-yaml" | "text/yaml" | "text/x-yaml" => {
                Ok(Some(DocumentFormat::Yaml))
            }
            _ => Err(DocumentError::UnsupportedMediaType(content_type.to_string())),
        }
    }
}

/// Parse a raw body into a JSON value
///
/// Without a known format, JSON is tried first and YAML second.
pub fn parse_document(
    format: Option<DocumentFormat>,
    body: &[u8],
) -> Result<JsonValue, DocumentError> {
    match format {
        Some(DocumentFormat::Json) => serde_json::from_slice(body)
            .map_err(|e| DocumentError::ValidationError(format!("invalid JSON document: {}", e))),
        Some(DocumentFormat::Yaml) => parse_yaml(body),
        None => serde_json::from_slice(body).or_else(|_| parse_yaml(body)),
    }
}

fn parse_yaml(body: &[u8]) -> Result<JsonValue, DocumentError> {
    let text = std::str::from_utf8(body)
        .map_err(|e| DocumentError::ValidationError(format!("document is not UTF-8: {}", e)))?;

    serde_yaml_ng::from_str(text)
        .map_err(|e| DocumentError::ValidationError(format!("invalid YAML document: {}", e)))
}

/// Normalize a parsed document and cache its routes
pub async fn ingest_document(
    cache: &dyn RouteCache,
    document: JsonValue,
) -> Result<DocumentSummary, DocumentError> {
    if !document.is_object() {
        return Err(NormalizeError::MissingPaths.into());
    }

    let dereferenced = normalizer::dereference(&document)?;
    let routes = normalizer::extract_routes(&dereferenced)?;

    let info = dereferenced.get("info");
    let summary = DocumentSummary {
        document_id: Uuid::new_v4(),
        title: info
            .and_then(|i| i.get("title"))
            .and_then(JsonValue::as_str)
            .map(str::to_string),
        version: info
            .and_then(|i| i.get("version"))
            .and_then(JsonValue::as_str)
            .map(str::to_string),
        ingested_at: chrono::Utc::now(),
        routes: routes.iter().map(Route::summary).collect(),
    };

    route_repository::save_document(cache, &summary, &routes).await?;

    tracing::info!(
        "Document {} ingested with {} route(s)",
        summary.document_id,
        routes.len()
    );

    Ok(summary)
}

/// Get a document summary by ID
pub async fn get_document(
    cache: &dyn RouteCache,
    document_id: Uuid,
) -> Result<DocumentSummary, DocumentError> {
    route_repository::find_document(cache, document_id)
        .await?
        .ok_or(DocumentError::NotFound(document_id))
}

/// Get one cached route of a document
pub async fn get_route(
    cache: &dyn RouteCache,
    document_id: Uuid,
    method: &str,
    path: &str,
) -> Result<Route, DocumentError> {
    get_document(cache, document_id).await?;

    route_repository::find_route(cache, document_id, method, path)
        .await?
        .ok_or_else(|| DocumentError::RouteNotFound {
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
        })
}
