//! Route Repository
//!
//! Stores document summaries and routes as JSON strings in the cache.
//!
//! Key layout:
//! - `document:{id}` holds the [`DocumentSummary`]
//! - `route:{id}:{METHOD}:{path}` holds one [`Route`]

use relay_core::domain::document::{DocumentSummary, Route};
use uuid::Uuid;

use crate::repository::RouteCache;

pub fn document_key(document_id: Uuid) -> String {
    format!("document:{}", document_id)
}

pub fn route_key(document_id: Uuid, method: &str, path: &str) -> String {
    format!("route:{}:{}:{}", document_id, method.to_ascii_uppercase(), path)
}

/// Store a document summary and every one of its routes
///
/// Routes are written before the summary so that a visible summary always
/// points at routes that can be read.
pub async fn save_document(
    cache: &dyn RouteCache,
    summary: &DocumentSummary,
    routes: &[Route],
) -> Result<(), serde_json::Error> {
    for route in routes {
        let key = route_key(summary.document_id, &route.method, &route.path);
        cache.set(&key, serde_json::to_string(route)?).await;
    }

    cache
        .set(
            &document_key(summary.document_id),
            serde_json::to_string(summary)?,
        )
        .await;

    Ok(())
}

/// Find a document summary by ID
pub async fn find_document(
    cache: &dyn RouteCache,
    document_id: Uuid,
) -> Result<Option<DocumentSummary>, serde_json::Error> {
    match cache.get(&document_key(document_id)).await {
        Some(raw) => serde_json::from_str(&raw).map(Some),
        None => Ok(None),
    }
}

/// Find the raw cached JSON of a route
///
/// The string is returned untouched so it can be forwarded as a run input.
pub async fn find_route_raw(
    cache: &dyn RouteCache,
    document_id: Uuid,
    method: &str,
    path: &str,
) -> Option<String> {
    cache.get(&route_key(document_id, method, path)).await
}

/// Find a route by method and path
pub async fn find_route(
    cache: &dyn RouteCache,
    document_id: Uuid,
    method: &str,
    path: &str,
) -> Result<Option<Route>, serde_json::Error> {
    match find_route_raw(cache, document_id, method, path).await {
        Some(raw) => serde_json::from_str(&raw).map(Some),
        None => Ok(None),
    }
}
