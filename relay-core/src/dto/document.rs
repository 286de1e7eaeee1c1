//! DTOs for the Relay HTTP API

use serde::{Deserialize, Serialize};

/// Query selecting one cached route of a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteQuery {
    pub method: String,
    pub path: String,
}

/// Request to dispatch a cached route to the remote job service
///
/// The bearer token is taken from the `Authorization` header, not the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub method: String,
    pub path: String,
    pub user_id: String,
    pub work_item_id: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub interval_ms: Option<u64>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}
