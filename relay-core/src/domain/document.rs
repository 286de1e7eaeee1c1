//! API description domain types

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Operation keys recognized under a path item, in route ordering
pub const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// One operation of an ingested API description, fully dereferenced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Uppercase HTTP method
    pub method: String,
    pub path: String,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    /// The operation object with all local references resolved
    pub operation: JsonValue,
}

impl Route {
    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            method: self.method.clone(),
            path: self.path.clone(),
            operation_id: self.operation_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub method: String,
    pub path: String,
    pub operation_id: Option<String>,
}

/// Metadata kept for every ingested document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub document_id: Uuid,
    pub title: Option<String>,
    pub version: Option<String>,
    pub ingested_at: chrono::DateTime<chrono::Utc>,
    pub routes: Vec<RouteSummary>,
}
