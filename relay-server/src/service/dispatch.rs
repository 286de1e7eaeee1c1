//! Dispatch Service
//!
//! Sends one cached route to the remote job service and waits for the run to
//! finish.

use relay_client::{OrchestrationError, Orchestrator};
use relay_core::domain::poll::PollConfig;
use relay_core::domain::run::{OrchestrationResult, RunInput, RunRequest};
use relay_core::dto::document::DispatchRequest;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::repository::{RouteCache, route_repository};
use crate::service::document::{self, DocumentError};

/// Name of the run input carrying the serialized route
pub const ROUTE_INPUT: &str = "route";

/// Service error type
#[derive(Debug)]
pub enum DispatchError {
    Document(DocumentError),
    ValidationError(String),
    Orchestration(OrchestrationError),
}

impl From<DocumentError> for DispatchError {
    fn from(err: DocumentError) -> Self {
        DispatchError::Document(err)
    }
}

impl From<OrchestrationError> for DispatchError {
    fn from(err: OrchestrationError) -> Self {
        DispatchError::Orchestration(err)
    }
}

/// Build the run request for a cached route
///
/// The route's cached JSON is forwarded verbatim as the single `route` input.
pub fn build_run_request(auth_token: String, req: &DispatchRequest, route_json: String) -> RunRequest {
    RunRequest {
        auth_token,
        user_id: req.user_id.clone(),
        work_item_id: req.work_item_id.clone(),
        project_id: req.project_id.clone(),
        inputs: vec![RunInput::new(ROUTE_INPUT, route_json)],
    }
}

/// Dispatch a cached route and wait for its run to complete
pub async fn dispatch_route(
    cache: &dyn RouteCache,
    orchestrator: &Orchestrator,
    defaults: PollConfig,
    document_id: Uuid,
    auth_token: String,
    req: DispatchRequest,
    cancel: CancellationToken,
) -> Result<OrchestrationResult, DispatchError> {
    let config = defaults.with_overrides(req.interval_ms, req.timeout_ms);
    if config.interval_ms == 0 {
        return Err(DispatchError::ValidationError(
            "interval_ms must be greater than 0".to_string(),
        ));
    }

    document::get_document(cache, document_id).await?;
    let route_json = route_repository::find_route_raw(cache, document_id, &req.method, &req.path)
        .await
        .ok_or_else(|| DocumentError::RouteNotFound {
            method: req.method.to_ascii_uppercase(),
            path: req.path.clone(),
        })?;

    tracing::info!(
        "Dispatching {} {} of document {} to work item {}",
        req.method.to_ascii_uppercase(),
        req.path,
        document_id,
        req.work_item_id
    );

    let request = build_run_request(auth_token, &req, route_json);
    let result = orchestrator
        .run_with_cancellation(&request, &config, cancel)
        .await?;

    tracing::info!(
        "Run {} for {} {} finished as {}",
        result.start_details.run_id,
        req.method.to_ascii_uppercase(),
        req.path,
        result.final_result.state
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_run_request_forwards_route_json() {
        let req = DispatchRequest {
            method: "get".to_string(),
            path: "/pets".to_string(),
            user_id: "u-1".to_string(),
            work_item_id: "w-1".to_string(),
            project_id: Some("p-1".to_string()),
            interval_ms: None,
            timeout_ms: None,
        };

        let run = build_run_request("secret".to_string(), &req, "{\"method\":\"GET\"}".to_string());

        assert_eq!(run.auth_token, "secret");
        assert_eq!(run.project_id.as_deref(), Some("p-1"));
        assert_eq!(
            run.inputs,
            vec![RunInput::new(ROUTE_INPUT, "{\"method\":\"GET\"}")]
        );
    }
}
