//! Run launch endpoint

use async_trait::async_trait;
use relay_core::domain::run::{RunHandle, RunRequest};
use relay_core::dto::run::LaunchRunBody;
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use crate::JobServiceClient;
use crate::error::{ClientError, LaunchError};

/// Starts runs on the remote job service
///
/// Implementations issue exactly one outbound call per launch and never retry:
/// an ambiguous outcome (timeout, malformed body) is reported as a failure
/// even though the remote side may have started the work.
#[async_trait]
pub trait JobLauncher: Send + Sync {
    /// Starts one run and returns its handle
    async fn launch(&self, request: &RunRequest) -> Result<RunHandle, LaunchError>;
}

impl JobServiceClient {
    /// Start a run of a work item
    ///
    /// Sends `POST /v1/work-items/{work_item_id}/runs` with the request's
    /// user, project and inputs, authenticated with the request's bearer token.
    ///
    /// # Returns
    /// The handle carrying the run id and the raw response body
    pub async fn launch_run(&self, request: &RunRequest) -> crate::Result<RunHandle> {
        let url = self.endpoint(&["v1", "work-items", &request.work_item_id, "runs"])?;
        debug!("Launching work item {} at {}", request.work_item_id, url);

        let response = self
            .client
            .post(url)
            .bearer_auth(&request.auth_token)
            .json(&LaunchRunBody::from(request))
            .send()
            .await?;

        let payload: JsonValue = self.handle_response(response).await?;
        RunHandle::from_payload(payload).ok_or_else(|| {
            ClientError::ParseError("launch response does not contain a run id".to_string())
        })
    }
}

#[async_trait]
impl JobLauncher for JobServiceClient {
    async fn launch(&self, request: &RunRequest) -> Result<RunHandle, LaunchError> {
        let handle = self
            .launch_run(request)
            .await
            .map_err(|source| LaunchError {
                work_item_id: request.work_item_id.clone(),
                source,
            })?;

        info!(
            "Launched run {} for work item {}",
            handle.run_id, request.work_item_id
        );
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::{Path, State},
        http::{HeaderMap, StatusCode},
        routing::post,
    };
    use relay_core::domain::run::RunInput;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorded {
        calls: Arc<Mutex<Vec<(String, Option<String>, JsonValue)>>>,
    }

    async fn spawn_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn request() -> RunRequest {
        RunRequest {
            auth_token: "secret".to_string(),
            user_id: "u-1".to_string(),
            work_item_id: "summarize".to_string(),
            project_id: Some("p-1".to_string()),
            inputs: vec![
                RunInput::new("route", "{\"path\":\"/pets\"}"),
                RunInput::new("mode", "fast"),
            ],
        }
    }

    #[tokio::test]
    async fn test_launch_issues_one_call_and_returns_run_id() {
        let recorded = Recorded::default();
        let router = Router::new()
            .route(
                "/v1/work-items/{id}/runs",
                post(
                    |State(rec): State<Recorded>,
                     Path(id): Path<String>,
                     headers: HeaderMap,
                     Json(body): Json<JsonValue>| async move {
                        let auth = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        rec.calls.lock().unwrap().push((id, auth, body));
                        Json(json!({ "run_id": "run-42", "status": "PENDING" }))
                    },
                ),
            )
            .with_state(recorded.clone());
        let client = JobServiceClient::new(spawn_server(router).await);

        let handle = client.launch(&request()).await.unwrap();

        assert_eq!(handle.run_id, "run-42");
        assert_eq!(handle.payload["status"], "PENDING");

        let calls = recorded.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (work_item, auth, body) = &calls[0];
        assert_eq!(work_item, "summarize");
        assert_eq!(auth.as_deref(), Some("Bearer secret"));
        assert_eq!(body["user_id"], "u-1");
        assert_eq!(body["project_id"], "p-1");
        assert_eq!(body["inputs"][0]["name"], "route");
        assert_eq!(body["inputs"][1]["value"], "fast");
    }

    #[tokio::test]
    async fn test_launch_rejected_status_is_launch_error() {
        let router = Router::new().route(
            "/v1/work-items/{id}/runs",
            post(|| async { (StatusCode::FORBIDDEN, "quota exceeded") }),
        );
        let client = JobServiceClient::new(spawn_server(router).await);

        let err = client.launch(&request()).await.unwrap_err();

        assert_eq!(err.work_item_id, "summarize");
        assert!(matches!(
            err.source,
            ClientError::ApiError { status: 403, ref message } if message == "quota exceeded"
        ));
    }

    #[tokio::test]
    async fn test_launch_without_run_id_is_launch_error() {
        let router = Router::new().route(
            "/v1/work-items/{id}/runs",
            post(|| async { Json(json!({ "accepted": true })) }),
        );
        let client = JobServiceClient::new(spawn_server(router).await);

        let err = client.launch(&request()).await.unwrap_err();
        assert!(matches!(err.source, ClientError::ParseError(_)));
    }

    #[tokio::test]
    async fn test_launch_transport_failure_is_launch_error() {
        // Bind then drop to get a port with nothing listening
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = JobServiceClient::new(format!("http://{}", addr));
        let err = client.launch(&request()).await.unwrap_err();
        assert!(matches!(err.source, ClientError::RequestFailed(_)));
    }
}
