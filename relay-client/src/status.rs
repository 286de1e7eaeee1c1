//! Run status endpoint

use async_trait::async_trait;
use relay_core::domain::run::RunStatus;
use relay_core::dto::run::GetRunQuery;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::JobServiceClient;
use crate::error::{ClientError, StatusFetchError};

/// Reads the current state of a run
///
/// Fetching is a read: calling it repeatedly with the same arguments must be
/// safe.
#[async_trait]
pub trait StatusFetcher: Send + Sync {
    async fn fetch_status(
        &self,
        run_id: &str,
        auth_token: &str,
        user_id: Option<&str>,
        project_id: Option<&str>,
    ) -> Result<RunStatus, StatusFetchError>;
}

impl JobServiceClient {
    /// Get the current status of a run
    ///
    /// Sends `GET /v1/runs/{run_id}` with optional `user_id` and `project_id`
    /// query parameters.
    pub async fn get_run(
        &self,
        run_id: &str,
        auth_token: &str,
        user_id: Option<&str>,
        project_id: Option<&str>,
    ) -> crate::Result<RunStatus> {
        let url = self.endpoint(&["v1", "runs", run_id])?;
        let query = GetRunQuery {
            user_id: user_id.map(str::to_string),
            project_id: project_id.map(str::to_string),
        };

        let response = self
            .client
            .get(url)
            .bearer_auth(auth_token)
            .query(&query)
            .send()
            .await?;

        let payload: JsonValue = self.handle_response(response).await?;
        RunStatus::from_payload(payload).ok_or_else(|| {
            ClientError::ParseError("run status response does not contain a state".to_string())
        })
    }
}

#[async_trait]
impl StatusFetcher for JobServiceClient {
    async fn fetch_status(
        &self,
        run_id: &str,
        auth_token: &str,
        user_id: Option<&str>,
        project_id: Option<&str>,
    ) -> Result<RunStatus, StatusFetchError> {
        let status = self
            .get_run(run_id, auth_token, user_id, project_id)
            .await
            .map_err(|source| StatusFetchError {
                run_id: run_id.to_string(),
                source,
            })?;

        debug!("Run {} is {}", run_id, status.state);
        Ok(status)
    }
}
