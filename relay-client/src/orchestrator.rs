//! Orchestration facade
//!
//! Launches one run and polls it to completion. Any failure is returned as-is;
//! nothing is retried and no cancel request is ever sent to the remote
//! service, so a run whose polling fails keeps running unobserved.

use relay_core::domain::poll::PollConfig;
use relay_core::domain::run::{OrchestrationResult, RunRequest};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::JobServiceClient;
use crate::error::OrchestrationError;
use crate::launcher::JobLauncher;
use crate::poller::CompletionPoller;
use crate::status::StatusFetcher;

/// Launch-then-poll over injected launcher and fetcher implementations
///
/// Holds no per-call state, so a single instance can be shared across tasks
/// and serve concurrent calls.
#[derive(Clone)]
pub struct Orchestrator {
    launcher: Arc<dyn JobLauncher>,
    fetcher: Arc<dyn StatusFetcher>,
}

impl Orchestrator {
    pub fn new(launcher: Arc<dyn JobLauncher>, fetcher: Arc<dyn StatusFetcher>) -> Self {
        Self { launcher, fetcher }
    }

    /// Uses one HTTP client for both launching and status fetches
    pub fn from_client(client: JobServiceClient) -> Self {
        let client = Arc::new(client);
        Self::new(client.clone(), client)
    }

    /// Runs a request to completion, bounded only by `config.timeout_ms`
    pub async fn run(
        &self,
        request: &RunRequest,
        config: &PollConfig,
    ) -> Result<OrchestrationResult, OrchestrationError> {
        self.run_with_cancellation(request, config, CancellationToken::new())
            .await
    }

    /// Runs a request to completion, aborting early when `cancel` fires
    ///
    /// Exactly one launch is attempted; every status fetch uses the run id it
    /// returned.
    pub async fn run_with_cancellation(
        &self,
        request: &RunRequest,
        config: &PollConfig,
        cancel: CancellationToken,
    ) -> Result<OrchestrationResult, OrchestrationError> {
        let start_details = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Launch of work item {} cancelled", request.work_item_id);
                return Err(OrchestrationError::Cancelled { run_id: None });
            }
            handle = self.launcher.launch(request) => handle?,
        };

        let final_result = CompletionPoller::new(self.fetcher.as_ref())
            .with_cancellation(cancel)
            .poll_until_done(
                &start_details.run_id,
                &request.auth_token,
                Some(&request.user_id),
                request.project_id.as_deref(),
                config,
            )
            .await
            .inspect_err(|e| {
                warn!(
                    "Run {} of work item {} did not complete: {}",
                    start_details.run_id, request.work_item_id, e
                )
            })?;

        Ok(OrchestrationResult {
            start_details,
            final_result,
        })
    }
}
