//! Relay Job Service Client
//!
//! Starts runs on a remote job execution service, polls them until they reach
//! a terminal state, and surfaces a single result or a single failure.
//!
//! The crate is layered leaf first:
//! - [`JobLauncher`]: issues the "start run" request
//! - [`StatusFetcher`]: reads the current state of a run
//! - [`CompletionPoller`]: fixed-interval polling with a wall-clock deadline
//! - [`Orchestrator`]: launch once, then poll to completion
//!
//! [`JobServiceClient`] implements both the launcher and the fetcher over HTTP.
//!
//! # Example
//!
//! ```no_run
//! use relay_client::{JobServiceClient, Orchestrator};
//! use relay_core::domain::poll::PollConfig;
//! use relay_core::domain::run::{RunInput, RunRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let orchestrator = Orchestrator::from_client(JobServiceClient::new("http://localhost:9000"));
//!
//!     let request = RunRequest {
//!         auth_token: "token".to_string(),
//!         user_id: "user-1".to_string(),
//!         work_item_id: "summarize".to_string(),
//!         project_id: None,
//!         inputs: vec![RunInput::new("route", "{}")],
//!     };
//!
//!     let result = orchestrator.run(&request, &PollConfig::default()).await?;
//!     println!("Run {} finished: {}", result.start_details.run_id, result.final_result.state);
//!     Ok(())
//! }
//! ```

pub mod error;
mod launcher;
mod orchestrator;
mod poller;
mod status;

// Re-export commonly used types
pub use error::{ClientError, LaunchError, OrchestrationError, Result, StatusFetchError};
pub use launcher::JobLauncher;
pub use orchestrator::Orchestrator;
pub use poller::CompletionPoller;
pub use status::StatusFetcher;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

/// HTTP client for the remote job service
///
/// Cloning is cheap: the underlying connection pool is shared, so one client
/// can serve any number of concurrent orchestration calls.
#[derive(Debug, Clone)]
pub struct JobServiceClient {
    /// Base URL of the job service (e.g., "http://localhost:9000")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl JobServiceClient {
    /// Create a new job service client
    ///
    /// # Example
    /// ```
    /// use relay_client::JobServiceClient;
    ///
    /// let client = JobServiceClient::new("http://localhost:9000");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new job service client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use relay_client::JobServiceClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = JobServiceClient::with_client("http://localhost:9000", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the job service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build an endpoint URL from the base URL and percent-encoded path segments
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            ClientError::InvalidRequest(format!("invalid base URL '{}': {}", self.base_url, e))
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                ClientError::InvalidRequest(format!("base URL '{}' cannot be a base", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}
