//! Error types for the Relay client

use relay_core::domain::run::RunState;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for transport-level operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur while talking to the remote job service
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }
}

/// The remote service could not be asked to start a run
#[derive(Debug, Error)]
#[error("failed to launch run for work item {work_item_id}: {source}")]
pub struct LaunchError {
    pub work_item_id: String,
    pub source: ClientError,
}

/// The state of a run could not be read
#[derive(Debug, Error)]
#[error("failed to fetch status of run {run_id}: {source}")]
pub struct StatusFetchError {
    pub run_id: String,
    pub source: ClientError,
}

/// Failure of a poll or of a whole orchestration call
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    StatusFetch(#[from] StatusFetchError),

    /// The run reached FAILED or TERMINATED
    #[error("run {run_id} ended in state {state}")]
    RunFailed { run_id: String, state: RunState },

    /// The deadline passed while the run was still in flight
    #[error("run {run_id} did not finish within {}ms (last state: {last_state})", .timeout.as_millis())]
    PollTimeout {
        run_id: String,
        timeout: Duration,
        last_state: RunState,
    },

    /// The caller cancelled the call; `run_id` is set if the launch had succeeded
    #[error("orchestration cancelled{}", run_suffix(.run_id))]
    Cancelled { run_id: Option<String> },
}

impl OrchestrationError {
    /// Run id the failure relates to, when one had been obtained
    pub fn run_id(&self) -> Option<&str> {
        match self {
            Self::Launch(_) => None,
            Self::StatusFetch(err) => Some(&err.run_id),
            Self::RunFailed { run_id, .. } | Self::PollTimeout { run_id, .. } => Some(run_id),
            Self::Cancelled { run_id } => run_id.as_deref(),
        }
    }
}

fn run_suffix(run_id: &Option<String>) -> String {
    match run_id {
        Some(id) => format!(" (run {id})"),
        None => String::new(),
    }
}
