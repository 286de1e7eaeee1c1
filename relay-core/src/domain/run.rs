//! Run domain types

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// A single named input passed to the remote job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInput {
    pub name: String,
    pub value: String,
}

impl RunInput {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Everything needed to start one run on the remote job service
///
/// Built once by the caller and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Bearer token forwarded to the remote service
    pub auth_token: String,
    pub user_id: String,
    /// Identifier of the remote unit of work to start
    pub work_item_id: String,
    pub project_id: Option<String>,
    /// Inputs in the order they were supplied
    pub inputs: Vec<RunInput>,
}

/// Handle to a started run
///
/// Holds the run identifier and the raw launch response as returned by the
/// remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunHandle {
    pub run_id: String,
    pub payload: JsonValue,
}

impl RunHandle {
    /// Builds a handle from a launch response body
    ///
    /// The run id is looked up under `run_id`, `runId` or `id`, either at the
    /// top level or nested under `data`. Returns `None` when no string id is
    /// present.
    pub fn from_payload(payload: JsonValue) -> Option<Self> {
        let run_id = lookup_str(&payload, &["run_id", "runId", "id"])?.to_string();
        Some(Self { run_id, payload })
    }
}

/// State of a remote run
///
/// Remote states arrive as free-form strings. Known values (and their common
/// aliases) map onto named variants, everything else is kept in `Other` and is
/// never considered terminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunState {
    Pending,
    Running,
    Done,
    Failed,
    Terminated,
    Other(String),
}

impl RunState {
    /// Whether no further transitions will happen
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Terminated)
    }

    /// Whether the run ended without success
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Terminated)
    }
}

impl From<&str> for RunState {
    fn from(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PENDING" | "QUEUED" => Self::Pending,
            "RUNNING" => Self::Running,
            "DONE" | "SUCCEEDED" | "SUCCESS" | "COMPLETED" => Self::Done,
            "FAILED" => Self::Failed,
            "TERMINATED" | "CANCELLED" | "CANCELED" | "ABORTED" => Self::Terminated,
            _ => Self::Other(raw.to_string()),
        }
    }
}

impl From<String> for RunState {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<RunState> for String {
    fn from(state: RunState) -> Self {
        state.to_string()
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("PENDING"),
            Self::Running => f.write_str("RUNNING"),
            Self::Done => f.write_str("DONE"),
            Self::Failed => f.write_str("FAILED"),
            Self::Terminated => f.write_str("TERMINATED"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

/// Snapshot of a run as observed by one status fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatus {
    pub state: RunState,
    pub payload: JsonValue,
    pub observed_at: chrono::DateTime<chrono::Utc>,
}

impl RunStatus {
    pub fn new(state: RunState, payload: JsonValue) -> Self {
        Self {
            state,
            payload,
            observed_at: chrono::Utc::now(),
        }
    }

    /// Builds a status from a get-run response body
    ///
    /// The state is looked up under `state` or `status`, either at the top
    /// level or nested under `data`. Returns `None` when no string state is
    /// present.
    pub fn from_payload(payload: JsonValue) -> Option<Self> {
        let state = RunState::from(lookup_str(&payload, &["state", "status"])?);
        Some(Self::new(state, payload))
    }
}

/// Outcome of a successful orchestration call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationResult {
    pub start_details: RunHandle,
    pub final_result: RunStatus,
}

fn lookup_str<'a>(payload: &'a JsonValue, keys: &[&str]) -> Option<&'a str> {
    let top_level = keys.iter().find_map(|key| payload.get(key)?.as_str());
    top_level.or_else(|| {
        let data = payload.get("data")?;
        keys.iter().find_map(|key| data.get(key)?.as_str())
    })
}
