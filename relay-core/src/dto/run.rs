//! Run DTOs for the remote job service

use serde::{Deserialize, Serialize};

use crate::domain::run::{RunInput, RunRequest};

/// Body of the "start run" request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchRunBody {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub inputs: Vec<RunInput>,
}

impl From<&RunRequest> for LaunchRunBody {
    fn from(req: &RunRequest) -> Self {
        Self {
            user_id: req.user_id.clone(),
            project_id: req.project_id.clone(),
            inputs: req.inputs.clone(),
        }
    }
}

/// Query string of the "get run" request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetRunQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}
