use serde::{Deserialize, Serialize};

use crate::models::{Workspace, WorkspaceMember};

#[derive(Debug, Serialize, Deserialize)]
pub struct WorkspacesResponse {
    pub workspaces: Vec<Workspace>,
}

/// Body of `POST /api/workspaces/add-member`. Fields default to empty so a
/// missing field surfaces as a 400 validation error instead of a
/// deserialization rejection.
#[derive(Debug, Serialize, Deserialize)]
pub struct AddMemberRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub workspace_id: String,
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddMemberResponse {
    pub member: WorkspaceMember,
    pub message: String,
}
