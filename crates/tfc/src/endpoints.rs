//! API paths, relative to the base URL

/// Builds endpoint paths for one organization.
#[derive(Debug, Clone)]
pub struct Endpoints {
    organization: String,
}

impl Endpoints {
    /// Endpoints scoped to `organization`.
    pub fn new(organization: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
        }
    }

    /// The organization this table is scoped to.
    pub fn organization(&self) -> &str {
        &self.organization
    }

    /// Organization details (also used by the health check).
    pub fn organization_details(&self) -> String {
        format!("/organizations/{}", self.organization)
    }

    /// List or create projects.
    pub fn projects(&self) -> String {
        format!("/organizations/{}/projects", self.organization)
    }

    /// A single project.
    pub fn project(&self, project_id: &str) -> String {
        format!("/projects/{}", project_id)
    }

    /// List or create workspaces.
    pub fn workspaces(&self) -> String {
        format!("/organizations/{}/workspaces", self.organization)
    }

    /// A single workspace.
    pub fn workspace(&self, workspace_id: &str) -> String {
        format!("/workspaces/{}", workspace_id)
    }

    /// Lock a workspace.
    pub fn lock_workspace(&self, workspace_id: &str) -> String {
        format!("/workspaces/{}/actions/lock", workspace_id)
    }

    /// Unlock a workspace.
    pub fn unlock_workspace(&self, workspace_id: &str) -> String {
        format!("/workspaces/{}/actions/unlock", workspace_id)
    }

    /// Create a run.
    pub fn runs(&self) -> String {
        "/runs".to_string()
    }

    /// Runs across the organization.
    pub fn organization_runs(&self) -> String {
        format!("/organizations/{}/runs", self.organization)
    }

    /// Runs of one workspace.
    pub fn workspace_runs(&self, workspace_id: &str) -> String {
        format!("/workspaces/{}/runs", workspace_id)
    }

    /// A single run.
    pub fn run(&self, run_id: &str) -> String {
        format!("/runs/{}", run_id)
    }

    /// Apply, cancel or discard a run.
    pub fn run_action(&self, run_id: &str, action: RunAction) -> String {
        format!("/runs/{}/actions/{}", run_id, action.as_str())
    }
}

/// Actions that can be taken on a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunAction {
    /// Apply a planned run
    Apply,
    /// Cancel a run in progress
    Cancel,
    /// Discard a planned run
    Discard,
}

impl RunAction {
    /// Path segment of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunAction::Apply => "apply",
            RunAction::Cancel => "cancel",
            RunAction::Discard => "discard",
        }
    }

    /// Past tense, for confirmations.
    pub fn past_tense(&self) -> &'static str {
        match self {
            RunAction::Apply => "applied",
            RunAction::Cancel => "cancelled",
            RunAction::Discard => "discarded",
        }
    }
}
