//! Typed request models
//!
//! Field names are the in-process (underscored) names; the codec translates
//! them to the hyphenated wire form. `Option` fields distinguish "unset" from
//! "set to a falsy value": only `None` is omitted from the request body.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ClientError;

/// Common behaviour of request models.
pub trait RequestModel: Serialize + DeserializeOwned {
    /// Check the model's preconditions.
    fn validate(&self) -> Result<(), ClientError> {
        Ok(())
    }

    /// Bind a loosely-typed argument map to the model.
    ///
    /// Keys the model does not declare are ignored. Missing required fields
    /// and failed preconditions are reported as validation errors.
    fn from_arguments(arguments: &Map<String, Value>) -> Result<Self, ClientError> {
        let model: Self = serde_json::from_value(Value::Object(arguments.clone()))
            .map_err(|e| ClientError::validation(format!("invalid arguments: {}", e)))?;
        model.validate()?;
        Ok(model)
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ClientError> {
    if value.trim().is_empty() {
        return Err(ClientError::validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn require_any_field<T: Serialize>(model: &T) -> Result<(), ClientError> {
    let has_fields = match serde_json::to_value(model)? {
        Value::Object(fields) => !fields.is_empty(),
        _ => false,
    };
    if !has_fields {
        return Err(ClientError::validation(
            "at least one attribute to update must be provided",
        ));
    }
    Ok(())
}

/// Create a project in the organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateProjectRequest {
    /// Project name
    pub name: String,
    /// Project description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CreateProjectRequest {
    /// Create a validated request.
    pub fn new(name: impl Into<String>) -> Result<Self, ClientError> {
        let request = Self {
            name: name.into(),
            description: None,
        };
        request.validate()?;
        Ok(request)
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl RequestModel for CreateProjectRequest {
    fn validate(&self) -> Result<(), ClientError> {
        require_non_empty("name", &self.name)
    }
}

/// Update a project. At least one field must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateProjectRequest {
    /// New name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl UpdateProjectRequest {
    /// Returns true when no field is set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

impl RequestModel for UpdateProjectRequest {
    fn validate(&self) -> Result<(), ClientError> {
        require_any_field(self)?;
        if let Some(name) = &self.name {
            require_non_empty("name", name)?;
        }
        Ok(())
    }
}

/// Create a workspace in the organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateWorkspaceRequest {
    /// Workspace name
    pub name: String,
    /// Project to place the workspace in; sent as a relationship
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Workspace description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Apply successful plans automatically
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_apply: Option<bool>,
    /// `remote`, `local` or `agent`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_mode: Option<String>,
    /// Terraform version constraint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terraform_version: Option<String>,
    /// Directory to run Terraform in, relative to the repository root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    /// Paths whose changes trigger runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_prefixes: Option<Vec<String>>,
}

impl CreateWorkspaceRequest {
    /// Create a validated request with only the name set.
    pub fn new(name: impl Into<String>) -> Result<Self, ClientError> {
        let request = Self {
            name: name.into(),
            project_id: None,
            description: None,
            auto_apply: None,
            execution_mode: None,
            terraform_version: None,
            working_directory: None,
            trigger_prefixes: None,
        };
        request.validate()?;
        Ok(request)
    }

    /// Place the workspace in a project.
    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Set auto-apply.
    pub fn with_auto_apply(mut self, auto_apply: bool) -> Self {
        self.auto_apply = Some(auto_apply);
        self
    }
}

impl RequestModel for CreateWorkspaceRequest {
    fn validate(&self) -> Result<(), ClientError> {
        require_non_empty("name", &self.name)
    }
}

/// Update a workspace. At least one field must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateWorkspaceRequest {
    /// New name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Move the workspace to another project; sent as a relationship
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// New description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Apply successful plans automatically
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_apply: Option<bool>,
    /// `remote`, `local` or `agent`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_mode: Option<String>,
    /// Terraform version constraint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terraform_version: Option<String>,
    /// Directory to run Terraform in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    /// Paths whose changes trigger runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_prefixes: Option<Vec<String>>,
}

impl RequestModel for UpdateWorkspaceRequest {
    fn validate(&self) -> Result<(), ClientError> {
        require_any_field(self)?;
        if let Some(name) = &self.name {
            require_non_empty("name", name)?;
        }
        Ok(())
    }
}

/// Queue a run in a workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRunRequest {
    /// Workspace to run in; sent as a relationship
    pub workspace_id: String,
    /// Run message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Plan a destroy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_destroy: Option<bool>,
    /// Refresh state before planning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<bool>,
    /// Only refresh state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_only: Option<bool>,
    /// Resource addresses to force replacement of
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace_addrs: Option<Vec<String>>,
    /// Resource addresses to target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_addrs: Option<Vec<String>>,
    /// Speculative plan that cannot be applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_only: Option<bool>,
}

impl CreateRunRequest {
    /// Create a validated request for the given workspace.
    pub fn new(workspace_id: impl Into<String>) -> Result<Self, ClientError> {
        let request = Self {
            workspace_id: workspace_id.into(),
            message: None,
            is_destroy: None,
            refresh: None,
            refresh_only: None,
            replace_addrs: None,
            target_addrs: None,
            plan_only: None,
        };
        request.validate()?;
        Ok(request)
    }

    /// Set the run message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl RequestModel for CreateRunRequest {
    fn validate(&self) -> Result<(), ClientError> {
        require_non_empty("workspace_id", &self.workspace_id)
    }
}

/// Payload for apply, cancel and discard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunActionRequest {
    /// Comment recorded with the action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl RunActionRequest {
    /// An action with a comment.
    pub fn with_comment(comment: impl Into<String>) -> Self {
        Self {
            comment: Some(comment.into()),
        }
    }
}

impl RequestModel for RunActionRequest {}

/// Payload for locking a workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LockWorkspaceRequest {
    /// Why the workspace is locked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RequestModel for LockWorkspaceRequest {}

/// Query options for project and workspace listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListOptions {
    /// Related resources to include
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
    /// Name filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl RequestModel for ListOptions {}

/// Where to list runs from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunScope {
    /// Every run in the organization
    Organization,
    /// Runs of one workspace
    Workspace(String),
}

/// Arguments for listing runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListRunsQuery {
    /// List the runs of this workspace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    /// List runs across the organization
    #[serde(default)]
    pub organization_runs: bool,
    /// Related resources to include
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
    /// Search filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl ListRunsQuery {
    /// Runs of one workspace.
    pub fn workspace(workspace_id: impl Into<String>) -> Self {
        Self {
            workspace_id: Some(workspace_id.into()),
            ..Self::default()
        }
    }

    /// Runs across the organization.
    pub fn organization() -> Self {
        Self {
            organization_runs: true,
            ..Self::default()
        }
    }

    /// Resolve the scope. The organization flag wins when both are given.
    pub fn scope(&self) -> Result<RunScope, ClientError> {
        if self.organization_runs {
            return Ok(RunScope::Organization);
        }
        match self.workspace_id.as_deref() {
            Some(id) if !id.trim().is_empty() => Ok(RunScope::Workspace(id.to_string())),
            _ => Err(ClientError::validation(
                "either workspace_id must be provided or organization_runs must be true",
            )),
        }
    }
}

impl RequestModel for ListRunsQuery {
    fn validate(&self) -> Result<(), ClientError> {
        self.scope().map(|_| ())
    }
}
