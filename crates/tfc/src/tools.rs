//! Tool names and definitions.
//!
//! - [`ToolName`] - the fixed set of operations a host can invoke
//! - [`ToolDefinition`] - a tool's schema (name, description, JSON Schema parameters)
//! - [`catalog`] - definitions for every tool, in a stable order

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

/// Every operation the dispatcher can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    /// Check API connectivity
    HealthCheck,
    /// Create a project
    CreateProject,
    /// Update a project
    UpdateProject,
    /// List projects
    ListProjects,
    /// Show one project
    GetProject,
    /// Create a workspace
    CreateWorkspace,
    /// Update a workspace
    UpdateWorkspace,
    /// List workspaces
    ListWorkspaces,
    /// Show one workspace
    GetWorkspace,
    /// Lock a workspace
    LockWorkspace,
    /// Unlock a workspace
    UnlockWorkspace,
    /// Queue a run
    CreateRun,
    /// Show one run
    GetRun,
    /// List runs
    ListRuns,
    /// Apply a run
    ApplyRun,
    /// Cancel a run
    CancelRun,
    /// Discard a run
    DiscardRun,
}

impl ToolName {
    /// All tools, in catalog order.
    pub const ALL: [ToolName; 17] = [
        ToolName::HealthCheck,
        ToolName::CreateProject,
        ToolName::UpdateProject,
        ToolName::ListProjects,
        ToolName::GetProject,
        ToolName::CreateWorkspace,
        ToolName::UpdateWorkspace,
        ToolName::ListWorkspaces,
        ToolName::GetWorkspace,
        ToolName::LockWorkspace,
        ToolName::UnlockWorkspace,
        ToolName::CreateRun,
        ToolName::GetRun,
        ToolName::ListRuns,
        ToolName::ApplyRun,
        ToolName::CancelRun,
        ToolName::DiscardRun,
    ];

    /// Wire name of the tool.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::HealthCheck => "health_check",
            ToolName::CreateProject => "create_project",
            ToolName::UpdateProject => "update_project",
            ToolName::ListProjects => "list_projects",
            ToolName::GetProject => "get_project",
            ToolName::CreateWorkspace => "create_workspace",
            ToolName::UpdateWorkspace => "update_workspace",
            ToolName::ListWorkspaces => "list_workspaces",
            ToolName::GetWorkspace => "get_workspace",
            ToolName::LockWorkspace => "lock_workspace",
            ToolName::UnlockWorkspace => "unlock_workspace",
            ToolName::CreateRun => "create_run",
            ToolName::GetRun => "get_run",
            ToolName::ListRuns => "list_runs",
            ToolName::ApplyRun => "apply_run",
            ToolName::CancelRun => "cancel_run",
            ToolName::DiscardRun => "discard_run",
        }
    }

    /// Returns true when the tool never changes remote state.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            ToolName::HealthCheck
                | ToolName::ListProjects
                | ToolName::GetProject
                | ToolName::ListWorkspaces
                | ToolName::GetWorkspace
                | ToolName::GetRun
                | ToolName::ListRuns
        )
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tool name outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown tool: {0}")]
pub struct UnknownTool(pub String);

impl FromStr for ToolName {
    type Err = UnknownTool;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| UnknownTool(s.to_string()))
    }
}

/// Full definition of a tool including its parameter schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (unique identifier).
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool's parameters.
    #[serde(default)]
    pub parameters: Value,
}

impl ToolDefinition {
    /// Create a new tool definition.
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Create a tool definition with no parameters.
    pub fn no_params(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(
            name,
            description,
            json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        )
    }

    /// Names of the required parameters.
    pub fn required(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

fn string(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn boolean(description: &str) -> Value {
    json!({ "type": "boolean", "description": description })
}

fn string_list(description: &str) -> Value {
    json!({ "type": "array", "items": { "type": "string" }, "description": description })
}

fn object(properties: Value, required: &[&str]) -> Value {
    json!({ "type": "object", "properties": properties, "required": required })
}

fn workspace_properties(name_description: &str) -> Value {
    json!({
        "name": string(name_description),
        "project_id": string("Project ID to place the workspace in (optional)"),
        "description": string("Workspace description (optional)"),
        "auto_apply": boolean("Apply successful plans automatically (optional)"),
        "execution_mode": string("Execution mode: remote, local or agent (optional)"),
        "terraform_version": string("Terraform version (optional)"),
        "working_directory": string("Working directory relative to the repository root (optional)"),
        "trigger_prefixes": string_list("Paths whose changes trigger runs (optional)")
    })
}

/// The definition of one tool.
pub fn definition(tool: ToolName) -> ToolDefinition {
    let name = tool.as_str();
    match tool {
        ToolName::HealthCheck => {
            ToolDefinition::no_params(name, "Check HCP Terraform API connectivity")
        }
        ToolName::CreateProject => ToolDefinition::new(
            name,
            "Create a new HCP Terraform project",
            object(
                json!({
                    "name": string("Project name"),
                    "description": string("Project description (optional)")
                }),
                &["name"],
            ),
        ),
        ToolName::UpdateProject => ToolDefinition::new(
            name,
            "Update an existing HCP Terraform project",
            object(
                json!({
                    "project_id": string("Project ID"),
                    "name": string("New project name (optional)"),
                    "description": string("New project description (optional)")
                }),
                &["project_id"],
            ),
        ),
        ToolName::ListProjects => ToolDefinition::new(
            name,
            "List HCP Terraform projects in the organization",
            object(
                json!({
                    "include": string("Related resources to include (optional)"),
                    "search": string("Search term to filter projects by name (optional)")
                }),
                &[],
            ),
        ),
        ToolName::GetProject => ToolDefinition::new(
            name,
            "Show details of an HCP Terraform project",
            object(json!({ "project_id": string("Project ID") }), &["project_id"]),
        ),
        ToolName::CreateWorkspace => ToolDefinition::new(
            name,
            "Create a new HCP Terraform workspace",
            object(workspace_properties("Workspace name"), &["name"]),
        ),
        ToolName::UpdateWorkspace => {
            let mut properties = workspace_properties("New workspace name (optional)");
            if let Some(map) = properties.as_object_mut() {
                map.insert("workspace_id".into(), string("Workspace ID"));
            }
            ToolDefinition::new(
                name,
                "Update an existing HCP Terraform workspace",
                object(properties, &["workspace_id"]),
            )
        }
        ToolName::ListWorkspaces => ToolDefinition::new(
            name,
            "List HCP Terraform workspaces in the organization",
            object(
                json!({
                    "include": string("Related resources to include (optional)"),
                    "search": string("Search term to filter workspaces by name (optional)")
                }),
                &[],
            ),
        ),
        ToolName::GetWorkspace => ToolDefinition::new(
            name,
            "Show details of an HCP Terraform workspace",
            object(json!({ "workspace_id": string("Workspace ID") }), &["workspace_id"]),
        ),
        ToolName::LockWorkspace => ToolDefinition::new(
            name,
            "Lock an HCP Terraform workspace",
            object(
                json!({
                    "workspace_id": string("Workspace ID"),
                    "reason": string("Reason for locking (optional)")
                }),
                &["workspace_id"],
            ),
        ),
        ToolName::UnlockWorkspace => ToolDefinition::new(
            name,
            "Unlock an HCP Terraform workspace",
            object(json!({ "workspace_id": string("Workspace ID") }), &["workspace_id"]),
        ),
        ToolName::CreateRun => ToolDefinition::new(
            name,
            "Queue a new run in an HCP Terraform workspace",
            object(
                json!({
                    "workspace_id": string("Workspace ID"),
                    "message": string("Run message (optional)"),
                    "is_destroy": boolean("Plan a destroy (optional)"),
                    "refresh": boolean("Refresh state before planning (optional)"),
                    "refresh_only": boolean("Only refresh state (optional)"),
                    "replace_addrs": string_list("Resource addresses to replace (optional)"),
                    "target_addrs": string_list("Resource addresses to target (optional)"),
                    "plan_only": boolean("Speculative plan that cannot be applied (optional)")
                }),
                &["workspace_id"],
            ),
        ),
        ToolName::GetRun => ToolDefinition::new(
            name,
            "Show the status of an HCP Terraform run",
            object(json!({ "run_id": string("Run ID") }), &["run_id"]),
        ),
        ToolName::ListRuns => ToolDefinition::new(
            name,
            "List HCP Terraform runs for a workspace or the whole organization",
            object(
                json!({
                    "workspace_id": string("Workspace ID (required unless organization_runs is true)"),
                    "organization_runs": boolean("List runs across the organization (optional)"),
                    "include": string("Related resources to include (optional)"),
                    "search": string("Search term (optional)")
                }),
                &[],
            ),
        ),
        ToolName::ApplyRun => run_action_definition(name, "Apply a planned HCP Terraform run"),
        ToolName::CancelRun => run_action_definition(name, "Cancel a running HCP Terraform run"),
        ToolName::DiscardRun => {
            run_action_definition(name, "Discard a planned HCP Terraform run")
        }
    }
}

fn run_action_definition(name: &str, description: &str) -> ToolDefinition {
    ToolDefinition::new(
        name,
        description,
        object(
            json!({
                "run_id": string("Run ID"),
                "comment": string("Comment for the action (optional)")
            }),
            &["run_id"],
        ),
    )
}

/// Definitions for every tool.
pub fn catalog() -> Vec<ToolDefinition> {
    ToolName::ALL.into_iter().map(definition).collect()
}
