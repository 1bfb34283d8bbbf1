//! Tool dispatch
//!
//! Binds loosely-typed argument maps to request models, calls the client and
//! renders every outcome, failures included, as human-readable text.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::client::TerraformClient;
use crate::codec::{Envelope, Resource};
use crate::endpoints::RunAction;
use crate::error::ClientError;
use crate::models::{
    CreateProjectRequest, CreateRunRequest, CreateWorkspaceRequest, ListOptions, ListRunsQuery,
    LockWorkspaceRequest, RequestModel, RunActionRequest, UpdateProjectRequest,
    UpdateWorkspaceRequest,
};
use crate::tools::ToolName;

/// One block of text returned to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextResult {
    /// The rendered text
    pub text: String,
}

impl TextResult {
    /// Wrap a string.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Maps tool names to client operations.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: Arc<TerraformClient>,
}

impl Dispatcher {
    /// Dispatch over a shared client.
    pub fn new(client: Arc<TerraformClient>) -> Self {
        Self { client }
    }

    /// The underlying client.
    pub fn client(&self) -> &Arc<TerraformClient> {
        &self.client
    }

    /// Run a tool and render its outcome.
    ///
    /// Never fails: unknown tools, bad arguments, API errors and even panics
    /// inside an operation come back as a single text result.
    pub async fn dispatch(&self, name: &str, arguments: &Map<String, Value>) -> Vec<TextResult> {
        let tool = match name.parse::<ToolName>() {
            Ok(tool) => tool,
            Err(e) => {
                tracing::warn!(tool = name, "unknown tool requested");
                return vec![TextResult::new(e.to_string())];
            }
        };
        tracing::debug!(%tool, "dispatching tool call");

        let outcome = AssertUnwindSafe(self.call(tool, arguments))
            .catch_unwind()
            .await;
        let text = match outcome {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                tracing::warn!(%tool, error = %e, kind = %e.kind(), "tool call failed");
                render_error(&e)
            }
            Err(_) => {
                tracing::error!(%tool, "tool call panicked");
                format!("Unexpected error: {} did not complete", tool)
            }
        };
        vec![TextResult::new(text)]
    }

    /// Run a tool, returning the rendered success text or the client error.
    pub async fn call(
        &self,
        tool: ToolName,
        arguments: &Map<String, Value>,
    ) -> Result<String, ClientError> {
        let client = &self.client;
        match tool {
            ToolName::HealthCheck => {
                let status = if client.health_check().await {
                    "healthy"
                } else {
                    "unhealthy"
                };
                Ok(format!("HCP Terraform API is {}", status))
            }

            ToolName::CreateProject => {
                let request = CreateProjectRequest::from_arguments(arguments)?;
                let envelope = client.create_project(&request).await?;
                Ok(created("project", Some(&request.name), &envelope))
            }
            ToolName::UpdateProject => {
                let project_id = target(arguments, "project_id")?;
                let request = UpdateProjectRequest::from_arguments(arguments)?;
                let envelope = client.update_project(&project_id, &request).await?;
                Ok(updated("project", &project_id, &envelope))
            }
            ToolName::ListProjects => {
                let options = ListOptions::from_arguments(arguments)?;
                let envelope = client.list_projects(&options).await?;
                Ok(listing("project", &envelope, |project| {
                    named_line(project, false)
                }))
            }
            ToolName::GetProject => {
                let project_id = target(arguments, "project_id")?;
                let envelope = client.get_project(&project_id).await?;
                Ok(detail("project", &project_id, &envelope, describe_project))
            }

            ToolName::CreateWorkspace => {
                let request = CreateWorkspaceRequest::from_arguments(arguments)?;
                let envelope = client.create_workspace(&request).await?;
                Ok(created("workspace", Some(&request.name), &envelope))
            }
            ToolName::UpdateWorkspace => {
                let workspace_id = target(arguments, "workspace_id")?;
                let request = UpdateWorkspaceRequest::from_arguments(arguments)?;
                let envelope = client.update_workspace(&workspace_id, &request).await?;
                Ok(updated("workspace", &workspace_id, &envelope))
            }
            ToolName::ListWorkspaces => {
                let options = ListOptions::from_arguments(arguments)?;
                let envelope = client.list_workspaces(&options).await?;
                Ok(listing("workspace", &envelope, |workspace| {
                    named_line(workspace, true)
                }))
            }
            ToolName::GetWorkspace => {
                let workspace_id = target(arguments, "workspace_id")?;
                let envelope = client.get_workspace(&workspace_id).await?;
                Ok(detail(
                    "workspace",
                    &workspace_id,
                    &envelope,
                    describe_workspace,
                ))
            }
            ToolName::LockWorkspace => {
                let workspace_id = target(arguments, "workspace_id")?;
                let request = LockWorkspaceRequest::from_arguments(arguments)?;
                client.lock_workspace(&workspace_id, &request).await?;
                Ok(format!("Successfully locked workspace {}", workspace_id))
            }
            ToolName::UnlockWorkspace => {
                let workspace_id = target(arguments, "workspace_id")?;
                client.unlock_workspace(&workspace_id).await?;
                Ok(format!("Successfully unlocked workspace {}", workspace_id))
            }

            ToolName::CreateRun => {
                let request = CreateRunRequest::from_arguments(arguments)?;
                let envelope = client.create_run(&request).await?;
                Ok(created("run", None, &envelope))
            }
            ToolName::GetRun => {
                let run_id = target(arguments, "run_id")?;
                let envelope = client.get_run(&run_id).await?;
                Ok(detail("run", &run_id, &envelope, describe_run))
            }
            ToolName::ListRuns => {
                let query = ListRunsQuery::from_arguments(arguments)?;
                let envelope = client.list_runs(&query).await?;
                Ok(listing("run", &envelope, run_line))
            }
            ToolName::ApplyRun => self.run_action(RunAction::Apply, arguments).await,
            ToolName::CancelRun => self.run_action(RunAction::Cancel, arguments).await,
            ToolName::DiscardRun => self.run_action(RunAction::Discard, arguments).await,
        }
    }

    async fn run_action(
        &self,
        action: RunAction,
        arguments: &Map<String, Value>,
    ) -> Result<String, ClientError> {
        let run_id = target(arguments, "run_id")?;
        let request = RunActionRequest::from_arguments(arguments)?;
        self.client.run_action(&run_id, action, &request).await?;
        Ok(format!("Successfully {} run {}", action.past_tense(), run_id))
    }
}

/// Render a client error the way tool results report failures.
pub fn render_error(err: &ClientError) -> String {
    match err {
        ClientError::Validation(message) => format!("Invalid arguments: {}", message),
        ClientError::Transport(_) => format!("Connection error: {}", err),
        ClientError::Api { .. } | ClientError::InvalidResponse { .. } => {
            format!("API Error: {}", err)
        }
    }
}

fn target(arguments: &Map<String, Value>, key: &str) -> Result<String, ClientError> {
    match arguments.get(key) {
        Some(Value::String(id)) if !id.trim().is_empty() => Ok(id.clone()),
        Some(_) => Err(ClientError::validation(format!("{} must be a non-empty string", key))),
        None => Err(ClientError::validation(format!("missing required argument: {}", key))),
    }
}

fn created(kind: &str, name: Option<&str>, envelope: &Envelope) -> String {
    let label = match name {
        Some(name) => format!("{} '{}'", kind, name),
        None => kind.to_string(),
    };
    match envelope.single() {
        Some(resource) => format!("Successfully created {} with ID: {}", label, resource.id),
        None => format!("Created {}, but the API returned no resource", label),
    }
}

fn updated(kind: &str, id: &str, envelope: &Envelope) -> String {
    if envelope.data.is_absent() {
        format!("Updated {} {}, but the API returned no resource", kind, id)
    } else {
        format!("Successfully updated {} {}", kind, id)
    }
}

fn listing(kind: &str, envelope: &Envelope, line: impl Fn(&Resource) -> String) -> String {
    let resources = envelope.resources();
    if resources.is_empty() {
        return format!("No {}s found", kind);
    }
    let lines: Vec<String> = resources.iter().map(line).collect();
    format!(
        "Found {} {}(s):\n{}",
        resources.len(),
        kind,
        lines.join("\n")
    )
}

fn named_line(resource: &Resource, show_lock: bool) -> String {
    let name = resource.attribute_str("name").unwrap_or("Unknown");
    let mut line = format!("- {} (ID: {})", name, resource.id);
    if let Some(description) = resource.attribute_str("description")
        && !description.is_empty()
    {
        line.push_str(" - ");
        line.push_str(description);
    }
    if show_lock && resource.attribute_bool("locked") == Some(true) {
        line.push_str(" [LOCKED]");
    }
    line
}

fn run_line(run: &Resource) -> String {
    let status = run.attribute_str("status").unwrap_or("Unknown");
    let mut line = format!("- Run {}: {}", run.id, status);
    if let Some(message) = run.attribute_str("message")
        && !message.is_empty()
    {
        line.push_str(" - ");
        line.push_str(message);
    }
    line
}

fn detail(
    kind: &str,
    id: &str,
    envelope: &Envelope,
    describe: fn(&Resource) -> Vec<String>,
) -> String {
    match envelope.single() {
        Some(resource) => describe(resource).join("\n"),
        None => format!("No {} found with ID: {}", kind, id),
    }
}

fn field(resource: &Resource, label: &str, key: &str) -> Option<String> {
    match resource.attribute(key)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(format!("{}: {}", label, s)),
        other => Some(format!("{}: {}", label, other)),
    }
}

fn describe_project(project: &Resource) -> Vec<String> {
    let name = project.attribute_str("name").unwrap_or("Unknown");
    let mut lines = vec![format!("Project {} (ID: {})", name, project.id)];
    lines.extend(field(project, "Description", "description"));
    lines.extend(field(project, "Created", "created-at"));
    lines
}

fn describe_workspace(workspace: &Resource) -> Vec<String> {
    let name = workspace.attribute_str("name").unwrap_or("Unknown");
    let mut lines = vec![format!("Workspace {} (ID: {})", name, workspace.id)];
    lines.extend(field(workspace, "Description", "description"));
    lines.extend(field(workspace, "Locked", "locked"));
    lines.extend(field(workspace, "Execution mode", "execution-mode"));
    lines.extend(field(workspace, "Terraform version", "terraform-version"));
    lines.extend(field(workspace, "Auto apply", "auto-apply"));
    lines.extend(field(workspace, "Working directory", "working-directory"));
    if let Some(project) = workspace.related("project") {
        lines.push(format!("Project: {}", project.id));
    }
    lines
}

fn describe_run(run: &Resource) -> Vec<String> {
    let status = run.attribute_str("status").unwrap_or("Unknown");
    let mut lines = vec![format!("Run {}: {}", run.id, status)];
    lines.extend(field(run, "Message", "message"));
    lines.extend(field(run, "Destroy", "is-destroy"));
    lines.extend(field(run, "Plan only", "plan-only"));
    lines.extend(field(run, "Created", "created-at"));
    if let Some(workspace) = run.related("workspace") {
        lines.push(format!("Workspace: {}", workspace.id));
    }
    lines
}
