//! Read-only `terraform://` resources
//!
//! Resources expose the same data as the read tools, rendered as JSON
//! documents instead of prose.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::client::TerraformClient;
use crate::codec::Envelope;
use crate::error::ClientError;
use crate::models::ListOptions;

/// URI scheme of every resource.
pub const SCHEME: &str = "terraform://";

const JSON_MIME: &str = "application/json";
const TEXT_MIME: &str = "text/plain";

/// A parsed resource URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceUri {
    /// `terraform://organization/info`
    OrganizationInfo,
    /// `terraform://projects`
    Projects,
    /// `terraform://workspaces`
    Workspaces,
    /// `terraform://project/{id}`
    Project(String),
    /// `terraform://workspace/{id}`
    Workspace(String),
    /// `terraform://run/{id}`
    Run(String),
}

/// A URI outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown or empty resource: {0}")]
pub struct UnknownResource(pub String);

impl FromStr for ResourceUri {
    type Err = UnknownResource;

    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownResource(uri.to_string());
        let path = uri.strip_prefix(SCHEME).ok_or_else(unknown)?;
        let segments: Vec<&str> = path.split('/').collect();

        // The identifier is always the last path segment.
        let id = || match segments.last() {
            Some(id) if segments.len() > 1 && !id.is_empty() => Ok(id.to_string()),
            _ => Err(unknown()),
        };
        match segments.as_slice() {
            ["organization", "info"] => Ok(ResourceUri::OrganizationInfo),
            ["projects"] => Ok(ResourceUri::Projects),
            ["workspaces"] => Ok(ResourceUri::Workspaces),
            ["project", ..] => id().map(ResourceUri::Project),
            ["workspace", ..] => id().map(ResourceUri::Workspace),
            ["run", ..] => id().map(ResourceUri::Run),
            _ => Err(unknown()),
        }
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceUri::OrganizationInfo => write!(f, "{}organization/info", SCHEME),
            ResourceUri::Projects => write!(f, "{}projects", SCHEME),
            ResourceUri::Workspaces => write!(f, "{}workspaces", SCHEME),
            ResourceUri::Project(id) => write!(f, "{}project/{}", SCHEME, id),
            ResourceUri::Workspace(id) => write!(f, "{}workspace/{}", SCHEME, id),
            ResourceUri::Run(id) => write!(f, "{}run/{}", SCHEME, id),
        }
    }
}

/// A resource advertised to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceInfo {
    /// Resource URI
    pub uri: String,
    /// Display name
    pub name: String,
    /// Short description
    pub description: String,
    /// MIME type of the contents
    pub mime_type: String,
}

impl ResourceInfo {
    fn json(uri: ResourceUri, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            uri: uri.to_string(),
            name: name.into(),
            description: description.into(),
            mime_type: JSON_MIME.to_string(),
        }
    }
}

/// Contents of a read resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceText {
    /// The URI that was read
    pub uri: String,
    /// MIME type of `text`
    pub mime_type: String,
    /// JSON document, or a plain-text explanation on failure
    pub text: String,
}

impl ResourceText {
    fn plain(uri: &str, text: impl Into<String>) -> Self {
        Self {
            uri: uri.to_string(),
            mime_type: TEXT_MIME.to_string(),
            text: text.into(),
        }
    }

    /// Returns true when the read produced a JSON document.
    pub fn is_json(&self) -> bool {
        self.mime_type == JSON_MIME
    }
}

/// Lists and reads resources through a shared client.
#[derive(Debug, Clone)]
pub struct ResourceReader {
    client: Arc<TerraformClient>,
}

impl ResourceReader {
    /// Read through `client`.
    pub fn new(client: Arc<TerraformClient>) -> Self {
        Self { client }
    }

    /// Advertised resources: organization info, the collections and one
    /// entry per project. A failure to list projects is logged and skipped.
    pub async fn list(&self) -> Vec<ResourceInfo> {
        let mut resources = vec![
            ResourceInfo::json(
                ResourceUri::OrganizationInfo,
                "Organization Information",
                "Basic information about the HCP Terraform organization",
            ),
            ResourceInfo::json(
                ResourceUri::Projects,
                "Projects",
                "All projects in the organization",
            ),
            ResourceInfo::json(
                ResourceUri::Workspaces,
                "Workspaces",
                "All workspaces in the organization",
            ),
        ];

        match self.client.list_projects(&ListOptions::default()).await {
            Ok(envelope) => {
                resources.extend(envelope.resources().iter().map(|project| {
                    let name = project.attribute_str("name").unwrap_or("Unknown");
                    ResourceInfo::json(
                        ResourceUri::Project(project.id.clone()),
                        format!("Project: {}", name),
                        format!("Details for project {}", project.id),
                    )
                }));
            }
            Err(e) => tracing::warn!(error = %e, "could not list project resources"),
        }
        resources
    }

    /// Read one resource. Never fails: unknown URIs and client errors come
    /// back as plain text.
    pub async fn read(&self, uri: &str) -> ResourceText {
        tracing::debug!(uri, "reading resource");
        let parsed = match uri.parse::<ResourceUri>() {
            Ok(parsed) => parsed,
            Err(e) => return ResourceText::plain(uri, e.to_string()),
        };

        match self.render(&parsed).await {
            Ok(Some(text)) => ResourceText {
                uri: uri.to_string(),
                mime_type: JSON_MIME.to_string(),
                text,
            },
            Ok(None) => ResourceText::plain(uri, UnknownResource(uri.to_string()).to_string()),
            Err(e) => {
                tracing::error!(uri, error = %e, "failed to read resource");
                ResourceText::plain(uri, format!("API Error: {}", e))
            }
        }
    }

    async fn render(&self, uri: &ResourceUri) -> Result<Option<String>, ClientError> {
        let client = &self.client;
        let document = match uri {
            ResourceUri::OrganizationInfo => {
                let envelope = client.get_organization().await?;
                envelope
                    .single()
                    .map(|organization| self.organization_info(&organization.attributes))
            }
            ResourceUri::Projects => {
                Some(collection(&client.list_projects(&ListOptions::default()).await?))
            }
            ResourceUri::Workspaces => {
                Some(collection(&client.list_workspaces(&ListOptions::default()).await?))
            }
            ResourceUri::Project(id) => single(&client.get_project(id).await?)?,
            ResourceUri::Workspace(id) => single(&client.get_workspace(id).await?)?,
            ResourceUri::Run(id) => single(&client.get_run(id).await?)?,
        };
        document.map(|value| pretty(&value)).transpose()
    }

    fn organization_info(&self, attributes: &serde_json::Map<String, Value>) -> Value {
        let config = self.client.config();
        let retrieved_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs_f64())
            .unwrap_or_default();
        json!({
            "name": config.organization,
            "api_url": config.base_url,
            "status": "connected",
            "retrieved_at": retrieved_at,
            "data": attributes,
        })
    }
}

fn collection(envelope: &Envelope) -> Value {
    json!({
        "count": envelope.resources().len(),
        "data": envelope.resources(),
    })
}

fn single(envelope: &Envelope) -> Result<Option<Value>, ClientError> {
    envelope
        .single()
        .map(serde_json::to_value)
        .transpose()
        .map_err(ClientError::from)
}

fn pretty(value: &Value) -> Result<String, ClientError> {
    Ok(serde_json::to_string_pretty(value)?)
}
