//! HCP Terraform API client

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::cache::ReadCache;
use crate::codec::{Envelope, ResourceDocument, parse_response, to_wire_attributes};
use crate::config::ClientConfig;
use crate::endpoints::{Endpoints, RunAction};
use crate::error::ClientError;
use crate::limiter::RateLimiter;
use crate::models::{
    CreateProjectRequest, CreateRunRequest, CreateWorkspaceRequest, ListOptions, ListRunsQuery,
    LockWorkspaceRequest, RequestModel, RunActionRequest, RunScope, UpdateProjectRequest,
    UpdateWorkspaceRequest,
};
use crate::transport::{HttpRequest, HttpTransport, Method, ReqwestTransport};

/// Client for one organization.
///
/// Each operation validates its input, waits for a rate-limit permit, sends
/// one request and classifies the response. Nothing is retried: operations
/// that change remote state are not idempotent and a failed call is reported
/// to the caller as is.
///
/// The client is cheap to share behind an `Arc`; the rate limiter and the
/// connection pool are the only state shared between concurrent calls.
pub struct TerraformClient {
    config: ClientConfig,
    endpoints: Endpoints,
    limiter: Arc<RateLimiter>,
    transport: Arc<dyn HttpTransport>,
    cache: Option<ReadCache>,
}

impl fmt::Debug for TerraformClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerraformClient")
            .field("config", &self.config)
            .field("limiter", &self.limiter)
            .field("caching", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

impl TerraformClient {
    /// Create a client that talks to the configured base URL.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client over a custom transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let cache = config
            .enable_caching
            .then(|| ReadCache::new(config.cache_ttl));
        Self {
            endpoints: Endpoints::new(config.organization.clone()),
            limiter: Arc::new(RateLimiter::from(config.rate_limit)),
            transport,
            cache,
            config,
        }
    }

    /// Share a rate limiter with other clients.
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    /// The configuration the client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Endpoint paths for the configured organization.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// The rate limiter guarding outbound calls.
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    async fn execute(&self, request: HttpRequest) -> Result<Envelope, ClientError> {
        self.execute_with(request, self.cache.as_ref()).await
    }

    async fn execute_with(
        &self,
        request: HttpRequest,
        cache: Option<&ReadCache>,
    ) -> Result<Envelope, ClientError> {
        let read_only = request.method.is_read_only();
        let cache_key = request.cache_key();

        if read_only && let Some(hit) = cache.and_then(|c| c.get(&cache_key)) {
            tracing::debug!(key = %cache_key, "cache hit");
            return Ok(hit);
        }
        let generation = cache.map(ReadCache::generation);

        self.limiter.acquire().await;
        tracing::debug!(method = %request.method, path = %request.path, "sending request");

        let method = request.method;
        let sent = self.transport.send(request).await;
        if !read_only && let Some(cache) = cache {
            cache.clear();
        }

        let response = sent.inspect_err(|e| {
            tracing::warn!(method = %method, key = %cache_key, error = %e, "request failed");
        })?;
        tracing::debug!(status = response.status, "received response");

        let envelope = parse_response(response.status, &response.body).inspect_err(|e| {
            tracing::warn!(method = %method, key = %cache_key, error = %e, "API call failed");
        })?;

        if read_only
            && let (Some(cache), Some(generation)) = (cache, generation)
            && !cache.insert_if_current(cache_key.clone(), envelope.clone(), generation)
        {
            tracing::debug!(key = %cache_key, "cache cleared during read, response not stored");
        }
        Ok(envelope)
    }

    /// GET a path below the base URL.
    pub async fn get(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<Envelope, ClientError> {
        self.execute(HttpRequest::new(Method::Get, path).with_query(query))
            .await
    }

    /// POST a JSON body to a path below the base URL.
    pub async fn post(&self, path: &str, body: Value) -> Result<Envelope, ClientError> {
        self.execute(HttpRequest::new(Method::Post, path).with_body(body))
            .await
    }

    /// PATCH a path below the base URL with a JSON body.
    pub async fn patch(&self, path: &str, body: Value) -> Result<Envelope, ClientError> {
        self.execute(HttpRequest::new(Method::Patch, path).with_body(body))
            .await
    }

    /// Returns true when the organization endpoint answers successfully.
    ///
    /// Any client error, including transport failures, reads as unhealthy.
    /// The request always goes to the API, never to the read cache.
    pub async fn health_check(&self) -> bool {
        let request = HttpRequest::new(Method::Get, self.endpoints.organization_details());
        match self.execute_with(request, None).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, "health check failed");
                false
            }
        }
    }

    /// Organization details.
    pub async fn get_organization(&self) -> Result<Envelope, ClientError> {
        self.get(&self.endpoints.organization_details(), Vec::new())
            .await
    }

    // Projects

    /// Create a project.
    pub async fn create_project(
        &self,
        request: &CreateProjectRequest,
    ) -> Result<Envelope, ClientError> {
        request.validate()?;
        let body = ResourceDocument::new("projects", request)?.into_json();
        self.post(&self.endpoints.projects(), body).await
    }

    /// Update a project. Rejects a request with no fields set.
    pub async fn update_project(
        &self,
        project_id: &str,
        request: &UpdateProjectRequest,
    ) -> Result<Envelope, ClientError> {
        require_id("project_id", project_id)?;
        request.validate()?;
        let body = ResourceDocument::new("projects", request)?.into_json();
        self.patch(&self.endpoints.project(project_id), body).await
    }

    /// List projects.
    pub async fn list_projects(&self, options: &ListOptions) -> Result<Envelope, ClientError> {
        let query = list_query(options, "search[names]");
        self.get(&self.endpoints.projects(), query).await
    }

    /// A single project.
    pub async fn get_project(&self, project_id: &str) -> Result<Envelope, ClientError> {
        require_id("project_id", project_id)?;
        self.get(&self.endpoints.project(project_id), Vec::new())
            .await
    }

    // Workspaces

    /// Create a workspace, attached to a project when `project_id` is set.
    pub async fn create_workspace(
        &self,
        request: &CreateWorkspaceRequest,
    ) -> Result<Envelope, ClientError> {
        request.validate()?;
        let body = ResourceDocument::new("workspaces", request)?
            .relate_attribute("project-id", "project", "projects")
            .into_json();
        self.post(&self.endpoints.workspaces(), body).await
    }

    /// Update a workspace. Rejects a request with no fields set.
    pub async fn update_workspace(
        &self,
        workspace_id: &str,
        request: &UpdateWorkspaceRequest,
    ) -> Result<Envelope, ClientError> {
        require_id("workspace_id", workspace_id)?;
        request.validate()?;
        let body = ResourceDocument::new("workspaces", request)?
            .relate_attribute("project-id", "project", "projects")
            .into_json();
        self.patch(&self.endpoints.workspace(workspace_id), body)
            .await
    }

    /// List workspaces.
    pub async fn list_workspaces(&self, options: &ListOptions) -> Result<Envelope, ClientError> {
        let query = list_query(options, "search[name]");
        self.get(&self.endpoints.workspaces(), query).await
    }

    /// A single workspace.
    pub async fn get_workspace(&self, workspace_id: &str) -> Result<Envelope, ClientError> {
        require_id("workspace_id", workspace_id)?;
        self.get(&self.endpoints.workspace(workspace_id), Vec::new())
            .await
    }

    /// Lock a workspace, optionally recording a reason.
    pub async fn lock_workspace(
        &self,
        workspace_id: &str,
        request: &LockWorkspaceRequest,
    ) -> Result<Envelope, ClientError> {
        require_id("workspace_id", workspace_id)?;
        let body = Value::Object(to_wire_attributes(request)?);
        self.post(&self.endpoints.lock_workspace(workspace_id), body)
            .await
    }

    /// Unlock a workspace.
    pub async fn unlock_workspace(&self, workspace_id: &str) -> Result<Envelope, ClientError> {
        require_id("workspace_id", workspace_id)?;
        self.post(
            &self.endpoints.unlock_workspace(workspace_id),
            Value::Object(Default::default()),
        )
        .await
    }

    // Runs

    /// Queue a run in a workspace.
    pub async fn create_run(&self, request: &CreateRunRequest) -> Result<Envelope, ClientError> {
        request.validate()?;
        let body = ResourceDocument::new("runs", request)?
            .relate_attribute("workspace-id", "workspace", "workspaces")
            .into_json();
        self.post(&self.endpoints.runs(), body).await
    }

    /// A single run.
    pub async fn get_run(&self, run_id: &str) -> Result<Envelope, ClientError> {
        require_id("run_id", run_id)?;
        self.get(&self.endpoints.run(run_id), Vec::new()).await
    }

    /// List runs of a workspace or of the whole organization.
    ///
    /// A query naming neither scope fails before any request is sent.
    pub async fn list_runs(&self, query: &ListRunsQuery) -> Result<Envelope, ClientError> {
        let path = match query.scope()? {
            RunScope::Organization => self.endpoints.organization_runs(),
            RunScope::Workspace(id) => {
                require_id("workspace_id", &id)?;
                self.endpoints.workspace_runs(&id)
            }
        };
        let mut params = Vec::new();
        if let Some(include) = &query.include {
            params.push(("include".to_string(), include.clone()));
        }
        if let Some(search) = &query.search {
            params.push(("search[basic]".to_string(), search.clone()));
        }
        self.get(&path, params).await
    }

    /// Apply, cancel or discard a run.
    pub async fn run_action(
        &self,
        run_id: &str,
        action: RunAction,
        request: &RunActionRequest,
    ) -> Result<Envelope, ClientError> {
        require_id("run_id", run_id)?;
        let body = Value::Object(to_wire_attributes(request)?);
        self.post(&self.endpoints.run_action(run_id, action), body)
            .await
    }

    /// Apply a planned run.
    pub async fn apply_run(
        &self,
        run_id: &str,
        request: &RunActionRequest,
    ) -> Result<Envelope, ClientError> {
        self.run_action(run_id, RunAction::Apply, request).await
    }

    /// Cancel a run in progress.
    pub async fn cancel_run(
        &self,
        run_id: &str,
        request: &RunActionRequest,
    ) -> Result<Envelope, ClientError> {
        self.run_action(run_id, RunAction::Cancel, request).await
    }

    /// Discard a planned run.
    pub async fn discard_run(
        &self,
        run_id: &str,
        request: &RunActionRequest,
    ) -> Result<Envelope, ClientError> {
        self.run_action(run_id, RunAction::Discard, request).await
    }
}

/// Ids are interpolated into URL paths, so anything that could change the
/// path or start a query string is rejected.
fn require_id(field: &str, id: &str) -> Result<(), ClientError> {
    let is_segment = !id.trim().is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\', '?', '#', '%']);
    if !is_segment {
        return Err(ClientError::validation(format!("{} is not a valid id: {:?}", field, id)));
    }
    Ok(())
}

fn list_query(options: &ListOptions, search_param: &str) -> Vec<(String, String)> {
    let mut query = Vec::new();
    if let Some(include) = &options.include {
        query.push(("include".to_string(), include.clone()));
    }
    if let Some(search) = &options.search {
        query.push((search_param.to_string(), search.clone()));
    }
    query
}
