//! HCP Terraform MCP Server
//!
//! An MCP server that exposes HCP Terraform projects, workspaces and runs as
//! tools, `terraform://` resources and a status prompt.

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    model::*,
    service::{RequestContext, RoleServer},
};
use tfc::{ClientConfig, ClientError, Dispatcher, ResourceReader, TerraformClient, ToolDefinition};

pub mod settings;

/// Name of the organization status prompt.
pub const STATUS_PROMPT: &str = "terraform_status";

/// MCP server backed by one [`TerraformClient`].
#[derive(Clone)]
pub struct TerraformServer {
    dispatcher: Dispatcher,
    resources: ResourceReader,
}

impl std::fmt::Debug for TerraformServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerraformServer")
            .field("client", self.dispatcher.client())
            .finish_non_exhaustive()
    }
}

impl TerraformServer {
    /// Serve through an existing client.
    pub fn new(client: Arc<TerraformClient>) -> Self {
        Self {
            dispatcher: Dispatcher::new(client.clone()),
            resources: ResourceReader::new(client),
        }
    }

    /// Build the client from configuration.
    pub fn from_config(config: ClientConfig) -> Result<Self, ClientError> {
        Ok(Self::new(Arc::new(TerraformClient::new(config)?)))
    }

    /// The shared client.
    pub fn client(&self) -> &Arc<TerraformClient> {
        self.dispatcher.client()
    }

    fn tools(&self) -> Vec<Tool> {
        tfc::catalog().into_iter().map(to_tool).collect()
    }
}

fn to_tool(definition: ToolDefinition) -> Tool {
    let input_schema = match definition.parameters {
        serde_json::Value::Object(map) => Arc::new(map),
        _ => Arc::new(serde_json::Map::new()),
    };
    Tool {
        name: definition.name.into(),
        title: None,
        description: Some(definition.description.into()),
        input_schema,
        output_schema: None,
        annotations: None,
        icons: None,
        meta: None,
    }
}

/// Prompts offered by the server.
pub fn prompts() -> Vec<Prompt> {
    vec![Prompt::new(
        STATUS_PROMPT,
        Some("Get the current status of HCP Terraform organization"),
        None,
    )]
}

/// Render a prompt by name. Unknown names yield an explanatory message.
pub fn prompt(name: &str) -> GetPromptResult {
    if name == STATUS_PROMPT {
        return GetPromptResult {
            description: Some("Check HCP Terraform organization status".into()),
            messages: vec![PromptMessage::new_text(
                PromptMessageRole::User,
                "Please check the status of my HCP Terraform organization and provide a summary \
                 of the current state, including recent runs and workspace statuses.",
            )],
        };
    }
    GetPromptResult {
        description: Some(format!("Unknown prompt: {}", name)),
        messages: vec![PromptMessage::new_text(
            PromptMessageRole::User,
            format!("Error: Unknown prompt '{}'", name),
        )],
    }
}

impl ServerHandler for TerraformServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .enable_prompts()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Manage HCP Terraform projects, workspaces and runs for the configured \
                organization. Every tool returns a short text result; failures are reported \
                as text too. Read terraform:// resources for raw JSON details."
                    .into(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: self.tools(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = request.arguments.unwrap_or_default();
        let results = self.dispatcher.dispatch(&request.name, &arguments).await;
        Ok(CallToolResult::success(
            results
                .into_iter()
                .map(|result| Content::text(result.text))
                .collect(),
        ))
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let resources = self
            .resources
            .list()
            .await
            .into_iter()
            .map(|info| {
                let mut raw = RawResource::new(info.uri, info.name);
                raw.description = Some(info.description);
                raw.mime_type = Some(info.mime_type);
                raw.no_annotation()
            })
            .collect();
        Ok(ListResourcesResult::with_all_items(resources))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let read = self.resources.read(&request.uri).await;
        let mut contents = ResourceContents::text(read.text, read.uri);
        if let ResourceContents::TextResourceContents { mime_type, .. } = &mut contents {
            *mime_type = Some(read.mime_type);
        }
        Ok(ReadResourceResult {
            contents: vec![contents],
        })
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        Ok(ListPromptsResult::with_all_items(prompts()))
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        Ok(prompt(&request.name))
    }
}
