//! HCP Terraform MCP Server
//!
//! Serves HCP Terraform tools, resources and prompts over stdio.

use clap::Parser;
use rmcp::ServiceExt;
use tfc_mcp::TerraformServer;
use tfc_mcp::settings::{ConnectionArgs, init_tracing};

/// MCP server for HCP Terraform
#[derive(Parser, Debug)]
#[command(name = "tfc-mcp", version)]
#[command(about = "MCP server exposing HCP Terraform projects, workspaces and runs")]
struct Args {
    #[command(flatten)]
    connection: ConnectionArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.connection.debug)?;

    let config = args.connection.client_config();
    tracing::info!(organization = %config.organization, "Starting HCP Terraform MCP server");
    tracing::debug!(config = ?config.summary(), "server configuration");

    let server = TerraformServer::from_config(config)?;

    // Report connectivity without delaying the handshake.
    let client = server.client().clone();
    tokio::spawn(async move {
        if client.health_check().await {
            tracing::info!("Connected to HCP Terraform API");
        } else {
            tracing::warn!("Failed to connect to HCP Terraform API");
        }
    });

    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .inspect_err(|e| {
            tracing::error!("Failed to start MCP service: {}", e);
        })?;

    tracing::info!("HCP Terraform MCP server running");

    service.waiting().await?;

    tracing::info!("HCP Terraform MCP server shutting down");

    Ok(())
}
