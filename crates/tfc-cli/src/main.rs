//! tfc - call HCP Terraform tools from a terminal
//!
//! Usage:
//!   tfc tools                                  Print the tool catalog
//!   tfc health                                 Check API connectivity
//!   tfc call list_runs --args '{"organization_runs": true}'
//!   tfc resources                              List terraform:// resources
//!   tfc read terraform://organization/info     Read one resource
//!
//! Credentials come from `TFC_API_TOKEN` and `TFC_ORGANIZATION` (or flags).

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tfc::{Dispatcher, ResourceReader, TerraformClient};
use tfc_mcp::settings::{ConnectionArgs, init_tracing};

/// Call HCP Terraform tools and read resources without an agent host
#[derive(Parser, Debug)]
#[command(name = "tfc", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every tool with its parameter schema as JSON
    Tools,
    /// Check API connectivity; exits non-zero when unhealthy
    Health {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Run one tool and print its text result
    Call {
        /// Tool name, e.g. list_workspaces
        tool: String,
        /// Tool arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// List advertised resources
    Resources {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Read one terraform:// resource
    Read {
        /// Resource URI
        uri: String,
        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

fn connect(connection: &ConnectionArgs) -> anyhow::Result<Arc<TerraformClient>> {
    init_tracing(connection.debug)?;
    let client = TerraformClient::new(connection.client_config())
        .context("invalid connection settings")?;
    Ok(Arc::new(client))
}

fn parse_arguments(raw: &str) -> anyhow::Result<Map<String, Value>> {
    match serde_json::from_str(raw).context("--args must be valid JSON")? {
        Value::Object(map) => Ok(map),
        other => anyhow::bail!("--args must be a JSON object, got {}", other),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Command::Tools => {
            println!("{}", serde_json::to_string_pretty(&tfc::catalog())?);
        }
        Command::Health { connection } => {
            let client = connect(&connection)?;
            if client.health_check().await {
                println!("HCP Terraform API is healthy");
            } else {
                println!("HCP Terraform API is unhealthy");
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Call {
            tool,
            args,
            connection,
        } => {
            let arguments = parse_arguments(&args)?;
            let dispatcher = Dispatcher::new(connect(&connection)?);
            for result in dispatcher.dispatch(&tool, &arguments).await {
                println!("{}", result.text);
            }
        }
        Command::Resources { connection } => {
            let reader = ResourceReader::new(connect(&connection)?);
            println!("{}", serde_json::to_string_pretty(&reader.list().await)?);
        }
        Command::Read { uri, connection } => {
            let reader = ResourceReader::new(connect(&connection)?);
            let contents = reader.read(&uri).await;
            println!("{}", contents.text);
            if !contents.is_json() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
