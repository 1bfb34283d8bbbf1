//! tfc: HCP Terraform API client
//!
//! A rate-limited JSON:API client for one HCP Terraform organization, plus a
//! tool dispatcher and resource reader that render every outcome as text for
//! assistant hosts.

mod cache;
mod client;
mod config;
mod dispatch;
mod endpoints;
mod error;
mod limiter;
mod transport;

pub mod codec;
pub mod models;
pub mod resources;
pub mod tools;

pub use cache::ReadCache;
pub use client::TerraformClient;
pub use codec::{ApiError, Envelope, Resource, ResourceData};
pub use config::{ClientConfig, ConfigSummary, DEFAULT_BASE_URL, RateLimit};
pub use dispatch::{Dispatcher, TextResult, render_error};
pub use endpoints::{Endpoints, RunAction};
pub use error::{ClientError, ErrorKind};
pub use limiter::RateLimiter;
pub use resources::{ResourceInfo, ResourceReader, ResourceText, ResourceUri};
pub use tools::{ToolDefinition, ToolName, catalog};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport};
