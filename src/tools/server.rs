use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, warn};

use super::ToolError;
use crate::ado::AdoClient;
use crate::config::AdoSettings;

// --- Tool parameter structs ---

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListPullRequestsParams {
    /// The source branch to list pull requests for (without refs/heads/)
    pub branch: String,
    /// The repository name (default: configured repository)
    pub repository: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestParams {
    /// The repository name (default: configured repository)
    pub repository: Option<String>,
    /// The pull request ID
    pub pull_request_id: u64,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildErrorsParams {
    /// The pull request ID
    pub pull_request_id: u64,
}

// --- MCP Server ---

/// MCP server exposing read-only Azure DevOps pull request tools.
///
/// Each call opens its own client and drops it when the call returns.
#[derive(Clone)]
pub struct AdoToolServer {
    settings: Arc<AdoSettings>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl AdoToolServer {
    pub fn new(settings: AdoSettings) -> Self {
        Self {
            settings: Arc::new(settings),
            tool_router: Self::tool_router(),
        }
    }

    fn connect(&self) -> Result<AdoClient, McpError> {
        AdoClient::new(&self.settings).map_err(|e| to_mcp_err(e.into()))
    }

    fn repository(&self, requested: Option<&str>) -> Result<String, McpError> {
        self.settings
            .resolve_repository(requested)
            .map_err(|e| to_mcp_err(e.into()))
    }

    /// List active pull requests for a source branch
    #[tool(description = "List pull requests for the given branch in the configured repository.")]
    async fn list_pull_requests(
        &self,
        Parameters(params): Parameters<ListPullRequestsParams>,
    ) -> Result<CallToolResult, McpError> {
        let repository = self.repository(params.repository.as_deref())?;
        let client = self.connect()?;
        let json = super::list_pull_requests(&client, &repository, &params.branch)
            .await
            .map_err(to_mcp_err)?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    /// Get all comments of a pull request
    #[tool(description = "Get comments for a specific pull request.")]
    async fn get_pull_request_comments(
        &self,
        Parameters(params): Parameters<PullRequestParams>,
    ) -> Result<CallToolResult, McpError> {
        let repository = self.repository(params.repository.as_deref())?;
        let client = self.connect()?;
        let json = super::pull_request_comments(&client, &repository, params.pull_request_id)
            .await
            .map_err(to_mcp_err)?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    /// Get changed files of a pull request with suggested local git commands
    #[tool(
        description = "Get the files changed in a pull request's latest iteration, with git commands for inspecting the diff locally."
    )]
    async fn get_pull_request_changes(
        &self,
        Parameters(params): Parameters<PullRequestParams>,
    ) -> Result<CallToolResult, McpError> {
        let repository = self.repository(params.repository.as_deref())?;
        let client = self.connect()?;
        let json = super::pull_request_changes(&client, &repository, params.pull_request_id)
            .await
            .map_err(to_mcp_err)?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    /// Get error lines from the latest build of a pull request
    #[tool(
        description = "Get build errors for a pull request to help with troubleshooting and code review."
    )]
    async fn get_build_errors_for_pull_request(
        &self,
        Parameters(params): Parameters<BuildErrorsParams>,
    ) -> Result<CallToolResult, McpError> {
        let client = self.connect()?;
        let json = super::build_errors(&client, params.pull_request_id, self.settings.build_match)
            .await
            .map_err(to_mcp_err)?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

#[tool_handler]
impl ServerHandler for AdoToolServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Read-only Azure DevOps tools: list pull requests, read comments, inspect changes and build errors"
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

fn to_mcp_err(e: ToolError) -> McpError {
    warn!(error = %e, "tool call failed");
    match e {
        ToolError::Config(_) => McpError::invalid_params(e.to_string(), None),
        ToolError::Ado(_) | ToolError::Serialize(_) => McpError::internal_error(e.to_string(), None),
    }
}

/// Start the MCP server on stdio transport.
pub async fn serve(settings: AdoSettings) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        organization = %settings.organization,
        project = %settings.project,
        "starting MCP server on stdio"
    );
    let server = AdoToolServer::new(settings);
    let service = server.serve(rmcp::transport::stdio()).await?;
    service.waiting().await?;
    Ok(())
}
