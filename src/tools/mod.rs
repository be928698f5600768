pub mod server;

pub use server::serve;

use thiserror::Error;
use tracing::{info, instrument};

use crate::ado::{AdoError, BuildSource, PullRequestSource};
use crate::builds::{self, BuildMatch};
use crate::changes;
use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ado(#[from] AdoError),

    #[error("Failed to serialize result: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Active pull requests for a source branch, as a JSON array.
#[instrument(skip(source))]
pub async fn list_pull_requests(
    source: &dyn PullRequestSource,
    repository: &str,
    branch: &str,
) -> Result<String, ToolError> {
    let pull_requests = source.list_pull_requests(repository, branch).await?;
    info!(count = pull_requests.len(), "listed pull requests");
    Ok(serde_json::to_string(&pull_requests)?)
}

/// Non-empty comments across all threads of a pull request, as a JSON array.
#[instrument(skip(source))]
pub async fn pull_request_comments(
    source: &dyn PullRequestSource,
    repository: &str,
    pull_request_id: u64,
) -> Result<String, ToolError> {
    let comments = source.list_comments(repository, pull_request_id).await?;
    info!(count = comments.len(), "fetched pull request comments");
    Ok(serde_json::to_string(&comments)?)
}

/// Pull request metadata, changed files and suggested git commands, as JSON.
pub async fn pull_request_changes(
    source: &dyn PullRequestSource,
    repository: &str,
    pull_request_id: u64,
) -> Result<String, ToolError> {
    let info = changes::pull_request_changes(source, repository, pull_request_id).await?;
    Ok(serde_json::to_string(&info)?)
}

/// Error findings from the pull request's latest build, as a JSON array.
pub async fn build_errors(
    source: &dyn BuildSource,
    pull_request_id: u64,
    strategy: BuildMatch,
) -> Result<String, ToolError> {
    let findings = builds::collect_build_errors(source, pull_request_id, strategy).await?;
    Ok(serde_json::to_string(&findings)?)
}
