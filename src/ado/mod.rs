pub mod client;
pub mod types;

#[cfg(test)]
pub mod fake;

pub use client::AdoClient;
pub use types::{
    BuildQuery, BuildRef, FileChange, LineRange, LogRef, PullRequest, PullRequestComment,
    PullRequestMetadata,
};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdoError {
    #[error("Azure DevOps API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("Azure DevOps returned {status} for {path}")]
    Status { status: u16, path: String },

    #[error("Invalid Azure DevOps URL: {0}")]
    InvalidUrl(String),
}

/// Builds and their logs for one project.
#[async_trait]
pub trait BuildSource: Send + Sync {
    /// Completed, pull-request-triggered builds, most recently finished first.
    async fn list_completed_builds(&self, query: &BuildQuery) -> Result<Vec<BuildRef>, AdoError>;

    /// Log containers of a build, in container order.
    async fn list_build_logs(&self, build_id: u64) -> Result<Vec<LogRef>, AdoError>;

    /// Raw text lines of one log container within `range`.
    async fn get_build_log_lines(
        &self,
        build_id: u64,
        log_id: u64,
        range: LineRange,
    ) -> Result<Vec<String>, AdoError>;
}

/// Pull requests, their discussion and their changes for one project.
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    /// Active pull requests whose source branch is `branch`.
    async fn list_pull_requests(
        &self,
        repository: &str,
        branch: &str,
    ) -> Result<Vec<PullRequest>, AdoError>;

    async fn list_comments(
        &self,
        repository: &str,
        pull_request_id: u64,
    ) -> Result<Vec<PullRequestComment>, AdoError>;

    async fn get_pull_request(
        &self,
        repository: &str,
        pull_request_id: u64,
    ) -> Result<PullRequestMetadata, AdoError>;

    /// Iteration ids of a pull request, in any order.
    async fn list_iterations(
        &self,
        repository: &str,
        pull_request_id: u64,
    ) -> Result<Vec<u64>, AdoError>;

    async fn get_iteration_changes(
        &self,
        repository: &str,
        pull_request_id: u64,
        iteration_id: u64,
    ) -> Result<Vec<FileChange>, AdoError>;
}
