use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::types::short_branch_name;
use super::{
    AdoError, BuildQuery, BuildRef, BuildSource, FileChange, LineRange, LogRef, PullRequest,
    PullRequestComment, PullRequestMetadata, PullRequestSource,
};
use crate::config::AdoSettings;

const API_VERSION: &str = "7.1";
const MARKDOWN_PROPERTY: &str = "Microsoft.TeamFoundation.Discussion.SupportsMarkdown";
const MAX_PULL_REQUESTS: u32 = 100;

/// Azure DevOps REST client bound to one organization and project.
///
/// Authenticates with basic auth (empty user, PAT as password). Meant to
/// live for a single tool invocation.
pub struct AdoClient {
    http: reqwest::Client,
    base: Url,
    organization: String,
    project: String,
    pat: String,
}

#[derive(Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildResponse {
    id: u64,
    status: Option<String>,
    reason: Option<String>,
    finish_time: Option<DateTime<Utc>>,
    source_branch: Option<String>,
    #[serde(default)]
    trigger_info: HashMap<String, String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogResponse {
    id: u64,
    line_count: Option<u64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityRef {
    display_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestResponse {
    pull_request_id: u64,
    title: Option<String>,
    source_ref_name: Option<String>,
    target_ref_name: Option<String>,
    status: Option<String>,
    creation_date: Option<DateTime<Utc>>,
    created_by: Option<IdentityRef>,
}

#[derive(Deserialize)]
struct IterationResponse {
    id: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IterationChangesResponse {
    #[serde(default)]
    change_entries: Vec<ChangeEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangeEntry {
    change_type: Option<String>,
    item: Option<ChangeItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangeItem {
    path: Option<String>,
    #[serde(default)]
    is_folder: bool,
}

#[derive(Deserialize)]
struct ThreadResponse {
    #[serde(default)]
    properties: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    comments: Option<Vec<CommentResponse>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentResponse {
    id: u64,
    content: Option<String>,
    author: Option<IdentityRef>,
    published_date: Option<DateTime<Utc>>,
}

impl AdoClient {
    pub fn new(settings: &AdoSettings) -> Result<Self, AdoError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|_| AdoError::InvalidUrl(settings.base_url.clone()))?;
        if base.cannot_be_a_base() {
            return Err(AdoError::InvalidUrl(settings.base_url.clone()));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base,
            organization: settings.organization.clone(),
            project: settings.project.clone(),
            pat: settings.pat.clone(),
        })
    }

    /// `{base}/{organization}/{project}/_apis/{segments...}`, each segment
    /// percent-encoded.
    fn api_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .push(&self.organization)
                .push(&self.project)
                .push("_apis")
                .extend(segments);
        }
        url
    }

    fn repository_url(&self, repository: &str, rest: &[&str]) -> Url {
        let mut segments = vec!["git", "repositories", repository];
        segments.extend_from_slice(rest);
        self.api_url(&segments)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, AdoError> {
        let path = url.path().to_string();
        debug!(path = %path, "GET");
        let response = self
            .http
            .get(url)
            .header(USER_AGENT, "ado-pr-tools")
            .header(ACCEPT, "application/json")
            .basic_auth("", Some(&self.pat))
            .query(query)
            .query(&[("api-version", API_VERSION)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdoError::Status {
                status: status.as_u16(),
                path,
            });
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl BuildSource for AdoClient {
    #[instrument(skip(self), fields(org = %self.organization, project = %self.project))]
    async fn list_completed_builds(&self, query: &BuildQuery) -> Result<Vec<BuildRef>, AdoError> {
        let mut params = vec![
            ("reasonFilter", "pullRequest".to_string()),
            ("statusFilter", "completed".to_string()),
            ("queryOrder", "finishTimeDescending".to_string()),
            (
                "minTime",
                query
                    .min_finish_time
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            ("$top", query.top.to_string()),
        ];
        if let Some(branch) = &query.branch_name {
            params.push(("branchName", branch.clone()));
        }

        let response: ListResponse<BuildResponse> =
            self.get_json(self.api_url(&["build", "builds"]), &params).await?;
        debug!(builds = response.value.len(), "received builds");

        Ok(response
            .value
            .into_iter()
            .map(|mut build| BuildRef {
                id: build.id,
                status: build.status,
                reason: build.reason,
                finish_time: build.finish_time,
                source_branch: build.source_branch,
                trigger_pr_number: build.trigger_info.remove("pr.number"),
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn list_build_logs(&self, build_id: u64) -> Result<Vec<LogRef>, AdoError> {
        let id = build_id.to_string();
        let response: ListResponse<LogResponse> = self
            .get_json(self.api_url(&["build", "builds", &id, "logs"]), &[])
            .await?;

        Ok(response
            .value
            .into_iter()
            .map(|log| LogRef {
                id: log.id,
                line_count: log.line_count,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn get_build_log_lines(
        &self,
        build_id: u64,
        log_id: u64,
        range: LineRange,
    ) -> Result<Vec<String>, AdoError> {
        let build = build_id.to_string();
        let log = log_id.to_string();
        let params = [
            ("startLine", range.start.to_string()),
            ("endLine", range.start.saturating_add(range.count).to_string()),
        ];
        let response: ListResponse<String> = self
            .get_json(self.api_url(&["build", "builds", &build, "logs", &log]), &params)
            .await?;
        debug!(lines = response.value.len(), "received log lines");

        Ok(response.value)
    }
}

#[async_trait]
impl PullRequestSource for AdoClient {
    #[instrument(skip(self))]
    async fn list_pull_requests(
        &self,
        repository: &str,
        branch: &str,
    ) -> Result<Vec<PullRequest>, AdoError> {
        let params = [
            ("searchCriteria.sourceRefName", format!("refs/heads/{branch}")),
            ("searchCriteria.status", "active".to_string()),
            ("$top", MAX_PULL_REQUESTS.to_string()),
        ];
        let response: ListResponse<PullRequestResponse> = self
            .get_json(self.repository_url(repository, &["pullrequests"]), &params)
            .await?;

        Ok(response
            .value
            .into_iter()
            .map(|pr| PullRequest {
                id: pr.pull_request_id,
                title: pr.title.unwrap_or_default(),
                created_by: pr
                    .created_by
                    .and_then(|who| who.display_name)
                    .unwrap_or_default(),
                source_branch: pr
                    .source_ref_name
                    .as_deref()
                    .map(short_branch_name)
                    .unwrap_or_default()
                    .to_string(),
                target_branch: pr
                    .target_ref_name
                    .as_deref()
                    .map(short_branch_name)
                    .unwrap_or_default()
                    .to_string(),
                status: pr.status.unwrap_or_default(),
                created_date: pr.creation_date,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn list_comments(
        &self,
        repository: &str,
        pull_request_id: u64,
    ) -> Result<Vec<PullRequestComment>, AdoError> {
        let id = pull_request_id.to_string();
        let response: ListResponse<ThreadResponse> = self
            .get_json(
                self.repository_url(repository, &["pullrequests", &id, "threads"]),
                &[],
            )
            .await?;

        let mut comments = Vec::new();
        for thread in response.value {
            let comment_type = match &thread.properties {
                Some(props) if props.contains_key(MARKDOWN_PROPERTY) => "markdown",
                _ => "text",
            };
            for comment in thread.comments.unwrap_or_default() {
                let Some(content) = comment.content.filter(|c| !c.trim().is_empty()) else {
                    continue;
                };
                comments.push(PullRequestComment {
                    id: comment.id,
                    content,
                    author: comment
                        .author
                        .and_then(|who| who.display_name)
                        .unwrap_or_else(|| "Unknown".to_string()),
                    created_date: comment.published_date,
                    comment_type: comment_type.to_string(),
                });
            }
        }
        debug!(comments = comments.len(), "collected thread comments");

        Ok(comments)
    }

    #[instrument(skip(self))]
    async fn get_pull_request(
        &self,
        repository: &str,
        pull_request_id: u64,
    ) -> Result<PullRequestMetadata, AdoError> {
        let id = pull_request_id.to_string();
        let pr: PullRequestResponse = self
            .get_json(self.repository_url(repository, &["pullrequests", &id]), &[])
            .await?;

        Ok(PullRequestMetadata {
            id: pr.pull_request_id,
            title: pr.title.unwrap_or_default(),
            source_branch: pr
                .source_ref_name
                .as_deref()
                .map(|name| short_branch_name(name).to_string()),
            target_branch: pr
                .target_ref_name
                .as_deref()
                .map(|name| short_branch_name(name).to_string()),
        })
    }

    #[instrument(skip(self))]
    async fn list_iterations(
        &self,
        repository: &str,
        pull_request_id: u64,
    ) -> Result<Vec<u64>, AdoError> {
        let id = pull_request_id.to_string();
        let response: ListResponse<IterationResponse> = self
            .get_json(
                self.repository_url(repository, &["pullrequests", &id, "iterations"]),
                &[],
            )
            .await?;

        Ok(response.value.into_iter().map(|it| it.id).collect())
    }

    #[instrument(skip(self))]
    async fn get_iteration_changes(
        &self,
        repository: &str,
        pull_request_id: u64,
        iteration_id: u64,
    ) -> Result<Vec<FileChange>, AdoError> {
        let id = pull_request_id.to_string();
        let iteration = iteration_id.to_string();
        let response: IterationChangesResponse = self
            .get_json(
                self.repository_url(
                    repository,
                    &["pullrequests", &id, "iterations", &iteration, "changes"],
                ),
                &[],
            )
            .await?;

        Ok(response
            .change_entries
            .into_iter()
            .filter_map(|entry| {
                let item = entry.item?;
                if item.is_folder {
                    return None;
                }
                let path = item.path?;
                Some(FileChange {
                    path: path.trim_start_matches('/').to_string(),
                    change_type: entry.change_type.unwrap_or_default(),
                })
            })
            .collect())
    }
}
