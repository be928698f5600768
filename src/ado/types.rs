use chrono::{DateTime, Utc};
use serde::Serialize;

/// A completed build as returned by the build listing, reduced to the
/// fields the locator needs.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildRef {
    /// Build id
    pub id: u64,
    /// Completion status (e.g. "completed")
    pub status: Option<String>,
    /// Trigger reason (e.g. "pullRequest")
    pub reason: Option<String>,
    /// When the build finished
    pub finish_time: Option<DateTime<Utc>>,
    /// Full source ref, e.g. `refs/pull/42/merge`
    pub source_branch: Option<String>,
    /// Raw `pr.number` value from the trigger info
    pub trigger_pr_number: Option<String>,
}

/// One log container of a build.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRef {
    pub id: u64,
    pub line_count: Option<u64>,
}

/// Half-open window of log lines to fetch, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: u32,
    pub count: u32,
}

/// Filters for the completed-build listing.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildQuery {
    /// Only builds finished at or after this instant
    pub min_finish_time: DateTime<Utc>,
    /// Maximum number of builds, most recent first
    pub top: u32,
    /// Restrict to a source ref (merge-ref matching)
    pub branch_name: Option<String>,
}

/// An active pull request, as listed for a source branch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub id: u64,
    pub title: String,
    pub created_by: String,
    pub source_branch: String,
    pub target_branch: String,
    pub status: String,
    pub created_date: Option<DateTime<Utc>>,
}

/// A single comment from a pull request discussion thread.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestComment {
    pub id: u64,
    pub content: String,
    pub author: String,
    pub created_date: Option<DateTime<Utc>>,
    /// "markdown" or "text"
    pub comment_type: String,
}

/// Title and branches of a pull request. Branch names carry no
/// `refs/heads/` prefix.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestMetadata {
    pub id: u64,
    pub title: String,
    pub source_branch: Option<String>,
    pub target_branch: Option<String>,
}

/// One changed file in a pull request iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    /// Repository-relative path
    pub path: String,
    /// e.g. "edit", "add", "delete"
    pub change_type: String,
}

/// Strip the `refs/heads/` namespace from a ref name.
pub fn short_branch_name(ref_name: &str) -> &str {
    ref_name.strip_prefix("refs/heads/").unwrap_or(ref_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_branch_name() {
        assert_eq!(short_branch_name("refs/heads/feature/x"), "feature/x");
        assert_eq!(short_branch_name("main"), "main");
        assert_eq!(short_branch_name("refs/pull/4/merge"), "refs/pull/4/merge");
    }

    #[test]
    fn test_metadata_serializes_camel_case_with_null_branches() {
        let metadata = PullRequestMetadata {
            id: 7,
            title: "Fix".to_string(),
            source_branch: None,
            target_branch: Some("main".to_string()),
        };
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["sourceBranch"], serde_json::Value::Null);
        assert_eq!(json["targetBranch"], "main");
    }
}
