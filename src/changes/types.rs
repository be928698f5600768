use serde::Serialize;

use crate::ado::{FileChange, PullRequestMetadata};

/// Local git commands a reviewer can run to see a pull request's diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeAdvisory {
    /// Per-file comparisons, in file order
    pub file_specific_commands: Vec<String>,
    /// Whole-branch diff, log and divergence summary
    pub branch_commands: Vec<String>,
    /// How the commands are meant to be used; set whenever any command is
    pub permission_note: Option<String>,
}

/// Everything `get_pull_request_changes` returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestChangeInfo {
    pub pull_request: PullRequestMetadata,
    pub changes: Vec<FileChange>,
    pub advisory: ChangeAdvisory,
}
