pub mod types;

pub use types::{ChangeAdvisory, PullRequestChangeInfo};

use tracing::{debug, instrument};

use crate::ado::{AdoError, FileChange, PullRequestMetadata, PullRequestSource};

pub const PERMISSION_NOTE: &str = "The repository is available as a local git working copy. \
The commands above are read-only hints for inspecting this pull request's changes; \
run them locally only as your own permission settings allow.";

/// Derive local git commands from a pull request's branches and files.
///
/// Branch comparisons are only suggested when both branches are known.
pub fn advise(metadata: &PullRequestMetadata, changes: &[FileChange]) -> ChangeAdvisory {
    let branches = metadata
        .source_branch
        .as_deref()
        .zip(metadata.target_branch.as_deref());

    let mut file_specific_commands = Vec::with_capacity(changes.len() * 2);
    for change in changes {
        file_specific_commands.push(format!("git diff HEAD -- {}", change.path));
        if let Some((source, target)) = branches {
            file_specific_commands.push(format!(
                "git diff {target}..{source} -- {}",
                change.path
            ));
        }
    }

    let branch_commands = match branches {
        Some((source, target)) => vec![
            format!("git diff {target}..{source}"),
            format!("git log {target}..{source} --oneline"),
            format!("git rev-list --left-right --count {target}...{source}"),
        ],
        None => Vec::new(),
    };

    let permission_note = (!file_specific_commands.is_empty() || !branch_commands.is_empty())
        .then(|| PERMISSION_NOTE.to_string());

    ChangeAdvisory {
        file_specific_commands,
        branch_commands,
        permission_note,
    }
}

/// Fetch a pull request with the files changed in its latest iteration,
/// plus suggested git commands.
///
/// A pull request without iterations yields no changes, an empty advisory
/// and metadata without branch names.
#[instrument(skip(source))]
pub async fn pull_request_changes(
    source: &dyn PullRequestSource,
    repository: &str,
    pull_request_id: u64,
) -> Result<PullRequestChangeInfo, AdoError> {
    let metadata = source.get_pull_request(repository, pull_request_id).await?;
    let iterations = source.list_iterations(repository, pull_request_id).await?;

    let Some(latest) = iterations.into_iter().max() else {
        debug!("pull request has no iterations");
        return Ok(PullRequestChangeInfo {
            pull_request: PullRequestMetadata {
                source_branch: None,
                target_branch: None,
                ..metadata
            },
            changes: Vec::new(),
            advisory: ChangeAdvisory::default(),
        });
    };

    let changes = source
        .get_iteration_changes(repository, pull_request_id, latest)
        .await?;
    debug!(iteration = latest, files = changes.len(), "fetched iteration changes");

    let advisory = advise(&metadata, &changes);
    Ok(PullRequestChangeInfo {
        pull_request: metadata,
        changes,
        advisory,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ado::fake::FakeAdo;
    use std::collections::HashMap;

    fn metadata(source: Option<&str>, target: Option<&str>) -> PullRequestMetadata {
        PullRequestMetadata {
            id: 42,
            title: "Add login".to_string(),
            source_branch: source.map(str::to_string),
            target_branch: target.map(str::to_string),
        }
    }

    fn change(path: &str) -> FileChange {
        FileChange {
            path: path.to_string(),
            change_type: "edit".to_string(),
        }
    }

    #[test]
    fn test_advise_with_both_branches() {
        let advisory = advise(&metadata(Some("feature/x"), Some("main")), &[change("a.txt")]);
        assert_eq!(
            advisory.file_specific_commands,
            vec!["git diff HEAD -- a.txt", "git diff main..feature/x -- a.txt"]
        );
        assert_eq!(
            advisory.branch_commands,
            vec![
                "git diff main..feature/x",
                "git log main..feature/x --oneline",
                "git rev-list --left-right --count main...feature/x",
            ]
        );
        assert_eq!(advisory.permission_note.as_deref(), Some(PERMISSION_NOTE));
    }

    #[test]
    fn test_advise_with_unknown_source_branch() {
        let advisory = advise(
            &metadata(None, Some("main")),
            &[change("src/lib.rs"), change("README.md")],
        );
        assert_eq!(
            advisory.file_specific_commands,
            vec!["git diff HEAD -- src/lib.rs", "git diff HEAD -- README.md"]
        );
        assert!(advisory.branch_commands.is_empty());
        assert!(advisory.permission_note.is_some());
    }

    #[test]
    fn test_advise_branch_commands_without_files() {
        let advisory = advise(&metadata(Some("docs/update"), Some("develop")), &[]);
        assert!(advisory.file_specific_commands.is_empty());
        assert_eq!(advisory.branch_commands.len(), 3);
        assert!(advisory.permission_note.is_some());
    }

    #[test]
    fn test_advise_nothing_to_suggest() {
        let advisory = advise(&metadata(None, None), &[]);
        assert_eq!(advisory, ChangeAdvisory::default());
    }

    #[tokio::test]
    async fn test_changes_use_latest_iteration() {
        let source = FakeAdo {
            metadata: Some(metadata(Some("feature/x"), Some("main"))),
            iterations: vec![1, 3, 2],
            changes: HashMap::from([(1, vec![change("old.rs")]), (3, vec![change("new.rs")])]),
            ..Default::default()
        };

        let info = pull_request_changes(&source, "frontend", 42).await.unwrap();

        assert_eq!(*source.change_calls.lock().unwrap(), vec![3]);
        assert_eq!(info.changes, vec![change("new.rs")]);
        assert_eq!(info.pull_request.source_branch.as_deref(), Some("feature/x"));
        assert_eq!(info.advisory.file_specific_commands.len(), 2);
    }

    #[tokio::test]
    async fn test_changes_without_iterations() {
        let source = FakeAdo {
            metadata: Some(metadata(Some("feature/x"), Some("main"))),
            ..Default::default()
        };

        let info = pull_request_changes(&source, "frontend", 42).await.unwrap();

        assert!(info.changes.is_empty());
        assert_eq!(info.advisory, ChangeAdvisory::default());
        assert_eq!(info.pull_request.title, "Add login");
        assert!(info.pull_request.source_branch.is_none());
        assert!(info.pull_request.target_branch.is_none());
        assert!(source.change_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_changes_propagate_source_errors() {
        let source = FakeAdo::default();
        assert!(pull_request_changes(&source, "frontend", 42).await.is_err());
    }
}
