use serde::{Deserialize, Serialize};

use crate::ado::BuildRef;

/// One error line pulled out of a build log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildErrorFinding {
    /// The raw log line that matched
    pub message: String,
    /// Lines immediately following the match that look like a stack trace,
    /// joined with '\n'. `None` when there were none.
    pub trace: Option<String>,
}

/// How a completed build is tied back to a pull request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildMatch {
    /// The trigger's `pr.number` parses to the pull request id
    #[default]
    TriggerPrNumber,
    /// The build ran on `refs/pull/{id}/merge`
    MergeRef,
}

impl BuildMatch {
    pub fn matches(self, build: &BuildRef, pull_request_id: u64) -> bool {
        match self {
            BuildMatch::TriggerPrNumber => build
                .trigger_pr_number
                .as_deref()
                .and_then(|n| n.trim().parse::<u64>().ok())
                == Some(pull_request_id),
            BuildMatch::MergeRef => {
                build.source_branch.as_deref() == Some(merge_ref(pull_request_id).as_str())
            }
        }
    }
}

/// The merge ref a pull request build runs on.
pub fn merge_ref(pull_request_id: u64) -> String {
    format!("refs/pull/{pull_request_id}/merge")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ado::fake::{at, pr_build};

    #[test]
    fn test_trigger_number_must_parse() {
        let mut build = pr_build(1, "42", at(1, 0));
        assert!(BuildMatch::TriggerPrNumber.matches(&build, 42));
        assert!(!BuildMatch::TriggerPrNumber.matches(&build, 4));

        build.trigger_pr_number = Some("forty-two".to_string());
        assert!(!BuildMatch::TriggerPrNumber.matches(&build, 42));

        build.trigger_pr_number = None;
        assert!(!BuildMatch::TriggerPrNumber.matches(&build, 42));
    }

    #[test]
    fn test_merge_ref_match() {
        let mut build = pr_build(1, "42", at(1, 0));
        build.trigger_pr_number = None;
        assert!(BuildMatch::MergeRef.matches(&build, 42));
        assert!(!BuildMatch::MergeRef.matches(&build, 420));
    }

    #[test]
    fn test_absent_trace_serializes_as_null() {
        let finding = BuildErrorFinding {
            message: "error CS1002".to_string(),
            trace: None,
        };
        assert_eq!(
            serde_json::to_string(&finding).unwrap(),
            r#"{"message":"error CS1002","trace":null}"#
        );
    }
}
