//! In-memory source for exercising the build and change pipelines.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use super::{
    AdoError, BuildQuery, BuildRef, BuildSource, FileChange, LineRange, LogRef, PullRequest,
    PullRequestComment, PullRequestMetadata, PullRequestSource,
};

#[derive(Default)]
pub struct FakeAdo {
    pub builds: Vec<BuildRef>,
    /// build id -> log ids in container order
    pub logs: HashMap<u64, Vec<u64>>,
    /// (build id, log id) -> lines
    pub lines: HashMap<(u64, u64), Vec<String>>,
    pub pull_requests: Vec<PullRequest>,
    pub comments: Vec<PullRequestComment>,
    pub metadata: Option<PullRequestMetadata>,
    pub iterations: Vec<u64>,
    /// iteration id -> changes
    pub changes: HashMap<u64, Vec<FileChange>>,
    /// Make the build listing fail
    pub fail_builds: bool,
    /// (build id, log id) whose line fetch fails
    pub fail_log: Option<(u64, u64)>,
    pub queries: Mutex<Vec<BuildQuery>>,
    pub log_list_calls: Mutex<Vec<u64>>,
    pub line_calls: Mutex<Vec<(u64, u64, LineRange)>>,
    pub change_calls: Mutex<Vec<u64>>,
}

pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
}

pub fn pr_build(id: u64, pr: &str, finished: DateTime<Utc>) -> BuildRef {
    BuildRef {
        id,
        status: Some("completed".to_string()),
        reason: Some("pullRequest".to_string()),
        finish_time: Some(finished),
        source_branch: Some(format!("refs/pull/{pr}/merge")),
        trigger_pr_number: Some(pr.to_string()),
    }
}

pub fn lines(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|l| l.to_string()).collect()
}

impl FakeAdo {
    pub fn with_log(mut self, build: u64, log: u64, raw: &[&str]) -> Self {
        self.logs.entry(build).or_default().push(log);
        self.lines.insert((build, log), lines(raw));
        self
    }

    fn unavailable() -> AdoError {
        AdoError::Status {
            status: 503,
            path: "/fake".to_string(),
        }
    }
}

#[async_trait]
impl BuildSource for FakeAdo {
    async fn list_completed_builds(&self, query: &BuildQuery) -> Result<Vec<BuildRef>, AdoError> {
        self.queries.lock().unwrap().push(query.clone());
        if self.fail_builds {
            return Err(Self::unavailable());
        }
        Ok(self.builds.clone())
    }

    async fn list_build_logs(&self, build_id: u64) -> Result<Vec<LogRef>, AdoError> {
        self.log_list_calls.lock().unwrap().push(build_id);
        Ok(self
            .logs
            .get(&build_id)
            .into_iter()
            .flatten()
            .map(|&id| LogRef {
                id,
                line_count: None,
            })
            .collect())
    }

    async fn get_build_log_lines(
        &self,
        build_id: u64,
        log_id: u64,
        range: LineRange,
    ) -> Result<Vec<String>, AdoError> {
        self.line_calls.lock().unwrap().push((build_id, log_id, range));
        if self.fail_log == Some((build_id, log_id)) {
            return Err(Self::unavailable());
        }
        Ok(self
            .lines
            .get(&(build_id, log_id))
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl PullRequestSource for FakeAdo {
    async fn list_pull_requests(
        &self,
        _repository: &str,
        branch: &str,
    ) -> Result<Vec<PullRequest>, AdoError> {
        Ok(self
            .pull_requests
            .iter()
            .filter(|pr| pr.source_branch == branch)
            .cloned()
            .collect())
    }

    async fn list_comments(
        &self,
        _repository: &str,
        _pull_request_id: u64,
    ) -> Result<Vec<PullRequestComment>, AdoError> {
        Ok(self.comments.clone())
    }

    async fn get_pull_request(
        &self,
        _repository: &str,
        _pull_request_id: u64,
    ) -> Result<PullRequestMetadata, AdoError> {
        self.metadata.clone().ok_or_else(Self::unavailable)
    }

    async fn list_iterations(
        &self,
        _repository: &str,
        _pull_request_id: u64,
    ) -> Result<Vec<u64>, AdoError> {
        Ok(self.iterations.clone())
    }

    async fn get_iteration_changes(
        &self,
        _repository: &str,
        _pull_request_id: u64,
        iteration_id: u64,
    ) -> Result<Vec<FileChange>, AdoError> {
        self.change_calls.lock().unwrap().push(iteration_id);
        Ok(self.changes.get(&iteration_id).cloned().unwrap_or_default())
    }
}
