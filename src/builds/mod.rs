pub mod extract;
pub mod types;

pub use extract::extract_errors;
pub use types::{BuildErrorFinding, BuildMatch};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, instrument};

use crate::ado::{AdoError, BuildQuery, BuildRef, BuildSource, LineRange};

/// How far back to look for a pull request's builds.
pub const LOOKBACK_DAYS: i64 = 30;
/// Most recent candidate builds considered.
pub const MAX_CANDIDATE_BUILDS: u32 = 100;
/// Lines fetched from each log container, starting at line 0.
pub const LOG_LINE_WINDOW: LineRange = LineRange {
    start: 0,
    count: 1000,
};

/// Find the most recently finished completed build of a pull request.
///
/// Returns `Ok(None)` when nothing matches within the lookback window.
#[instrument(skip(source, now))]
pub async fn locate_build(
    source: &dyn BuildSource,
    pull_request_id: u64,
    strategy: BuildMatch,
    now: DateTime<Utc>,
) -> Result<Option<BuildRef>, AdoError> {
    let query = BuildQuery {
        min_finish_time: now - Duration::days(LOOKBACK_DAYS),
        top: MAX_CANDIDATE_BUILDS,
        branch_name: match strategy {
            BuildMatch::MergeRef => Some(types::merge_ref(pull_request_id)),
            BuildMatch::TriggerPrNumber => None,
        },
    };

    let candidates = source.list_completed_builds(&query).await?;
    debug!(candidates = candidates.len(), "listed completed builds");

    let selected = candidates
        .into_iter()
        .filter(is_completed_pull_request_build)
        .filter(|build| {
            build
                .finish_time
                .is_some_and(|finished| finished >= query.min_finish_time)
        })
        .filter(|build| strategy.matches(build, pull_request_id))
        .reduce(|best, build| {
            if build.finish_time > best.finish_time {
                build
            } else {
                best
            }
        });

    match &selected {
        Some(build) => debug!(build = build.id, "selected build"),
        None => debug!("no matching build"),
    }
    Ok(selected)
}

fn is_completed_pull_request_build(build: &BuildRef) -> bool {
    let completed = build
        .status
        .as_deref()
        .map_or(true, |status| status.eq_ignore_ascii_case("completed"));
    let from_pull_request = build
        .reason
        .as_deref()
        .map_or(true, |reason| reason.eq_ignore_ascii_case("pullRequest"));
    completed && from_pull_request
}

/// Collect error findings from every log of the pull request's build.
///
/// Findings keep build, then log container, then line order. Logs are
/// fetched one after another.
pub async fn collect_build_errors(
    source: &dyn BuildSource,
    pull_request_id: u64,
    strategy: BuildMatch,
) -> Result<Vec<BuildErrorFinding>, AdoError> {
    collect_build_errors_at(source, pull_request_id, strategy, Utc::now()).await
}

#[instrument(skip(source, now))]
async fn collect_build_errors_at(
    source: &dyn BuildSource,
    pull_request_id: u64,
    strategy: BuildMatch,
    now: DateTime<Utc>,
) -> Result<Vec<BuildErrorFinding>, AdoError> {
    let builds: Vec<BuildRef> = locate_build(source, pull_request_id, strategy, now)
        .await?
        .into_iter()
        .collect();

    let mut findings = Vec::new();
    for build in &builds {
        let logs = source.list_build_logs(build.id).await?;
        debug!(build = build.id, logs = logs.len(), "listed build logs");

        for log in &logs {
            let lines = source
                .get_build_log_lines(build.id, log.id, LOG_LINE_WINDOW)
                .await?;
            let found = extract_errors(&lines);
            debug!(
                build = build.id,
                log = log.id,
                line_count = ?log.line_count,
                fetched = lines.len(),
                errors = found.len(),
                "scanned log"
            );
            findings.extend(found);
        }
    }

    info!(builds = builds.len(), errors = findings.len(), "collected build errors");
    Ok(findings)
}
