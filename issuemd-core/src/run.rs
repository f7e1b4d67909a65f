//! One sync run: fetch, render, write, advance the checkpoint
//!
//! Issues are handled strictly one after another in the order the source
//! returned them. The first failure stops the run; documents written before
//! it stay on disk and the checkpoint only covers issues that made it.

use tracing::{debug, error, info};

use crate::config::{RenderConfig, RunConfig};
use crate::datetime::Timestamp;
use crate::github::{CommentSource, IssueQuery, IssueSource, RepoInfo};
use crate::record::IssueRecord;
use crate::render;
use crate::store::DocumentStore;
use crate::template;
use crate::Result;

/// High-water mark of issue activity; never moves backward
#[derive(Debug, Clone, Copy, Default)]
pub struct Checkpoint {
    latest: Option<Timestamp>,
}

impl Checkpoint {
    pub fn new(start: Option<Timestamp>) -> Self {
        Checkpoint { latest: start }
    }

    /// Move forward to `candidate` if it is valid and later than the current
    /// mark. An invalid current mark counts as unknown and is replaced.
    pub fn advance(&mut self, candidate: Timestamp) -> bool {
        if !candidate.is_valid() {
            return false;
        }

        let replace = match self.latest {
            Some(current) if current.is_valid() => current < candidate,
            _ => true,
        };
        if replace {
            self.latest = Some(candidate);
        }
        replace
    }

    pub fn latest(&self) -> Option<Timestamp> {
        self.latest
    }
}

/// Outcome of a run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub files_count: usize,
    pub last_timestamp: Option<Timestamp>,
    pub is_success: bool,
}

impl RunSummary {
    /// Timestamp worth writing back: only after at least one document and
    /// only when it is a real point in time.
    pub fn checkpoint_to_persist(&self) -> Option<Timestamp> {
        if self.files_count == 0 {
            return None;
        }
        self.last_timestamp.filter(Timestamp::is_valid)
    }
}

/// Collaborators a run talks to
pub struct RunSources<'a> {
    pub issues: &'a dyn IssueSource,
    pub comments: &'a dyn CommentSource,
    pub store: &'a dyn DocumentStore,
}

struct Progress {
    files_count: usize,
    checkpoint: Checkpoint,
}

/// Fetch, render and store every changed issue.
///
/// Configuration problems are returned as errors before anything is fetched;
/// everything after that is folded into the summary.
pub async fn generate_documents(config: &RunConfig, sources: RunSources<'_>) -> Result<RunSummary> {
    let repo = RepoInfo::from_url(config.source_repository()?)?;
    let last_timestamp = config.last_timestamp();

    let query = IssueQuery {
        repo,
        max_issues: config.max_issues_per_run(),
        since: last_timestamp.filter(Timestamp::is_valid),
    };
    let render_config = config.render_config();
    let file_name_template = config.file_name_template();

    let mut progress = Progress {
        files_count: 0,
        checkpoint: Checkpoint::new(last_timestamp),
    };

    let outcome = render_all(
        &query,
        &sources,
        &render_config,
        &file_name_template,
        &mut progress,
    )
    .await;

    if let Err(err) = &outcome {
        error!("{}", err);
    }

    Ok(RunSummary {
        files_count: progress.files_count,
        last_timestamp: progress.checkpoint.latest(),
        is_success: outcome.is_ok(),
    })
}

async fn render_all(
    query: &IssueQuery,
    sources: &RunSources<'_>,
    render_config: &RenderConfig,
    file_name_template: &str,
    progress: &mut Progress,
) -> Result<()> {
    let issues = sources.issues.fetch_issues(query).await?;
    info!("Rendering {} issues from {}", issues.len(), query.repo);

    for issue in issues.iter().filter(|issue| !issue.is_pull_request()) {
        write_issue(issue, sources, render_config, file_name_template).await?;

        progress.files_count += 1;
        if progress.checkpoint.advance(issue.activity_time()) {
            debug!("Checkpoint advanced to {}", issue.activity_time());
        }
    }

    Ok(())
}

async fn write_issue(
    issue: &IssueRecord,
    sources: &RunSources<'_>,
    render_config: &RenderConfig,
    file_name_template: &str,
) -> Result<()> {
    let comments = sources.comments.fetch_comments(issue).await?;
    let file_name = template::resolve(file_name_template, issue, render_config);
    let document = render::render(issue, &comments, render_config);

    let path = sources.store.write(&file_name, &document).await?;
    debug!("Issue #{} -> {}", issue.number, path.display());
    Ok(())
}
