// ai
//! 🚰 ETL stage: Reddit in, CSV out, hand-off on the way out the door.
//!
//! Extract, transform, and load run as one logical stage: a page loop over the
//! source, one normalize pass over the whole batch (the `edited` vote needs
//! every row), one write to disk. The return value is the hand-off, tagged
//! `Succeeded` only after the file is fully written.

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

use crate::app_config::{AppConfig, JobConfig};
use crate::backends::file::CsvSink;
use crate::backends::reddit::RedditSession;
use crate::backends::{Source, SourceBackend};
use crate::common::{RawPost, TimeFilter};
use crate::errors::PipelineError;
use crate::pipelines::handoff::Handoff;
use crate::progress::FetchProgress;
use crate::transforms::normalize;

/// 📰 One run's worth of "what to fetch and what to call it".
#[derive(Debug, Clone, PartialEq)]
pub struct EtlRequest {
    pub run_id: Uuid,
    pub file_name: String,
    pub subreddit: String,
    pub time_filter: TimeFilter,
    pub limit: Option<NonZeroU32>,
}

impl EtlRequest {
    /// 🗓️ The scheduled job for a given run date: `<prefix>_<YYYYMMDD>`, fresh run id.
    pub fn from_job(job: &JobConfig, run_date: NaiveDate) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            file_name: job.file_name_for(run_date),
            subreddit: job.subreddit.clone(),
            time_filter: job.time_filter,
            limit: job.limit,
        }
    }

    /// 📁 `<output_path>/<file_name>.csv`
    pub fn artifact_path(&self, output_path: &Path) -> PathBuf {
        output_path.join(format!("{}.csv", self.file_name))
    }
}

/// 🚀 Stage 1 against the real Reddit API.
///
/// An authentication failure comes back as `PipelineError::Authentication`,
/// which is the caller's cue to stop the process.
pub async fn etl_stage(config: &AppConfig, request: &EtlRequest) -> Result<Handoff, PipelineError> {
    let the_session = RedditSession::connect(&config.reddit).await?;
    let the_source = SourceBackend::Reddit(the_session.top(
        &request.subreddit,
        request.time_filter,
        request.limit,
    ));
    extract_transform_load(
        the_source,
        &config.output_path,
        request,
        config.runtime.show_progress,
    )
    .await
}

/// 🔄 The stage body with the source handed in. `etl_stage` calls this with
/// Reddit, tests call it with an in-memory subreddit.
pub async fn extract_transform_load(
    mut source: impl Source,
    output_path: &Path,
    request: &EtlRequest,
    show_progress: bool,
) -> Result<Handoff, PipelineError> {
    info!(
        "🚀 Run {}: top of r/{} ({}), limit {}",
        request.run_id,
        request.subreddit,
        request.time_filter,
        request
            .limit
            .map_or_else(|| "none".to_string(), |limit| limit.to_string())
    );

    let the_limit = request.limit.map(|limit| limit.get() as usize);
    let mut the_progress = FetchProgress::new(
        format!("r/{}", request.subreddit),
        the_limit.map(|limit| limit as u64),
        show_progress,
    );

    let mut the_batch: Vec<RawPost> = Vec::new();
    while let Some(page) = source.next_page().await? {
        the_progress.update(page.len() as u64);
        the_batch.extend(page);
        if the_limit.is_some_and(|limit| the_batch.len() >= limit) {
            break;
        }
    }
    the_progress.finish();
    if let Some(limit) = the_limit {
        the_batch.truncate(limit);
    }
    debug!(
        "📦 extracted {} posts, kept {}",
        the_progress.total_posts(),
        the_batch.len()
    );

    let the_table = normalize(&the_batch);

    let the_artifact_path = request.artifact_path(output_path);
    CsvSink::new(&the_artifact_path).write(&the_table).await?;

    info!(
        "✅ Run {}: {} rows written to {}",
        request.run_id,
        the_table.len(),
        the_artifact_path.display()
    );
    Ok(Handoff::succeeded(
        request.run_id,
        request.file_name.clone(),
        the_artifact_path,
        the_table.len(),
    ))
}
