// ai
//! 🎼 Pipelines: the orchestrator. Two stages, one dependency edge.
//!
//! ```text
//!   stage 1: etl_stage                                 stage 2: upload_stage
//!  ┌──────────────────────────────────┐   Handoff   ┌───────────────────────────────┐
//!  │ Reddit ─▶ normalize ─▶ CsvSink   │────────────▶│ connect ─▶ ensure ─▶ put raw/ │
//!  └──────────────────────────────────┘  (path +    └───────────────────────────────┘
//!                                          run id +
//!                                          status)
//! ```
//!
//! Each stage is also callable on its own, which is how an external scheduler
//! drives it: `extract` today at midnight, `upload` right after, the hand-off
//! file in between. `run_pipeline` does both in one process for everyone else.
//!
//! Strictly sequential. No parallelism across posts or runs; the date in the
//! file name is what keeps two runs out of each other's way.

mod etl_stage;
mod handoff;
mod upload_stage;

use std::path::Path;
use std::time::Instant;

use tracing::{error, warn};

pub use etl_stage::{EtlRequest, etl_stage, extract_transform_load};
pub use handoff::{Handoff, StageStatus};
pub use upload_stage::{UploadOutcome, UploadStep, upload_stage, upload_with};

use crate::app_config::AppConfig;
use crate::backends::reddit::RedditSession;
use crate::backends::s3::S3Store;
use crate::backends::{SourceBackend, StoreBackend};
use crate::errors::{PipelineError, StoreError};
use crate::report::RunReport;

/// 🚀 Stage 1, then stage 2, in one process. Stage 2 only starts if stage 1
/// returned a hand-off; a stage 1 error leaves a `Failed` hand-off on disk so
/// a later `upload` refuses to ship a half-written file.
pub async fn run_pipeline(
    config: &AppConfig,
    request: &EtlRequest,
) -> Result<RunReport, PipelineError> {
    let the_start = Instant::now();

    let the_source = match RedditSession::connect(&config.reddit).await {
        Ok(session) => SourceBackend::Reddit(session.top(
            &request.subreddit,
            request.time_filter,
            request.limit,
        )),
        Err(err) => {
            let the_handoff_path = Handoff::default_path(&config.output_path, &request.file_name);
            record_failed_extract(&the_handoff_path, request, &config.output_path).await;
            return Err(err.into());
        }
    };
    // -- builds a client only, nothing goes over the wire before stage 1 is done
    let the_store = S3Store::connect(&config.storage).await.map(StoreBackend::S3);

    run_stages(
        the_source,
        the_store,
        &config.storage.bucket,
        &config.output_path,
        request,
        config.runtime.show_progress,
        the_start,
    )
    .await
}

/// 🔄 The body of a run once both backends exist. A store that failed to
/// connect is reported as `UploadOutcome::Failed` after stage 1, never before.
async fn run_stages(
    source: SourceBackend,
    store: Result<StoreBackend, StoreError>,
    bucket: &str,
    output_path: &Path,
    request: &EtlRequest,
    show_progress: bool,
    started: Instant,
) -> Result<RunReport, PipelineError> {
    let the_handoff_path = Handoff::default_path(output_path, &request.file_name);

    let the_handoff =
        match extract_transform_load(source, output_path, request, show_progress).await {
            Ok(handoff) => handoff,
            Err(err) => {
                record_failed_extract(&the_handoff_path, request, output_path).await;
                return Err(err);
            }
        };
    the_handoff.write_to(&the_handoff_path).await?;

    let the_outcome = match store {
        Ok(store) => upload_with(&store, bucket, &the_handoff).await?,
        Err(err) => {
            error!("💀 {err}");
            UploadOutcome::Failed {
                step: UploadStep::Connect,
                reason: err.to_string(),
            }
        }
    };
    Ok(RunReport {
        handoff: the_handoff,
        outcome: the_outcome,
        elapsed: started.elapsed(),
    })
}

/// 💀 Leave a `Failed` hand-off behind. Best effort: the extract error is the
/// one the caller needs to see, so a failure here is only logged.
pub async fn record_failed_extract(handoff_path: &Path, request: &EtlRequest, output_path: &Path) {
    let the_note = Handoff::failed(
        request.run_id,
        request.file_name.clone(),
        request.artifact_path(output_path),
    );
    if let Err(err) = the_note.write_to(handoff_path).await {
        warn!("⚠️ Could not record the failed extract: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::{JobConfig, RuntimeConfig};
    use crate::backends::in_mem::{InMemorySource, InMemoryStore};
    use crate::backends::{BucketState, RedditConfig, StorageConfig};
    use crate::common::{RawPost, TimeFilter};
    use crate::errors::SourceError;
    use serde_json::json;
    use uuid::Uuid;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> EtlRequest {
        EtlRequest {
            run_id: Uuid::new_v4(),
            file_name: "reddit_20240117".to_string(),
            subreddit: "dataengineering".to_string(),
            time_filter: TimeFilter::Day,
            limit: None,
        }
    }

    fn the_ab_batch() -> anyhow::Result<Vec<RawPost>> {
        Ok(vec![
            serde_json::from_value(json!({
                "id": "a", "title": "A", "over_18": 0, "edited": false, "author": "u1",
                "score": "5", "num_comments": "2", "created_utc": 1700000000
            }))?,
            serde_json::from_value(json!({
                "id": "b", "title": "B", "over_18": 1, "edited": 1700000100, "author": null,
                "score": "9", "num_comments": "0", "created_utc": 1700000050
            }))?,
        ])
    }

    #[tokio::test]
    async fn the_one_where_the_whole_night_goes_to_plan() -> anyhow::Result<()> {
        let the_dir = tempfile::tempdir()?;
        let the_store = InMemoryStore::new();
        let the_request = request();

        let the_report = run_stages(
            SourceBackend::InMemory(InMemorySource::new(vec![the_ab_batch()?])),
            Ok(StoreBackend::InMemory(the_store.clone())),
            "lake",
            the_dir.path(),
            &the_request,
            false,
            Instant::now(),
        )
        .await?;

        assert_eq!(the_report.handoff.status, StageStatus::Succeeded);
        assert_eq!(the_report.handoff.row_count, 2);
        assert!(matches!(
            the_report.outcome,
            UploadOutcome::Uploaded { bucket_state: Some(BucketState::Created), .. }
        ));

        let the_bytes = the_store
            .object("lake", "raw/reddit_20240117.csv")
            .await
            .unwrap_or_default();
        let the_csv = String::from_utf8(the_bytes)?;
        let the_lines: Vec<&str> = the_csv.lines().collect();
        assert_eq!(
            the_lines[0],
            "id,title,score,num_comments,author,created_utc,url,over_18,edited,spoiler,stickied"
        );
        assert_eq!(the_lines[2], "b,B,9,0,None,2023-11-14 22:14:10,None,true,false,false,false");

        let the_note =
            Handoff::read_from(&Handoff::default_path(the_dir.path(), "reddit_20240117")).await?;
        assert_eq!(the_note, the_report.handoff);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_broken_extract_never_reaches_the_bucket() -> anyhow::Result<()> {
        let the_dir = tempfile::tempdir()?;
        let the_store = InMemoryStore::new();
        let the_request = request();

        let the_verdict = run_stages(
            SourceBackend::InMemory(InMemorySource::failing_after(
                vec![the_ab_batch()?],
                SourceError::Status {
                    status: 500,
                    url: "mem://top".to_string(),
                    body: String::new(),
                },
            )),
            Ok(StoreBackend::InMemory(the_store.clone())),
            "lake",
            the_dir.path(),
            &the_request,
            false,
            Instant::now(),
        )
        .await;

        assert!(matches!(the_verdict, Err(PipelineError::Source(_))));
        assert_eq!(the_store.object_count().await, 0);

        // -- the note on the fridge says "failed", and stage 2 believes it
        let the_note =
            Handoff::read_from(&Handoff::default_path(the_dir.path(), "reddit_20240117")).await?;
        assert_eq!(the_note.status, StageStatus::Failed);
        assert_eq!(the_note.run_id, the_request.run_id);
        assert!(matches!(
            upload_with(&the_store, "lake", &the_note).await,
            Err(PipelineError::UpstreamIncomplete { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_bucket_is_unreachable_but_the_csv_still_lands() -> anyhow::Result<()>
    {
        let the_dir = tempfile::tempdir()?;
        let the_request = request();

        let the_report = run_stages(
            SourceBackend::InMemory(InMemorySource::new(vec![the_ab_batch()?])),
            Err(StoreError::Connect("no keys, no bucket".to_string())),
            "lake",
            the_dir.path(),
            &the_request,
            false,
            Instant::now(),
        )
        .await?;

        assert!(matches!(
            the_report.outcome,
            UploadOutcome::Failed { step: UploadStep::Connect, .. }
        ));
        assert!(the_request.artifact_path(the_dir.path()).is_file());
        let the_note =
            Handoff::read_from(&Handoff::default_path(the_dir.path(), "reddit_20240117")).await?;
        assert_eq!(the_note.status, StageStatus::Succeeded);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_reddit_says_no_and_the_fridge_note_says_failed() -> anyhow::Result<()> {
        let the_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&the_server)
            .await;
        // -- stage 2 must never start: not one request reaches the store
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&the_server)
            .await;

        let the_dir = tempfile::tempdir()?;
        let the_config = AppConfig {
            reddit: RedditConfig {
                client_id: "the-id".to_string(),
                client_secret: "the-wrong-secret".to_string(),
                user_agent: "rdx-test".to_string(),
                auth_url: the_server.uri(),
                api_url: the_server.uri(),
                page_size: 100,
            },
            storage: StorageConfig {
                bucket: "lake".to_string(),
                access_key_id: Some("AKIATEST".to_string()),
                secret_access_key: Some("secret".to_string()),
                region: "us-east-1".to_string(),
                endpoint: Some(the_server.uri()),
                path_style: true,
            },
            output_path: the_dir.path().to_path_buf(),
            job: JobConfig::default(),
            runtime: RuntimeConfig {
                strict_upload: false,
                show_progress: false,
            },
        };
        let the_request = request();

        let the_verdict = run_pipeline(&the_config, &the_request).await;

        assert!(matches!(the_verdict, Err(PipelineError::Authentication(_))));
        let the_note =
            Handoff::read_from(&Handoff::default_path(the_dir.path(), "reddit_20240117")).await?;
        assert_eq!(the_note.status, StageStatus::Failed);
        assert_eq!(the_note.run_id, the_request.run_id);
        Ok(())
    }
}
