// ai
//! 🪣 Upload stage: connect, ensure the bucket, put the artifact under `raw/`.
//!
//! Store trouble does not end the process. Every failure here is logged where
//! it is observed and turned into an [`UploadOutcome`]; what to do about a
//! non-uploaded outcome is the caller's call (see `runtime.strict_upload`).
//!
//! The one thing this stage refuses outright is a hand-off that stage 1 marked
//! as failed.

use std::fmt;

use tracing::{error, info, warn};

use crate::app_config::AppConfig;
use crate::backends::s3::S3Store;
use crate::backends::{BucketState, ObjectStore, StoreBackend};
use crate::errors::{PipelineError, StoreError};
use crate::pipelines::handoff::{Handoff, StageStatus};

/// 🧭 Which step of the upload gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStep {
    Connect,
    PutObject,
}

impl fmt::Display for UploadStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadStep::Connect => write!(f, "connect"),
            UploadStep::PutObject => write!(f, "put_object"),
        }
    }
}

/// 📬 How the upload went.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// ✅ The object is in the bucket. `bucket_state` is `None` when the bucket
    /// check failed but the put went through anyway.
    Uploaded {
        bucket: String,
        key: String,
        bucket_state: Option<BucketState>,
    },
    /// 🔍 The artifact was gone by the time we got there. Nothing was uploaded.
    ArtifactMissing { path: std::path::PathBuf },
    /// 💀 Logged already. Here for the report and the exit code.
    Failed { step: UploadStep, reason: String },
}

impl UploadOutcome {
    pub fn is_uploaded(&self) -> bool {
        matches!(self, UploadOutcome::Uploaded { .. })
    }
}

impl fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadOutcome::Uploaded { bucket, key, .. } => write!(f, "uploaded to {bucket}/{key}"),
            UploadOutcome::ArtifactMissing { path } => {
                write!(f, "the file was not found: {}", path.display())
            }
            UploadOutcome::Failed { step, reason } => write!(f, "{step} failed: {reason}"),
        }
    }
}

/// 🚀 Stage 2 against the configured S3 endpoint.
pub async fn upload_stage(
    config: &AppConfig,
    handoff: &Handoff,
) -> Result<UploadOutcome, PipelineError> {
    // -- no point opening a connection for an upload we are about to refuse
    refuse_failed(handoff)?;

    let the_store = match S3Store::connect(&config.storage).await {
        Ok(store) => StoreBackend::S3(store),
        Err(err) => {
            error!("💀 {err}");
            return Ok(UploadOutcome::Failed {
                step: UploadStep::Connect,
                reason: err.to_string(),
            });
        }
    };

    upload_with(&the_store, &config.storage.bucket, handoff).await
}

/// 🔄 The stage body with the store handed in.
pub async fn upload_with(
    store: &impl ObjectStore,
    bucket: &str,
    handoff: &Handoff,
) -> Result<UploadOutcome, PipelineError> {
    check_handoff(handoff)?;

    let the_remote_name = handoff
        .remote_name()
        .ok_or_else(|| PipelineError::Handoff {
            path: handoff.artifact_path.clone(),
            reason: "the artifact path has no file name to upload under".to_string(),
        })?
        .to_string();

    // -- a failed bucket check is not the end: the credentials may only be allowed to PUT
    let the_bucket_state = match store.ensure_bucket(bucket).await {
        Ok(state) => Some(state),
        Err(err) => {
            error!("💀 {err}");
            None
        }
    };

    match store
        .put_object(&handoff.artifact_path, bucket, &the_remote_name)
        .await
    {
        Ok(key) => {
            info!("✅ Run {}: artifact uploaded to {bucket}/{key}", handoff.run_id);
            Ok(UploadOutcome::Uploaded {
                bucket: bucket.to_string(),
                key,
                bucket_state: the_bucket_state,
            })
        }
        Err(StoreError::NotFound { path }) => {
            warn!("⚠️ The file was not found: {}", path.display());
            Ok(UploadOutcome::ArtifactMissing { path })
        }
        Err(err) => {
            error!("💀 {err}");
            Ok(UploadOutcome::Failed {
                step: UploadStep::PutObject,
                reason: err.to_string(),
            })
        }
    }
}

fn refuse_failed(handoff: &Handoff) -> Result<(), PipelineError> {
    if handoff.status == StageStatus::Failed {
        return Err(PipelineError::UpstreamIncomplete {
            run_id: handoff.run_id.to_string(),
            artifact_path: handoff.artifact_path.clone(),
        });
    }
    Ok(())
}

fn check_handoff(handoff: &Handoff) -> Result<(), PipelineError> {
    refuse_failed(handoff)?;
    if handoff.status == StageStatus::Unverified {
        warn!(
            "⚠️ No stage status came with '{}', uploading it on trust",
            handoff.artifact_path.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::in_mem::InMemoryStore;
    use uuid::Uuid;

    fn an_artifact(dir: &tempfile::TempDir) -> anyhow::Result<Handoff> {
        let the_path = dir.path().join("reddit_20240117.csv");
        std::fs::write(&the_path, "id,title\np1,hi\n")?;
        Ok(Handoff::succeeded(Uuid::new_v4(), "reddit_20240117", the_path, 1))
    }

    #[tokio::test]
    async fn the_one_where_the_first_upload_builds_the_bucket() -> anyhow::Result<()> {
        let the_dir = tempfile::tempdir()?;
        let the_note = an_artifact(&the_dir)?;
        let the_store = InMemoryStore::new();

        let the_outcome = upload_with(&the_store, "lake", &the_note).await?;

        assert_eq!(
            the_outcome,
            UploadOutcome::Uploaded {
                bucket: "lake".to_string(),
                key: "raw/reddit_20240117.csv".to_string(),
                bucket_state: Some(BucketState::Created),
            }
        );
        assert_eq!(
            the_store.object("lake", "raw/reddit_20240117.csv").await,
            Some(b"id,title\np1,hi\n".to_vec())
        );
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_same_day_overwrites_the_same_key() -> anyhow::Result<()> {
        let the_dir = tempfile::tempdir()?;
        let the_note = an_artifact(&the_dir)?;
        let the_store = InMemoryStore::with_bucket("lake");

        upload_with(&the_store, "lake", &the_note).await?;
        std::fs::write(&the_note.artifact_path, "id,title\np2,again\n")?;
        let the_outcome = upload_with(&the_store, "lake", &the_note).await?;

        assert!(matches!(
            the_outcome,
            UploadOutcome::Uploaded { bucket_state: Some(BucketState::AlreadyExists), .. }
        ));
        assert_eq!(the_store.object_count().await, 1);
        assert_eq!(
            the_store.object("lake", "raw/reddit_20240117.csv").await,
            Some(b"id,title\np2,again\n".to_vec())
        );
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_artifact_vanished_before_upload() -> anyhow::Result<()> {
        let the_dir = tempfile::tempdir()?;
        let the_note = Handoff::succeeded(
            Uuid::new_v4(),
            "gone",
            the_dir.path().join("gone.csv"),
            3,
        );
        let the_store = InMemoryStore::new();

        let the_outcome = upload_with(&the_store, "lake", &the_note).await?;

        assert!(matches!(the_outcome, UploadOutcome::ArtifactMissing { .. }));
        assert!(!the_outcome.is_uploaded());
        assert_eq!(the_store.object_count().await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_failed_extract_is_not_uploaded() -> anyhow::Result<()> {
        let the_dir = tempfile::tempdir()?;
        let mut the_note = an_artifact(&the_dir)?;
        the_note.status = StageStatus::Failed;
        let the_store = InMemoryStore::new();

        let the_verdict = upload_with(&the_store, "lake", &the_note).await;

        assert!(matches!(the_verdict, Err(PipelineError::UpstreamIncomplete { .. })));
        assert_eq!(the_store.object_count().await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_bucket_check_is_forbidden_but_the_put_is_not() -> anyhow::Result<()>
    {
        let the_dir = tempfile::tempdir()?;
        let the_note = an_artifact(&the_dir)?;
        let the_store = InMemoryStore::with_bucket("lake").deny_bucket_checks();

        let the_outcome = upload_with(&the_store, "lake", &the_note).await?;

        assert!(matches!(
            the_outcome,
            UploadOutcome::Uploaded { bucket_state: None, .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_no_bucket_means_no_upload_and_no_panic() -> anyhow::Result<()> {
        let the_dir = tempfile::tempdir()?;
        let the_note = an_artifact(&the_dir)?;
        let the_store = InMemoryStore::new().deny_bucket_checks();

        let the_outcome = upload_with(&the_store, "lake", &the_note).await?;

        assert!(matches!(
            the_outcome,
            UploadOutcome::Failed { step: UploadStep::PutObject, .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_bare_path_is_uploaded_on_trust() -> anyhow::Result<()> {
        let the_dir = tempfile::tempdir()?;
        let the_path = an_artifact(&the_dir)?.artifact_path;
        let the_store = InMemoryStore::new();

        let the_outcome =
            upload_with(&the_store, "lake", &Handoff::from_artifact_path(the_path)).await?;
        assert!(the_outcome.is_uploaded());
        Ok(())
    }
}
