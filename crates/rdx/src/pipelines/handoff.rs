// ai
//! 📨 Handoff: the note stage 1 leaves on the fridge for stage 2.
//!
//! The scheduler only carries one string between tasks. We still give that
//! string a shape: the artifact path plus the run it came from, how many rows
//! it holds, and whether stage 1 actually finished writing it.
//!
//! 🧠 Knowledge graph:
//! - Written by `etl_stage` (Succeeded) or by the CLI when stage 1 blew up (Failed)
//! - Read by `upload_stage`, which refuses Failed and squints at Unverified
//! - A bare path string from an older scheduler becomes `Unverified`
//! - `Display` is the bare artifact path, which is what the scheduler passes along

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::errors::PipelineError;

/// 🚦 How stage 1 ended, as far as stage 2 is allowed to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    /// ✅ The artifact was fully written.
    Succeeded,
    /// 💀 Stage 1 errored. Whatever is at `artifact_path` is not to be trusted.
    Failed,
    /// 🤷 Nobody said. We only have a path.
    Unverified,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageStatus::Succeeded => write!(f, "succeeded"),
            StageStatus::Failed => write!(f, "failed"),
            StageStatus::Unverified => write!(f, "unverified"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Handoff {
    pub run_id: Uuid,
    pub file_name: String,
    pub artifact_path: PathBuf,
    pub row_count: usize,
    pub status: StageStatus,
}

impl Handoff {
    pub fn succeeded(
        run_id: Uuid,
        file_name: impl Into<String>,
        artifact_path: impl Into<PathBuf>,
        row_count: usize,
    ) -> Self {
        Self {
            run_id,
            file_name: file_name.into(),
            artifact_path: artifact_path.into(),
            row_count,
            status: StageStatus::Succeeded,
        }
    }

    pub fn failed(
        run_id: Uuid,
        file_name: impl Into<String>,
        artifact_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            run_id,
            file_name: file_name.into(),
            artifact_path: artifact_path.into(),
            row_count: 0,
            status: StageStatus::Failed,
        }
    }

    /// 🤷 Wrap a bare path from a scheduler that only passes strings around.
    pub fn from_artifact_path(artifact_path: impl Into<PathBuf>) -> Self {
        let artifact_path = artifact_path.into();
        let file_name = artifact_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            run_id: Uuid::new_v4(),
            file_name,
            artifact_path,
            row_count: 0,
            status: StageStatus::Unverified,
        }
    }

    /// 🏷️ The remote object name: the last component of the artifact path.
    pub fn remote_name(&self) -> Option<&str> {
        self.artifact_path.file_name().and_then(|name| name.to_str())
    }

    /// 📁 `<output_path>/<file_name>.handoff.json`, next to the artifact.
    pub fn default_path(output_path: &Path, file_name: &str) -> PathBuf {
        output_path.join(format!("{file_name}.handoff.json"))
    }

    pub async fn write_to(&self, path: &Path) -> Result<(), PipelineError> {
        let the_json = serde_json::to_vec_pretty(self).map_err(|err| PipelineError::Handoff {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| PipelineError::Handoff {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                })?;
        }
        tokio::fs::write(path, the_json)
            .await
            .map_err(|err| PipelineError::Handoff {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })?;
        debug!(
            "📨 hand-off for run {} ({}) written to {}",
            self.run_id,
            self.status,
            path.display()
        );
        Ok(())
    }

    /// 📬 Read a hand-off. JSON if it parses as one, otherwise the file content
    /// is taken as a bare artifact path and the hand-off is `Unverified`.
    pub async fn read_from(path: &Path) -> Result<Self, PipelineError> {
        let the_contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|err| PipelineError::Handoff {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                })?;
        Self::parse(&the_contents).map_err(|reason| PipelineError::Handoff {
            path: path.to_path_buf(),
            reason,
        })
    }

    fn parse(contents: &str) -> Result<Self, String> {
        let trimmed = contents.trim();
        if trimmed.is_empty() {
            return Err("the hand-off is empty".to_string());
        }
        if trimmed.starts_with('{') {
            return serde_json::from_str(trimmed).map_err(|err| err.to_string());
        }
        Ok(Self::from_artifact_path(trimmed))
    }
}

impl fmt::Display for Handoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.artifact_path.display())
    }
}
