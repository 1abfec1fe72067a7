// ai
//! 💀 Errors: a taxonomy of everything that can go sideways between Reddit and S3.
//!
//! Each component speaks its own dialect of failure, and the orchestrator is the
//! interpreter who decides which ones end the run and which ones get logged and
//! shrugged at:
//!
//! - [`SourceError`]: the Reddit side. `Authentication` is the fatal one.
//! - [`SinkError`]: the disk side. Parent dirs that refuse to exist, etc.
//! - [`StoreError`]: the bucket side. `NotFound` is the polite one.
//! - [`PipelineError`]: what a stage hands back to its caller.
//!
//! 🦆 The duck has filed all of these under "expected".

use std::path::PathBuf;

use thiserror::Error;

/// 📡 Things the Reddit API can do to us.
#[derive(Debug, Error)]
pub enum SourceError {
    /// 🔒 The token endpoint said no. Nothing downstream can proceed without a session.
    #[error("💀 Reddit authentication failed: {0}")]
    Authentication(String),

    #[error("💀 Could not build a request URL from '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("💀 Request to Reddit never came back in one piece")]
    Request(#[from] reqwest::Error),

    #[error("💀 Reddit answered {status} for {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    #[error("💀 Reddit sent a listing we could not decode")]
    Decode(#[from] serde_json::Error),
}

/// 📄 Things the local filesystem can do to the artifact.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("💀 Could not create the artifact directory '{path}'")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("💀 Could not write the artifact '{path}'")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("💀 Could not read the artifact '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("💀 CSV encoding went wrong")]
    Csv(#[from] csv::Error),
}

/// 🪣 Things the object store can do to the upload.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 🔌 No usable handle. The gateway never got off the ground.
    #[error("💀 Could not connect to the object store: {0}")]
    Connect(String),

    #[error("💀 Could not ensure bucket '{bucket}': {reason}")]
    Bucket { bucket: String, reason: String },

    /// 🔍 The artifact vanished before upload. Recoverable by the caller.
    #[error("💀 The file was not found: '{path}'")]
    NotFound { path: PathBuf },

    #[error("💀 Could not read '{path}' for upload")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("💀 Upload of '{key}' failed: {reason}")]
    Transport { key: String, reason: String },
}

/// 🎼 What a stage hands back when it cannot finish.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// 🔒 Fail-fast territory. The CLI turns this into an exit code of 1.
    #[error("💀 Could not open a Reddit session, the run cannot start")]
    Authentication(#[source] SourceError),

    #[error("💀 Extraction failed")]
    Source(#[source] SourceError),

    #[error("💀 Writing the artifact failed")]
    Sink(#[from] SinkError),

    /// ⚠️ Stage 1 tagged its own hand-off as failed. Stage 2 refuses to pretend otherwise.
    #[error("💀 Run {run_id} did not finish extraction, refusing to upload '{artifact_path}'")]
    UpstreamIncomplete {
        run_id: String,
        artifact_path: PathBuf,
    },

    #[error("💀 The hand-off message at '{path}' is unusable: {reason}")]
    Handoff { path: PathBuf, reason: String },
}

impl From<SourceError> for PipelineError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Authentication(_) => PipelineError::Authentication(err),
            other => PipelineError::Source(other),
        }
    }
}

impl PipelineError {
    /// 🔒 True for the one failure the process is not allowed to survive.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PipelineError::Authentication(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_one_where_auth_failures_get_promoted_to_fatal() {
        let the_verdict: PipelineError = SourceError::Authentication("401".to_string()).into();
        assert!(the_verdict.is_fatal());

        let the_hiccup: PipelineError = SourceError::Status {
            status: 503,
            url: "https://oauth.reddit.com/r/rust/top".to_string(),
            body: "busy".to_string(),
        }
        .into();
        assert!(!the_hiccup.is_fatal());
        assert!(matches!(the_hiccup, PipelineError::Source(_)));
    }

    #[test]
    fn the_one_where_a_missing_artifact_is_called_what_it_is() {
        let the_missing = StoreError::NotFound {
            path: PathBuf::from("/tmp/nope.csv"),
        };
        assert!(the_missing.to_string().contains("The file was not found"));
    }
}
