//! 📰 rdx: the top of a subreddit, every night, into a bucket.
//!
//! 🎬 *[narrator voice]* "Somewhere, a data engineer wanted to know what other
//! data engineers were complaining about. Daily. In CSV. In S3."
//!
//! Reddit → [`transforms::normalize`] → CSV on disk → `<bucket>/raw/<file>.csv`,
//! as two stages joined by a [`pipelines::Handoff`]. The binary lives in
//! `rdx-cli`; this crate is everything else. 🦆

pub mod app_config;
pub mod backends;
pub mod common;
pub mod errors;
pub mod pipelines;
mod progress;
pub mod report;
pub mod transforms;

pub use app_config::{AppConfig, load_config};
pub use errors::PipelineError;
pub use pipelines::{EtlRequest, Handoff, UploadOutcome, etl_stage, run_pipeline, upload_stage};
