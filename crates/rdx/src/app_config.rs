//! 🔧 App Configuration: the sacred TOML-and-env-to-struct pipeline.
//!
//! 📡 "Config not found: We looked everywhere. Under the couch. Behind the fridge.
//! In the junk drawer. Nothing." says every developer at 3am 🦆
//!
//! 🏗️ Powered by Figment. Built once in `main`, passed by reference to whoever
//! needs it. No globals. No module-level credential constants lurking in the attic.

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use tracing::info;

use crate::backends::{RedditConfig, StorageConfig};
use crate::common::TimeFilter;

/// 📦 The AppConfig: one struct to rule them all, one struct to find them,
/// one struct to bring them all, and in the Figment bind them.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// 📡 Reddit app credentials and endpoints.
    pub reddit: RedditConfig,
    /// 🪣 Where the artifact goes after it leaves the local disk.
    pub storage: StorageConfig,
    /// 📁 Local directory for artifacts and hand-off messages.
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    /// 📰 What to pull: subreddit, window, limit, and how to name the file.
    #[serde(default)]
    pub job: JobConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

fn default_output_path() -> PathBuf {
    PathBuf::from("data/output")
}

/// 📰 The daily job. Defaults mirror the schedule this pipeline was born with:
/// r/dataengineering, top of the day, 500 posts, `reddit_YYYYMMDD.csv`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct JobConfig {
    #[serde(default = "default_subreddit")]
    pub subreddit: String,
    #[serde(default)]
    pub time_filter: TimeFilter,
    /// 🔢 `None` means "as many as Reddit will give us".
    #[serde(default = "default_limit")]
    pub limit: Option<NonZeroU32>,
    #[serde(default = "default_file_name_prefix")]
    pub file_name_prefix: String,
}

fn default_subreddit() -> String {
    "dataengineering".to_string()
}

fn default_limit() -> Option<NonZeroU32> {
    NonZeroU32::new(500)
}

fn default_file_name_prefix() -> String {
    "reddit".to_string()
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            subreddit: default_subreddit(),
            time_filter: TimeFilter::default(),
            limit: default_limit(),
            file_name_prefix: default_file_name_prefix(),
        }
    }
}

impl JobConfig {
    /// 🏷️ The run-scoped file name: `<prefix>_<YYYYMMDD>`.
    ///
    /// The date suffix is the only thing keeping two overlapping runs from
    /// writing the same artifact and the same remote key. Keep it.
    pub fn file_name_for(&self, run_date: NaiveDate) -> String {
        format!("{}_{}", self.file_name_prefix, run_date.format("%Y%m%d"))
    }
}

/// 🎛️ Knobs for how the run behaves, as opposed to what it fetches.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// 🚨 When true, an upload that did not land is a non-zero exit so the
    /// scheduler can retry. When false, it is logged and the run moves on.
    #[serde(default)]
    pub strict_upload: bool,
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
}

fn default_show_progress() -> bool {
    true
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            strict_upload: false,
            show_progress: default_show_progress(),
        }
    }
}

/// 🚀 Load the config: from env vars, an optional TOML file, or the sheer power of hoping.
///
/// 🔧 Env vars use the `RDX_` prefix and `__` for nesting:
/// `RDX_REDDIT__CLIENT_ID`, `RDX_STORAGE__BUCKET`, `RDX_OUTPUT_PATH`, ...
///
/// 📐 No file → env only. A file → env + TOML, merged, TOML wins on conflicts.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!(
        "🔧 Loading configuration: {:#?}",
        config_file_name.unwrap_or(Path::new(""))
    );

    let config = Figment::new().merge(Env::prefixed("RDX_").split("__"));

    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables (RDX_*). \
             Check that reddit.client_id, reddit.client_secret and storage.bucket are set.",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables (RDX_*). \
                 No file was provided, so RDX_REDDIT__CLIENT_ID, RDX_REDDIT__CLIENT_SECRET \
                 and RDX_STORAGE__BUCKET all have to come from the environment."
            .to_string(),
    };

    config.extract().context(context_msg)
}
