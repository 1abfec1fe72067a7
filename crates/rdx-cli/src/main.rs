//! 🚀 rdx-cli: the front door of rdx.
//!
//! 🎬 *[narrator voice]* "Every night at midnight, a scheduler somewhere typed
//! `rdx-cli extract`, waited, and then typed `rdx-cli upload`..."
//! 📦 This binary loads config, sets up logging, picks a subcommand, and lets
//! the library do the heavy lifting. Like a manager. 🦆

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rdx::PipelineError;
use rdx::app_config::{AppConfig, JobConfig, load_config};
use rdx::backends::file::read_table;
use rdx::common::TimeFilter;
use rdx::pipelines::{
    EtlRequest, Handoff, UploadOutcome, etl_stage, record_failed_extract, run_pipeline,
    upload_stage,
};
use rdx::report::{preview_table, run_report_table};

const DEFAULT_CONFIG_FILE: &str = "rdx.toml";

/// 📰 Top posts from a subreddit, into a CSV, into a bucket.
#[derive(Debug, Parser)]
#[command(name = "rdx-cli", version, about)]
struct Cli {
    /// 🔧 TOML config file. Defaults to ./rdx.toml when it exists; env vars (RDX_*) always apply.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 🚰 Stage 1: fetch, normalize, write the CSV, leave a hand-off behind.
    Extract {
        #[command(flatten)]
        job: JobArgs,
        /// 📨 Where to write the hand-off. Defaults to <output_path>/<file_name>.handoff.json
        #[arg(long)]
        handoff: Option<PathBuf>,
    },
    /// 🪣 Stage 2: ensure the bucket, upload the artifact under raw/.
    Upload(UploadArgs),
    /// 🎼 Stage 1 then stage 2, in one process.
    Run {
        #[command(flatten)]
        job: JobArgs,
    },
    /// 🔍 Show the first rows of an artifact.
    Preview {
        artifact: PathBuf,
        #[arg(long, default_value_t = 10)]
        rows: usize,
    },
}

/// 📰 Per-run overrides on top of the `[job]` config.
#[derive(Debug, Args)]
struct JobArgs {
    #[arg(long)]
    subreddit: Option<String>,
    /// hour, day, week, month, year or all
    #[arg(long)]
    time_filter: Option<TimeFilter>,
    #[arg(long, conflicts_with = "no_limit")]
    limit: Option<NonZeroU32>,
    /// ♾️ Take everything Reddit is willing to page through.
    #[arg(long)]
    no_limit: bool,
    /// 🏷️ Overrides the `<prefix>_<YYYYMMDD>` file name.
    #[arg(long)]
    file_name: Option<String>,
}

impl JobArgs {
    fn request(&self, job: &JobConfig) -> EtlRequest {
        let mut the_request = EtlRequest::from_job(job, Utc::now().date_naive());
        if let Some(subreddit) = &self.subreddit {
            the_request.subreddit = subreddit.clone();
        }
        if let Some(time_filter) = self.time_filter {
            the_request.time_filter = time_filter;
        }
        if let Some(limit) = self.limit {
            the_request.limit = Some(limit);
        }
        if self.no_limit {
            the_request.limit = None;
        }
        if let Some(file_name) = &self.file_name {
            the_request.file_name = file_name.clone();
        }
        the_request
    }
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct UploadArgs {
    /// 📨 A hand-off written by `extract`.
    #[arg(long)]
    handoff: Option<PathBuf>,
    /// 📄 A bare artifact path, for schedulers that only pass strings around.
    #[arg(long)]
    artifact: Option<PathBuf>,
}

/// 🚀 main(): init tracing, parse args, run, and turn failures into exit code 1.
#[tokio::main]
async fn main() -> Result<()> {
    // 📡 RUST_LOG wins when set, otherwise info
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(err) = dispatch(cli).await {
        error!("💀 error: {}", err);
        // -- 🧅 peel the onion, one layer at a time
        for cause in err.chain().skip(1) {
            error!("⚠️  cause: {}", cause);
        }

        let the_run_never_started = err.chain().any(|cause| {
            cause
                .downcast_ref::<PipelineError>()
                .is_some_and(PipelineError::is_fatal)
        });
        if the_run_never_started {
            error!(
                "🔒 hint: Reddit refused the credentials. Check reddit.client_id and \
                 reddit.client_secret (RDX_REDDIT__CLIENT_ID / RDX_REDDIT__CLIENT_SECRET)."
            );
        }

        // 🗑️ Exit with prejudice. The scheduler owns retries.
        std::process::exit(1);
    }

    Ok(())
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Extract { job, handoff } => {
            let the_config = config(cli.config.as_deref())?;
            extract(&the_config, &job, handoff).await
        }
        Command::Upload(args) => {
            let the_config = config(cli.config.as_deref())?;
            upload(&the_config, args).await
        }
        Command::Run { job } => {
            let the_config = config(cli.config.as_deref())?;
            let the_report = run_pipeline(&the_config, &job.request(&the_config.job))
                .await
                .context("💀 The run did not make it through stage 1")?;
            println!("{}", run_report_table(&the_report));
            enforce_strict_upload(&the_config, &the_report.outcome)
        }
        Command::Preview { artifact, rows } => {
            let the_table = read_table(&artifact)
                .await
                .with_context(|| {
                    format!("💀 Could not read '{}' as an rdx artifact", artifact.display())
                })?;
            println!("{}", preview_table(&the_table, rows));
            info!("🔍 showing {} of {} rows", rows.min(the_table.len()), the_table.len());
            Ok(())
        }
    }
}

/// 🔧 An explicit --config must exist. Without one, ./rdx.toml is used if it is there.
fn config(explicit: Option<&Path>) -> Result<AppConfig> {
    let the_file = match explicit {
        Some(path) => {
            let exists = path.try_exists().with_context(|| {
                format!("💀 Could not check whether the config file '{}' exists", path.display())
            })?;
            if !exists {
                bail!(
                    "💀 Configuration file '{}' does not exist. Relative paths resolve against the \
                     current directory; an absolute path removes the guesswork.",
                    path.display()
                );
            }
            Some(path)
        }
        None => Some(Path::new(DEFAULT_CONFIG_FILE)).filter(|path| path.is_file()),
    };
    load_config(the_file).context("💀 rdx-cli could not load its configuration")
}

async fn extract(config: &AppConfig, job: &JobArgs, handoff: Option<PathBuf>) -> Result<()> {
    let the_request = job.request(&config.job);
    let the_handoff_path = handoff
        .unwrap_or_else(|| Handoff::default_path(&config.output_path, &the_request.file_name));

    match etl_stage(config, &the_request).await {
        Ok(the_handoff) => {
            the_handoff.write_to(&the_handoff_path).await?;
            // -- stdout carries the bare hand-off value for schedulers that pipe it along
            println!("{the_handoff}");
            Ok(())
        }
        Err(err) => {
            record_failed_extract(&the_handoff_path, &the_request, &config.output_path).await;
            Err(err).context("💀 Stage 1 (extract) failed")
        }
    }
}

async fn upload(config: &AppConfig, args: UploadArgs) -> Result<()> {
    let the_handoff = match (args.handoff, args.artifact) {
        (Some(path), _) => Handoff::read_from(&path).await?,
        (None, Some(artifact)) => Handoff::from_artifact_path(artifact),
        (None, None) => bail!("💀 upload needs --handoff or --artifact"),
    };

    let the_outcome = upload_stage(config, &the_handoff)
        .await
        .context("💀 Stage 2 (upload) refused the hand-off")?;
    info!("📬 {the_outcome}");
    enforce_strict_upload(config, &the_outcome)
}

/// 🚨 With `runtime.strict_upload`, anything short of "uploaded" is an exit code.
fn enforce_strict_upload(config: &AppConfig, outcome: &UploadOutcome) -> Result<()> {
    if config.runtime.strict_upload && !outcome.is_uploaded() {
        bail!("💀 The upload did not land ({outcome}) and runtime.strict_upload is on");
    }
    Ok(())
}
