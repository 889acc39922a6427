use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

mod cmd;

#[derive(Parser)]
#[command(name = "badge-collector")]
#[command(version, about = "Plan, run and track Kaggle badge collection")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Progress file. Overrides BADGE_COLLECTOR_STATE and config.toml.
    #[arg(long, global = true)]
    pub state_file: Option<PathBuf>,

    /// Badge catalog JSON. Defaults to the catalog built into the binary.
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Config file (defaults to ~/.badge-collector/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Move an unreadable progress file aside and start fresh
    #[arg(long, global = true)]
    pub reset_corrupt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show earned / total / actionable counts per phase
    Status {
        /// Also list every badge with its last result
        #[arg(short, long)]
        badges: bool,
    },
    /// List badges that can be attempted now, in execution order
    Plan {
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=5))]
        phase: Option<u8>,
        /// Include badges that need a human
        #[arg(long)]
        all: bool,
    },
    /// Attempt every actionable badge once
    Run {
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=5))]
        phase: Option<u8>,
        /// Print the plan without running anything
        #[arg(long)]
        dry_run: bool,
        /// Do not check credentials or network first
        #[arg(long)]
        skip_preflight: bool,
    },
    /// Record an outcome observed outside a run
    #[command(group(ArgGroup::new("outcome").required(true).args(["earned", "failed"])))]
    Record {
        badge: String,
        #[arg(long)]
        earned: bool,
        #[arg(long)]
        failed: bool,
        #[arg(long)]
        detail: Option<String>,
    },
    /// Show the attempt history, newest last
    History {
        badge: Option<String>,
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
    /// Mark every badge unearned
    Reset {
        #[arg(long)]
        force: bool,
    },
    /// List the badge catalog
    Catalog {
        /// Validate the catalog, prerequisite graph and config, then exit
        #[arg(long)]
        check: bool,
    },
}

/// Install stderr and daily-file logging. The returned guard flushes the
/// file writer on drop.
fn init_logging(verbose: bool) -> Option<WorkerGuard> {
    let default = if verbose {
        "badge_collector=debug,warn"
    } else {
        "warn"
    };
    let stderr_filter = std::env::var("BADGE_COLLECTOR_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(stderr_filter);

    let log_dir = badge_collector::config::default_home().join("logs");
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("badge-collector")
        .filename_suffix("log")
        .build(&log_dir)
        .ok();

    let (file_layer, guard) = match appender {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(EnvFilter::new("badge_collector=info"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();
    guard
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.verbose);

    match &cli.command {
        Commands::Status { badges } => cmd::cmd_status(&cli, *badges)?,
        Commands::Plan { phase, all } => cmd::cmd_plan(&cli, *phase, *all)?,
        Commands::Run {
            phase,
            dry_run,
            skip_preflight,
        } => cmd::cmd_run(&cli, *phase, *dry_run, *skip_preflight)?,
        Commands::Record {
            badge,
            earned,
            failed: _,
            detail,
        } => cmd::cmd_record(&cli, badge, *earned, detail.as_deref())?,
        Commands::History { badge, limit } => cmd::cmd_history(&cli, badge.as_deref(), *limit)?,
        Commands::Reset { force } => cmd::cmd_reset(&cli, *force)?,
        Commands::Catalog { check } => cmd::cmd_catalog(&cli, *check)?,
    }

    Ok(())
}
