use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "focusflow",
    version,
    about = "FocusFlow: today-first task and focus CLI",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Config file to use instead of the default lookup.
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Data directory override.
    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a task, scheduled for today unless --date says otherwise.
    Add {
        title: String,

        /// Target day as YYYY-MM-DD; anything unparsable falls back to today.
        #[arg(long)]
        date: Option<String>,

        /// Planned minutes.
        #[arg(long, default_value_t = 0)]
        estimate: u32,

        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(long)]
        note: Option<String>,
    },

    /// Show one day's tasks (today by default).
    List {
        #[arg(long)]
        date: Option<String>,

        /// Include completed tasks regardless of the persisted toggle.
        #[arg(long)]
        all: bool,

        /// Archive view: every day, not just the selected one.
        #[arg(long)]
        archive: bool,
    },

    /// Mark a task completed. Accepts a full id or a unique prefix.
    Done {
        id: String,

        /// Minutes actually spent.
        #[arg(long)]
        actual: Option<u32>,
    },

    /// Statistics for one day (today by default).
    Stats {
        #[arg(long)]
        date: Option<String>,
    },

    /// Per-day statistics for the Monday-first week containing --date.
    Week {
        #[arg(long)]
        date: Option<String>,
    },

    /// Persist the completed/archived visibility toggles.
    Prefs {
        #[arg(long)]
        show_completed: Option<bool>,

        #[arg(long)]
        show_archived: Option<bool>,
    },

    /// Dump the migrated task collection as JSON.
    Export,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}
