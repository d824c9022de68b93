//! CLI struct definitions for the TaskGame command-line interface.
//!
//! All top-level clap-derived types live here. Subsystem command groups are
//! defined next to their subsystem in `plugins/`.

use crate::core::output::OutputFormat;
use crate::plugins::{chores, members};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "taskgame",
    version = env!("CARGO_PKG_VERSION"),
    about = "Household chore game: chores grow in value while they wait, whoever does them cashes in. 🏠"
)]
pub struct Cli {
    /// Project directory (defaults to the nearest parent containing `.taskgame/`).
    #[clap(long, global = true)]
    pub dir: Option<PathBuf>,
    /// Output format.
    #[clap(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,
    /// Log level for stderr diagnostics (overridden by RUST_LOG).
    #[clap(long, global = true, default_value = "warn")]
    pub log_level: String,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create `.taskgame/` with a config file and the default household
    #[clap(name = "init")]
    Init {
        /// Overwrite an existing snapshot with the default household.
        #[clap(long)]
        force: bool,
    },

    /// Show chores by location with their current value
    #[clap(name = "board", visible_alias = "b")]
    Board {
        /// Acting member (defaults to $TASKGAME_MEMBER).
        #[clap(long)]
        member: Option<String>,
    },

    /// Complete a chore and collect its points
    #[clap(name = "done", visible_alias = "d")]
    Done {
        /// Chore name.
        #[clap(long)]
        chore: String,
        /// Acting member (defaults to $TASKGAME_MEMBER).
        #[clap(long)]
        member: Option<String>,
        /// Skip the confirmation prompt.
        #[clap(long, short = 'y')]
        yes: bool,
    },

    /// Show the leaderboard
    #[clap(name = "scores", visible_alias = "s")]
    Scores,

    /// Manage household members
    #[clap(name = "member")]
    Member(members::MemberCli),

    /// Manage the chore catalogue
    #[clap(name = "chore")]
    Chore(chores::ChoreCli),

    /// Replace all data with the default household
    #[clap(name = "reset-all")]
    ResetAll {
        /// Required: this cannot be undone.
        #[clap(long)]
        yes: bool,
    },

    /// Remote document store
    #[clap(name = "remote")]
    Remote(RemoteCli),

    /// Show version information
    #[clap(name = "version")]
    Version,
}

#[derive(clap::Args, Debug)]
pub struct RemoteCli {
    #[clap(subcommand)]
    pub command: RemoteCommand,
}

#[derive(Subcommand, Debug)]
pub enum RemoteCommand {
    /// Show whether a remote store is configured
    Status,
    /// Create a new private gist seeded with the current snapshot
    Create,
}
