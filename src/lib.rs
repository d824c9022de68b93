//! TaskGame: a household chore game.
//!
//! Members earn points by completing chores. A chore that nobody does grows
//! in value (one bonus point per full week, up to three), and whoever finally
//! does it collects the accrued value. A leaderboard ranks members by their
//! cumulative points.
//!
//! # Architecture
//!
//! ## Snapshot
//!
//! All state is one JSON document ([`core::snapshot::Snapshot`]): the member
//! ledger plus the chore catalogue. It lives in a GitHub Gist when one is
//! configured and always in `.taskgame/data/` as the local copy.
//!
//! ## Request cycle
//!
//! Every command is one turn through [`core::broker::SnapshotBroker`]:
//! load → normalize → refresh accrued values → run the operation → save if
//! something changed. Last write wins.
//!
//! ## Engine
//!
//! - [`plugins::accrual`]: current value of a chore from its base points and
//!   the time since it was last completed
//! - [`plugins::completion`]: eligibility and the completion transaction
//!
//! # Examples
//!
//! ```bash
//! taskgame init
//! taskgame board --member Antoine
//! taskgame done --member Antoine --chore "Sortir les poubelles" --yes
//! taskgame scores
//! ```

pub mod cli;
pub mod core;
pub mod plugins;

use crate::cli::{Cli, Command, RemoteCommand};
use crate::core::broker::{Access, SnapshotBroker};
use crate::core::config::{self, Config};
use crate::core::error::TaskGameError;
use crate::core::output::{self, OutputFormat};
use crate::core::schemas;
use crate::core::snapshot::Snapshot;
use crate::core::store::{FallbackStore, GistStore, LocalFileStore, SnapshotStore};
use crate::core::time::{self, SystemClock};
use crate::plugins::completion::{self, Completion, ConfirmationState};
use crate::plugins::{chores, leaderboard, members};

use clap::Parser;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

pub type AppBroker = SnapshotBroker<FallbackStore, SystemClock>;

/// Everything a command needs for one invocation.
pub struct App {
    pub root: PathBuf,
    pub config: Config,
    pub format: OutputFormat,
    pub broker: AppBroker,
}

impl App {
    pub fn open(root: &Path, config: Config, format: OutputFormat) -> Result<Self, TaskGameError> {
        let remote = config.resolve_remote().map(GistStore::new).transpose()?;
        let local = LocalFileStore::new(config::data_path(root, &config));
        let store = FallbackStore::new(remote, local);
        debug!(store = %store.describe(), "store opened");
        let broker = SnapshotBroker::new(store, SystemClock, config.accrual);
        Ok(Self {
            root: root.to_path_buf(),
            config,
            format,
            broker,
        })
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` wins over `level`.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("taskgame={}", level)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run() -> Result<(), TaskGameError> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let start_dir = match cli.dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Command::Version => {
            println!("v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Init { force } => run_init(&start_dir, force, cli.format),
        command => {
            let root = config::find_project_root(&start_dir)?;
            let config = config::load_config(&root)?;
            let app = App::open(&root, config, cli.format)?;
            dispatch(&app, command)
        }
    }
}

fn dispatch(app: &App, command: Command) -> Result<(), TaskGameError> {
    match command {
        Command::Board { member } => run_board(app, member),
        Command::Done { chore, member, yes } => run_done(app, &chore, member, yes),
        Command::Scores => run_scores(app),
        Command::Member(cli) => members::run_member_cli(app, cli),
        Command::Chore(cli) => chores::run_chore_cli(app, cli),
        Command::ResetAll { yes } => run_reset_all(app, yes),
        Command::Remote(cli) => match cli.command {
            RemoteCommand::Status => run_remote_status(app),
            RemoteCommand::Create => run_remote_create(app),
        },
        Command::Init { .. } | Command::Version => Ok(()),
    }
}

fn run_init(dir: &Path, force: bool, format: OutputFormat) -> Result<(), TaskGameError> {
    fs::create_dir_all(dir)?;
    let root = fs::canonicalize(dir)?;
    let project_dir = config::project_dir(&root);
    fs::create_dir_all(project_dir.join(schemas::DATA_DIR_NAME))?;

    let config_path = config::config_path(&root);
    let wrote_config = !config_path.exists();
    if wrote_config {
        fs::write(&config_path, config::DEFAULT_CONFIG_TOML)?;
    }

    let config = config::load_config(&root)?;
    let data_path = config::data_path(&root, &config);
    let app = App::open(&root, config, format)?;

    let seeded = if data_path.exists() && !force {
        None
    } else {
        let report = app.broker.replace(Snapshot::default_seed())?;
        info!(path = %data_path.display(), "seeded default household");
        Some(report)
    };

    let envelope = time::command_envelope(
        "init",
        "ok",
        chrono::Utc::now(),
        serde_json::json!({
            "root": root.to_string_lossy(),
            "config_written": wrote_config,
            "seeded": seeded,
        }),
    );
    output::emit(format, &envelope, || {
        if seeded.is_some() {
            format!("Initialized TaskGame in {}", project_dir.display())
        } else {
            format!(
                "TaskGame already initialized in {} (use --force to reset the data)",
                project_dir.display()
            )
        }
    })
}

fn resolve_member(member: Option<String>) -> Result<String, TaskGameError> {
    member
        .or_else(|| std::env::var(schemas::MEMBER_ENV).ok())
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .ok_or_else(|| {
            TaskGameError::ValidationError(format!(
                "no acting member; pass --member or set {}",
                schemas::MEMBER_ENV
            ))
        })
}

fn run_board(app: &App, member: Option<String>) -> Result<(), TaskGameError> {
    let member = resolve_member(member)?;
    let turn = app.broker.with_snapshot("board", Access::Read, |snap, now| {
        let points = snap
            .members
            .get(&member)
            .map(|m| m.points)
            .ok_or_else(|| TaskGameError::UnknownMember(member.clone()))?;
        Ok((points, leaderboard::board(snap, &member, now)))
    })?;
    let (points, groups) = turn.value;
    let envelope = time::command_envelope(
        "board",
        "ok",
        turn.now,
        serde_json::json!({ "member": member, "points": points, "locations": groups }),
    );
    output::emit(app.format, &envelope, || {
        output::render_board(&member, points, &groups)
    })
}

/// Reads one answer. `None` means the input was not understood.
fn prompt_yes_no(question: &str) -> Result<Option<bool>, TaskGameError> {
    let mut stderr = io::stderr();
    write!(stderr, "{}", question)?;
    stderr.flush()?;
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer)? == 0 {
        return Ok(Some(false));
    }
    Ok(parse_answer(&answer))
}

fn parse_answer(answer: &str) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" | "o" | "oui" => Some(true),
        "" | "n" | "no" | "non" => Some(false),
        _ => None,
    }
}

/// Asks until the pending confirmation for `chore` is settled.
fn confirm_chore(
    confirmations: &mut ConfirmationState,
    chore: &str,
    question: &str,
) -> Result<bool, TaskGameError> {
    confirmations.request(chore);
    let mut accepted = false;
    while confirmations.is_pending(chore) {
        match prompt_yes_no(question)? {
            Some(true) => accepted = confirmations.confirm(chore),
            Some(false) => confirmations.cancel(chore),
            None => eprintln!("Please answer y or n."),
        }
    }
    Ok(accepted)
}

fn run_done(
    app: &App,
    chore_name: &str,
    member: Option<String>,
    yes: bool,
) -> Result<(), TaskGameError> {
    let member = resolve_member(member)?;
    let mut confirmations = ConfirmationState::new();

    let turn = app.broker.with_snapshot("done", Access::Write, |snap, now| {
        if let Some(chore) = snap.chores.get(chore_name) {
            if !snap.has_member(&member) {
                return Err(TaskGameError::UnknownMember(member.clone()));
            }
            if !completion::query_eligibility(chore, &member) {
                return Err(TaskGameError::IneligibleMember {
                    member: member.clone(),
                    chore: chore_name.to_string(),
                });
            }
            if !yes {
                let question = format!(
                    "'{}' is worth {} pts. Done? [y/N] ",
                    chore_name, chore.current_points
                );
                if !confirm_chore(&mut confirmations, chore_name, &question)? {
                    return Ok(None);
                }
            }
        }
        completion::complete_chore(snap, &member, chore_name, now).map(Some)
    })?;

    let (status, text) = match &turn.value {
        Some(Completion::Awarded(award)) => {
            info!(
                member = %award.member,
                chore = %award.chore,
                points = award.points_awarded,
                "chore completed"
            );
            ("ok", output::render_award(award))
        }
        Some(Completion::UnknownChore { chore }) => (
            "not_found",
            format!("Chore '{}' not found; no points awarded.", chore),
        ),
        None => ("cancelled", "Cancelled.".to_string()),
    };
    let envelope = time::command_envelope(
        "done",
        status,
        turn.now,
        serde_json::json!({
            "member": member,
            "chore": chore_name,
            "awarded": turn.value.as_ref().map_or(0, |c| c.points_awarded()),
            "result": turn.value,
            "saved": turn.saved,
        }),
    );
    output::emit(app.format, &envelope, || text)
}

fn run_scores(app: &App) -> Result<(), TaskGameError> {
    let turn = app
        .broker
        .with_snapshot("scores", Access::Read, |snap, _| Ok(leaderboard::leaderboard(snap)))?;
    let envelope = time::command_envelope(
        "scores",
        "ok",
        turn.now,
        serde_json::json!({ "standings": turn.value }),
    );
    output::emit(app.format, &envelope, || {
        output::render_leaderboard(&turn.value)
    })
}

fn run_reset_all(app: &App, yes: bool) -> Result<(), TaskGameError> {
    if !yes {
        return Err(TaskGameError::ValidationError(
            "reset-all replaces every member and chore; pass --yes to confirm".to_string(),
        ));
    }
    let turn = app.broker.with_snapshot("reset_all", Access::Write, |snap, _| {
        members::reset_all(snap);
        Ok(())
    })?;
    let envelope = time::command_envelope(
        "reset_all",
        "ok",
        turn.now,
        serde_json::json!({ "saved": turn.saved }),
    );
    output::emit(app.format, &envelope, || "Application reset.".to_string())
}

fn run_remote_status(app: &App) -> Result<(), TaskGameError> {
    let store = app.broker.store();
    let envelope = time::command_envelope(
        "remote.status",
        "ok",
        chrono::Utc::now(),
        serde_json::json!({
            "configured": store.has_remote(),
            "store": store.describe(),
            "local_path": store.local().path().to_string_lossy(),
        }),
    );
    output::emit(app.format, &envelope, || {
        if store.has_remote() {
            format!("Remote configured: {}", store.describe())
        } else {
            format!(
                "No remote configured (set remote.gist_id or {} and ${}); using {}",
                schemas::REMOTE_GIST_ID_ENV,
                app.config.remote.token_env,
                store.describe()
            )
        }
    })
}

fn run_remote_create(app: &App) -> Result<(), TaskGameError> {
    let token = std::env::var(&app.config.remote.token_env)
        .ok()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| {
            TaskGameError::ValidationError(format!(
                "${} must hold an API token to create a gist",
                app.config.remote.token_env
            ))
        })?;
    let now = chrono::Utc::now();
    let mut snapshot = app.broker.load_refreshed(now)?;
    let stamp = time::format_ts(now);
    snapshot.created_at = Some(stamp.clone());
    snapshot.last_updated = Some(stamp);
    let gist_id = GistStore::create(
        &app.config.remote.api_base,
        &token,
        &app.config.remote.file_name,
        &snapshot,
    )?;
    let envelope = time::command_envelope(
        "remote.create",
        "ok",
        now,
        serde_json::json!({ "gist_id": gist_id }),
    );
    output::emit(app.format, &envelope, || {
        format!(
            "Created gist {}. Add `gist_id = \"{}\"` under [remote] in {}.",
            gist_id,
            gist_id,
            config::config_path(&app.root).display()
        )
    })
}
