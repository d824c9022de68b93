//! Chore catalogue administration.

use crate::App;
use crate::core::broker::Access;
use crate::core::error::TaskGameError;
use crate::core::output;
use crate::core::schemas;
use crate::core::snapshot::{Chore, Snapshot};
use crate::core::time;
use crate::plugins::completion;
use clap::Subcommand;
use std::collections::BTreeSet;

pub fn add_chore(
    snapshot: &mut Snapshot,
    name: &str,
    base_points: u32,
    location: &str,
) -> Result<(), TaskGameError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TaskGameError::ValidationError(
            "chore name must not be empty".to_string(),
        ));
    }
    if snapshot.chores.contains_key(name) {
        return Err(TaskGameError::ValidationError(format!(
            "chore '{}' already exists",
            name
        )));
    }
    if !(schemas::MIN_BASE_POINTS..=schemas::MAX_BASE_POINTS).contains(&base_points) {
        return Err(TaskGameError::ValidationError(format!(
            "base points must be between {} and {}, got {}",
            schemas::MIN_BASE_POINTS,
            schemas::MAX_BASE_POINTS,
            base_points
        )));
    }
    if !schemas::LOCATIONS.contains(&location) {
        return Err(TaskGameError::ValidationError(format!(
            "unknown location '{}' (expected one of: {})",
            location,
            schemas::LOCATIONS.join(", ")
        )));
    }
    snapshot
        .chores
        .insert(name.to_string(), Chore::new(base_points, location));
    Ok(())
}

pub fn remove_chore(snapshot: &mut Snapshot, name: &str) -> Result<Chore, TaskGameError> {
    snapshot
        .chores
        .remove(name)
        .ok_or_else(|| TaskGameError::NotFound(format!("chore '{}'", name)))
}

/// Restricts a chore to `members`, or opens it to everyone with `None`.
pub fn set_eligibility(
    snapshot: &mut Snapshot,
    chore_name: &str,
    members: Option<BTreeSet<String>>,
) -> Result<(), TaskGameError> {
    if let Some(allowed) = &members {
        if allowed.is_empty() {
            return Err(TaskGameError::ValidationError(
                "an allow-list needs at least one member; use --all to open the chore".to_string(),
            ));
        }
        if let Some(unknown) = allowed.iter().find(|m| !snapshot.has_member(m)) {
            return Err(TaskGameError::UnknownMember(unknown.clone()));
        }
    }
    let chore = snapshot
        .chores
        .get_mut(chore_name)
        .ok_or_else(|| TaskGameError::NotFound(format!("chore '{}'", chore_name)))?;
    chore.eligible_members = members;
    Ok(())
}

#[derive(clap::Args, Debug)]
pub struct ChoreCli {
    #[clap(subcommand)]
    pub command: ChoreCommand,
}

#[derive(Subcommand, Debug)]
pub enum ChoreCommand {
    /// Add a chore.
    Add {
        #[clap(value_name = "NAME")]
        name: String,
        /// Base points (1-3).
        #[clap(long, default_value = "1")]
        points: u32,
        /// Location, one of the household locations.
        #[clap(long)]
        location: String,
    },
    /// Remove a chore.
    Remove {
        #[clap(value_name = "NAME")]
        name: String,
    },
    /// List chores with their current value and who may do them.
    List {
        /// Only show chores at this location.
        #[clap(long)]
        location: Option<String>,
    },
    /// Restrict a chore to some members, or open it to everyone.
    Eligible {
        #[clap(value_name = "NAME")]
        chore: String,
        /// Allowed member (repeatable).
        #[clap(long = "member", conflicts_with = "all")]
        members: Vec<String>,
        /// Open the chore to every member.
        #[clap(long)]
        all: bool,
    },
}

pub fn run_chore_cli(app: &App, cli: ChoreCli) -> Result<(), TaskGameError> {
    match cli.command {
        ChoreCommand::Add {
            name,
            points,
            location,
        } => {
            let name = name.trim().to_string();
            let turn = app.broker.with_snapshot("chore.add", Access::Write, |snap, _| {
                add_chore(snap, &name, points, &location)
            })?;
            let envelope = time::command_envelope(
                "chore.add",
                "ok",
                turn.now,
                serde_json::json!({
                    "chore": name,
                    "base_points": points,
                    "location": location,
                    "saved": turn.saved
                }),
            );
            output::emit(app.format, &envelope, || {
                format!("Chore '{}' added ({} pts, {}).", name, points, location)
            })
        }
        ChoreCommand::Remove { name } => {
            let turn = app.broker.with_snapshot("chore.remove", Access::Write, |snap, _| {
                remove_chore(snap, &name)
            })?;
            let envelope = time::command_envelope(
                "chore.remove",
                "ok",
                turn.now,
                serde_json::json!({ "chore": name, "saved": turn.saved }),
            );
            output::emit(app.format, &envelope, || format!("Chore '{}' removed.", name))
        }
        ChoreCommand::List { location } => {
            let turn = app.broker.with_snapshot("chore.list", Access::Read, |snap, _| {
                let snap: &Snapshot = snap;
                let items: Vec<serde_json::Value> = snap
                    .chores
                    .iter()
                    .filter(|(_, c)| location.as_deref().is_none_or(|l| c.location == l))
                    .map(|(name, chore)| {
                        serde_json::json!({
                            "name": name,
                            "location": chore.location,
                            "base_points": chore.base_points,
                            "current_points": chore.current_points,
                            "last_completed_at": chore.last_completed_at,
                            "last_completed_by": chore.last_completed_by,
                            "eligible_members": completion::eligible_members(snap, chore),
                            "restricted": chore.is_restricted(),
                        })
                    })
                    .collect();
                Ok(items)
            })?;
            let envelope = time::command_envelope(
                "chore.list",
                "ok",
                turn.now,
                serde_json::json!({ "items": turn.value }),
            );
            output::emit(app.format, &envelope, || {
                if turn.value.is_empty() {
                    return "No chores found.".to_string();
                }
                turn.value
                    .iter()
                    .map(|v| {
                        let name = v.get("name").and_then(|x| x.as_str()).unwrap_or("?");
                        let loc = v.get("location").and_then(|x| x.as_str()).unwrap_or("?");
                        let base = v.get("base_points").and_then(|x| x.as_u64()).unwrap_or(0);
                        let current = v.get("current_points").and_then(|x| x.as_u64()).unwrap_or(0);
                        let who = if v.get("restricted").and_then(|x| x.as_bool()) == Some(true) {
                            v.get("eligible_members")
                                .and_then(|x| x.as_array())
                                .map(|a| {
                                    a.iter()
                                        .filter_map(|m| m.as_str())
                                        .collect::<Vec<_>>()
                                        .join(", ")
                                })
                                .unwrap_or_default()
                        } else {
                            "everyone".to_string()
                        };
                        format!("- {} [{}|{}/{} pts] ({})", name, loc, current, base, who)
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        ChoreCommand::Eligible {
            chore,
            members,
            all,
        } => {
            let allowed = if all {
                None
            } else {
                Some(members.iter().map(|m| m.trim().to_string()).collect::<BTreeSet<_>>())
            };
            let turn = app
                .broker
                .with_snapshot("chore.eligible", Access::Write, |snap, _| {
                    set_eligibility(snap, &chore, allowed.clone())
                })?;
            let envelope = time::command_envelope(
                "chore.eligible",
                "ok",
                turn.now,
                serde_json::json!({
                    "chore": chore,
                    "eligible_members": allowed,
                    "saved": turn.saved
                }),
            );
            output::emit(app.format, &envelope, || match &allowed {
                None => format!("Chore '{}' is open to everyone.", chore),
                Some(set) => format!(
                    "Chore '{}' restricted to: {}.",
                    chore,
                    set.iter().cloned().collect::<Vec<_>>().join(", ")
                ),
            })
        }
    }
}
