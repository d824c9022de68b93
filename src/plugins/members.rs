//! Household member administration.

use crate::App;
use crate::core::broker::Access;
use crate::core::error::TaskGameError;
use crate::core::output;
use crate::core::snapshot::{Member, Snapshot};
use crate::core::time;
use clap::Subcommand;

pub fn add_member(snapshot: &mut Snapshot, name: &str) -> Result<(), TaskGameError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TaskGameError::ValidationError(
            "member name must not be empty".to_string(),
        ));
    }
    if snapshot.has_member(name) {
        return Err(TaskGameError::ValidationError(format!(
            "member '{}' already exists",
            name
        )));
    }
    snapshot.members.insert(name.to_string(), Member::default());
    Ok(())
}

/// Removes a member and drops them from every chore allow-list. An
/// allow-list left empty reopens its chore to everyone.
///
/// `last_completed_by` is left as is; a dangling actor name is only a
/// display concern. The household always keeps at least one member.
pub fn remove_member(snapshot: &mut Snapshot, name: &str) -> Result<Member, TaskGameError> {
    if !snapshot.has_member(name) {
        return Err(TaskGameError::NotFound(format!("member '{}'", name)));
    }
    if snapshot.members.len() <= 1 {
        return Err(TaskGameError::ValidationError(
            "cannot remove the last member".to_string(),
        ));
    }
    for chore in snapshot.chores.values_mut() {
        if let Some(allowed) = chore.eligible_members.as_mut() {
            allowed.remove(name);
            if allowed.is_empty() {
                chore.eligible_members = None;
            }
        }
    }
    snapshot
        .members
        .remove(name)
        .ok_or_else(|| TaskGameError::NotFound(format!("member '{}'", name)))
}

/// Sets every member's total to exactly zero. Returns how many were reset.
pub fn reset_scores(snapshot: &mut Snapshot) -> usize {
    for member in snapshot.members.values_mut() {
        member.points = 0;
    }
    snapshot.members.len()
}

/// Replaces the whole snapshot with the default household.
pub fn reset_all(snapshot: &mut Snapshot) {
    *snapshot = Snapshot::default_seed();
}

#[derive(clap::Args, Debug)]
pub struct MemberCli {
    #[clap(subcommand)]
    pub command: MemberCommand,
}

#[derive(Subcommand, Debug)]
pub enum MemberCommand {
    /// Add a member with zero points.
    Add {
        #[clap(value_name = "NAME")]
        name: String,
    },
    /// Remove a member (the last one cannot be removed).
    Remove {
        #[clap(value_name = "NAME")]
        name: String,
    },
    /// List members and their points.
    List,
    /// Set every member's points back to zero.
    ResetScores {
        /// Required: this cannot be undone.
        #[clap(long)]
        yes: bool,
    },
}

pub fn run_member_cli(app: &App, cli: MemberCli) -> Result<(), TaskGameError> {
    match cli.command {
        MemberCommand::Add { name } => {
            let name = name.trim().to_string();
            let turn = app
                .broker
                .with_snapshot("member.add", Access::Write, |snap, _| add_member(snap, &name))?;
            let envelope = time::command_envelope(
                "member.add",
                "ok",
                turn.now,
                serde_json::json!({ "member": name, "saved": turn.saved }),
            );
            output::emit(app.format, &envelope, || format!("Member '{}' added.", name))
        }
        MemberCommand::Remove { name } => {
            let turn = app
                .broker
                .with_snapshot("member.remove", Access::Write, |snap, _| {
                    remove_member(snap, &name)
                })?;
            let envelope = time::command_envelope(
                "member.remove",
                "ok",
                turn.now,
                serde_json::json!({
                    "member": name,
                    "points": turn.value.points,
                    "saved": turn.saved
                }),
            );
            output::emit(app.format, &envelope, || {
                format!("Member '{}' removed ({} points).", name, turn.value.points)
            })
        }
        MemberCommand::List => {
            let turn = app
                .broker
                .with_snapshot("member.list", Access::Read, |snap, _| Ok(snap.members.clone()))?;
            let envelope = time::command_envelope(
                "member.list",
                "ok",
                turn.now,
                serde_json::json!({ "members": turn.value }),
            );
            output::emit(app.format, &envelope, || {
                turn.value
                    .iter()
                    .map(|(name, member)| format!("- {} ({} pts)", name, member.points))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        MemberCommand::ResetScores { yes } => {
            if !yes {
                return Err(TaskGameError::ValidationError(
                    "resetting scores cannot be undone; pass --yes to confirm".to_string(),
                ));
            }
            let turn = app
                .broker
                .with_snapshot("member.reset_scores", Access::Write, |snap, _| {
                    Ok(reset_scores(snap))
                })?;
            let envelope = time::command_envelope(
                "member.reset_scores",
                "ok",
                turn.now,
                serde_json::json!({ "reset": turn.value, "saved": turn.saved }),
            );
            output::emit(app.format, &envelope, || {
                format!("Scores reset for {} member(s).", turn.value)
            })
        }
    }
}
