//! Completion transaction and eligibility.
//!
//! Completing a chore cashes in its accrued value for the acting member and
//! restarts its timer. All checks run before the first write, so a rejected
//! completion leaves the snapshot exactly as it was.

use crate::core::error::TaskGameError;
use crate::core::snapshot::{Chore, Snapshot};
use crate::core::time;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Award {
    pub chore: String,
    pub member: String,
    pub points_awarded: u32,
    pub member_total: u64,
    pub completed_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Completion {
    Awarded(Award),
    /// The chore does not exist; nothing was changed.
    UnknownChore { chore: String },
}

impl Completion {
    pub fn points_awarded(&self) -> u32 {
        match self {
            Completion::Awarded(award) => award.points_awarded,
            Completion::UnknownChore { .. } => 0,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Completion::Awarded(_))
    }
}

/// A member may complete a chore when the chore is open to everyone or the
/// member is on its allow-list.
pub fn query_eligibility(chore: &Chore, member: &str) -> bool {
    match &chore.eligible_members {
        None => true,
        Some(allowed) => allowed.contains(member),
    }
}

/// Current members allowed to complete `chore`.
pub fn eligible_members(snapshot: &Snapshot, chore: &Chore) -> Vec<String> {
    snapshot
        .members
        .keys()
        .filter(|name| query_eligibility(chore, name))
        .cloned()
        .collect()
}

/// Awards `member` the chore's cached `current_points` and resets the chore.
///
/// The caller is expected to have refreshed the snapshot for `now` first.
/// An unknown chore is a no-op; an unknown or ineligible member is an error.
pub fn complete_chore(
    snapshot: &mut Snapshot,
    member: &str,
    chore_name: &str,
    now: DateTime<Utc>,
) -> Result<Completion, TaskGameError> {
    let Some(chore) = snapshot.chores.get(chore_name) else {
        return Ok(Completion::UnknownChore {
            chore: chore_name.to_string(),
        });
    };
    if !snapshot.has_member(member) {
        return Err(TaskGameError::UnknownMember(member.to_string()));
    }
    if !query_eligibility(chore, member) {
        return Err(TaskGameError::IneligibleMember {
            member: member.to_string(),
            chore: chore_name.to_string(),
        });
    }

    let points_awarded = chore.current_points;
    let completed_at = time::format_ts(now);

    let member_total = match snapshot.members.get_mut(member) {
        Some(record) => {
            record.points = record.points.saturating_add(u64::from(points_awarded));
            record.points
        }
        None => return Err(TaskGameError::UnknownMember(member.to_string())),
    };
    if let Some(chore) = snapshot.chores.get_mut(chore_name) {
        chore.last_completed_at = Some(completed_at.clone());
        chore.last_completed_by = Some(member.to_string());
        chore.current_points = chore.base_points;
    }

    Ok(Completion::Awarded(Award {
        chore: chore_name.to_string(),
        member: member.to_string(),
        points_awarded,
        member_total,
        completed_at,
    }))
}

/// Pending "is it really done?" prompts, keyed by chore name.
///
/// Owned by the presentation layer for the length of one interaction; it is
/// never written into the snapshot.
#[derive(Debug, Default, Clone)]
pub struct ConfirmationState {
    pending: HashSet<String>,
}

impl ConfirmationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, chore: &str) {
        self.pending.insert(chore.to_string());
    }

    pub fn is_pending(&self, chore: &str) -> bool {
        self.pending.contains(chore)
    }

    /// Consumes the pending flag. Returns false when nothing was pending.
    pub fn confirm(&mut self, chore: &str) -> bool {
        self.pending.remove(chore)
    }

    pub fn cancel(&mut self, chore: &str) {
        self.pending.remove(chore);
    }
}
