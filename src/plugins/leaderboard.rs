//! Read-side views: the score ranking and the per-location chore board.

use crate::core::schemas;
use crate::core::snapshot::Snapshot;
use crate::core::time;
use crate::plugins::completion::query_eligibility;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub rank: usize,
    pub member: String,
    pub points: u64,
    pub medal: &'static str,
}

pub fn medal_for_rank(rank: usize) -> &'static str {
    match rank {
        1 => "🥇",
        2 => "🥈",
        3 => "🥉",
        _ => "🏅",
    }
}

/// Members by points descending, ties broken by name.
pub fn leaderboard(snapshot: &Snapshot) -> Vec<Standing> {
    let mut scores: Vec<(&String, u64)> = snapshot
        .members
        .iter()
        .map(|(name, member)| (name, member.points))
        .collect();
    scores.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    scores
        .into_iter()
        .enumerate()
        .map(|(i, (name, points))| Standing {
            rank: i + 1,
            member: name.clone(),
            points,
            medal: medal_for_rank(i + 1),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardEntry {
    pub chore: String,
    pub current_points: u32,
    pub base_points: u32,
    pub has_bonus: bool,
    /// Only set when at least one full day has passed.
    pub days_since_done: Option<i64>,
    pub last_completed_by: Option<String>,
    pub eligible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationGroup {
    pub location: String,
    pub chores: Vec<BoardEntry>,
}

/// Groups chores by location for `member`. Known locations come in
/// catalogue order, others follow alphabetically.
pub fn board(snapshot: &Snapshot, member: &str, now: DateTime<Utc>) -> Vec<LocationGroup> {
    let mut grouped: BTreeMap<&str, Vec<BoardEntry>> = BTreeMap::new();
    for (name, chore) in &snapshot.chores {
        let days_since_done = chore
            .last_completed_at
            .as_deref()
            .and_then(time::parse_ts)
            .map(|at| time::elapsed_days(at, now))
            .filter(|days| *days > 0);
        grouped
            .entry(chore.location.as_str())
            .or_default()
            .push(BoardEntry {
                chore: name.clone(),
                current_points: chore.current_points,
                base_points: chore.base_points,
                has_bonus: chore.has_bonus(),
                days_since_done,
                last_completed_by: chore.last_completed_by.clone(),
                eligible: query_eligibility(chore, member),
            });
    }

    let mut groups = Vec::with_capacity(grouped.len());
    for location in schemas::LOCATIONS {
        if let Some(chores) = grouped.remove(location) {
            groups.push(LocationGroup {
                location: location.to_string(),
                chores,
            });
        }
    }
    groups.extend(grouped.into_iter().map(|(location, chores)| LocationGroup {
        location: location.to_string(),
        chores,
    }));
    groups
}
