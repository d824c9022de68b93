//! Accrual engine: how a chore's reward grows while nobody does it.
//!
//! A chore is worth its base points plus one bonus point per full step of
//! days since it was last completed, up to a cap. The value is a pure
//! function of the chore record and the current instant; the cached
//! `current_points` field is only ever a copy of that result.

use crate::core::snapshot::{Chore, Snapshot};
use crate::core::time;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DAYS_PER_BONUS_STEP: u32 = 7;
pub const MAX_BONUS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccrualPolicy {
    /// Full days needed for each bonus point. Must be at least 1.
    pub days_per_step: u32,
    pub max_bonus: u32,
}

impl Default for AccrualPolicy {
    fn default() -> Self {
        Self {
            days_per_step: DAYS_PER_BONUS_STEP,
            max_bonus: MAX_BONUS,
        }
    }
}

impl AccrualPolicy {
    pub fn bonus_for_days(&self, elapsed_days: i64) -> u32 {
        if elapsed_days <= 0 {
            return 0;
        }
        let step = i64::from(self.days_per_step.max(1));
        let steps = elapsed_days / step;
        steps.min(i64::from(self.max_bonus)) as u32
    }

    /// Base points plus the time bonus. A missing or unparsable completion
    /// timestamp is treated as never completed.
    pub fn current_points(&self, chore: &Chore, now: DateTime<Utc>) -> u32 {
        let Some(completed_at) = chore.last_completed_at.as_deref().and_then(time::parse_ts) else {
            return chore.base_points;
        };
        let days = time::elapsed_days(completed_at, now);
        chore.base_points.saturating_add(self.bonus_for_days(days))
    }

    /// Rewrites every chore's cached `current_points`. Touches nothing else.
    pub fn refresh_all(&self, snapshot: &mut Snapshot, now: DateTime<Utc>) {
        for chore in snapshot.chores.values_mut() {
            chore.current_points = self.current_points(chore, now);
        }
    }
}

pub fn compute_current_points(chore: &Chore, now: DateTime<Utc>) -> u32 {
    AccrualPolicy::default().current_points(chore, now)
}

pub fn refresh_all(snapshot: &mut Snapshot, now: DateTime<Utc>) {
    AccrualPolicy::default().refresh_all(snapshot, now)
}
