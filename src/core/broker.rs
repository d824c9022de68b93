use crate::core::error::TaskGameError;
use crate::core::snapshot::Snapshot;
use crate::core::store::{SaveReport, SnapshotStore};
use crate::core::time::{self, Clock};
use crate::plugins::accrual::AccrualPolicy;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// Result of one turn.
#[derive(Debug)]
pub struct Turn<R> {
    pub value: R,
    pub now: DateTime<Utc>,
    /// `None` when nothing was written.
    pub saved: Option<SaveReport>,
    pub fingerprint: String,
}

/// The snapshot broker is the only path from a command to stored state.
/// Each call is one request cycle: load, normalize, refresh, run the
/// operation, and save when a write actually changed something.
pub struct SnapshotBroker<S: SnapshotStore, C: Clock> {
    store: S,
    clock: C,
    policy: AccrualPolicy,
}

impl<S: SnapshotStore, C: Clock> SnapshotBroker<S, C> {
    pub fn new(store: S, clock: C, policy: AccrualPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> AccrualPolicy {
        self.policy
    }

    /// Loads the stored snapshot, or the default household when the store
    /// is empty, normalized and refreshed for `now`.
    pub fn load_refreshed(&self, now: DateTime<Utc>) -> Result<Snapshot, TaskGameError> {
        let mut snapshot = match self.store.load()? {
            Some(snapshot) => snapshot,
            None => {
                info!(store = %self.store.describe(), "no stored snapshot, starting from the default household");
                Snapshot::default_seed()
            }
        };
        snapshot.normalize();
        self.policy.refresh_all(&mut snapshot, now);
        Ok(snapshot)
    }

    /// Execute `f` against a freshly loaded snapshot.
    pub fn with_snapshot<F, R>(&self, op_name: &str, access: Access, f: F) -> Result<Turn<R>, TaskGameError>
    where
        F: FnOnce(&mut Snapshot, DateTime<Utc>) -> Result<R, TaskGameError>,
    {
        let now = self.clock.now();
        let mut snapshot = self.load_refreshed(now)?;
        let before = snapshot.fingerprint();

        let value = f(&mut snapshot, now)?;

        let after = snapshot.fingerprint();
        let saved = if access == Access::Write && before != after {
            snapshot.last_updated = Some(time::format_ts(now));
            let report = self.store.save(&snapshot)?;
            info!(op = op_name, store = %self.store.describe(), "snapshot saved");
            Some(report)
        } else {
            debug!(op = op_name, "snapshot unchanged, nothing saved");
            None
        };

        Ok(Turn {
            value,
            now,
            saved,
            fingerprint: after,
        })
    }

    /// Writes `snapshot` as is, bypassing load. Used to seed a new project.
    pub fn replace(&self, mut snapshot: Snapshot) -> Result<SaveReport, TaskGameError> {
        let now = self.clock.now();
        snapshot.normalize();
        self.policy.refresh_all(&mut snapshot, now);
        if snapshot.created_at.is_none() {
            snapshot.created_at = Some(time::format_ts(now));
        }
        snapshot.last_updated = Some(time::format_ts(now));
        self.store.save(&snapshot)
    }
}
