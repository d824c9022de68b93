use chrono::{TimeZone, Utc};
use std::cell::RefCell;
use std::collections::BTreeSet;
use taskgame::core::broker::{Access, SnapshotBroker};
use taskgame::core::error::TaskGameError;
use taskgame::core::snapshot::Snapshot;
use taskgame::core::store::{FallbackStore, LocalFileStore, SaveReport, SnapshotStore};
use taskgame::core::time::FixedClock;
use taskgame::plugins::accrual::AccrualPolicy;
use taskgame::plugins::chores::{add_chore, remove_chore, set_eligibility};
use taskgame::plugins::completion::{complete_chore, eligible_members};
use taskgame::plugins::members::{add_member, remove_member, reset_scores};
use tempfile::tempdir;

/// In-memory stand-in for the hosted store.
#[derive(Default)]
struct MemoryRemote {
    doc: RefCell<Option<Snapshot>>,
    down: bool,
}

impl SnapshotStore for MemoryRemote {
    fn load(&self) -> Result<Option<Snapshot>, TaskGameError> {
        if self.down {
            return Err(TaskGameError::RemoteError("connection refused".to_string()));
        }
        Ok(self.doc.borrow().clone())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<SaveReport, TaskGameError> {
        if self.down {
            return Err(TaskGameError::RemoteError("connection refused".to_string()));
        }
        *self.doc.borrow_mut() = Some(snapshot.clone());
        Ok(SaveReport {
            remote: Some(true),
            local: false,
        })
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

fn down() -> MemoryRemote {
    MemoryRemote {
        doc: RefCell::new(None),
        down: true,
    }
}

#[test]
fn member_lifecycle() {
    let mut snap = Snapshot::default_seed();
    add_member(&mut snap, "Zoé").unwrap();
    assert!(snap.has_member("Zoé"));

    set_eligibility(
        &mut snap,
        "Tailler les haies",
        Some(BTreeSet::from(["Zoé".to_string(), "Martin".to_string()])),
    )
    .unwrap();
    complete_chore(&mut snap, "Zoé", "Tailler les haies", Utc::now()).unwrap();
    assert_eq!(snap.members["Zoé"].points, 3);

    let removed = remove_member(&mut snap, "Zoé").unwrap();
    assert_eq!(removed.points, 3);
    let allowed = snap.chores["Tailler les haies"].eligible_members.clone().unwrap();
    assert_eq!(allowed, BTreeSet::from(["Martin".to_string()]));
    // History keeps the departed member's name.
    assert_eq!(
        snap.chores["Tailler les haies"].last_completed_by.as_deref(),
        Some("Zoé")
    );
}

#[test]
fn removing_sole_allowed_member_reopens_the_chore() {
    let mut snap = Snapshot::default_seed();
    set_eligibility(
        &mut snap,
        "Désherber",
        Some(BTreeSet::from(["Martin".to_string()])),
    )
    .unwrap();

    remove_member(&mut snap, "Martin").unwrap();
    let chore = &snap.chores["Désherber"];
    assert_eq!(chore.eligible_members, None);
    assert_eq!(eligible_members(&snap, chore).len(), 4);

    for member in snap.member_names() {
        let mut attempt = snap.clone();
        assert!(complete_chore(&mut attempt, &member, "Désherber", Utc::now()).is_ok());
    }
}

#[test]
fn last_member_cannot_be_removed() {
    let mut snap = Snapshot::default_seed();
    for name in ["Antoine", "Arthur", "Raphael", "Martin"] {
        remove_member(&mut snap, name).unwrap();
    }
    assert!(matches!(
        remove_member(&mut snap, "Perrinne"),
        Err(TaskGameError::ValidationError(_))
    ));
    assert!(matches!(
        remove_member(&mut snap, "Antoine"),
        Err(TaskGameError::NotFound(_))
    ));
}

#[test]
fn reset_scores_leaves_chores_alone() {
    let mut snap = Snapshot::default_seed();
    complete_chore(&mut snap, "Arthur", "Nettoyer le four", Utc::now()).unwrap();
    let chores = snap.chores.clone();
    reset_scores(&mut snap);
    assert!(snap.members.values().all(|m| m.points == 0));
    assert_eq!(snap.chores, chores);
}

#[test]
fn chore_catalogue_admin() {
    let mut snap = Snapshot::default_seed();
    add_chore(&mut snap, "Laver la voiture", 3, "Garage").unwrap();
    assert_eq!(snap.chores["Laver la voiture"].location, "Garage");
    assert_eq!(eligible_members(&snap, &snap.chores["Laver la voiture"]).len(), 5);

    set_eligibility(
        &mut snap,
        "Laver la voiture",
        Some(BTreeSet::from(["Raphael".to_string()])),
    )
    .unwrap();
    assert_eq!(
        eligible_members(&snap, &snap.chores["Laver la voiture"]),
        vec!["Raphael".to_string()]
    );

    remove_chore(&mut snap, "Laver la voiture").unwrap();
    assert!(!snap.chores.contains_key("Laver la voiture"));
    assert!(set_eligibility(&mut snap, "Laver la voiture", None).is_err());
}

#[test]
fn fallback_reads_local_when_remote_is_down() {
    let tmp = tempdir().unwrap();
    let local = LocalFileStore::new(tmp.path().join("data.json"));
    let mut seed = Snapshot::default_seed();
    seed.members.get_mut("Raphael").unwrap().points = 7;
    local.save(&seed).unwrap();

    let store = FallbackStore::new(Some(down()), local);
    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded.members["Raphael"].points, 7);
}

#[test]
fn fallback_prefers_remote_copy() {
    let tmp = tempdir().unwrap();
    let local = LocalFileStore::new(tmp.path().join("data.json"));
    local.save(&Snapshot::default_seed()).unwrap();

    let mut remote_doc = Snapshot::default_seed();
    remote_doc.members.get_mut("Martin").unwrap().points = 42;
    let remote = MemoryRemote {
        doc: RefCell::new(Some(remote_doc)),
        down: false,
    };
    let store = FallbackStore::new(Some(remote), local);
    assert_eq!(store.load().unwrap().unwrap().members["Martin"].points, 42);
}

#[test]
fn fallback_save_keeps_local_backup_when_remote_fails() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("data.json");
    let store = FallbackStore::new(Some(down()), LocalFileStore::new(&path));

    let report = store.save(&Snapshot::default_seed()).unwrap();
    assert_eq!(
        report,
        SaveReport {
            remote: Some(false),
            local: true
        }
    );
    assert!(path.exists());
}

#[test]
fn fallback_without_remote_reports_local_only() {
    let tmp = tempdir().unwrap();
    let store: FallbackStore<MemoryRemote> =
        FallbackStore::new(None, LocalFileStore::new(tmp.path().join("data.json")));
    assert!(!store.has_remote());
    assert!(store.load().unwrap().is_none());
    let report = store.save(&Snapshot::default_seed()).unwrap();
    assert_eq!(report.remote, None);
    assert!(report.local);
}

#[test]
fn broker_writes_both_copies() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("data.json");
    let store = FallbackStore::new(Some(MemoryRemote::default()), LocalFileStore::new(&path));
    let at = Utc.with_ymd_and_hms(2024, 6, 30, 18, 0, 0).unwrap();
    let broker = SnapshotBroker::new(store, FixedClock(at), AccrualPolicy::default());

    let turn = broker
        .with_snapshot("member.add", Access::Write, |snap, _| add_member(snap, "Zoé"))
        .unwrap();
    assert_eq!(
        turn.saved,
        Some(SaveReport {
            remote: Some(true),
            local: true
        })
    );
    assert!(broker.store().local().load().unwrap().unwrap().has_member("Zoé"));
    assert!(broker.store().load().unwrap().unwrap().has_member("Zoé"));
}

#[test]
fn legacy_document_is_normalized_on_load() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("data.json");
    std::fs::write(
        &path,
        serde_json::json!({
            "colocataires": { "Antoine": { "points": 5 } },
            "taches": {
                "Faire la vaisselle": {
                    "points_base": 0,
                    "lieu": "Cuisine",
                    "derniere_realisation": "",
                    "points_actuels": 0
                }
            }
        })
        .to_string(),
    )
    .unwrap();

    let at = Utc.with_ymd_and_hms(2024, 6, 30, 18, 0, 0).unwrap();
    let broker = SnapshotBroker::new(
        LocalFileStore::new(&path),
        FixedClock(at),
        AccrualPolicy::default(),
    );
    let snap = broker.load_refreshed(at).unwrap();
    let chore = &snap.chores["Faire la vaisselle"];
    assert_eq!(chore.base_points, 1);
    assert_eq!(chore.current_points, 1);
    assert!(chore.last_completed_at.is_none());
    assert_eq!(snap.members["Antoine"].points, 5);
}
