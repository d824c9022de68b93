use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::BTreeSet;
use taskgame::core::broker::{Access, SnapshotBroker};
use taskgame::core::error::TaskGameError;
use taskgame::core::snapshot::Snapshot;
use taskgame::core::store::{LocalFileStore, SnapshotStore};
use taskgame::core::time::{FixedClock, format_ts};
use taskgame::plugins::accrual::{AccrualPolicy, compute_current_points, refresh_all};
use taskgame::plugins::completion::{Completion, complete_chore, query_eligibility};
use taskgame::plugins::leaderboard::leaderboard;
use tempfile::tempdir;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 30, 18, 0, 0).unwrap()
}

fn done_days_ago(snap: &mut Snapshot, chore: &str, days: i64) {
    let chore = snap.chores.get_mut(chore).unwrap();
    chore.last_completed_at = Some(format_ts(now() - Duration::days(days)));
    chore.last_completed_by = Some("Arthur".to_string());
}

#[test]
fn accrued_value_follows_the_weekly_steps() {
    let mut snap = Snapshot::default_seed();
    done_days_ago(&mut snap, "Faire la vaisselle", 15);
    done_days_ago(&mut snap, "Sortir les poubelles", 22);
    done_days_ago(&mut snap, "Désherber", 6);
    refresh_all(&mut snap, now());

    assert_eq!(snap.chores["Faire la vaisselle"].current_points, 4);
    assert_eq!(snap.chores["Sortir les poubelles"].current_points, 4);
    assert_eq!(snap.chores["Désherber"].current_points, 2);
    // never completed: base value only
    assert_eq!(snap.chores["Nettoyer le four"].current_points, 3);
}

#[test]
fn bonus_is_capped_and_value_stays_in_range() {
    let mut snap = Snapshot::default_seed();
    let names: Vec<String> = snap.chores.keys().cloned().collect();
    for (i, name) in names.iter().enumerate() {
        done_days_ago(&mut snap, name, (i as i64) * 9);
    }
    refresh_all(&mut snap, now());

    for chore in snap.chores.values() {
        assert!(chore.current_points >= chore.base_points);
        assert!(chore.current_points <= chore.base_points + 3);
        assert_eq!(compute_current_points(chore, now()), chore.current_points);
    }
    assert_eq!(
        snap.chores
            .values()
            .filter(|c| c.current_points == c.base_points + 3)
            .count(),
        names.len() - 3
    );
}

#[test]
fn accrual_is_monotonic_in_time() {
    let mut snap = Snapshot::default_seed();
    done_days_ago(&mut snap, "Tondre la pelouse", 0);
    let chore = &snap.chores["Tondre la pelouse"];
    let mut previous = 0;
    for day in 0..60 {
        let value = compute_current_points(chore, now() + Duration::days(day));
        assert!(value >= previous);
        previous = value;
    }
    assert_eq!(previous, 6);
}

#[test]
fn refresh_is_idempotent_at_a_fixed_instant() {
    let mut snap = Snapshot::default_seed();
    done_days_ago(&mut snap, "Faire la vaisselle", 15);
    done_days_ago(&mut snap, "Sortir les poubelles", 1);
    snap.chores.get_mut("Désherber").unwrap().last_completed_at = Some("n/a".to_string());

    refresh_all(&mut snap, now());
    let once = snap.clone();
    refresh_all(&mut snap, now());
    assert_eq!(snap, once);

    // 15 days done is still two full weeks at 20 days.
    refresh_all(&mut snap, now() + Duration::days(5));
    assert_eq!(snap, once);
}

#[test]
fn malformed_timestamp_falls_back_to_base() {
    let mut snap = Snapshot::default_seed();
    snap.chores.get_mut("Faire la vaisselle").unwrap().last_completed_at =
        Some("hier soir".to_string());
    refresh_all(&mut snap, now());
    assert_eq!(snap.chores["Faire la vaisselle"].current_points, 2);
}

#[test]
fn custom_policy_changes_step_and_cap() {
    let policy = AccrualPolicy {
        days_per_step: 3,
        max_bonus: 5,
    };
    let mut snap = Snapshot::default_seed();
    done_days_ago(&mut snap, "Balayer la cour", 10);
    policy.refresh_all(&mut snap, now());
    assert_eq!(snap.chores["Balayer la cour"].current_points, 4);

    done_days_ago(&mut snap, "Balayer la cour", 40);
    policy.refresh_all(&mut snap, now());
    assert_eq!(snap.chores["Balayer la cour"].current_points, 6);
}

#[test]
fn completion_awards_accrued_value_and_resets_the_chore() {
    let mut snap = Snapshot::default_seed();
    snap.members.get_mut("Antoine").unwrap().points = 5;
    done_days_ago(&mut snap, "Faire la vaisselle", 15);
    refresh_all(&mut snap, now());

    let outcome = complete_chore(&mut snap, "Antoine", "Faire la vaisselle", now()).unwrap();
    let Completion::Awarded(award) = outcome else {
        panic!("expected an award");
    };
    assert_eq!(award.points_awarded, 4);
    assert_eq!(award.member_total, 9);
    assert_eq!(snap.members["Antoine"].points, 9);

    let chore = &snap.chores["Faire la vaisselle"];
    assert_eq!(chore.current_points, chore.base_points);
    assert_eq!(chore.last_completed_by.as_deref(), Some("Antoine"));
    assert_eq!(chore.last_completed_at.as_deref(), Some(format_ts(now()).as_str()));

    // Doing it again right away is worth the base value.
    refresh_all(&mut snap, now());
    let again = complete_chore(&mut snap, "Antoine", "Faire la vaisselle", now()).unwrap();
    assert_eq!(again.points_awarded(), 2);
    assert_eq!(snap.members["Antoine"].points, 11);
}

#[test]
fn completion_only_touches_the_actor_and_the_chore() {
    let mut snap = Snapshot::default_seed();
    refresh_all(&mut snap, now());
    let before = snap.clone();
    complete_chore(&mut snap, "Martin", "Nettoyer le four", now()).unwrap();

    for (name, member) in &snap.members {
        if name != "Martin" {
            assert_eq!(member, &before.members[name]);
        }
    }
    for (name, chore) in &snap.chores {
        if name != "Nettoyer le four" {
            assert_eq!(chore, &before.chores[name]);
        }
    }
}

#[test]
fn unknown_chore_is_a_no_op() {
    let mut snap = Snapshot::default_seed();
    refresh_all(&mut snap, now());
    let before = snap.clone();
    let outcome = complete_chore(&mut snap, "Antoine", "Repeindre la façade", now()).unwrap();
    assert!(!outcome.is_applied());
    assert_eq!(outcome.points_awarded(), 0);
    assert_eq!(snap, before);
}

#[test]
fn restricted_chore_rejects_other_members() {
    let mut snap = Snapshot::default_seed();
    snap.chores.get_mut("Tondre la pelouse").unwrap().eligible_members =
        Some(BTreeSet::from(["Martin".to_string(), "Arthur".to_string()]));
    refresh_all(&mut snap, now());
    let chore = &snap.chores["Tondre la pelouse"];
    assert!(query_eligibility(chore, "Martin"));
    assert!(!query_eligibility(chore, "Antoine"));

    let before = snap.clone();
    let err = complete_chore(&mut snap, "Antoine", "Tondre la pelouse", now()).unwrap_err();
    assert!(matches!(err, TaskGameError::IneligibleMember { .. }));
    assert_eq!(snap, before);

    complete_chore(&mut snap, "Arthur", "Tondre la pelouse", now()).unwrap();
    assert_eq!(snap.members["Arthur"].points, 3);
}

#[test]
fn open_chore_accepts_every_member() {
    let mut snap = Snapshot::default_seed();
    let chore = &snap.chores["Arroser les plantes"];
    for member in snap.member_names() {
        assert!(query_eligibility(chore, &member));
    }
    assert!(complete_chore(&mut snap, "Ghost", "Arroser les plantes", now()).is_err());
}

#[test]
fn leaderboard_reflects_completions() {
    let mut snap = Snapshot::default_seed();
    refresh_all(&mut snap, now());
    complete_chore(&mut snap, "Perrinne", "Nettoyer la douche 1er", now()).unwrap();
    complete_chore(&mut snap, "Raphael", "Balayer la cour", now()).unwrap();

    let standings = leaderboard(&snap);
    assert_eq!(standings[0].member, "Perrinne");
    assert_eq!(standings[0].points, 3);
    assert_eq!(standings[1].member, "Raphael");
    assert_eq!(standings.len(), 5);
}

#[test]
fn broker_refreshes_then_completes_and_persists() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("data.json");
    let store = LocalFileStore::new(&path);

    let mut seed = Snapshot::default_seed();
    seed.members.get_mut("Antoine").unwrap().points = 5;
    done_days_ago(&mut seed, "Faire la vaisselle", 15);
    store.save(&seed).unwrap();

    let broker = SnapshotBroker::new(store, FixedClock(now()), AccrualPolicy::default());
    let turn = broker
        .with_snapshot("done", Access::Write, |snap, at| {
            complete_chore(snap, "Antoine", "Faire la vaisselle", at)
        })
        .unwrap();
    assert_eq!(turn.value.points_awarded(), 4);
    assert!(turn.saved.is_some());

    let stored = LocalFileStore::new(&path).load().unwrap().unwrap();
    assert_eq!(stored.members["Antoine"].points, 9);
    assert_eq!(stored.chores["Faire la vaisselle"].current_points, 2);
}

#[test]
fn concurrent_writers_last_save_wins() {
    let tmp = tempdir().unwrap();
    let store = LocalFileStore::new(tmp.path().join("data.json"));
    store.save(&Snapshot::default_seed()).unwrap();

    let mut first = store.load().unwrap().unwrap();
    let mut second = store.load().unwrap().unwrap();
    refresh_all(&mut first, now());
    refresh_all(&mut second, now());

    complete_chore(&mut first, "Antoine", "Nettoyer le four", now()).unwrap();
    complete_chore(&mut second, "Martin", "Tondre la pelouse", now()).unwrap();
    store.save(&first).unwrap();
    store.save(&second).unwrap();

    let stored = store.load().unwrap().unwrap();
    assert_eq!(stored.members["Martin"].points, 3);
    assert_eq!(stored.members["Antoine"].points, 0);
    assert!(stored.chores["Nettoyer le four"].last_completed_at.is_none());
}
