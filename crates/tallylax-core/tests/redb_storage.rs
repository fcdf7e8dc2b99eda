//! Integration tests for the redb storage backend.

#![allow(clippy::unwrap_used, clippy::panic)]

use tallylax_core::{
    Category, NewPlayer, RedbStorage, Role, StateKey, Storage, TallyError, Tracker, TrackerState,
    parse_date,
};
use tempfile::TempDir;

fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn fresh_database_loads_default_state() {
    let temp = create_temp_dir();
    let storage = RedbStorage::open(temp.path().join("state.redb")).unwrap();

    assert_eq!(storage.load().unwrap(), TrackerState::new());
    assert!(storage.stored_keys().unwrap().is_empty());
}

#[test]
fn only_touched_keys_are_written() {
    let temp = create_temp_dir();
    let storage = RedbStorage::open(temp.path().join("state.redb")).unwrap();
    let mut tracker = Tracker::open(storage).unwrap();

    let _ = tracker.set_team_name("Hawks");
    assert_eq!(tracker.storage().stored_keys().unwrap(), vec![StateKey::Team]);

    let _ = tracker
        .add_player(10, NewPlayer::new("Sam", "7", Role::Runner))
        .unwrap();
    assert_eq!(
        tracker.storage().stored_keys().unwrap(),
        vec![StateKey::Team, StateKey::Roster]
    );
}

#[test]
fn state_survives_reopen() {
    let temp = create_temp_dir();
    let path = temp.path().join("state.redb");

    let expected = {
        let mut tracker = Tracker::open(RedbStorage::open(&path).unwrap()).unwrap();
        let game = tracker
            .add_game(1, "Ravens", parse_date("2025-04-12").unwrap())
            .unwrap()
            .into_value()
            .id;
        let keeper = tracker
            .add_player(1, NewPlayer::new("Kit", "30", Role::Goalie))
            .unwrap()
            .into_value()
            .id;
        let _ = tracker.toggle_attendance(&game, &keeper).unwrap();
        let _ = tracker
            .apply_stat_event(&game, &keeper, Category::ShotsFaced, 10)
            .unwrap();
        let _ = tracker
            .apply_stat_event(&game, &keeper, Category::GoalsAllowed, 3)
            .unwrap();
        let _ = tracker.lock_game(&game).unwrap();
        tracker.state().clone()
    };

    let reopened = Tracker::open(RedbStorage::open(&path).unwrap()).unwrap();
    assert_eq!(reopened.state(), &expected);

    let totals = reopened.season_totals();
    let keeper = &reopened.state().roster()[0].id;
    let saves = totals.get(keeper).unwrap().saves().unwrap();
    assert_eq!(saves.saves, 7);
    assert_eq!(saves.save_percent.to_string(), "70.0");
}

#[test]
fn clear_removes_every_record() {
    let temp = create_temp_dir();
    let path = temp.path().join("state.redb");
    let mut tracker = Tracker::open(RedbStorage::open(&path).unwrap()).unwrap();
    let _ = tracker.set_team_name("Hawks");
    tracker.flush().unwrap();
    assert_eq!(tracker.storage().stored_keys().unwrap().len(), StateKey::ALL.len());

    let applied = tracker.reset(true).unwrap();
    assert!(applied.is_persisted());
    assert!(tracker.storage().stored_keys().unwrap().is_empty());
    assert_eq!(tracker.storage().load().unwrap(), TrackerState::new());
}

#[test]
fn corrupt_record_is_reported() {
    let temp = create_temp_dir();
    let path = temp.path().join("state.redb");
    {
        let mut storage = RedbStorage::open(&path).unwrap();
        // A valid write followed by a hand-corrupted roster record.
        storage.persist(&TrackerState::new(), &StateKey::ALL).unwrap();
    }
    {
        let db = redb::Database::create(&path).unwrap();
        let table: redb::TableDefinition<&str, &[u8]> = redb::TableDefinition::new("state");
        let txn = db.begin_write().unwrap();
        {
            let mut t = txn.open_table(table).unwrap();
            t.insert("roster", b"{\"not\": \"a list\"}".as_slice()).unwrap();
        }
        txn.commit().unwrap();
    }

    let err = Tracker::open(RedbStorage::open(&path).unwrap()).unwrap_err();
    assert!(matches!(err, TallyError::CorruptRecord { key: "roster", .. }));
}
