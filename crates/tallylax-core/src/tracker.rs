//! # Tracker
//!
//! The single controller over the state tree.
//!
//! A `Tracker` owns one [`TrackerState`] and one [`Storage`] backend and is
//! the only way to mutate either. Each mutating call validates, applies the
//! change in memory, then writes the records it touched. A failed write is
//! handed back in [`Applied::persist_error`]; the in-memory change stands.
//! Keys whose write failed stay pending and ride along with every later
//! write until one succeeds, so the next successful write supersedes the
//! failed one even when it touches a different record.

use crate::aggregate::{GameSummary, SeasonTotals};
use crate::formats;
use crate::{
    Category, Game, GameId, LockTransition, NewPlayer, Player, PlayerId, Result, StatLine,
    StateKey, Storage, TallyError, Team, TrackerState,
};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Result of a mutation that was applied in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Applied<T> {
    /// What the operation produced.
    pub value: T,
    /// Set when the durable copy could not be written.
    pub persist_error: Option<TallyError>,
}

impl<T> Applied<T> {
    fn clean(value: T) -> Self {
        Self {
            value,
            persist_error: None,
        }
    }

    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.persist_error.is_none()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// The store: state tree plus its durable mirror.
#[derive(Debug)]
pub struct Tracker<S: Storage> {
    state: TrackerState,
    storage: S,
    /// Keys whose last write failed.
    pending: BTreeSet<StateKey>,
}

impl<S: Storage> Tracker<S> {
    /// Load the stored tree and take ownership of the backend.
    pub fn open(storage: S) -> Result<Self> {
        let state = storage.load()?;
        Ok(Self {
            state,
            storage,
            pending: BTreeSet::new(),
        })
    }

    #[must_use]
    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Records not yet written since a failed write.
    pub fn pending_keys(&self) -> impl Iterator<Item = StateKey> + '_ {
        self.pending.iter().copied()
    }

    fn commit<T>(&mut self, value: T, keys: &[StateKey]) -> Applied<T> {
        self.pending.extend(keys.iter().copied());
        let keys: Vec<StateKey> = self.pending.iter().copied().collect();
        let persist_error = self.storage.persist(&self.state, &keys).err();
        if persist_error.is_none() {
            self.pending.clear();
        }
        Applied {
            value,
            persist_error,
        }
    }

    /// Write every record, e.g. after a previous write failed.
    pub fn flush(&mut self) -> Result<()> {
        self.storage.persist(&self.state, &StateKey::ALL)?;
        self.pending.clear();
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Team, roster, games
    // -------------------------------------------------------------------------

    pub fn set_team_name(&mut self, name: impl Into<String>) -> Applied<Team> {
        let team = self.state.set_team_name(name).clone();
        self.commit(team, &[StateKey::Team])
    }

    /// Add a player under the first free id at or after `id_seed`.
    pub fn add_player(&mut self, id_seed: u64, new: NewPlayer) -> Result<Applied<Player>> {
        let id = self.state.fresh_player_id(id_seed);
        let player = self.state.add_player(id, new)?.clone();
        Ok(self.commit(player, &[StateKey::Roster]))
    }

    pub fn remove_player(&mut self, id: &PlayerId) -> Result<Applied<Player>> {
        let player = self.state.remove_player(id)?;
        Ok(self.commit(player, &[StateKey::Roster]))
    }

    /// Add a game under the first free id at or after `id_seed`.
    pub fn add_game(
        &mut self,
        id_seed: u64,
        opponent: impl Into<String>,
        date: NaiveDate,
    ) -> Result<Applied<Game>> {
        let id = self.state.fresh_game_id(id_seed);
        let game = self.state.add_game(id, opponent, date)?.clone();
        Ok(self.commit(game, &[StateKey::Games]))
    }

    // -------------------------------------------------------------------------
    // Attendance, ledger, lock
    // -------------------------------------------------------------------------

    pub fn toggle_attendance(&mut self, game: &GameId, player: &PlayerId) -> Result<Applied<bool>> {
        let present = self.state.toggle_attendance(game, player)?;
        Ok(self.commit(present, &[StateKey::AttendanceByGame]))
    }

    /// Apply a stat event; returns the player's full updated line.
    pub fn apply_stat_event(
        &mut self,
        game: &GameId,
        player: &PlayerId,
        category: Category,
        delta: i64,
    ) -> Result<Applied<StatLine>> {
        let line = self
            .state
            .apply_stat_event(game, player, category, delta)?
            .clone();
        Ok(self.commit(line, &[StateKey::StatsByGame]))
    }

    /// Lock a game. Re-locking succeeds without writing anything.
    pub fn lock_game(&mut self, game: &GameId) -> Result<Applied<LockTransition>> {
        match self.state.lock_game(game)? {
            LockTransition::Locked => Ok(self.commit(LockTransition::Locked, &[StateKey::LockedGames])),
            LockTransition::AlreadyLocked => Ok(Applied::clean(LockTransition::AlreadyLocked)),
        }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn is_eligible(&self, game: &GameId, player: &PlayerId) -> bool {
        self.state.is_eligible(game, player)
    }

    #[must_use]
    pub fn season_totals(&self) -> SeasonTotals {
        self.state.season_totals()
    }

    pub fn game_summary(&self, game: &GameId) -> Result<GameSummary> {
        self.state.game_summary(game)
    }

    // -------------------------------------------------------------------------
    // Bulk operations
    // -------------------------------------------------------------------------

    pub fn export_json(&self) -> Result<String> {
        formats::export_json(&self.state)
    }

    /// Replace the whole tree with a backup document.
    ///
    /// The document is parsed and checked before anything is replaced, so a
    /// malformed document leaves the current tree untouched.
    pub fn import_json(&mut self, document: &str) -> Result<Applied<()>> {
        self.state = formats::import_json(document)?;
        Ok(self.commit((), &StateKey::ALL))
    }

    /// Drop every stored record and return to the default tree.
    /// Irreversible, so the caller must pass `confirmed = true`.
    pub fn reset(&mut self, confirmed: bool) -> Result<Applied<()>> {
        if !confirmed {
            return Err(TallyError::ResetNotConfirmed);
        }
        self.state = TrackerState::new();
        let persist_error = self.storage.clear().err();
        if persist_error.is_none() {
            self.pending.clear();
        } else {
            self.pending.extend(StateKey::ALL);
        }
        Ok(Applied {
            value: (),
            persist_error,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
