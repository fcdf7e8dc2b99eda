//! # Game Lock
//!
//! A per-game, one-way gate: `UNLOCKED -> LOCKED`. There is no unlock.
//! Locked games reject every ledger and attendance mutation; reads are never
//! gated, so recorded values stay visible.

use crate::{GameId, Result, TallyError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lock status of one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unlocked,
    Locked,
}

/// Outcome of a lock request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTransition {
    /// The game moved `UNLOCKED -> LOCKED`.
    Locked,
    /// The game was already locked; nothing changed.
    AlreadyLocked,
}

/// game -> locked.
///
/// Persisted as `{"<gameId>": true}`. Only `true` entries mean locked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockSet(BTreeMap<GameId, bool>);

impl LockSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self, game: &GameId) -> LockState {
        if self.is_locked(game) {
            LockState::Locked
        } else {
            LockState::Unlocked
        }
    }

    #[must_use]
    pub fn is_locked(&self, game: &GameId) -> bool {
        self.0.get(game).copied().unwrap_or(false)
    }

    /// Fails with [`TallyError::LockedGame`] if the game is locked.
    pub fn ensure_unlocked(&self, game: &GameId) -> Result<()> {
        if self.is_locked(game) {
            return Err(TallyError::LockedGame { game: game.clone() });
        }
        Ok(())
    }

    /// Locked games, in id order.
    pub fn locked(&self) -> impl Iterator<Item = &GameId> {
        self.0.iter().filter(|(_, locked)| **locked).map(|(id, _)| id)
    }

    #[must_use]
    pub fn mentions_game(&self, game: &GameId) -> bool {
        self.0.contains_key(game)
    }

    /// Lock a game. Idempotent: re-locking reports
    /// [`LockTransition::AlreadyLocked`] and leaves the set unchanged.
    pub(crate) fn lock(&mut self, game: &GameId) -> LockTransition {
        if self.is_locked(game) {
            return LockTransition::AlreadyLocked;
        }
        self.0.insert(game.clone(), true);
        LockTransition::Locked
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn games_start_unlocked() {
        let locks = LockSet::new();
        let game = GameId::new("g");
        assert_eq!(locks.state(&game), LockState::Unlocked);
        assert!(locks.ensure_unlocked(&game).is_ok());
    }

    #[test]
    fn lock_is_one_way_and_idempotent() {
        let mut locks = LockSet::new();
        let game = GameId::new("g");

        assert_eq!(locks.lock(&game), LockTransition::Locked);
        let snapshot = locks.clone();

        assert_eq!(locks.lock(&game), LockTransition::AlreadyLocked);
        assert_eq!(locks, snapshot);
        assert_eq!(locks.state(&game), LockState::Locked);
    }

    #[test]
    fn ensure_unlocked_reports_game() {
        let mut locks = LockSet::new();
        let game = GameId::new("g");
        locks.lock(&game);

        let err = locks.ensure_unlocked(&game).unwrap_err();
        assert_eq!(err, TallyError::LockedGame { game });
    }

    #[test]
    fn false_entries_are_unlocked() {
        let locks: LockSet = serde_json::from_str(r#"{"g1": false, "g2": true}"#).unwrap();
        assert!(!locks.is_locked(&GameId::new("g1")));
        assert!(locks.is_locked(&GameId::new("g2")));

        let locked: Vec<_> = locks.locked().map(GameId::as_str).collect();
        assert_eq!(locked, vec!["g2"]);
    }
}
