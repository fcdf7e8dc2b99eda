//! # Attendance Register
//!
//! Per-game presence flags. A player is stat-eligible for a game only while
//! their flag for that game is `true`; missing entries read as absent.

use crate::{GameId, PlayerId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// game -> player -> present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttendanceRecord(BTreeMap<GameId, BTreeMap<PlayerId, bool>>);

impl AttendanceRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `AttendanceRecord[game]?.[player] == true`.
    #[must_use]
    pub fn is_present(&self, game: &GameId, player: &PlayerId) -> bool {
        self.0
            .get(game)
            .and_then(|flags| flags.get(player))
            .copied()
            .unwrap_or(false)
    }

    /// Player ids marked present for a game, in id order.
    pub fn present(&self, game: &GameId) -> impl Iterator<Item = &PlayerId> {
        self.0
            .get(game)
            .into_iter()
            .flat_map(|flags| flags.iter().filter(|(_, here)| **here).map(|(id, _)| id))
    }

    #[must_use]
    pub fn mentions_player(&self, player: &PlayerId) -> bool {
        self.0.values().any(|flags| flags.contains_key(player))
    }

    #[must_use]
    pub fn mentions_game(&self, game: &GameId) -> bool {
        self.0.contains_key(game)
    }

    /// Flip a flag (a missing entry counts as absent, so the first toggle
    /// marks the player present). Returns the new value.
    ///
    /// Ungated: the lock check runs in [`crate::state`].
    pub(crate) fn toggle(&mut self, game: &GameId, player: &PlayerId) -> bool {
        let flag = self
            .0
            .entry(game.clone())
            .or_default()
            .entry(player.clone())
            .or_insert(false);
        *flag = !*flag;
        *flag
    }
}

// =============================================================================
// TESTS
// =============================================================================
