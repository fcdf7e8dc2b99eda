//! # Tracker State
//!
//! The six persisted collections and every rule that mutates them.
//!
//! `TrackerState` is plain data plus validation. It never touches storage;
//! [`crate::Tracker`] wraps it and persists whatever keys an operation
//! reports as touched.
//!
//! Gate order for a stat event: game unlocked, game exists, player on roster,
//! category tracked for the role, player present. The first failing gate is
//! reported and nothing is written. The lock comes first so a locked id stays
//! read-only even when an imported tree no longer lists its game.

use crate::aggregate::{self, GameSummary, SeasonTotals};
use crate::{
    AttendanceRecord, Category, Game, GameId, LockSet, LockTransition, NewPlayer, Player, PlayerId,
    Result, StatLine, StatRecord, TallyError, Team,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// =============================================================================
// STATE KEYS
// =============================================================================

/// One persisted record of the state tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StateKey {
    Team,
    Roster,
    Games,
    StatsByGame,
    AttendanceByGame,
    LockedGames,
}

impl StateKey {
    pub const ALL: [StateKey; 6] = [
        StateKey::Team,
        StateKey::Roster,
        StateKey::Games,
        StateKey::StatsByGame,
        StateKey::AttendanceByGame,
        StateKey::LockedGames,
    ];

    /// Record name, identical to the key in the backup document.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Roster => "roster",
            Self::Games => "games",
            Self::StatsByGame => "statsByGame",
            Self::AttendanceByGame => "attendanceByGame",
            Self::LockedGames => "lockedGames",
        }
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// TRACKER STATE
// =============================================================================

/// The whole state tree. Serializes to the backup document shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerState {
    #[serde(default)]
    team: Team,
    #[serde(default)]
    roster: Vec<Player>,
    #[serde(default)]
    games: Vec<Game>,
    #[serde(default)]
    stats_by_game: StatRecord,
    #[serde(default)]
    attendance_by_game: AttendanceRecord,
    #[serde(default)]
    locked_games: LockSet,
}

impl TrackerState {
    /// Fresh state: default team name, everything else empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Read access
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn team(&self) -> &Team {
        &self.team
    }

    #[must_use]
    pub fn roster(&self) -> &[Player] {
        &self.roster
    }

    #[must_use]
    pub fn games(&self) -> &[Game] {
        &self.games
    }

    #[must_use]
    pub fn stats(&self) -> &StatRecord {
        &self.stats_by_game
    }

    #[must_use]
    pub fn attendance(&self) -> &AttendanceRecord {
        &self.attendance_by_game
    }

    #[must_use]
    pub fn locks(&self) -> &LockSet {
        &self.locked_games
    }

    #[must_use]
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.roster.iter().find(|p| &p.id == id)
    }

    #[must_use]
    pub fn game(&self, id: &GameId) -> Option<&Game> {
        self.games.iter().find(|g| &g.id == id)
    }

    fn require_game(&self, id: &GameId) -> Result<&Game> {
        self.game(id).ok_or_else(|| TallyError::UnknownGame(id.clone()))
    }

    fn require_player(&self, id: &PlayerId) -> Result<&Player> {
        self.player(id)
            .ok_or_else(|| TallyError::UnknownPlayer(id.clone()))
    }

    #[must_use]
    pub fn is_locked(&self, game: &GameId) -> bool {
        self.locked_games.is_locked(game)
    }

    /// Whether a player may receive stat events for a game.
    #[must_use]
    pub fn is_eligible(&self, game: &GameId, player: &PlayerId) -> bool {
        self.attendance_by_game.is_present(game, player)
    }

    /// Roster players marked present for a game, in roster order.
    pub fn present_players(&self, game: &GameId) -> impl Iterator<Item = &Player> {
        self.roster
            .iter()
            .filter(move |p| self.attendance_by_game.is_present(game, &p.id))
    }

    /// Season totals, recomputed from the ledger on every call.
    #[must_use]
    pub fn season_totals(&self) -> SeasonTotals {
        aggregate::compute_season_totals(&self.games, &self.roster, &self.stats_by_game)
    }

    /// Summary of one game over the current roster.
    pub fn game_summary(&self, game: &GameId) -> Result<GameSummary> {
        let game = self.require_game(game)?;
        Ok(aggregate::game_summary(
            game,
            &self.roster,
            &self.stats_by_game,
            &self.attendance_by_game,
            &self.locked_games,
        ))
    }

    /// Summaries of every game, in game-list order.
    #[must_use]
    pub fn game_summaries(&self) -> Vec<GameSummary> {
        self.games
            .iter()
            .map(|game| {
                aggregate::game_summary(
                    game,
                    &self.roster,
                    &self.stats_by_game,
                    &self.attendance_by_game,
                    &self.locked_games,
                )
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Ids
    // -------------------------------------------------------------------------

    fn player_id_taken(&self, id: &PlayerId) -> bool {
        self.player(id).is_some()
            || self.stats_by_game.mentions_player(id)
            || self.attendance_by_game.mentions_player(id)
    }

    fn game_id_taken(&self, id: &GameId) -> bool {
        self.game(id).is_some()
            || self.stats_by_game.mentions_game(id)
            || self.attendance_by_game.mentions_game(id)
            || self.locked_games.mentions_game(id)
    }

    /// First unused player id at or after `seed`.
    ///
    /// Ids seen anywhere in the history count as used, so a removed player's
    /// id is never handed out again.
    #[must_use]
    pub fn fresh_player_id(&self, seed: u64) -> PlayerId {
        let mut n = seed;
        loop {
            let id = PlayerId(n.to_string());
            if !self.player_id_taken(&id) {
                return id;
            }
            n = n.wrapping_add(1);
        }
    }

    /// First unused game id at or after `seed`.
    #[must_use]
    pub fn fresh_game_id(&self, seed: u64) -> GameId {
        let mut n = seed;
        loop {
            let id = GameId(n.to_string());
            if !self.game_id_taken(&id) {
                return id;
            }
            n = n.wrapping_add(1);
        }
    }

    // -------------------------------------------------------------------------
    // Team and roster
    // -------------------------------------------------------------------------

    pub fn set_team_name(&mut self, name: impl Into<String>) -> &Team {
        self.team.name = name.into();
        &self.team
    }

    /// Add a player. Name and number are required; the id must be unused.
    pub fn add_player(&mut self, id: PlayerId, new: NewPlayer) -> Result<&Player> {
        let name = new.name.trim();
        let number = new.number.trim();
        if name.is_empty() {
            return Err(TallyError::InvalidPlayer("name is required".to_string()));
        }
        if number.is_empty() {
            return Err(TallyError::InvalidPlayer("number is required".to_string()));
        }
        if id.as_str().is_empty() {
            return Err(TallyError::InvalidPlayer("id is required".to_string()));
        }
        if self.player_id_taken(&id) {
            return Err(TallyError::DuplicateId(id.0));
        }

        let index = self.roster.len();
        self.roster.push(Player {
            id,
            name: name.to_string(),
            number: number.to_string(),
            role: new.role,
        });
        Ok(&self.roster[index])
    }

    /// Remove a player from the roster. Their history stays in the ledger.
    pub fn remove_player(&mut self, id: &PlayerId) -> Result<Player> {
        let index = self
            .roster
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| TallyError::UnknownPlayer(id.clone()))?;
        Ok(self.roster.remove(index))
    }

    // -------------------------------------------------------------------------
    // Games
    // -------------------------------------------------------------------------

    pub fn add_game(
        &mut self,
        id: GameId,
        opponent: impl Into<String>,
        date: NaiveDate,
    ) -> Result<&Game> {
        if id.as_str().is_empty() {
            return Err(TallyError::DuplicateId("empty game id".to_string()));
        }
        if self.game_id_taken(&id) {
            return Err(TallyError::DuplicateId(id.0));
        }

        let index = self.games.len();
        self.games.push(Game {
            id,
            opponent: opponent.into().trim().to_string(),
            date: Some(date),
        });
        Ok(&self.games[index])
    }

    // -------------------------------------------------------------------------
    // Attendance, ledger, lock
    // -------------------------------------------------------------------------

    /// Flip a player's presence for a game. Returns the new value.
    pub fn toggle_attendance(&mut self, game: &GameId, player: &PlayerId) -> Result<bool> {
        self.locked_games.ensure_unlocked(game)?;
        self.require_game(game)?;
        self.require_player(player)?;
        Ok(self.attendance_by_game.toggle(game, player))
    }

    /// Apply a counted event and return the player's updated line.
    pub fn apply_stat_event(
        &mut self,
        game: &GameId,
        player: &PlayerId,
        category: Category,
        delta: i64,
    ) -> Result<&StatLine> {
        self.locked_games.ensure_unlocked(game)?;
        self.require_game(game)?;

        let role = self.require_player(player)?.role;
        if !role.tracks(category) {
            return Err(TallyError::CategoryNotTracked { role, category });
        }
        if !self.is_eligible(game, player) {
            return Err(TallyError::NotPresent {
                game: game.clone(),
                player: player.clone(),
            });
        }

        Ok(self.stats_by_game.apply(game, player, category, delta))
    }

    /// Lock a game for good. Re-locking is a no-op.
    pub fn lock_game(&mut self, game: &GameId) -> Result<LockTransition> {
        self.require_game(game)?;
        Ok(self.locked_games.lock(game))
    }

    // -------------------------------------------------------------------------
    // Whole-tree checks
    // -------------------------------------------------------------------------

    /// Assemble a tree from decoded records.
    pub(crate) fn from_parts(
        team: Team,
        roster: Vec<Player>,
        games: Vec<Game>,
        stats_by_game: StatRecord,
        attendance_by_game: AttendanceRecord,
        locked_games: LockSet,
    ) -> Self {
        Self {
            team,
            roster,
            games,
            stats_by_game,
            attendance_by_game,
            locked_games,
        }
    }

    /// Structural checks for a tree that did not come from these operations
    /// (imports, stored records). Reports the offending record and problem.
    pub(crate) fn validate(&self) -> std::result::Result<(), (StateKey, String)> {
        let mut players = BTreeSet::new();
        for player in &self.roster {
            if player.id.as_str().is_empty() {
                return Err((StateKey::Roster, "player with an empty id".to_string()));
            }
            if !players.insert(&player.id) {
                return Err((
                    StateKey::Roster,
                    format!("duplicate player id '{}'", player.id),
                ));
            }
        }

        let mut games = BTreeSet::new();
        for game in &self.games {
            if game.id.as_str().is_empty() {
                return Err((StateKey::Games, "game with an empty id".to_string()));
            }
            if !games.insert(&game.id) {
                return Err((StateKey::Games, format!("duplicate game id '{}'", game.id)));
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::parse_date;
    use crate::{LockState, Role};

    fn seeded() -> (TrackerState, GameId, PlayerId, PlayerId) {
        let mut state = TrackerState::new();
        let game = state
            .add_game(GameId::new("g1"), "Ravens", parse_date("2025-04-12").unwrap())
            .unwrap()
            .id
            .clone();
        let runner = state
            .add_player(PlayerId::new("r1"), NewPlayer::new("Sam", "7", Role::Runner))
            .unwrap()
            .id
            .clone();
        let goalie = state
            .add_player(PlayerId::new("k1"), NewPlayer::new("Kit", "1", Role::Goalie))
            .unwrap()
            .id
            .clone();
        (state, game, runner, goalie)
    }

    #[test]
    fn new_state_has_default_team() {
        let state = TrackerState::new();
        assert_eq!(state.team().name, crate::DEFAULT_TEAM_NAME);
        assert!(state.roster().is_empty());
        assert!(state.games().is_empty());
    }

    #[test]
    fn add_player_requires_name_and_number() {
        let mut state = TrackerState::new();
        let err = state
            .add_player(PlayerId::new("1"), NewPlayer::new("  ", "7", Role::Runner))
            .unwrap_err();
        assert!(matches!(err, TallyError::InvalidPlayer(_)));

        let err = state
            .add_player(PlayerId::new("1"), NewPlayer::new("Sam", "", Role::Runner))
            .unwrap_err();
        assert!(matches!(err, TallyError::InvalidPlayer(_)));
        assert!(state.roster().is_empty());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let (mut state, game, runner, _) = seeded();
        let err = state
            .add_player(runner.clone(), NewPlayer::new("Other", "9", Role::Runner))
            .unwrap_err();
        assert_eq!(err, TallyError::DuplicateId(runner.0.clone()));

        let err = state
            .add_game(game.clone(), "Again", parse_date("2025-05-01").unwrap())
            .unwrap_err();
        assert_eq!(err, TallyError::DuplicateId(game.0));
    }

    #[test]
    fn stat_entry_requires_presence() {
        let (mut state, game, runner, _) = seeded();
        let err = state
            .apply_stat_event(&game, &runner, Category::Goals, 1)
            .unwrap_err();
        assert!(matches!(err, TallyError::NotPresent { .. }));

        assert!(state.toggle_attendance(&game, &runner).unwrap());
        let line = state
            .apply_stat_event(&game, &runner, Category::Goals, 1)
            .unwrap();
        assert_eq!(line.count(Category::Goals), 1);
    }

    #[test]
    fn category_must_match_role() {
        let (mut state, game, runner, goalie) = seeded();
        state.toggle_attendance(&game, &runner).unwrap();
        state.toggle_attendance(&game, &goalie).unwrap();

        let err = state
            .apply_stat_event(&game, &runner, Category::ShotsFaced, 1)
            .unwrap_err();
        assert_eq!(
            err,
            TallyError::CategoryNotTracked {
                role: Role::Runner,
                category: Category::ShotsFaced
            }
        );

        let err = state
            .apply_stat_event(&game, &goalie, Category::FaceOffsWon, 1)
            .unwrap_err();
        assert!(matches!(err, TallyError::CategoryNotTracked { .. }));
        assert!(state.stats().is_empty());
    }

    #[test]
    fn goalie_line_derives_saves() {
        let (mut state, game, _, goalie) = seeded();
        state.toggle_attendance(&game, &goalie).unwrap();
        state
            .apply_stat_event(&game, &goalie, Category::ShotsFaced, 10)
            .unwrap();
        let line = state
            .apply_stat_event(&game, &goalie, Category::GoalsAllowed, 3)
            .unwrap();

        let summary = line.saves().unwrap();
        assert_eq!(summary.saves, 7);
        assert_eq!(summary.save_percent.to_string(), "70.0");
    }

    #[test]
    fn locked_game_rejects_mutation() {
        let (mut state, game, runner, goalie) = seeded();
        state.toggle_attendance(&game, &runner).unwrap();
        state
            .apply_stat_event(&game, &runner, Category::Goals, 2)
            .unwrap();

        assert_eq!(state.lock_game(&game).unwrap(), LockTransition::Locked);
        let before = state.clone();

        let err = state
            .apply_stat_event(&game, &runner, Category::Goals, 1)
            .unwrap_err();
        assert_eq!(err, TallyError::LockedGame { game: game.clone() });

        let err = state.toggle_attendance(&game, &goalie).unwrap_err();
        assert!(err.is_locked_game());

        assert_eq!(state, before);
        // Reads are never gated.
        assert_eq!(
            state.stats().line(&game, &runner).unwrap().count(Category::Goals),
            2
        );
    }

    #[test]
    fn relock_is_idempotent() {
        let (mut state, game, _, _) = seeded();
        state.lock_game(&game).unwrap();
        let before = state.clone();

        assert_eq!(state.lock_game(&game).unwrap(), LockTransition::AlreadyLocked);
        assert_eq!(state, before);
        assert_eq!(state.locks().state(&game), LockState::Locked);
    }

    #[test]
    fn lock_gate_precedes_other_checks() {
        let (mut state, game, _, _) = seeded();
        state.lock_game(&game).unwrap();
        let err = state
            .apply_stat_event(&game, &PlayerId::new("nobody"), Category::Goals, 1)
            .unwrap_err();
        assert!(err.is_locked_game());
    }

    #[test]
    fn unknown_targets_are_reported() {
        let (mut state, game, runner, _) = seeded();
        let missing = GameId::new("nope");
        assert_eq!(
            state.toggle_attendance(&missing, &runner).unwrap_err(),
            TallyError::UnknownGame(missing.clone())
        );
        assert_eq!(
            state.lock_game(&missing).unwrap_err(),
            TallyError::UnknownGame(missing)
        );
        let ghost = PlayerId::new("ghost");
        assert_eq!(
            state.toggle_attendance(&game, &ghost).unwrap_err(),
            TallyError::UnknownPlayer(ghost)
        );
    }

    #[test]
    fn removal_keeps_history_and_blocks_id_reuse() {
        let (mut state, game, runner, _) = seeded();
        state.toggle_attendance(&game, &runner).unwrap();
        state
            .apply_stat_event(&game, &runner, Category::Assists, 1)
            .unwrap();

        let removed = state.remove_player(&runner).unwrap();
        assert_eq!(removed.name, "Sam");
        assert!(state.player(&runner).is_none());
        assert!(state.stats().line(&game, &runner).is_some());
        assert_eq!(state.season_totals().total(&runner, Category::Assists), 1);

        let err = state
            .add_player(runner.clone(), NewPlayer::new("New", "2", Role::Runner))
            .unwrap_err();
        assert!(matches!(err, TallyError::DuplicateId(_)));
    }

    #[test]
    fn fresh_ids_skip_history() {
        let mut state = TrackerState::new();
        let game = state
            .add_game(GameId::new("100"), "A", parse_date("2025-01-01").unwrap())
            .unwrap()
            .id
            .clone();
        state
            .add_player(PlayerId::new("100"), NewPlayer::new("A", "1", Role::Runner))
            .unwrap();
        state
            .toggle_attendance(&game, &PlayerId::new("100"))
            .unwrap();
        state.remove_player(&PlayerId::new("100")).unwrap();

        assert_eq!(state.fresh_player_id(100), PlayerId::new("101"));
        assert_eq!(state.fresh_game_id(100), GameId::new("101"));
        assert_eq!(state.fresh_game_id(5), GameId::new("5"));
    }

    #[test]
    fn present_players_follow_roster_order() {
        let (mut state, game, runner, goalie) = seeded();
        state.toggle_attendance(&game, &goalie).unwrap();
        state.toggle_attendance(&game, &runner).unwrap();

        let names: Vec<_> = state.present_players(&game).map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Sam", "Kit"]);
    }

    #[test]
    fn lock_gate_applies_to_unlisted_games() {
        let doc = r#"{
            "roster": [{"id": "p", "name": "Sam", "number": "7", "role": "runner"}],
            "lockedGames": {"ghost": true}
        }"#;
        let mut state: TrackerState = serde_json::from_str(doc).unwrap();
        let ghost = GameId::new("ghost");
        let player = PlayerId::new("p");

        let err = state
            .apply_stat_event(&ghost, &player, Category::Goals, 1)
            .unwrap_err();
        assert!(err.is_locked_game());
        let err = state.toggle_attendance(&ghost, &player).unwrap_err();
        assert!(err.is_locked_game());

        let err = state
            .apply_stat_event(&GameId::new("other"), &player, Category::Goals, 1)
            .unwrap_err();
        assert!(matches!(err, TallyError::UnknownGame(_)));
    }

    #[test]
    fn validate_finds_duplicates() {
        let doc = r#"{"roster": [
            {"id": "1", "name": "A", "number": "1", "role": "runner"},
            {"id": "1", "name": "B", "number": "2", "role": "runner"}
        ]}"#;
        let state: TrackerState = serde_json::from_str(doc).unwrap();
        let (key, reason) = state.validate().unwrap_err();
        assert_eq!(key, StateKey::Roster);
        assert!(reason.contains("duplicate player id"));
        assert!(TrackerState::new().validate().is_ok());
    }
}
