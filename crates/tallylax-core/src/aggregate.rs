//! # Aggregation Engine
//!
//! Read-only folds over the ledger: season totals and per-game summaries.
//!
//! Nothing here is cached. Every call recomputes from the ledger, so the
//! result always reflects the current state.
//!
//! ## Category choice
//!
//! Each player is folded over their own role's category list. A goalie's
//! season line therefore carries `Shots Faced` / `Goals Allowed` and a
//! season `Saves` / `Save %` derived from those sums. Ids that are no longer
//! on the roster take their role from the ledger: any recorded goalie-only
//! category (`Shots Faced`, `Goals Allowed`) makes them a goalie, otherwise
//! they are folded over the runner list.

use crate::{
    AttendanceRecord, Category, Game, GameId, LockSet, Player, PlayerId, Role, SaveSummary,
    StatLine, StatRecord,
};
use serde::Serialize;
use std::collections::BTreeMap;

// =============================================================================
// SEASON TOTALS
// =============================================================================

/// One player's season totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonLine {
    /// Role used for the fold (inferred from the ledger for ids not on the
    /// roster).
    pub role: Role,
    /// False when the id has stats but is no longer on the roster.
    pub on_roster: bool,
    totals: BTreeMap<Category, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    saves: Option<SaveSummary>,
}

impl SeasonLine {
    fn zeroed(role: Role, on_roster: bool) -> Self {
        Self {
            role,
            on_roster,
            totals: role.categories().iter().map(|c| (*c, 0)).collect(),
            saves: None,
        }
    }

    fn absorb(&mut self, line: &StatLine) {
        for category in self.role.categories() {
            let total = self.totals.entry(*category).or_insert(0);
            *total = total.saturating_add(u64::from(line.count(*category)));
        }
    }

    fn finish(&mut self) {
        if self.role == Role::Goalie {
            self.saves = Some(SaveSummary::from_counts(
                self.total(Category::ShotsFaced),
                self.total(Category::GoalsAllowed),
            ));
        }
    }

    /// Season total for a category (0 for categories outside the role).
    #[must_use]
    pub fn total(&self, category: Category) -> u64 {
        self.totals.get(&category).copied().unwrap_or(0)
    }

    /// Totals for every category of the role, in category order.
    pub fn totals(&self) -> impl Iterator<Item = (Category, u64)> + '_ {
        self.totals.iter().map(|(c, n)| (*c, *n))
    }

    /// Season save summary, goalies only.
    #[must_use]
    pub fn saves(&self) -> Option<SaveSummary> {
        self.saves
    }
}

/// player -> [`SeasonLine`]; only ids with at least one stat line appear.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SeasonTotals(BTreeMap<PlayerId, SeasonLine>);

impl SeasonTotals {
    #[must_use]
    pub fn get(&self, player: &PlayerId) -> Option<&SeasonLine> {
        self.0.get(player)
    }

    /// Total for one player and category; players without stats read as 0.
    #[must_use]
    pub fn total(&self, player: &PlayerId, category: Category) -> u64 {
        self.0.get(player).map_or(0, |line| line.total(category))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlayerId, &SeasonLine)> {
        self.0.iter()
    }

    /// Ids with totals that are no longer on the roster.
    pub fn orphans(&self) -> impl Iterator<Item = &PlayerId> {
        self.0
            .iter()
            .filter(|(_, line)| !line.on_roster)
            .map(|(id, _)| id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Fold every game's ledger into season totals.
///
/// Walks `games` in list order and each game's players in id order. Ledger
/// entries for game ids not in `games` are ignored. Players that have no
/// line in a game contribute nothing for that game.
#[must_use]
pub fn compute_season_totals(games: &[Game], roster: &[Player], stats: &StatRecord) -> SeasonTotals {
    let roles: BTreeMap<&PlayerId, Role> = roster.iter().map(|p| (&p.id, p.role)).collect();
    let mut played: BTreeMap<&PlayerId, Vec<&StatLine>> = BTreeMap::new();

    for game in games {
        let Some(ledger) = stats.game(&game.id) else {
            continue;
        };
        for (player, line) in ledger {
            played.entry(player).or_default().push(line);
        }
    }

    let lines = played
        .into_iter()
        .map(|(player, lines)| {
            let listed = roles.get(player).copied();
            let role = listed.unwrap_or_else(|| recorded_role(&lines));
            let mut season = SeasonLine::zeroed(role, listed.is_some());
            for line in lines {
                season.absorb(line);
            }
            season.finish();
            (player.clone(), season)
        })
        .collect();
    SeasonTotals(lines)
}

/// Role of an id that left the roster, judged by what was recorded for it.
fn recorded_role(lines: &[&StatLine]) -> Role {
    let goalie_only = lines
        .iter()
        .flat_map(|line| line.counts())
        .any(|(category, n)| n > 0 && !Role::Runner.tracks(category));
    if goalie_only { Role::Goalie } else { Role::Runner }
}

// =============================================================================
// GAME SUMMARY
// =============================================================================

/// One roster player's line in a game summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub player: Player,
    pub present: bool,
    /// Empty when nothing was recorded.
    pub line: StatLine,
}

/// A game with one row per current roster player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    pub game: Game,
    pub locked: bool,
    pub rows: Vec<SummaryRow>,
}

/// Build the summary of one game over the current roster, in roster order.
#[must_use]
pub fn game_summary(
    game: &Game,
    roster: &[Player],
    stats: &StatRecord,
    attendance: &AttendanceRecord,
    locks: &LockSet,
) -> GameSummary {
    let rows = roster
        .iter()
        .map(|player| SummaryRow {
            player: player.clone(),
            present: attendance.is_present(&game.id, &player.id),
            line: stats
                .line(&game.id, &player.id)
                .cloned()
                .unwrap_or_default(),
        })
        .collect();

    GameSummary {
        game: game.clone(),
        locked: locks.is_locked(&game.id),
        rows,
    }
}

/// Game ids referenced by the ledger but missing from the game list.
pub fn unlisted_games<'a>(games: &[Game], stats: &'a StatRecord) -> Vec<&'a GameId> {
    stats
        .games()
        .map(|(id, _)| id)
        .filter(|id| !games.iter().any(|g| &g.id == *id))
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
