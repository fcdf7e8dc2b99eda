//! # Stat Ledger
//!
//! Per-game, per-player counters.
//!
//! A [`StatLine`] holds one player's counts for one game plus, for goalie
//! counters, the derived `Saves` / `Save %` pair. Counts never go below zero:
//! a delta that would take a counter negative clamps it at 0. The derived
//! pair is recomputed right after any write to `Shots Faced` or
//! `Goals Allowed` and is never written directly.
//!
//! The ledger itself does not know about locks or attendance; those gates
//! run in [`crate::state`] before a delta ever reaches [`StatRecord`].

use crate::{Category, GameId, PlayerId};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Persisted key of the derived save count.
pub const SAVES_KEY: &str = "Saves";

/// Persisted key of the derived save percentage.
pub const SAVE_PERCENT_KEY: &str = "Save %";

// =============================================================================
// SAVE PERCENT
// =============================================================================

/// Save percentage with one decimal of precision, stored as integer tenths.
///
/// `70.0%` is `tenths == 700`. Displays as `"70.0"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct SavePercent {
    tenths: u32,
}

impl SavePercent {
    /// `100 * saves / shots`, rounded half-up to one decimal.
    /// Zero shots gives `0.0` regardless of saves.
    #[must_use]
    pub fn from_counts(saves: u64, shots: u64) -> Self {
        if shots == 0 {
            return Self::default();
        }
        // tenths = round(1000 * saves / shots) = floor((2000 * saves + shots) / (2 * shots))
        let numerator = saves.saturating_mul(2000).saturating_add(shots);
        let tenths = numerator / shots.saturating_mul(2);
        Self {
            tenths: tenths.min(u64::from(u32::MAX)) as u32,
        }
    }

    #[must_use]
    pub fn tenths(self) -> u32 {
        self.tenths
    }
}

impl fmt::Display for SavePercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.tenths / 10, self.tenths % 10)
    }
}

impl Serialize for SavePercent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// =============================================================================
// SAVE SUMMARY
// =============================================================================

/// Derived goalie fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SaveSummary {
    pub saves: u64,
    pub save_percent: SavePercent,
}

impl SaveSummary {
    /// `Saves = max(0, shots_faced - goals_allowed)`, percentage from that.
    #[must_use]
    pub fn from_counts(shots_faced: u64, goals_allowed: u64) -> Self {
        let saves = shots_faced.saturating_sub(goals_allowed);
        Self {
            saves,
            save_percent: SavePercent::from_counts(saves, shots_faced),
        }
    }
}

// =============================================================================
// STAT LINE
// =============================================================================

/// One player's counts for one game.
///
/// Persisted as a flat map, e.g.
/// `{"Shots Faced": 10, "Goals Allowed": 3, "Saves": 7, "Save %": "70.0"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatLine {
    counts: BTreeMap<Category, u32>,
    saves: Option<SaveSummary>,
}

impl StatLine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current count for a category; missing entries read as 0.
    #[must_use]
    pub fn count(&self, category: Category) -> u32 {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    /// Categories that have been written at least once, in category order.
    pub fn counts(&self) -> impl Iterator<Item = (Category, u32)> + '_ {
        self.counts.iter().map(|(c, n)| (*c, *n))
    }

    /// Derived goalie fields, present once a goalie counter was written.
    #[must_use]
    pub fn saves(&self) -> Option<SaveSummary> {
        self.saves
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Apply `delta` to a counter, clamping at zero. Returns the new count.
    pub fn apply(&mut self, category: Category, delta: i64) -> u32 {
        let current = i64::from(self.count(category));
        let next = current
            .saturating_add(delta)
            .clamp(0, i64::from(u32::MAX)) as u32;
        self.counts.insert(category, next);

        if category.feeds_saves() {
            self.recompute_saves();
        }
        next
    }

    fn recompute_saves(&mut self) {
        self.saves = Some(SaveSummary::from_counts(
            u64::from(self.count(Category::ShotsFaced)),
            u64::from(self.count(Category::GoalsAllowed)),
        ));
    }
}

impl Serialize for StatLine {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let derived = if self.saves.is_some() { 2 } else { 0 };
        let mut map = serializer.serialize_map(Some(self.counts.len() + derived))?;
        for (category, count) in &self.counts {
            map.serialize_entry(category.name(), count)?;
        }
        if let Some(summary) = &self.saves {
            map.serialize_entry(SAVES_KEY, &summary.saves)?;
            map.serialize_entry(SAVE_PERCENT_KEY, &summary.save_percent)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for StatLine {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(StatLineVisitor)
    }
}

struct StatLineVisitor;

impl<'de> Visitor<'de> for StatLineVisitor {
    type Value = StatLine;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of stat category names to non-negative counts")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<StatLine, A::Error> {
        let mut line = StatLine::default();
        let mut has_derived = false;

        while let Some(key) = access.next_key::<String>()? {
            match key.as_str() {
                // Derived values are read to keep the stream aligned, then
                // recomputed from the counters below.
                SAVES_KEY => {
                    let _stored: u64 = access.next_value()?;
                    has_derived = true;
                }
                SAVE_PERCENT_KEY => {
                    let _stored: String = access.next_value()?;
                    has_derived = true;
                }
                name => {
                    let category = Category::from_name(name).ok_or_else(|| {
                        de::Error::custom(format!("unknown stat category '{name}'"))
                    })?;
                    let count: u32 = access.next_value()?;
                    line.counts.insert(category, count);
                }
            }
        }

        if has_derived || line.counts.keys().any(|c| c.feeds_saves()) {
            line.recompute_saves();
        }
        Ok(line)
    }
}

// =============================================================================
// STAT RECORD
// =============================================================================

/// Stat lines of one game, keyed by player.
pub type GameLedger = BTreeMap<PlayerId, StatLine>;

/// The whole ledger: game -> player -> [`StatLine`].
///
/// Entries are created lazily on first write and only disappear through a
/// full reset or import. Player removal does not touch them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatRecord(BTreeMap<GameId, GameLedger>);

impl StatRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn line(&self, game: &GameId, player: &PlayerId) -> Option<&StatLine> {
        self.0.get(game)?.get(player)
    }

    #[must_use]
    pub fn game(&self, game: &GameId) -> Option<&GameLedger> {
        self.0.get(game)
    }

    /// All games with at least one stat line, in id order.
    pub fn games(&self) -> impl Iterator<Item = (&GameId, &GameLedger)> {
        self.0.iter()
    }

    #[must_use]
    pub fn mentions_player(&self, player: &PlayerId) -> bool {
        self.0.values().any(|ledger| ledger.contains_key(player))
    }

    #[must_use]
    pub fn mentions_game(&self, game: &GameId) -> bool {
        self.0.contains_key(game)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Apply a delta without any gating. Callers must have checked the lock
    /// state, attendance and category first.
    pub(crate) fn apply(
        &mut self,
        game: &GameId,
        player: &PlayerId,
        category: Category,
        delta: i64,
    ) -> &StatLine {
        let line = self
            .0
            .entry(game.clone())
            .or_default()
            .entry(player.clone())
            .or_default();
        line.apply(category, delta);
        line
    }
}

// =============================================================================
// TESTS
// =============================================================================
