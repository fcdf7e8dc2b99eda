//! # Stat Categories
//!
//! The closed set of counted statistics and the per-role category lists.
//!
//! Categories are persisted by their display name (`"Shots on Net"`), so the
//! stored documents stay human-readable. Unknown names are rejected at the
//! boundary instead of being carried around as free-form keys.

use crate::Role;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A counted statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    ShotsTaken,
    ShotsOnNet,
    Goals,
    PowerPlayGoals,
    ShortHandedGoals,
    Assists,
    LooseBalls,
    BlockedShots,
    CausedTurnovers,
    Turnovers,
    FaceOffsTaken,
    FaceOffsWon,
    PenaltyMinutes,
    ShotsFaced,
    GoalsAllowed,
}

/// Categories tracked for runners, in display order.
pub const RUNNER_CATEGORIES: [Category; 13] = [
    Category::ShotsTaken,
    Category::ShotsOnNet,
    Category::Goals,
    Category::PowerPlayGoals,
    Category::ShortHandedGoals,
    Category::Assists,
    Category::LooseBalls,
    Category::BlockedShots,
    Category::CausedTurnovers,
    Category::Turnovers,
    Category::FaceOffsTaken,
    Category::FaceOffsWon,
    Category::PenaltyMinutes,
];

/// Categories tracked for goalies, in display order.
pub const GOALIE_CATEGORIES: [Category; 4] = [
    Category::ShotsFaced,
    Category::GoalsAllowed,
    Category::Goals,
    Category::Assists,
];

/// Every category, runner list first then goalie-only entries.
pub const ALL_CATEGORIES: [Category; 15] = [
    Category::ShotsTaken,
    Category::ShotsOnNet,
    Category::Goals,
    Category::PowerPlayGoals,
    Category::ShortHandedGoals,
    Category::Assists,
    Category::LooseBalls,
    Category::BlockedShots,
    Category::CausedTurnovers,
    Category::Turnovers,
    Category::FaceOffsTaken,
    Category::FaceOffsWon,
    Category::PenaltyMinutes,
    Category::ShotsFaced,
    Category::GoalsAllowed,
];

impl Category {
    /// Display (and persisted) name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ShotsTaken => "Shots Taken",
            Self::ShotsOnNet => "Shots on Net",
            Self::Goals => "Goals",
            Self::PowerPlayGoals => "Power Play Goals",
            Self::ShortHandedGoals => "Short Handed Goals",
            Self::Assists => "Assists",
            Self::LooseBalls => "Loose Balls",
            Self::BlockedShots => "Blocked Shots",
            Self::CausedTurnovers => "Caused Turnovers",
            Self::Turnovers => "Turnovers",
            Self::FaceOffsTaken => "Face Offs Taken",
            Self::FaceOffsWon => "Face Offs Won",
            Self::PenaltyMinutes => "Penalty Minutes",
            Self::ShotsFaced => "Shots Faced",
            Self::GoalsAllowed => "Goals Allowed",
        }
    }

    /// Exact lookup by display name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_CATEGORIES.into_iter().find(|c| c.name() == name)
    }

    /// Lenient lookup for typed input: ignores case, spaces, `-` and `_`,
    /// so `shots-on-net`, `ShotsOnNet` and `Shots on Net` all match.
    #[must_use]
    pub fn parse_loose(input: &str) -> Option<Self> {
        let wanted = squash(input);
        ALL_CATEGORIES
            .into_iter()
            .find(|c| squash(c.name()) == wanted)
    }

    /// Whether writes to this category change the derived goalie fields.
    #[must_use]
    pub fn feeds_saves(self) -> bool {
        matches!(self, Self::ShotsFaced | Self::GoalsAllowed)
    }
}

fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

impl Role {
    /// Categories a player of this role can record.
    #[must_use]
    pub fn categories(self) -> &'static [Category] {
        match self {
            Self::Runner => &RUNNER_CATEGORIES,
            Self::Goalie => &GOALIE_CATEGORIES,
        }
    }

    #[must_use]
    pub fn tracks(self, category: Category) -> bool {
        self.categories().contains(&category)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Category {
    type Err = crate::TallyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_loose(s).ok_or_else(|| crate::TallyError::UnknownCategory(s.to_string()))
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Self::from_name(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown stat category '{name}'")))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for category in ALL_CATEGORIES {
            assert_eq!(Category::from_name(category.name()), Some(category));
        }
        assert_eq!(Category::from_name("Saves"), None);
    }

    #[test]
    fn loose_parsing() {
        assert_eq!(Category::parse_loose("shots-on-net"), Some(Category::ShotsOnNet));
        assert_eq!(Category::parse_loose("FaceOffsWon"), Some(Category::FaceOffsWon));
        assert_eq!(Category::parse_loose("goals_allowed"), Some(Category::GoalsAllowed));
        assert_eq!(Category::parse_loose("touchdowns"), None);
    }

    #[test]
    fn role_lists_differ() {
        assert!(Role::Runner.tracks(Category::LooseBalls));
        assert!(!Role::Runner.tracks(Category::ShotsFaced));
        assert!(Role::Goalie.tracks(Category::ShotsFaced));
        assert!(Role::Goalie.tracks(Category::Goals));
        assert!(!Role::Goalie.tracks(Category::FaceOffsWon));
    }

    #[test]
    fn only_goalie_counters_feed_saves() {
        let feeding: Vec<_> = ALL_CATEGORIES.into_iter().filter(|c| c.feeds_saves()).collect();
        assert_eq!(feeding, vec![Category::ShotsFaced, Category::GoalsAllowed]);
    }

    #[test]
    fn serializes_as_display_name() {
        let json = serde_json::to_string(&Category::PowerPlayGoals).unwrap();
        assert_eq!(json, "\"Power Play Goals\"");
        let back: Category = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Category::PowerPlayGoals);
        assert!(serde_json::from_str::<Category>("\"Dunks\"").is_err());
    }
}
