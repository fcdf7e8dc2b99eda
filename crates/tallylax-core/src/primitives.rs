//! # Primitives
//!
//! Identifier newtypes and the small entities of the data model:
//! [`Team`], [`Player`] and [`Game`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Team name used when nothing has been configured yet.
pub const DEFAULT_TEAM_NAME: &str = "My Team";

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique, immutable player identifier.
///
/// Ids outlive roster membership: a removed player's id keeps keying its
/// historical ledger and attendance entries.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

/// Unique, immutable game identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub String);

impl PlayerId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl GameId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// TEAM
// =============================================================================

/// The single team this tracker belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    #[serde(default = "default_team_name")]
    pub name: String,
}

fn default_team_name() -> String {
    DEFAULT_TEAM_NAME.to_string()
}

impl Default for Team {
    fn default() -> Self {
        Self {
            name: default_team_name(),
        }
    }
}

// =============================================================================
// PLAYER
// =============================================================================

/// Playing role. Decides which stat categories apply to a player.
///
/// Role is fixed when the player is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Runner,
    Goalie,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Runner => "runner",
            Self::Goalie => "goalie",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = crate::TallyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "runner" => Ok(Self::Runner),
            "goalie" => Ok(Self::Goalie),
            other => Err(crate::TallyError::InvalidPlayer(format!(
                "unknown role '{other}' (expected runner or goalie)"
            ))),
        }
    }
}

/// A roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Jersey number, kept as text ("00" and "7" are different numbers).
    pub number: String,
    pub role: Role,
}

/// Input for the roster-add operation. The id is assigned separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlayer {
    pub name: String,
    pub number: String,
    pub role: Role,
}

impl NewPlayer {
    #[must_use]
    pub fn new(name: impl Into<String>, number: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            number: number.into(),
            role,
        }
    }
}

// =============================================================================
// GAME
// =============================================================================

/// A scheduled or played match. Fields never change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub opponent: String,
    /// Calendar date, persisted as `YYYY-MM-DD`. A cleared date is `None`
    /// and persists as `""`.
    #[serde(with = "blank_date")]
    pub date: Option<NaiveDate>,
}

impl Game {
    /// Human label used in tables, e.g. `2025-04-12 vs Ravens`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} vs {}", self.date_text(), self.opponent)
    }

    /// The date as `YYYY-MM-DD`, or `"no date"`.
    #[must_use]
    pub fn date_text(&self) -> String {
        self.date
            .map_or_else(|| "no date".to_string(), |d| d.to_string())
    }
}

/// `Option<NaiveDate>` as a string where `""` means no date.
mod blank_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.collect_str(date),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|e| de::Error::custom(format!("invalid date '{raw}': {e}")))
    }
}

/// Parse an ISO calendar date (`YYYY-MM-DD`).
pub fn parse_date(raw: &str) -> crate::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| crate::TallyError::InvalidDate(format!("'{raw}': {e}")))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_defaults_to_my_team() {
        assert_eq!(Team::default().name, DEFAULT_TEAM_NAME);

        let team: Team = serde_json::from_str("{}").unwrap();
        assert_eq!(team.name, DEFAULT_TEAM_NAME);
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Goalie".parse::<Role>().unwrap(), Role::Goalie);
        assert_eq!(" runner ".parse::<Role>().unwrap(), Role::Runner);
        assert!("defense".parse::<Role>().is_err());
    }

    #[test]
    fn player_json_shape() {
        let player = Player {
            id: PlayerId::new("1712345678901"),
            name: "Alex".to_string(),
            number: "12".to_string(),
            role: Role::Goalie,
        };
        let json = serde_json::to_value(&player).unwrap();
        assert_eq!(json["id"], "1712345678901");
        assert_eq!(json["role"], "goalie");
    }

    #[test]
    fn game_date_is_iso() {
        let game = Game {
            id: GameId::new("g1"),
            opponent: "Ravens".to_string(),
            date: Some(parse_date("2025-04-12").unwrap()),
        };
        let json = serde_json::to_value(&game).unwrap();
        assert_eq!(json["date"], "2025-04-12");
        assert_eq!(game.label(), "2025-04-12 vs Ravens");
    }

    #[test]
    fn cleared_game_date_round_trips_as_blank() {
        let game: Game =
            serde_json::from_str(r#"{"id": "1", "opponent": "Owls", "date": ""}"#).unwrap();
        assert_eq!(game.date, None);
        assert_eq!(game.label(), "no date vs Owls");

        let json = serde_json::to_value(&game).unwrap();
        assert_eq!(json["date"], "");
    }

    #[test]
    fn malformed_game_date_is_rejected() {
        let result: Result<Game, _> =
            serde_json::from_str(r#"{"id": "1", "opponent": "Owls", "date": "April 12"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert!(parse_date("12/04/2025").is_err());
        assert!(parse_date("2025-02-30").is_err());
    }
}
