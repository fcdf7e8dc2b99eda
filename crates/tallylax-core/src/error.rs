//! # Errors
//!
//! Every failure in the core is local and recoverable; none is fatal to the
//! process and nothing is retried.

use crate::{Category, GameId, PlayerId, Role};
use thiserror::Error;

/// Errors raised by the TallyLax core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TallyError {
    /// A stat event or attendance toggle targeted a locked game.
    /// State is unchanged.
    #[error("game {game} is locked; its stats and attendance are read-only")]
    LockedGame { game: GameId },

    /// A backup document failed to parse or had an unexpected shape.
    /// State is unchanged.
    #[error("malformed import: {0}")]
    MalformedImport(String),

    /// The state could not be serialized for export.
    #[error("export failed: {0}")]
    Export(String),

    /// Writing the durable copy failed. The in-memory state is kept.
    #[error("failed to persist state: {0}")]
    StoragePersist(String),

    /// Opening or reading the durable copy failed.
    #[error("failed to load state: {0}")]
    StorageLoad(String),

    /// A stored record exists but does not decode.
    #[error("stored record '{key}' is corrupt: {reason}")]
    CorruptRecord { key: &'static str, reason: String },

    #[error("unknown game: {0}")]
    UnknownGame(GameId),

    #[error("unknown player: {0}")]
    UnknownPlayer(PlayerId),

    #[error("unknown stat category: {0}")]
    UnknownCategory(String),

    /// The category exists but is not recorded for the player's role.
    #[error("{category} is not tracked for a {role}")]
    CategoryNotTracked { role: Role, category: Category },

    /// Stats can only be entered for players marked present.
    #[error("player {player} is not marked present for game {game}")]
    NotPresent { game: GameId, player: PlayerId },

    #[error("invalid player: {0}")]
    InvalidPlayer(String),

    #[error("invalid date {0}")]
    InvalidDate(String),

    #[error("id already in use: {0}")]
    DuplicateId(String),

    /// Full reset was requested without explicit confirmation.
    #[error("reset requires explicit confirmation")]
    ResetNotConfirmed,
}

impl TallyError {
    /// True for the lock gate rejection.
    #[must_use]
    pub fn is_locked_game(&self) -> bool {
        matches!(self, Self::LockedGame { .. })
    }
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, TallyError>;
