//! # TallyLax Core
//!
//! The deterministic stat engine behind TallyLax.
//!
//! The core is split into small components, leaves first:
//!
//! - [`ledger`]: per-game, per-player counters and the derived goalie fields
//! - [`attendance`]: which roster players were present for a game
//! - [`lock`]: the one-way `UNLOCKED -> LOCKED` gate per game
//! - [`aggregate`]: season totals and per-game summaries, folded on demand
//! - [`state`]: the six persisted collections and every mutation rule
//! - [`tracker`]: the single controller that mutates state and persists it
//!
//! Persistence formats live in [`formats`] and the storage seam in [`storage`].
//! All collections are `BTreeMap`-backed and no floating point is used, so the
//! same sequence of operations always yields byte-identical exports.

pub mod aggregate;
pub mod attendance;
pub mod category;
pub mod error;
pub mod formats;
pub mod ledger;
pub mod lock;
pub mod primitives;
pub mod state;
pub mod storage;
pub mod tracker;

pub use aggregate::{GameSummary, SeasonLine, SeasonTotals, SummaryRow, compute_season_totals};
pub use attendance::AttendanceRecord;
pub use category::{ALL_CATEGORIES, Category, GOALIE_CATEGORIES, RUNNER_CATEGORIES};
pub use error::{Result, TallyError};
pub use ledger::{SavePercent, SaveSummary, StatLine, StatRecord};
pub use lock::{LockSet, LockState, LockTransition};
pub use primitives::{
    DEFAULT_TEAM_NAME, Game, GameId, NewPlayer, Player, PlayerId, Role, Team, parse_date,
};
pub use state::{StateKey, TrackerState};
pub use storage::{MemoryStorage, RedbStorage, Storage};
pub use tracker::{Applied, Tracker};
