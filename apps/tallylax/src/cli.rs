//! # CLI Commands
//!
//! One `cmd_*` function per subcommand. Each opens the configured backend,
//! runs one tracker operation, prints the outcome and returns.
//!
//! A failed write of the durable copy is not fatal: the change was applied
//! and the next successful write supersedes it, so it is logged as a warning
//! and the command still succeeds.

use crate::config::Backend;
use crate::file_store::FileStorage;
use crate::report;
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde_json::json;
use std::path::Path;
use tallylax_core::formats::BACKUP_FILE_NAME;
use tallylax_core::{
    Applied, Category, GOALIE_CATEGORIES, GameId, LockTransition, NewPlayer, PlayerId,
    RUNNER_CATEGORIES, RedbStorage, Role, StateKey, Storage, TallyError, Tracker, TrackerState,
    parse_date,
};
use tracing::{debug, info, warn};

// =============================================================================
// STORAGE DISPATCH
// =============================================================================

/// The backend selected at runtime.
#[derive(Debug)]
pub enum AppStorage {
    Redb(RedbStorage),
    File(FileStorage),
}

impl AppStorage {
    pub fn open(path: &Path, backend: Backend) -> Result<Self> {
        match backend {
            Backend::Redb => {
                let storage = RedbStorage::open(path)
                    .with_context(|| format!("Failed to open redb database: {}", path.display()))?;
                Ok(Self::Redb(storage))
            }
            Backend::File => Ok(Self::File(FileStorage::new(path))),
        }
    }
}

impl Storage for AppStorage {
    fn load(&self) -> tallylax_core::Result<TrackerState> {
        match self {
            Self::Redb(s) => s.load(),
            Self::File(s) => s.load(),
        }
    }

    fn persist(&mut self, state: &TrackerState, keys: &[StateKey]) -> tallylax_core::Result<()> {
        match self {
            Self::Redb(s) => s.persist(state, keys),
            Self::File(s) => s.persist(state, keys),
        }
    }

    fn clear(&mut self) -> tallylax_core::Result<()> {
        match self {
            Self::Redb(s) => s.clear(),
            Self::File(s) => s.clear(),
        }
    }
}

/// Open the tracker, creating an empty store when none exists yet.
pub fn load_tracker(path: &Path, backend: Backend) -> Result<Tracker<AppStorage>> {
    debug!("Opening {} store at {}", backend, path.display());
    let storage = AppStorage::open(path, backend)?;
    Tracker::open(storage).with_context(|| {
        format!(
            "Failed to load {}. Run `tallylax reset --yes` to start over.",
            path.display()
        )
    })
}

// =============================================================================
// HELPERS
// =============================================================================

/// Id seed from the wall clock, in Unix milliseconds.
fn id_seed() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Log a failed write and hand back the value.
fn settle<T>(applied: Applied<T>) -> T {
    if let Some(err) = &applied.persist_error {
        warn!("Change applied but not saved: {err}");
    }
    applied.value
}

/// Lock rejections are expected user errors; log them before returning.
fn rejected(err: TallyError) -> anyhow::Error {
    if err.is_locked_game() {
        warn!("{err}");
    }
    err.into()
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// INIT / TEAM
// =============================================================================

/// Initialize a new store.
pub fn cmd_init(path: &Path, backend: Backend, force: bool) -> Result<()> {
    if path.exists() {
        if !force {
            bail!(
                "Store already exists at {}. Use --force to overwrite.",
                path.display()
            );
        }
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove existing store: {}", path.display()))?;
    }

    let mut tracker = load_tracker(path, backend)?;
    tracker.flush()?;
    info!("Initialized {} store at {}", backend, path.display());
    println!("Initialized empty {} store at {}", backend, path.display());
    Ok(())
}

pub fn cmd_team(path: &Path, backend: Backend, json: bool, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Team name cannot be empty");
    }
    let mut tracker = load_tracker(path, backend)?;
    let team = settle(tracker.set_team_name(name));

    if json {
        print_json(&json!({ "team": team }))
    } else {
        println!("Team name set to {}", team.name);
        Ok(())
    }
}

// =============================================================================
// ROSTER
// =============================================================================

pub fn cmd_player_add(
    path: &Path,
    backend: Backend,
    json: bool,
    name: &str,
    number: &str,
    role: Role,
) -> Result<()> {
    let mut tracker = load_tracker(path, backend)?;
    let player = settle(tracker.add_player(id_seed(), NewPlayer::new(name, number, role))?);
    info!("Added player {} ({})", player.id, player.role);

    if json {
        print_json(&json!({ "player": player }))
    } else {
        println!(
            "Added #{} {} ({}) with id {}",
            player.number, player.name, player.role, player.id
        );
        Ok(())
    }
}

/// Remove a player from the roster. Recorded stats are kept.
pub fn cmd_player_remove(
    path: &Path,
    backend: Backend,
    json: bool,
    id: &str,
    confirmed: bool,
) -> Result<()> {
    if !confirmed {
        bail!("Removing a player needs --yes. Their recorded stats are kept.");
    }
    let mut tracker = load_tracker(path, backend)?;
    let player = settle(tracker.remove_player(&PlayerId::new(id))?);
    info!("Removed player {}", player.id);

    if json {
        print_json(&json!({ "removed": player }))
    } else {
        println!("Removed #{} {} from the roster", player.number, player.name);
        Ok(())
    }
}

pub fn cmd_player_list(path: &Path, backend: Backend, json: bool) -> Result<()> {
    let tracker = load_tracker(path, backend)?;
    let state = tracker.state();

    if json {
        print_json(&json!({ "team": state.team(), "roster": state.roster() }))
    } else {
        println!("{}", report::roster(state));
        Ok(())
    }
}

// =============================================================================
// GAMES
// =============================================================================

/// Add a game; `date` is `YYYY-MM-DD` and defaults to today.
pub fn cmd_game_add(
    path: &Path,
    backend: Backend,
    json: bool,
    opponent: &str,
    date: Option<&str>,
) -> Result<()> {
    let opponent = opponent.trim();
    if opponent.is_empty() {
        bail!("Opponent cannot be empty");
    }
    let date = match date {
        Some(raw) => parse_date(raw)?,
        None => today(),
    };

    let mut tracker = load_tracker(path, backend)?;
    let game = settle(tracker.add_game(id_seed(), opponent, date)?);
    info!("Added game {} ({})", game.id, game.label());

    if json {
        print_json(&json!({ "game": game }))
    } else {
        println!("Added {} with id {}", game.label(), game.id);
        Ok(())
    }
}

pub fn cmd_game_list(path: &Path, backend: Backend, json: bool) -> Result<()> {
    let tracker = load_tracker(path, backend)?;
    let state = tracker.state();

    if json {
        let games: Vec<_> = state
            .games()
            .iter()
            .map(|g| json!({ "game": g, "locked": state.is_locked(&g.id) }))
            .collect();
        print_json(&json!({ "games": games }))
    } else {
        println!("{}", report::games(state));
        Ok(())
    }
}

// =============================================================================
// ATTENDANCE / STATS / LOCK
// =============================================================================

/// Toggle a player's presence for a game.
pub fn cmd_attend(
    path: &Path,
    backend: Backend,
    json: bool,
    game: &str,
    player: &str,
) -> Result<()> {
    let game = GameId::new(game);
    let player = PlayerId::new(player);
    let mut tracker = load_tracker(path, backend)?;
    let present = settle(tracker.toggle_attendance(&game, &player).map_err(rejected)?);
    debug!("Attendance for {player} in {game}: {present}");

    if json {
        print_json(&json!({ "game": game, "player": player, "present": present }))
    } else {
        let name = tracker
            .state()
            .player(&player)
            .map_or_else(|| player.to_string(), |p| p.name.clone());
        let mark = if present { "present" } else { "absent" };
        println!("{name} marked {mark}");
        Ok(())
    }
}

/// Record a counted event for a present player.
pub fn cmd_stat(
    path: &Path,
    backend: Backend,
    json: bool,
    game: &str,
    player: &str,
    category: &str,
    delta: i64,
) -> Result<()> {
    let category = Category::parse_loose(category)
        .ok_or_else(|| TallyError::UnknownCategory(category.to_string()))?;
    let game = GameId::new(game);
    let player = PlayerId::new(player);

    let mut tracker = load_tracker(path, backend)?;
    let line = settle(
        tracker
            .apply_stat_event(&game, &player, category, delta)
            .map_err(rejected)?,
    );
    debug!("{category} {delta:+} for {player} in {game}");

    if json {
        return print_json(&json!({ "game": game, "player": player, "line": line }));
    }

    println!("{category}: {}", line.count(category));
    if let Some(saves) = line.saves() {
        println!("Saves: {}  Save %: {}", saves.saves, saves.save_percent);
    }
    Ok(())
}

/// Lock a game. Cannot be undone, so it needs `--yes`.
pub fn cmd_lock(path: &Path, backend: Backend, json: bool, game: &str, confirmed: bool) -> Result<()> {
    if !confirmed {
        bail!("Locking a game cannot be undone. Re-run with --yes to confirm.");
    }
    let game = GameId::new(game);
    let mut tracker = load_tracker(path, backend)?;
    let transition = settle(tracker.lock_game(&game)?);

    match transition {
        LockTransition::Locked => info!("Locked game {game}"),
        LockTransition::AlreadyLocked => debug!("Game {game} was already locked"),
    }

    if json {
        let already = transition == LockTransition::AlreadyLocked;
        print_json(&json!({ "game": game, "locked": true, "alreadyLocked": already }))
    } else {
        match transition {
            LockTransition::Locked => println!("Game {game} locked"),
            LockTransition::AlreadyLocked => println!("Game {game} was already locked"),
        }
        Ok(())
    }
}

// =============================================================================
// REPORTS
// =============================================================================

/// Per-game summary; all games when `game` is `None`.
pub fn cmd_summary(path: &Path, backend: Backend, json: bool, game: Option<&str>) -> Result<()> {
    let tracker = load_tracker(path, backend)?;
    let summaries = match game {
        Some(id) => vec![tracker.game_summary(&GameId::new(id))?],
        None => tracker.state().game_summaries(),
    };

    if json {
        return print_json(&json!({ "summaries": summaries }));
    }
    if summaries.is_empty() {
        println!("No games yet.");
    }
    let blocks: Vec<String> = summaries.iter().map(report::game_summary).collect();
    if !blocks.is_empty() {
        println!("{}", blocks.join("\n\n"));
    }
    Ok(())
}

pub fn cmd_season(path: &Path, backend: Backend, json: bool) -> Result<()> {
    let tracker = load_tracker(path, backend)?;
    let totals = tracker.season_totals();

    if json {
        print_json(&json!({ "team": tracker.state().team(), "totals": totals }))
    } else {
        println!("{}", report::season(tracker.state(), &totals));
        Ok(())
    }
}

pub fn cmd_categories(json: bool) -> Result<()> {
    if json {
        print_json(&json!({
            "runner": RUNNER_CATEGORIES,
            "goalie": GOALIE_CATEGORIES,
        }))
    } else {
        println!("{}", report::categories());
        Ok(())
    }
}

// =============================================================================
// BACKUP / RESET
// =============================================================================

/// Write a JSON backup of the whole tree. A directory target gets the
/// default backup file name.
pub fn cmd_export(path: &Path, backend: Backend, file: &Path) -> Result<()> {
    let target = if file.is_dir() {
        file.join(BACKUP_FILE_NAME)
    } else {
        file.to_path_buf()
    };

    let tracker = load_tracker(path, backend)?;
    let document = tracker.export_json()?;
    std::fs::write(&target, document)
        .with_context(|| format!("Failed to write backup: {}", target.display()))?;

    info!("Exported backup to {}", target.display());
    println!("Exported backup to {}", target.display());
    Ok(())
}

/// Replace the whole tree with a JSON backup. A malformed file changes nothing.
pub fn cmd_import(path: &Path, backend: Backend, file: &Path) -> Result<()> {
    let document = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read backup: {}", file.display()))?;

    let mut tracker = load_tracker(path, backend)?;
    settle(tracker.import_json(&document)?);
    let state = tracker.state();

    info!("Imported backup from {}", file.display());
    println!(
        "Imported {}: {} players, {} games",
        state.team().name,
        state.roster().len(),
        state.games().len()
    );
    Ok(())
}

/// Wipe every record. Irreversible, so it needs `--yes`.
///
/// A store whose records no longer decode is cleared without loading it.
pub fn cmd_reset(path: &Path, backend: Backend, confirmed: bool) -> Result<()> {
    if !confirmed {
        return Err(TallyError::ResetNotConfirmed)
            .context("Reset deletes every player, game and stat. Re-run with --yes to confirm.");
    }

    let mut storage = AppStorage::open(path, backend)?;
    if let Err(err) = storage.load() {
        warn!("Stored data does not load ({err}); clearing it");
        storage.clear()?;
    } else {
        let mut tracker = Tracker::open(storage)?;
        settle(tracker.reset(confirmed)?);
    }

    info!("Reset store at {}", path.display());
    println!("All data cleared");
    Ok(())
}
