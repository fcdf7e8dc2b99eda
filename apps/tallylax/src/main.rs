//! TallyLax command line entry point.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tallylax::cli::{
    cmd_attend, cmd_categories, cmd_export, cmd_game_add, cmd_game_list, cmd_import, cmd_init,
    cmd_lock, cmd_player_add, cmd_player_list, cmd_player_remove, cmd_reset, cmd_season,
    cmd_stat, cmd_summary, cmd_team,
};
use tallylax::config::{Backend, Config};
use tallylax_core::Role;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Lacrosse roster, attendance and game stat tracker
#[derive(Parser)]
#[command(name = "tallylax")]
#[command(about = "Track a lacrosse team's roster, attendance and game stats", long_about = None)]
#[command(version)]
struct Cli {
    /// Data file (env: TALLYLAX_DATA, default: tallylax.db)
    #[arg(long, global = true, value_name = "PATH")]
    data: Option<PathBuf>,

    /// Storage backend (env: TALLYLAX_BACKEND, default: redb)
    #[arg(long, global = true, value_enum)]
    backend: Option<Backend>,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging (RUST_LOG takes precedence when set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an empty store
    Init {
        /// Overwrite an existing store
        #[arg(long)]
        force: bool,
    },

    /// Set the team name
    Team { name: String },

    /// Manage the roster
    #[command(subcommand)]
    Player(PlayerCommand),

    /// Manage the game list
    #[command(subcommand)]
    Game(GameCommand),

    /// Toggle a player's attendance for a game
    Attend { game: String, player: String },

    /// Record a stat for a present player
    Stat {
        game: String,
        player: String,
        /// Category name, e.g. "goals" or "shots-on-net"
        category: String,
        /// Amount to add; negative values correct mistakes
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        delta: i64,
    },

    /// Lock a game's attendance and stats for good
    Lock {
        game: String,
        /// Confirm; locking cannot be undone
        #[arg(long)]
        yes: bool,
    },

    /// Show one game's box score, or every game's
    Summary { game: Option<String> },

    /// Show season totals
    Season,

    /// Write a JSON backup
    Export { file: PathBuf },

    /// Replace all data with a JSON backup
    Import { file: PathBuf },

    /// Delete all data
    Reset {
        /// Confirm; this cannot be undone
        #[arg(long)]
        yes: bool,
    },

    /// List stat categories per role
    Categories,
}

#[derive(Subcommand)]
enum PlayerCommand {
    /// Add a player to the roster
    Add {
        name: String,
        number: String,
        /// runner or goalie
        #[arg(long, default_value = "runner")]
        role: Role,
    },

    /// Remove a player; their recorded stats are kept
    Remove {
        id: String,
        #[arg(long)]
        yes: bool,
    },

    /// List the roster
    List,
}

#[derive(Subcommand)]
enum GameCommand {
    /// Add a game
    Add {
        opponent: String,
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        date: Option<String>,
    },

    /// List games
    List,
}

fn setup_logging(verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = Config::resolve(cli.data, cli.backend)?;
    let (path, backend, json) = (config.data.as_path(), config.backend, cli.json);
    tracing::debug!("Using {} store at {}", backend, path.display());

    match cli.command {
        Command::Init { force } => cmd_init(path, backend, force),
        Command::Team { name } => cmd_team(path, backend, json, &name),
        Command::Player(cmd) => match cmd {
            PlayerCommand::Add { name, number, role } => {
                cmd_player_add(path, backend, json, &name, &number, role)
            }
            PlayerCommand::Remove { id, yes } => cmd_player_remove(path, backend, json, &id, yes),
            PlayerCommand::List => cmd_player_list(path, backend, json),
        },
        Command::Game(cmd) => match cmd {
            GameCommand::Add { opponent, date } => {
                cmd_game_add(path, backend, json, &opponent, date.as_deref())
            }
            GameCommand::List => cmd_game_list(path, backend, json),
        },
        Command::Attend { game, player } => cmd_attend(path, backend, json, &game, &player),
        Command::Stat {
            game,
            player,
            category,
            delta,
        } => cmd_stat(path, backend, json, &game, &player, &category, delta),
        Command::Lock { game, yes } => cmd_lock(path, backend, json, &game, yes),
        Command::Summary { game } => cmd_summary(path, backend, json, game.as_deref()),
        Command::Season => cmd_season(path, backend, json),
        Command::Export { file } => cmd_export(path, backend, &file),
        Command::Import { file } => cmd_import(path, backend, &file),
        Command::Reset { yes } => cmd_reset(path, backend, yes),
        Command::Categories => cmd_categories(json),
    }
}
