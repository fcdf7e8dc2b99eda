//! Plain-text rendering for the terminal.
//!
//! Every function returns a `String` so commands decide where it goes and
//! tests can inspect it.

use tallylax_core::aggregate::unlisted_games;
use tallylax_core::{
    Category, GOALIE_CATEGORIES, GameSummary, Player, RUNNER_CATEGORIES, Role, SaveSummary,
    SeasonTotals, TrackerState,
};

// =============================================================================
// TABLE
// =============================================================================

/// Left-aligned columns separated by two spaces.
struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(cell.chars().count());
                }
            }
        }

        let line = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut out = line(&self.headers);
        out.push('\n');
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&line(&rule));
        for row in &self.rows {
            out.push('\n');
            out.push_str(&line(row));
        }
        out
    }
}

fn stat_headers(categories: &[Category], goalie: bool) -> Vec<String> {
    let mut headers = vec!["#".to_string(), "Name".to_string()];
    headers.extend(categories.iter().map(|c| c.name().to_string()));
    if goalie {
        headers.push("Saves".to_string());
        headers.push("Save %".to_string());
    }
    headers
}

fn push_saves(row: &mut Vec<String>, saves: SaveSummary) {
    row.push(saves.saves.to_string());
    row.push(saves.save_percent.to_string());
}

fn section(out: &mut String, title: &str, table: &Table) {
    if table.is_empty() {
        return;
    }
    if !out.is_empty() {
        out.push_str("\n\n");
    }
    out.push_str(title);
    out.push('\n');
    out.push_str(&table.render());
}

// =============================================================================
// ROSTER / GAMES
// =============================================================================

pub fn roster(state: &TrackerState) -> String {
    if state.roster().is_empty() {
        return format!("{}: no players on the roster.", state.team().name);
    }
    let mut table = Table::new(["ID", "#", "Name", "Role"]);
    for player in state.roster() {
        table.push(vec![
            player.id.to_string(),
            player.number.clone(),
            player.name.clone(),
            player.role.to_string(),
        ]);
    }
    format!("{} roster\n{}", state.team().name, table.render())
}

pub fn games(state: &TrackerState) -> String {
    if state.games().is_empty() {
        return "No games yet.".to_string();
    }
    let mut table = Table::new(["ID", "Date", "Opponent", "Status"]);
    for game in state.games() {
        let status = if state.is_locked(&game.id) { "locked" } else { "open" };
        table.push(vec![
            game.id.to_string(),
            game.date_text(),
            game.opponent.clone(),
            status.to_string(),
        ]);
    }
    table.render()
}

// =============================================================================
// GAME SUMMARY
// =============================================================================

pub fn game_summary(summary: &GameSummary) -> String {
    let status = if summary.locked { "LOCKED" } else { "open" };
    let mut out = format!("{} [{status}]", summary.game.label());

    let mut runners = Table::new(stat_headers(&RUNNER_CATEGORIES, false));
    let mut goalies = Table::new(stat_headers(&GOALIE_CATEGORIES, true));

    for row in &summary.rows {
        let mut cells = vec![row.player.number.clone(), present_name(&row.player, row.present)];
        match row.player.role {
            Role::Runner => {
                cells.extend(RUNNER_CATEGORIES.iter().map(|c| row.line.count(*c).to_string()));
                runners.push(cells);
            }
            Role::Goalie => {
                cells.extend(GOALIE_CATEGORIES.iter().map(|c| row.line.count(*c).to_string()));
                push_saves(&mut cells, row.line.saves().unwrap_or_default());
                goalies.push(cells);
            }
        }
    }

    let mut body = String::new();
    section(&mut body, "Runners", &runners);
    section(&mut body, "Goalies", &goalies);
    if body.is_empty() {
        body.push_str("No players on the roster.");
    }
    out.push_str("\n\n");
    out.push_str(&body);
    out
}

/// Absent players are marked so the table shows who was eligible.
fn present_name(player: &Player, present: bool) -> String {
    if present {
        player.name.clone()
    } else {
        format!("{} (absent)", player.name)
    }
}

// =============================================================================
// SEASON
// =============================================================================

pub fn season(state: &TrackerState, totals: &SeasonTotals) -> String {
    let mut runners = Table::new(stat_headers(&RUNNER_CATEGORIES, false));
    let mut goalies = Table::new(stat_headers(&GOALIE_CATEGORIES, true));

    for player in state.roster() {
        let mut cells = vec![player.number.clone(), player.name.clone()];
        let categories = player.role.categories();
        cells.extend(
            categories
                .iter()
                .map(|c| totals.total(&player.id, *c).to_string()),
        );
        match player.role {
            Role::Runner => runners.push(cells),
            Role::Goalie => {
                let saves = totals
                    .get(&player.id)
                    .and_then(|line| line.saves())
                    .unwrap_or_default();
                push_saves(&mut cells, saves);
                goalies.push(cells);
            }
        }
    }

    let mut removed = Table::new(stat_headers(&RUNNER_CATEGORIES, false));
    let mut removed_goalies = Table::new(stat_headers(&GOALIE_CATEGORIES, true));
    for (id, line) in totals.iter().filter(|(_, line)| !line.on_roster) {
        let mut cells = vec![String::new(), format!("(removed {id})")];
        cells.extend(line.role.categories().iter().map(|c| line.total(*c).to_string()));
        match line.role {
            Role::Runner => removed.push(cells),
            Role::Goalie => {
                push_saves(&mut cells, line.saves().unwrap_or_default());
                removed_goalies.push(cells);
            }
        }
    }

    let mut out = format!("{} season totals", state.team().name);
    let mut body = String::new();
    section(&mut body, "Runners", &runners);
    section(&mut body, "Goalies", &goalies);
    section(&mut body, "No longer on the roster", &removed);
    section(&mut body, "Goalies no longer on the roster", &removed_goalies);
    if body.is_empty() {
        body.push_str("No players on the roster.");
    }
    out.push_str("\n\n");
    out.push_str(&body);

    let unlisted = unlisted_games(state.games(), state.stats());
    if !unlisted.is_empty() {
        let ids: Vec<String> = unlisted.iter().map(ToString::to_string).collect();
        out.push_str(&format!(
            "\n\nNote: stats for games not in the game list were skipped: {}",
            ids.join(", ")
        ));
    }
    out
}

// =============================================================================
// CATEGORIES
// =============================================================================

pub fn categories() -> String {
    let list = |categories: &[Category]| {
        categories
            .iter()
            .map(|c| c.name())
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "Runner: {}\nGoalie: {}\n\nCategory names are matched ignoring case, spaces, '-' and '_'.",
        list(&RUNNER_CATEGORIES),
        list(&GOALIE_CATEGORIES)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tallylax_core::{GameId, NewPlayer, PlayerId, parse_date};

    fn state() -> (TrackerState, GameId, PlayerId, PlayerId) {
        let mut state = TrackerState::new();
        let game = GameId::new("g1");
        state
            .add_game(game.clone(), "Ravens", parse_date("2025-04-12").unwrap())
            .unwrap();
        let runner = PlayerId::new("r");
        let keeper = PlayerId::new("k");
        state
            .add_player(runner.clone(), NewPlayer::new("Sam", "7", Role::Runner))
            .unwrap();
        state
            .add_player(keeper.clone(), NewPlayer::new("Kit", "30", Role::Goalie))
            .unwrap();
        (state, game, runner, keeper)
    }

    #[test]
    fn table_pads_columns() {
        let mut table = Table::new(["A", "Long header"]);
        table.push(vec!["wide cell".to_string(), "x".to_string()]);
        let rendered = table.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "A          Long header");
        assert_eq!(lines[1], "---------  -----------");
        assert_eq!(lines[2], "wide cell  x");
    }

    #[test]
    fn summary_splits_runners_and_goalies() {
        let (mut state, game, runner, keeper) = state();
        state.toggle_attendance(&game, &runner).unwrap();
        state.toggle_attendance(&game, &keeper).unwrap();
        state.apply_stat_event(&game, &keeper, Category::ShotsFaced, 10).unwrap();
        state.apply_stat_event(&game, &keeper, Category::GoalsAllowed, 3).unwrap();

        let text = game_summary(&state.game_summary(&game).unwrap());
        assert!(text.starts_with("2025-04-12 vs Ravens [open]"));
        assert!(text.contains("Runners"));
        assert!(text.contains("Goalies"));
        assert!(text.contains("70.0"));
    }

    #[test]
    fn absent_players_are_marked() {
        let (state, game, _, _) = state();
        let text = game_summary(&state.game_summary(&game).unwrap());
        assert!(text.contains("Sam (absent)"));
    }

    #[test]
    fn season_lists_removed_players_and_unlisted_games() {
        let (mut state, game, runner, _) = state();
        state.toggle_attendance(&game, &runner).unwrap();
        state.apply_stat_event(&game, &runner, Category::Goals, 2).unwrap();
        state.remove_player(&runner).unwrap();

        let text = season(&state, &state.season_totals());
        assert!(text.contains("No longer on the roster"));
        assert!(text.contains("(removed r)"));
        assert!(!text.contains("Note:"));
    }

    #[test]
    fn removed_goalies_keep_save_columns() {
        let (mut state, game, _, keeper) = state();
        state.toggle_attendance(&game, &keeper).unwrap();
        state.apply_stat_event(&game, &keeper, Category::ShotsFaced, 10).unwrap();
        state.apply_stat_event(&game, &keeper, Category::GoalsAllowed, 3).unwrap();
        state.remove_player(&keeper).unwrap();

        let text = season(&state, &state.season_totals());
        assert!(text.contains("Goalies no longer on the roster"));
        assert!(text.contains("(removed k)"));
        assert!(text.contains("70.0"));
    }

    #[test]
    fn empty_roster_renders_message() {
        let state = TrackerState::new();
        assert_eq!(roster(&state), "My Team: no players on the roster.");
        assert_eq!(games(&state), "No games yet.");
    }

    #[test]
    fn categories_lists_both_roles() {
        let text = categories();
        assert!(text.contains("Runner: Shots Taken, Shots on Net"));
        assert!(text.contains("Goalie: Shots Faced, Goals Allowed, Goals, Assists"));
    }
}
