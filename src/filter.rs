//! Player filters for the scoring views
//!
//! A [`ScoringFilter`] narrows the scoring rows to the players that clear a
//! points-per-game threshold and, optionally, play for one team and at one of
//! a set of positions.

use crate::scoring::ScoringRow;
use crate::stats::{split_positions, PlayerStats, StatsTable};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Team selector; `All` disables team filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamSelection {
    #[default]
    All,
    Team(String),
}

impl TeamSelection {
    /// Parses a selector value; empty input and `"All"` mean no team filter.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            TeamSelection::All
        } else {
            TeamSelection::Team(value.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TeamSelection::All => "All",
            TeamSelection::Team(code) => code,
        }
    }
}

fn players_where<'a, F>(table: &'a StatsTable, predicate: F) -> HashSet<&'a str>
where
    F: Fn(&PlayerStats) -> bool,
{
    table
        .rows()
        .iter()
        .filter(|&row| predicate(row))
        .map(|row| row.player.as_str())
        .collect()
}

/// Filter values for one dashboard evaluation.
///
/// Positions are kept uppercased, sorted and deduplicated so two filters that
/// select the same players compare (and hash) equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScoringFilter {
    /// Minimum points per game
    pub min_points: u32,
    pub team: TeamSelection,
    /// Selected positions; empty means every position
    pub positions: Vec<String>,
}

impl Default for ScoringFilter {
    fn default() -> Self {
        ScoringFilter {
            min_points: 3,
            team: TeamSelection::All,
            positions: Vec::new(),
        }
    }
}

impl ScoringFilter {
    pub fn new<I, S>(min_points: u32, team: TeamSelection, positions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let positions: BTreeSet<String> = positions
            .into_iter()
            .flat_map(|raw| split_positions(raw.as_ref()).collect::<Vec<_>>())
            .collect();
        ScoringFilter {
            min_points,
            team,
            positions: positions.into_iter().collect(),
        }
    }

    fn passes_points(&self, stats: &PlayerStats) -> bool {
        stats
            .points
            .map_or(false, |points| points >= f64::from(self.min_points))
    }

    fn passes_team(&self, stats: &PlayerStats) -> bool {
        match &self.team {
            TeamSelection::All => true,
            TeamSelection::Team(code) => &stats.team == code,
        }
    }

    fn passes_position(&self, stats: &PlayerStats) -> bool {
        self.positions.is_empty()
            || stats
                .positions()
                .any(|position| self.positions.contains(&position))
    }

    /// Names of the players that pass every criterion.
    ///
    /// Each criterion is checked against all of a player's rows, so a traded
    /// player is kept for a team selection if any of their lines is for that
    /// team.
    pub fn eligible_players<'a>(&self, table: &'a StatsTable) -> HashSet<&'a str> {
        let by_points = players_where(table, |row| self.passes_points(row));
        let by_team = players_where(table, |row| self.passes_team(row));
        let by_position = players_where(table, |row| self.passes_position(row));

        by_points
            .into_iter()
            .filter(|player| by_team.contains(player) && by_position.contains(player))
            .collect()
    }

    /// Keeps the scoring rows whose player passes the filter, in input order.
    pub fn apply(&self, table: &StatsTable, rows: &[ScoringRow]) -> Vec<ScoringRow> {
        let eligible = self.eligible_players(table);
        let filtered: Vec<ScoringRow> = rows
            .iter()
            .filter(|row| eligible.contains(row.player.as_str()))
            .cloned()
            .collect();

        tracing::debug!(
            min_points = self.min_points,
            team = self.team.as_str(),
            positions = ?self.positions,
            eligible = eligible.len(),
            kept = filtered.len(),
            "applied scoring filter"
        );
        filtered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{extract_scoring_flow, ShotType};

    fn stats(name: &str, pos: &str, team: &str, pts: Option<f64>) -> PlayerStats {
        PlayerStats {
            player: name.to_string(),
            position: pos.to_string(),
            team: team.to_string(),
            points: pts,
            three_pointers: Some(1.0),
            two_pointers: Some(2.0),
            free_throws: Some(1.0),
        }
    }

    fn sample_table() -> StatsTable {
        StatsTable::new(vec![
            stats("Star", "SF", "BOS", Some(27.0)),
            stats("Guard", "PG;SG", "LAL", Some(12.0)),
            stats("Bench", "C", "BOS", Some(2.0)),
            stats("Traded", "PF", "TOT", Some(9.0)),
            stats("Traded", "PF", "MIA", Some(8.0)),
            stats("Unknown", "C", "NYK", None),
        ])
    }

    fn names(filter: &ScoringFilter, table: &StatsTable) -> Vec<String> {
        let mut players: Vec<String> = filter
            .eligible_players(table)
            .into_iter()
            .map(str::to_string)
            .collect();
        players.sort();
        players
    }

    #[test]
    fn test_default_threshold() {
        let table = sample_table();
        let filter = ScoringFilter::default();
        assert_eq!(names(&filter, &table), vec!["Guard", "Star", "Traded"]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let table = sample_table();
        let filter = ScoringFilter::new(12, TeamSelection::All, Vec::<String>::new());
        assert_eq!(names(&filter, &table), vec!["Guard", "Star"]);
    }

    #[test]
    fn test_team_filter() {
        let table = sample_table();
        let filter = ScoringFilter::new(0, TeamSelection::parse("BOS"), Vec::<String>::new());
        assert_eq!(names(&filter, &table), vec!["Bench", "Star"]);

        let traded = ScoringFilter::new(0, TeamSelection::parse("MIA"), Vec::<String>::new());
        assert_eq!(names(&traded, &table), vec!["Traded"]);
    }

    #[test]
    fn test_all_team_parses_to_no_filter() {
        assert_eq!(TeamSelection::parse("All"), TeamSelection::All);
        assert_eq!(TeamSelection::parse(""), TeamSelection::All);
        assert_eq!(TeamSelection::parse(" LAL "), TeamSelection::Team("LAL".to_string()));
    }

    #[test]
    fn test_position_filter_matches_any_split_position() {
        let table = sample_table();
        let filter = ScoringFilter::new(0, TeamSelection::All, ["sg"]);
        assert_eq!(names(&filter, &table), vec!["Guard"]);

        let bigs = ScoringFilter::new(0, TeamSelection::All, ["C", "PF"]);
        assert_eq!(names(&bigs, &table), vec!["Bench", "Traded"]);
    }

    #[test]
    fn test_positions_normalized_for_equality() {
        let a = ScoringFilter::new(5, TeamSelection::All, ["sg", "PG", "SG"]);
        let b = ScoringFilter::new(5, TeamSelection::All, ["PG;SG"]);
        assert_eq!(a, b);
        assert_eq!(a.positions, vec!["PG", "SG"]);
    }

    #[test]
    fn test_apply_keeps_row_order() {
        let table = sample_table();
        let rows = extract_scoring_flow(&table);
        let filter = ScoringFilter::new(10, TeamSelection::All, Vec::<String>::new());
        let filtered = filter.apply(&table, &rows);

        assert!(filtered
            .iter()
            .all(|row| row.player == "Star" || row.player == "Guard"));
        let expected: Vec<_> = rows
            .iter()
            .filter(|row| row.player == "Star" || row.player == "Guard")
            .cloned()
            .collect();
        assert_eq!(filtered, expected);
    }

    #[test]
    fn test_team_selection_keeps_season_total_of_traded_player() {
        let season = PlayerStats {
            three_pointers: Some(2.0),
            two_pointers: Some(5.0),
            free_throws: Some(3.0),
            ..stats("Traded", "PF", "TOT", Some(25.0))
        };
        let stint = PlayerStats {
            three_pointers: Some(0.5),
            two_pointers: Some(1.0),
            free_throws: Some(1.0),
            ..stats("Traded", "PF", "MIA", Some(5.5))
        };
        let table = StatsTable::new(vec![season, stint]);
        let rows = extract_scoring_flow(&table);

        let filter = ScoringFilter::new(0, TeamSelection::parse("MIA"), Vec::<String>::new());
        let points: Vec<(ShotType, f64)> = filter
            .apply(&table, &rows)
            .into_iter()
            .map(|row| (row.shot_type, row.points))
            .collect();
        assert_eq!(
            points,
            vec![
                (ShotType::ThreePoint, 6.0),
                (ShotType::TwoPoint, 10.0),
                (ShotType::FreeThrow, 3.0),
            ]
        );
    }
}
