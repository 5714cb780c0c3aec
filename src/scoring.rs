//! Scoring extraction
//!
//! Reshapes the wide stats table (one row per player with `3P`, `2P` and `FT`
//! columns) into long rows of player, shot type and points, the input of the
//! player to shot-type flow.

use crate::flow::FlowRecord;
use crate::stats::{PlayerStats, StatsTable};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const PLAYER_COLUMN: &str = "Player";
pub const SHOT_TYPE_COLUMN: &str = "Shot Type";
pub const POINTS_COLUMN: &str = "Points";

/// Stage columns of the scoring flow, in hop order.
pub const SCORING_STAGES: [&str; 2] = [PLAYER_COLUMN, SHOT_TYPE_COLUMN];

/// Kind of made shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShotType {
    #[serde(rename = "3P")]
    ThreePoint,
    #[serde(rename = "2P")]
    TwoPoint,
    #[serde(rename = "FT")]
    FreeThrow,
}

impl ShotType {
    /// Shot types in the order their columns are melted.
    pub const ALL: [ShotType; 3] = [ShotType::ThreePoint, ShotType::TwoPoint, ShotType::FreeThrow];

    /// Points scored by one make of this shot.
    pub fn point_value(self) -> f64 {
        match self {
            ShotType::ThreePoint => 3.0,
            ShotType::TwoPoint => 2.0,
            ShotType::FreeThrow => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShotType::ThreePoint => "3P",
            ShotType::TwoPoint => "2P",
            ShotType::FreeThrow => "FT",
        }
    }

    /// Per-game makes of this shot type for a player.
    fn makes(self, stats: &PlayerStats) -> Option<f64> {
        match self {
            ShotType::ThreePoint => stats.three_pointers,
            ShotType::TwoPoint => stats.two_pointers,
            ShotType::FreeThrow => stats.free_throws,
        }
    }
}

impl std::fmt::Display for ShotType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Points a player scores per game from one shot type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRow {
    #[serde(rename = "Player")]
    pub player: String,
    #[serde(rename = "Shot Type")]
    pub shot_type: ShotType,
    #[serde(rename = "Points")]
    pub points: f64,
}

impl FlowRecord for ScoringRow {
    fn has_column(&self, column: &str) -> bool {
        matches!(column, PLAYER_COLUMN | SHOT_TYPE_COLUMN | POINTS_COLUMN)
    }

    fn label(&self, column: &str) -> Option<String> {
        match column {
            PLAYER_COLUMN => Some(self.player.clone()),
            SHOT_TYPE_COLUMN => Some(self.shot_type.as_str().to_string()),
            _ => None,
        }
    }

    fn value(&self, column: &str) -> Option<f64> {
        match column {
            POINTS_COLUMN => Some(self.points),
            _ => None,
        }
    }
}

/// Melts each player's 3P/2P/FT makes into scoring rows.
///
/// Only shot types with a strictly positive make count are kept, and makes are
/// converted to points by the shot's point value. A player listed on several
/// rows (a traded player's season total followed by per-team lines)
/// contributes only their first row.
pub fn extract_scoring_flow(table: &StatsTable) -> Vec<ScoringRow> {
    let mut seen = HashSet::new();
    let players: Vec<&PlayerStats> = table
        .rows()
        .iter()
        .filter(|row| seen.insert(row.player.as_str()))
        .collect();

    let mut rows = Vec::new();
    for shot_type in ShotType::ALL {
        for stats in &players {
            let Some(makes) = shot_type.makes(stats).filter(|makes| *makes > 0.0) else {
                continue;
            };
            rows.push(ScoringRow {
                player: stats.player.clone(),
                shot_type,
                points: makes * shot_type.point_value(),
            });
        }
    }

    tracing::debug!(
        players = players.len(),
        rows = rows.len(),
        "extracted scoring rows"
    );
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::aggregate;

    fn player(name: &str, three: Option<f64>, two: Option<f64>, ft: Option<f64>) -> PlayerStats {
        PlayerStats {
            player: name.to_string(),
            position: "PG".to_string(),
            team: "BOS".to_string(),
            points: Some(10.0),
            three_pointers: three,
            two_pointers: two,
            free_throws: ft,
        }
    }

    #[test]
    fn test_melt_order_and_point_values() {
        let table = StatsTable::new(vec![
            player("A", Some(2.0), Some(3.0), Some(4.0)),
            player("B", Some(1.0), None, Some(0.0)),
        ]);
        let rows = extract_scoring_flow(&table);

        let summary: Vec<_> = rows
            .iter()
            .map(|row| (row.player.as_str(), row.shot_type, row.points))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("A", ShotType::ThreePoint, 6.0),
                ("B", ShotType::ThreePoint, 3.0),
                ("A", ShotType::TwoPoint, 6.0),
                ("A", ShotType::FreeThrow, 4.0),
            ]
        );
    }

    #[test]
    fn test_traded_player_counted_once() {
        let table = StatsTable::new(vec![
            player("A", Some(1.0), None, None),
            player("A", Some(0.5), None, None),
        ]);
        let rows = extract_scoring_flow(&table);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].points, 3.0);
    }

    #[test]
    fn test_scoring_rows_feed_aggregator() {
        let table = StatsTable::new(vec![
            player("A", Some(1.0), Some(2.0), None),
            player("B", None, Some(1.0), Some(3.0)),
        ]);
        let rows = extract_scoring_flow(&table);
        let result = aggregate(&rows, &SCORING_STAGES, POINTS_COLUMN).unwrap();

        let links: Vec<_> = result.labeled_links().collect();
        assert_eq!(
            links,
            vec![
                ("A", "2P", 4.0),
                ("A", "3P", 3.0),
                ("B", "2P", 2.0),
                ("B", "FT", 3.0),
            ]
        );
        assert_eq!(result.labels.labels(), &["A", "2P", "3P", "B", "FT"]);
    }

    #[test]
    fn test_unknown_column_is_reported_missing() {
        let rows = vec![ScoringRow {
            player: "A".to_string(),
            shot_type: ShotType::FreeThrow,
            points: 1.0,
        }];
        let err = aggregate(&rows, &SCORING_STAGES, "PTS").unwrap_err();
        assert_eq!(
            err,
            crate::flow::FlowError::MissingColumn("PTS".to_string())
        );
    }

    #[test]
    fn test_row_serializes_with_column_names() {
        let row = ScoringRow {
            player: "A".to_string(),
            shot_type: ShotType::ThreePoint,
            points: 6.0,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["Player"], "A");
        assert_eq!(json["Shot Type"], "3P");
        assert_eq!(json["Points"], 6.0);
    }
}
