//! Player statistics table
//!
//! Loads the per-player box-score export (semicolon separated, latin-1
//! encoded) into typed rows. The header is validated once here so that the
//! rest of the crate works with named fields instead of column lookups.

use csv::{ByteRecord, ReaderBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Columns every stats export must provide.
pub const REQUIRED_COLUMNS: [&str; 7] = ["Player", "Pos", "Tm", "PTS", "3P", "2P", "FT"];

/// Errors that can occur when loading a stats table.
#[derive(Debug)]
pub enum StatsError {
    /// Underlying file could not be opened or read
    Io(std::io::Error),
    /// Malformed delimited text
    Csv(csv::Error),
    /// A required column is absent from the header
    MissingColumn {
        column: String,
        available: Vec<String>,
    },
}

impl std::fmt::Display for StatsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsError::Io(err) => write!(f, "I/O error: {}", err),
            StatsError::Csv(err) => write!(f, "CSV error: {}", err),
            StatsError::MissingColumn { column, available } => write!(
                f,
                "Column '{}' not found. Available columns: {}",
                column,
                available.join(", ")
            ),
        }
    }
}

impl std::error::Error for StatsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StatsError::Io(err) => Some(err),
            StatsError::Csv(err) => Some(err),
            StatsError::MissingColumn { .. } => None,
        }
    }
}

impl From<std::io::Error> for StatsError {
    fn from(err: std::io::Error) -> Self {
        StatsError::Io(err)
    }
}

impl From<csv::Error> for StatsError {
    fn from(err: csv::Error) -> Self {
        StatsError::Csv(err)
    }
}

/// One player's per-game box-score line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub player: String,
    /// Raw position string, e.g. `"SG"` or `"PG;SG"`
    pub position: String,
    pub team: String,
    /// Points per game (`PTS`)
    pub points: Option<f64>,
    /// Three-point field goals per game (`3P`)
    pub three_pointers: Option<f64>,
    /// Two-point field goals per game (`2P`)
    pub two_pointers: Option<f64>,
    /// Free throws per game (`FT`)
    pub free_throws: Option<f64>,
}

impl PlayerStats {
    /// Distinct normalized positions for this player.
    pub fn positions(&self) -> impl Iterator<Item = String> + '_ {
        split_positions(&self.position)
    }
}

/// Uppercases a raw `Pos` cell and splits multi-position entries on `;`.
pub fn split_positions(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(';')
        .map(|part| part.trim().to_uppercase())
        .filter(|part| !part.is_empty())
}

/// Column positions resolved from the header row.
struct ColumnMap {
    player: usize,
    position: usize,
    team: usize,
    points: usize,
    three_pointers: usize,
    two_pointers: usize,
    free_throws: usize,
}

impl ColumnMap {
    fn resolve(headers: &[String]) -> Result<Self, StatsError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|header| header == name)
                .ok_or_else(|| StatsError::MissingColumn {
                    column: name.to_string(),
                    available: headers.to_vec(),
                })
        };

        Ok(ColumnMap {
            player: find("Player")?,
            position: find("Pos")?,
            team: find("Tm")?,
            points: find("PTS")?,
            three_pointers: find("3P")?,
            two_pointers: find("2P")?,
            free_throws: find("FT")?,
        })
    }
}

/// Decodes ISO-8859-1 bytes; every byte maps to the code point of equal value.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .trim_start_matches("\u{ef}\u{bb}\u{bf}")
        .trim()
        .to_string()
}

fn text_field(record: &ByteRecord, idx: usize) -> String {
    record
        .get(idx)
        .map(|bytes| decode_latin1(bytes).trim().to_string())
        .unwrap_or_default()
}

fn numeric_field(record: &ByteRecord, idx: usize) -> Option<f64> {
    record
        .get(idx)
        .map(decode_latin1)
        .and_then(|text| text.trim().parse::<f64>().ok())
        .filter(|value| !value.is_nan())
}

/// In-memory table of player statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsTable {
    rows: Vec<PlayerStats>,
}

impl StatsTable {
    pub fn new(rows: Vec<PlayerStats>) -> Self {
        StatsTable { rows }
    }

    /// Loads a stats export from disk.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid delimited
    /// text, or lacks one of [`REQUIRED_COLUMNS`].
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, StatsError> {
        let file = File::open(path.as_ref())?;
        log::info!("Loading player stats from {}", path.as_ref().display());
        Self::from_reader(file)
    }

    /// Loads a stats export from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, StatsError> {
        let mut csv_reader = ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .byte_headers()?
            .iter()
            .map(|raw| normalize_header(&decode_latin1(raw)))
            .collect();
        let columns = ColumnMap::resolve(&headers)?;

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        let mut record = ByteRecord::new();
        while csv_reader.read_byte_record(&mut record)? {
            let player = text_field(&record, columns.player);
            if player.is_empty() {
                skipped += 1;
                log::warn!(
                    "Skipping row {} with no player name",
                    record.position().map(|p| p.line()).unwrap_or_default()
                );
                continue;
            }

            rows.push(PlayerStats {
                player,
                position: text_field(&record, columns.position),
                team: text_field(&record, columns.team),
                points: numeric_field(&record, columns.points),
                three_pointers: numeric_field(&record, columns.three_pointers),
                two_pointers: numeric_field(&record, columns.two_pointers),
                free_throws: numeric_field(&record, columns.free_throws),
            });
        }

        log::info!("Loaded {} player rows ({} skipped)", rows.len(), skipped);
        Ok(StatsTable { rows })
    }

    pub fn rows(&self) -> &[PlayerStats] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First row for `player`. Traded players can appear on several rows.
    pub fn get(&self, player: &str) -> Option<&PlayerStats> {
        self.rows.iter().find(|row| row.player == player)
    }

    /// Sorted distinct positions, with multi-position entries split apart.
    pub fn positions(&self) -> Vec<String> {
        self.rows
            .iter()
            .flat_map(PlayerStats::positions)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Sorted distinct non-empty team codes.
    pub fn teams(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| row.team.as_str())
            .filter(|team| !team.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}
