//! Shared application state for the dashboard API

use crate::scoring::{extract_scoring_flow, ScoringRow};
use crate::stats::StatsTable;
use crate::view::ViewCache;
use std::sync::Arc;

/// Shared application state
///
/// The stats table and its scoring rows are read-only after startup; the view
/// cache is the only mutable piece and guards itself.
#[derive(Clone)]
pub struct AppState {
    /// Loaded player statistics
    pub table: Arc<StatsTable>,
    /// Long-format scoring rows extracted from `table`
    pub scoring_rows: Arc<Vec<ScoringRow>>,
    /// Memo of the latest filter evaluation, shared by the table and flow views
    pub views: Arc<ViewCache>,
}

impl AppState {
    /// Creates a new application state
    pub fn new(table: StatsTable) -> Self {
        let scoring_rows = extract_scoring_flow(&table);
        AppState {
            table: Arc::new(table),
            scoring_rows: Arc::new(scoring_rows),
            views: Arc::new(ViewCache::new()),
        }
    }
}
