//! Filtered scoring views
//!
//! One filter evaluation produces both the scoring table and the flow
//! aggregate drawn from it. [`ViewCache`] memoizes the latest evaluation keyed
//! on the filter values so the table and the diagram are always served from
//! the same pass.

use crate::filter::ScoringFilter;
use crate::flow::{aggregate, FlowAggregate, FlowDiagram, FlowError, FlowOptions};
use crate::scoring::{ScoringRow, POINTS_COLUMN, SCORING_STAGES};
use crate::stats::StatsTable;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, trace};

/// Result of evaluating one [`ScoringFilter`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringView {
    pub filter: ScoringFilter,
    /// Filtered scoring rows, shown as the table view
    pub rows: Vec<ScoringRow>,
    /// Player to shot-type flow over exactly `rows`
    pub flow: FlowAggregate,
}

impl ScoringView {
    pub fn build(
        table: &StatsTable,
        scoring_rows: &[ScoringRow],
        filter: ScoringFilter,
    ) -> Result<Self, FlowError> {
        let rows = filter.apply(table, scoring_rows);
        let flow = aggregate(&rows, &SCORING_STAGES, POINTS_COLUMN)?;
        Ok(ScoringView { filter, rows, flow })
    }

    /// Flow diagram with the given rendering hints.
    pub fn diagram(&self, options: FlowOptions) -> FlowDiagram {
        FlowDiagram {
            aggregate: self.flow.clone(),
            options,
        }
    }

    /// Total points across the table view.
    pub fn total_points(&self) -> f64 {
        self.rows.iter().map(|row| row.points).sum()
    }
}

/// Memo of the most recently evaluated filter.
#[derive(Debug, Default)]
pub struct ViewCache {
    latest: Mutex<Option<Arc<ScoringView>>>,
}

impl ViewCache {
    pub fn new() -> Self {
        ViewCache::default()
    }

    /// Returns the view for `filter`, rebuilding only when it differs from the
    /// cached one. The lock is held while building, so concurrent callers
    /// with the same filter share a single evaluation.
    pub fn get_or_build(
        &self,
        table: &StatsTable,
        scoring_rows: &[ScoringRow],
        filter: ScoringFilter,
    ) -> Result<Arc<ScoringView>, FlowError> {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(view) = latest.as_ref().filter(|view| view.filter == filter) {
            trace!(?filter, "scoring view cache hit");
            return Ok(Arc::clone(view));
        }

        let view = Arc::new(ScoringView::build(table, scoring_rows, filter)?);
        debug!(
            filter = ?view.filter,
            rows = view.rows.len(),
            links = view.flow.links.len(),
            "rebuilt scoring view"
        );
        *latest = Some(Arc::clone(&view));
        Ok(view)
    }

    /// Drops the cached view.
    pub fn clear(&self) {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::TeamSelection;
    use crate::scoring::extract_scoring_flow;
    use crate::stats::PlayerStats;

    fn sample_table() -> StatsTable {
        StatsTable::new(vec![
            PlayerStats {
                player: "Star".to_string(),
                position: "SF".to_string(),
                team: "BOS".to_string(),
                points: Some(27.0),
                three_pointers: Some(3.0),
                two_pointers: Some(6.0),
                free_throws: Some(6.0),
            },
            PlayerStats {
                player: "Bench".to_string(),
                position: "C".to_string(),
                team: "BOS".to_string(),
                points: Some(2.0),
                three_pointers: None,
                two_pointers: Some(1.0),
                free_throws: None,
            },
        ])
    }

    #[test]
    fn test_table_and_flow_come_from_same_rows() {
        let table = sample_table();
        let rows = extract_scoring_flow(&table);
        let view = ScoringView::build(&table, &rows, ScoringFilter::default()).unwrap();

        assert!(view.rows.iter().all(|row| row.player == "Star"));
        let flow_total: f64 = view.flow.links.iter().map(|link| link.value).sum();
        assert_eq!(flow_total, view.total_points());
        assert_eq!(view.total_points(), 9.0 + 12.0 + 6.0);
    }

    #[test]
    fn test_empty_filter_result_is_empty_flow() {
        let table = sample_table();
        let rows = extract_scoring_flow(&table);
        let filter = ScoringFilter::new(40, TeamSelection::All, Vec::<String>::new());
        let view = ScoringView::build(&table, &rows, filter).unwrap();
        assert!(view.rows.is_empty());
        assert!(view.flow.is_empty());
        assert!(view.flow.labels.is_empty());
    }

    #[test]
    fn test_cache_reuses_view_for_equal_filter() {
        let table = sample_table();
        let rows = extract_scoring_flow(&table);
        let cache = ViewCache::new();

        let first = cache
            .get_or_build(&table, &rows, ScoringFilter::default())
            .unwrap();
        let second = cache
            .get_or_build(&table, &rows, ScoringFilter::default())
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let other = cache
            .get_or_build(&table, &rows, ScoringFilter::new(0, TeamSelection::All, ["C"]))
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(other.rows.len(), 1);

        cache.clear();
        let rebuilt = cache
            .get_or_build(&table, &rows, ScoringFilter::default())
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &rebuilt));
        assert_eq!(*first, *rebuilt);
    }

    #[test]
    fn test_diagram_carries_options() {
        let table = sample_table();
        let rows = extract_scoring_flow(&table);
        let view = ScoringView::build(&table, &rows, ScoringFilter::default()).unwrap();
        let options = FlowOptions {
            pad: 5,
            ..FlowOptions::default()
        };
        let diagram = view.diagram(options.clone());
        assert_eq!(diagram.options, options);
        assert_eq!(diagram.aggregate, view.flow);
    }
}
