//! HTTP request handlers for the dashboard API

use axum::{
    extract::{Query, State},
    response::Html,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use super::error::ApiError;
use super::state::AppState;
use crate::filter::{ScoringFilter, TeamSelection};
use crate::flow::{FlowDiagram, FlowOptions};
use crate::scoring::ScoringRow;
use crate::view::ScoringView;

const DASHBOARD_HTML: &str = include_str!("dashboard.html");

/// Integer slider bounds, mirrored by the dashboard widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Slider {
    pub start: u32,
    pub end: u32,
    pub step: u32,
    pub value: u32,
}

impl Slider {
    /// Checks that `value` lies on the slider; `None` selects the default.
    pub fn resolve(&self, name: &str, value: Option<u32>) -> Result<u32, ApiError> {
        let Some(value) = value else {
            return Ok(self.value);
        };
        if value < self.start || value > self.end {
            return Err(ApiError::InvalidParameter(format!(
                "{} must be between {} and {}, got {}",
                name, self.start, self.end, value
            )));
        }
        if (value - self.start) % self.step != 0 {
            return Err(ApiError::InvalidParameter(format!(
                "{} must be a multiple of {} from {}, got {}",
                name, self.step, self.start, value
            )));
        }
        Ok(value)
    }
}

/// Minimum points per game
pub const MIN_POINTS_SLIDER: Slider = Slider {
    start: 0,
    end: 40,
    step: 1,
    value: 3,
};

/// Diagram width in pixels
pub const WIDTH_SLIDER: Slider = Slider {
    start: 250,
    end: 2000,
    step: 250,
    value: 1000,
};

/// Diagram height in pixels
pub const HEIGHT_SLIDER: Slider = Slider {
    start: 200,
    end: 2500,
    step: 100,
    value: 1000,
};

/// GET / - Dashboard page
pub async fn dashboard_page() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

/// Health check endpoint
///
/// Returns a simple status response to verify the server is running
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok"
    }))
}

/// Response for filter options
#[derive(Debug, Serialize)]
pub struct FiltersResponse {
    /// Team choices, `"All"` first
    pub teams: Vec<String>,
    pub positions: Vec<String>,
    pub min_points: Slider,
    pub width: Slider,
    pub height: Slider,
}

/// GET /filters - Options for the filter widgets
pub async fn get_filters(State(state): State<Arc<AppState>>) -> Json<FiltersResponse> {
    let teams = std::iter::once(TeamSelection::All.as_str().to_string())
        .chain(state.table.teams())
        .collect();

    Json(FiltersResponse {
        teams,
        positions: state.table.positions(),
        min_points: MIN_POINTS_SLIDER,
        width: WIDTH_SLIDER,
        height: HEIGHT_SLIDER,
    })
}

/// Query parameters shared by the scoring endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ScoringQueryParams {
    pub min_points: Option<u32>,
    pub team: Option<String>,
    /// Comma separated positions; empty selects every position
    pub positions: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub pad: Option<String>,
    pub thickness: Option<String>,
    pub line_color: Option<String>,
    pub line_width: Option<String>,
}

impl ScoringQueryParams {
    /// Filter values. Width, height and rendering hints are not part of the key.
    fn filter(&self) -> Result<ScoringFilter, ApiError> {
        let min_points = MIN_POINTS_SLIDER.resolve("min_points", self.min_points)?;
        let team = self
            .team
            .as_deref()
            .map(TeamSelection::parse)
            .unwrap_or_default();
        let positions = self
            .positions
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .filter(|position| !position.trim().is_empty());
        Ok(ScoringFilter::new(min_points, team, positions))
    }

    fn options(&self) -> FlowOptions {
        let params: HashMap<String, String> = [
            ("pad", &self.pad),
            ("thickness", &self.thickness),
            ("line_color", &self.line_color),
            ("line_width", &self.line_width),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.clone().map(|value| (key.to_string(), value)))
        .collect();
        FlowOptions::from_map(&params)
    }

    fn size(&self) -> Result<(u32, u32), ApiError> {
        Ok((
            WIDTH_SLIDER.resolve("width", self.width)?,
            HEIGHT_SLIDER.resolve("height", self.height)?,
        ))
    }
}

fn evaluate(state: &AppState, params: &ScoringQueryParams) -> Result<Arc<ScoringView>, ApiError> {
    let filter = params.filter()?;
    let view = state
        .views
        .get_or_build(&state.table, &state.scoring_rows, filter)?;
    Ok(view)
}

/// Scoring table view
#[derive(Debug, Serialize)]
pub struct ScoringTable {
    pub row_count: usize,
    pub total_points: f64,
    pub rows: Vec<ScoringRow>,
}

impl ScoringTable {
    fn from_view(view: &ScoringView) -> Self {
        ScoringTable {
            row_count: view.rows.len(),
            total_points: view.total_points(),
            rows: view.rows.clone(),
        }
    }
}

/// Flow diagram view
#[derive(Debug, Serialize)]
pub struct ScoringFlow {
    pub width: u32,
    pub height: u32,
    pub diagram: FlowDiagram,
}

/// Response for GET /scoring/table
#[derive(Debug, Serialize)]
pub struct TableResponse {
    pub filter: ScoringFilter,
    pub table: ScoringTable,
}

/// Response for GET /scoring/flow
#[derive(Debug, Serialize)]
pub struct FlowResponse {
    pub filter: ScoringFilter,
    pub flow: ScoringFlow,
}

/// Response for GET /scoring
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub filter: ScoringFilter,
    pub table: ScoringTable,
    pub flow: ScoringFlow,
}

/// GET /scoring/table - Filtered player / shot type / points rows
pub async fn get_scoring_table(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ScoringQueryParams>,
) -> Result<Json<TableResponse>, ApiError> {
    let view = evaluate(&state, &params)?;

    Ok(Json(TableResponse {
        filter: view.filter.clone(),
        table: ScoringTable::from_view(&view),
    }))
}

/// GET /scoring/flow - Flow diagram for the filtered rows
pub async fn get_scoring_flow(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ScoringQueryParams>,
) -> Result<Json<FlowResponse>, ApiError> {
    let (width, height) = params.size()?;
    let view = evaluate(&state, &params)?;

    Ok(Json(FlowResponse {
        filter: view.filter.clone(),
        flow: ScoringFlow {
            width,
            height,
            diagram: view.diagram(params.options()),
        },
    }))
}

/// GET /scoring - Table and flow diagram from a single filter pass
pub async fn get_scoring(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ScoringQueryParams>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let (width, height) = params.size()?;
    let view = evaluate(&state, &params)?;

    Ok(Json(DashboardResponse {
        filter: view.filter.clone(),
        table: ScoringTable::from_view(&view),
        flow: ScoringFlow {
            width,
            height,
            diagram: view.diagram(params.options()),
        },
    }))
}
