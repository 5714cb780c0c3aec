//! Flow diagram aggregation
//!
//! Reshapes a table of observations into the link structure a layered flow
//! (Sankey) renderer consumes: for every adjacent pair of stage columns the
//! value column is summed per (source label, target label) group, and every
//! distinct label is numbered densely in first-seen order.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, trace};

/// Errors raised while validating an aggregation request.
///
/// Both variants are raised before any rows are grouped, so a failed call
/// never yields partial output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// The stage sequence is unusable (fewer than two columns, or repeats)
    InvalidInput(String),
    /// A named stage or value column is absent from a row's schema
    MissingColumn(String),
}

impl std::fmt::Display for FlowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            FlowError::MissingColumn(column) => write!(f, "Missing column: {}", column),
        }
    }
}

impl std::error::Error for FlowError {}

/// Row access used by the aggregator.
///
/// Implementors expose a fixed schema: `has_column` reports whether a column
/// exists at all, while `label`/`value` return `None` for a column that exists
/// but holds a missing cell.
pub trait FlowRecord {
    /// Whether `column` is part of this row's schema.
    fn has_column(&self, column: &str) -> bool;

    /// Categorical value of a stage column.
    fn label(&self, column: &str) -> Option<String>;

    /// Numeric value of the value column.
    fn value(&self, column: &str) -> Option<f64>;
}

/// A single cell of a [`Record`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Missing)
    }
}

/// Loosely-typed row keyed by column name, for ad hoc tables whose schema is
/// only known at runtime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    cells: HashMap<String, Cell>,
}

impl Record {
    pub fn new() -> Self {
        Record::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, column: impl Into<String>, cell: impl Into<Cell>) -> Self {
        self.cells.insert(column.into(), cell.into());
        self
    }
}

impl FlowRecord for Record {
    fn has_column(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }

    fn label(&self, column: &str) -> Option<String> {
        match self.cells.get(column)? {
            Cell::Text(text) => Some(text.clone()),
            Cell::Number(n) if n.is_nan() => None,
            Cell::Number(n) => Some(n.to_string()),
            Cell::Missing => None,
        }
    }

    fn value(&self, column: &str) -> Option<f64> {
        match self.cells.get(column)? {
            Cell::Number(n) if !n.is_nan() => Some(*n),
            Cell::Text(text) => text.trim().parse::<f64>().ok().filter(|n| !n.is_nan()),
            _ => None,
        }
    }
}

/// Rendering hints passed through to the flow diagram renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowOptions {
    /// Node spacing in pixels
    pub pad: u32,
    /// Node thickness in pixels
    pub thickness: u32,
    /// Node border color
    pub line_color: String,
    /// Node border width
    pub line_width: f64,
}

impl Default for FlowOptions {
    fn default() -> Self {
        FlowOptions {
            pad: 15,
            thickness: 20,
            line_color: "black".to_string(),
            line_width: 1.0,
        }
    }
}

impl FlowOptions {
    /// Builds options from a string map, falling back to the default for any
    /// key that is absent or does not parse. Unknown keys are ignored.
    pub fn from_map(params: &HashMap<String, String>) -> Self {
        let defaults = FlowOptions::default();
        FlowOptions {
            pad: params
                .get("pad")
                .and_then(|value| value.parse::<u32>().ok())
                .unwrap_or(defaults.pad),
            thickness: params
                .get("thickness")
                .and_then(|value| value.parse::<u32>().ok())
                .unwrap_or(defaults.thickness),
            line_color: params
                .get("line_color")
                .filter(|value| !value.trim().is_empty())
                .cloned()
                .unwrap_or(defaults.line_color),
            line_width: params
                .get("line_width")
                .and_then(|value| value.parse::<f64>().ok())
                .filter(|value| value.is_finite() && *value >= 0.0)
                .unwrap_or(defaults.line_width),
        }
    }
}

/// Dense numbering of every label that appears in a link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelIndex {
    labels: Vec<String>,
    positions: HashMap<String, usize>,
}

impl LabelIndex {
    fn new() -> Self {
        LabelIndex::default()
    }

    /// Returns the index of `label`, assigning the next free one if unseen.
    fn intern(&mut self, label: &str) -> usize {
        if let Some(&idx) = self.positions.get(label) {
            return idx;
        }
        let idx = self.labels.len();
        self.labels.push(label.to_string());
        self.positions.insert(label.to_string(), idx);
        idx
    }

    pub fn get(&self, label: &str) -> Option<usize> {
        self.positions.get(label).copied()
    }

    pub fn label(&self, idx: usize) -> Option<&str> {
        self.labels.get(idx).map(String::as_str)
    }

    /// Labels in index order; position `i` holds the label numbered `i`.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.labels
            .iter()
            .enumerate()
            .map(|(idx, label)| (label.as_str(), idx))
    }
}

/// Aggregated flow between two labels, by label index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowLink {
    pub source: usize,
    pub target: usize,
    pub value: f64,
}

/// Output of [`aggregate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowAggregate {
    pub links: Vec<FlowLink>,
    pub labels: LabelIndex,
}

impl FlowAggregate {
    /// Links with their indices resolved back to labels.
    pub fn labeled_links(&self) -> impl Iterator<Item = (&str, &str, f64)> + '_ {
        self.links.iter().filter_map(move |link| {
            Some((
                self.labels.label(link.source)?,
                self.labels.label(link.target)?,
                link.value,
            ))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

fn validate<R, S>(rows: &[R], stage_columns: &[S], value_column: &str) -> Result<(), FlowError>
where
    R: FlowRecord,
    S: AsRef<str>,
{
    if stage_columns.len() < 2 {
        return Err(FlowError::InvalidInput(format!(
            "at least 2 stage columns are required, got {}",
            stage_columns.len()
        )));
    }

    let mut seen = HashSet::new();
    for column in stage_columns {
        if !seen.insert(column.as_ref()) {
            return Err(FlowError::InvalidInput(format!(
                "stage column '{}' is listed more than once",
                column.as_ref()
            )));
        }
    }

    for row in rows {
        let columns = stage_columns
            .iter()
            .map(|column| column.as_ref())
            .chain(std::iter::once(value_column));
        for column in columns {
            if !row.has_column(column) {
                return Err(FlowError::MissingColumn(column.to_string()));
            }
        }
    }

    Ok(())
}

/// Sums `value_column` per (source label, target label) for one stage pair.
///
/// Groups come back sorted by key, so output order is independent of row order.
fn group_stage_pair<R: FlowRecord>(
    rows: &[R],
    source_column: &str,
    target_column: &str,
    value_column: &str,
) -> BTreeMap<(String, String), f64> {
    let mut groups = BTreeMap::new();
    for row in rows {
        let (Some(source), Some(target), Some(value)) = (
            row.label(source_column),
            row.label(target_column),
            row.value(value_column).filter(|v| !v.is_nan()),
        ) else {
            continue;
        };
        *groups.entry((source, target)).or_insert(0.0) += value;
    }
    groups
}

/// Aggregates `rows` into flow links across consecutive `stage_columns`.
///
/// # Errors
/// * [`FlowError::InvalidInput`] if fewer than two (or repeated) stage columns are given
/// * [`FlowError::MissingColumn`] if a stage or value column is absent from any row
pub fn aggregate<R, S>(
    rows: &[R],
    stage_columns: &[S],
    value_column: &str,
) -> Result<FlowAggregate, FlowError>
where
    R: FlowRecord,
    S: AsRef<str>,
{
    validate(rows, stage_columns, value_column)?;

    let mut labels = LabelIndex::new();
    let mut links = Vec::new();

    for pair in stage_columns.windows(2) {
        let (source_column, target_column) = (pair[0].as_ref(), pair[1].as_ref());
        let groups = group_stage_pair(rows, source_column, target_column, value_column);
        trace!(
            source = source_column,
            target = target_column,
            groups = groups.len(),
            "grouped stage pair"
        );

        for ((source, target), value) in groups {
            let source = labels.intern(&source);
            let target = labels.intern(&target);
            links.push(FlowLink {
                source,
                target,
                value,
            });
        }
    }

    debug!(
        rows = rows.len(),
        links = links.len(),
        labels = labels.len(),
        "aggregated flow"
    );

    Ok(FlowAggregate { links, labels })
}

/// Renderer-ready flow diagram: label index, indexed links and rendering hints.
///
/// Serializes to the `node`/`link` layout used by Sankey renderers:
/// `{"node": {"pad", "thickness", "line": {"color", "width"}, "label"},
///   "link": {"source", "target", "value"}}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowDiagram {
    pub aggregate: FlowAggregate,
    pub options: FlowOptions,
}

impl FlowDiagram {
    /// Aggregates `rows` and attaches `options` for rendering.
    pub fn from_rows<R, S>(
        rows: &[R],
        stage_columns: &[S],
        value_column: &str,
        options: FlowOptions,
    ) -> Result<Self, FlowError>
    where
        R: FlowRecord,
        S: AsRef<str>,
    {
        let aggregate = aggregate(rows, stage_columns, value_column)?;
        Ok(FlowDiagram { aggregate, options })
    }

    pub fn labels(&self) -> &[String] {
        self.aggregate.labels.labels()
    }

    pub fn links(&self) -> &[FlowLink] {
        &self.aggregate.links
    }
}

#[derive(Serialize)]
struct NodeLine<'a> {
    color: &'a str,
    width: f64,
}

#[derive(Serialize)]
struct NodePayload<'a> {
    pad: u32,
    thickness: u32,
    line: NodeLine<'a>,
    label: &'a [String],
}

#[derive(Serialize)]
struct LinkPayload {
    source: Vec<usize>,
    target: Vec<usize>,
    value: Vec<f64>,
}

impl Serialize for FlowDiagram {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let links = self.links();
        let node = NodePayload {
            pad: self.options.pad,
            thickness: self.options.thickness,
            line: NodeLine {
                color: &self.options.line_color,
                width: self.options.line_width,
            },
            label: self.labels(),
        };
        let link = LinkPayload {
            source: links.iter().map(|l| l.source).collect(),
            target: links.iter().map(|l| l.target).collect(),
            value: links.iter().map(|l| l.value).collect(),
        };

        let mut state = serializer.serialize_struct("FlowDiagram", 2)?;
        state.serialize_field("node", &node)?;
        state.serialize_field("link", &link)?;
        state.end()
    }
}
