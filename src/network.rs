use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::series::{same_index, Series, TimeIndex};
use crate::window::Window;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Separator of the zones in a line label, e.g. "BE -> FR".
pub const LINE_SEPARATOR: &str = " -> ";

/// Directed interconnection between two zones.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Serialize, Deserialize)]
pub struct Line {
    pub from: String,
    pub to: String,
}

impl Line {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn label(&self) -> String {
        self.to_string()
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.from, LINE_SEPARATOR, self.to)
    }
}

impl FromStr for Line {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(LINE_SEPARATOR) {
            Some((from, to)) if !from.trim().is_empty() && !to.trim().is_empty() => {
                Ok(Line::new(from.trim(), to.trim()))
            }
            _ => Err(AnalysisError::topology(s, "", "malformed line label")),
        }
    }
}

/// A non-zero flow on a line at one timestep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowRecord {
    pub from: String,
    pub to: String,
    pub timestamp: NaiveDateTime,
    pub flow: f64,
}

/// Flows (MW) between zones over a shared time index.
///
/// Self-loops are rejected on insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowTable {
    index: Arc<TimeIndex>,
    lines: BTreeMap<Line, Vec<f64>>,
}

impl FlowTable {
    pub fn new(index: Arc<TimeIndex>) -> Self {
        Self {
            index,
            lines: BTreeMap::new(),
        }
    }

    /// Builds a table from a square `zones x zones x time` matrix,
    /// `matrix[i][j][t]` being the flow from zone `i` to zone `j`.
    ///
    /// Entries that are zero over the whole horizon are dropped. A non-zero
    /// diagonal entry is an `InvalidTopology` error.
    pub fn from_dense(zones: &[String], index: Arc<TimeIndex>, matrix: &[Vec<Vec<f64>>]) -> Result<Self> {
        if matrix.len() != zones.len() {
            return Err(AnalysisError::topology(
                "",
                "",
                &format!("{} matrix rows for {} zones", matrix.len(), zones.len()),
            ));
        }
        let mut table = Self::new(index);
        for (i, row) in matrix.iter().enumerate() {
            if row.len() != zones.len() {
                return Err(AnalysisError::topology(
                    &zones[i],
                    "",
                    &format!("{} matrix columns for {} zones", row.len(), zones.len()),
                ));
            }
            for (j, flows) in row.iter().enumerate() {
                if flows.iter().all(|&f| f == 0.0) {
                    continue;
                }
                let series = Series::new(table.index.clone(), flows.clone())?;
                table.insert(Line::new(zones[i].as_str(), zones[j].as_str()), &series)?;
            }
        }
        Ok(table)
    }

    pub fn index(&self) -> &Arc<TimeIndex> {
        &self.index
    }

    pub fn insert(&mut self, line: Line, flow: &Series) -> Result<()> {
        if line.is_self_loop() {
            return Err(AnalysisError::topology(&line.from, &line.to, "self-loop"));
        }
        flow.ensure_aligned(&line.label(), &self.index)?;
        self.lines.insert(line, flow.values().to_vec());
        Ok(())
    }

    pub fn get(&self, line: &Line) -> Option<&[f64]> {
        self.lines.get(line).map(Vec::as_slice)
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.lines.keys()
    }

    fn check_window(&self, window: &Window) -> Result<()> {
        if window.fits(&self.index) {
            Ok(())
        } else {
            Err(AnalysisError::index_mismatch(
                "window",
                &self.index,
                format!("positions {} to {}", window.start(), window.end()),
            ))
        }
    }

    fn check_topology(&self) -> Result<()> {
        match self.lines.keys().find(|line| line.is_self_loop()) {
            Some(line) => Err(AnalysisError::topology(&line.from, &line.to, "self-loop")),
            None => Ok(()),
        }
    }

    /// Non-zero flows in the window, line by line.
    pub fn records(&self, window: &Window) -> Result<Vec<FlowRecord>> {
        self.check_window(window)?;
        let mut records = Vec::default();
        for (line, flows) in &self.lines {
            for t in window.range() {
                if flows[t] == 0.0 {
                    continue;
                }
                if let Some(timestamp) = self.index.get(t) {
                    records.push(FlowRecord {
                        from: line.from.clone(),
                        to: line.to.clone(),
                        timestamp,
                        flow: flows[t],
                    });
                }
            }
        }
        Ok(records)
    }

    /// Total flow of every line over the window.
    pub fn line_totals(&self, window: &Window) -> Result<BTreeMap<Line, f64>> {
        self.check_window(window)?;
        Ok(self
            .lines
            .iter()
            .map(|(line, flows)| (line.clone(), flows[window.range()].iter().sum()))
            .collect())
    }

    /// Net imports of a zone over the whole horizon.
    pub fn net_imports(&self, zone: &str) -> f64 {
        let mut net = 0.0;
        for (line, flows) in &self.lines {
            if line.to == zone {
                net += flows.iter().sum::<f64>();
            }
            if line.from == zone {
                net -= flows.iter().sum::<f64>();
            }
        }
        net
    }
}

/// Share of the horizon during which each line is congested.
///
/// Lines of `lines` whose label starts or ends with the rest-of-world
/// marker are dropped. A timestep of `window` counts as congested when
/// the flow in the line's direction equals its capacity limit and that
/// limit is strictly positive; flows against the direction never count. Counts are divided by the length of `horizon`, the
/// full demand index, not by the window length. Lines absent from the
/// flow or limit tables are never congested.
pub fn congestion(
    flows: &FlowTable,
    limits: &FlowTable,
    lines: &[Line],
    window: &Window,
    horizon: &TimeIndex,
    config: &AnalysisConfig,
) -> Result<BTreeMap<String, f64>> {
    if !same_index(&flows.index, &limits.index) {
        return Err(AnalysisError::index_mismatch(
            "capacity limits",
            &flows.index,
            &limits.index,
        ));
    }
    flows.check_window(window)?;
    if window.len() > horizon.len() {
        return Err(AnalysisError::index_mismatch(
            "window",
            horizon,
            format!("{} steps", window.len()),
        ));
    }

    let mut shares = BTreeMap::new();
    for line in lines {
        let label = line.label();
        if config.is_rest_of_world(&label) {
            continue;
        }
        let congested = match (flows.get(line), limits.get(line)) {
            (Some(flow), Some(limit)) => window
                .range()
                .filter(|&t| limit[t] > 0.0 && flow[t] == limit[t])
                .count(),
            _ => 0,
        };
        shares.insert(label, congested as f64 / horizon.len() as f64);
    }
    Ok(shares)
}

/// Net position of every zone over the window: inbound minus outbound
/// flow. Lines to zones outside `zones` only count for the listed end.
pub fn net_positions(flows: &FlowTable, zones: &[String], window: &Window) -> Result<BTreeMap<String, f64>> {
    flows.check_topology()?;
    flows.check_window(window)?;

    let mut positions = zones
        .iter()
        .map(|z| (z.clone(), 0.0))
        .collect::<BTreeMap<String, f64>>();
    for (line, total) in flows.line_totals(window)? {
        if let Some(p) = positions.get_mut(&line.to) {
            *p += total;
        }
        if let Some(p) = positions.get_mut(&line.from) {
            *p -= total;
        }
    }
    Ok(positions)
}
