use crate::debug::format_f64_vec;
use crate::error::Result;
use crate::frame::DispatchFrame;
use crate::series::{Series, TimeIndex};
use serde::Serialize;
use std::sync::Arc;

pub const CURTAILMENT_LABEL: &str = "Curtailment";

/// Area between two consecutive cumulative boundaries of the stacked
/// dispatch chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackBand {
    pub label: String,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Ordered stacked-area layout of a zone's dispatch.
///
/// The negative block walks from `floor` (the sum of all the negative
/// columns) up towards zero, so the band nearest to zero is drawn last.
/// The positive block starts at exactly zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackLayout {
    #[serde(skip)]
    index: Arc<TimeIndex>,
    /// Number of columns classified as negative.
    pub split: usize,
    pub negative: Vec<StackBand>,
    pub positive: Vec<StackBand>,
    /// Lower boundary of the negative block.
    pub floor: Vec<f64>,
}

/// Named cumulative boundary.
struct Boundary {
    name: String,
    values: Vec<f64>,
}

/// Bands between consecutive boundaries. Each band takes the name of its
/// upper boundary, i.e. of the column that produced the transition.
fn bands(boundaries: &[Boundary]) -> Vec<StackBand> {
    boundaries
        .windows(2)
        .map(|pair| StackBand {
            label: pair[1].name.clone(),
            lower: pair[0].values.clone(),
            upper: pair[1].values.clone(),
        })
        .collect()
}

/// Position of the zero line in the frame's columns.
///
/// The cursor advances while the mean of the current column over the
/// whole horizon is not positive, stopping at the last column. This is a
/// whole-series heuristic: a column with transient sign changes is
/// classified once, by its mean, and may end up drawn on the wrong side
/// of the axis for some timesteps.
pub fn zero_line_position(frame: &DispatchFrame) -> usize {
    let columns = frame.columns();
    if columns.is_empty() {
        return 0;
    }
    let mut k = 0;
    let mut mean = columns[k].mean();
    while mean <= 0.0 && k < columns.len() - 1 {
        k += 1;
        mean = columns[k].mean();
    }
    k
}

/// Builds the stacked-area layout of a netted, merit-ordered frame.
///
/// Columns before the zero line are negated and accumulated from the
/// floor towards zero; the remaining columns are accumulated from a zero
/// boundary upwards. A frame without columns, e.g. a zone that neither
/// generates nor exchanges, gives a layout without bands.
pub fn build_stack_layout(frame: &DispatchFrame) -> Result<StackLayout> {
    let k = zero_line_position(frame);
    let columns = frame.columns();
    log::debug!(
        "zero line after {} of {} columns",
        k,
        columns.len()
    );

    let floor = frame.row_sums(0..k);
    let mut negative = vec![Boundary {
        name: "sum".to_string(),
        values: floor.clone(),
    }];
    for column in &columns[..k] {
        let prev = &negative[negative.len() - 1].values;
        let values = prev
            .iter()
            .zip(&column.values)
            .map(|(p, v)| p - v)
            .collect();
        negative.push(Boundary {
            name: column.label.clone(),
            values,
        });
    }

    let mut positive = vec![Boundary {
        name: "zero".to_string(),
        values: vec![0.0; frame.len()],
    }];
    for column in &columns[k..] {
        let prev = &positive[positive.len() - 1].values;
        let values = prev
            .iter()
            .zip(&column.values)
            .map(|(p, v)| p + v)
            .collect();
        positive.push(Boundary {
            name: column.label.clone(),
            values,
        });
    }

    if let Some(top) = positive.last() {
        log::trace!("stack top: {}", format_f64_vec(&top.values));
    }
    log::trace!("stack floor: {}", format_f64_vec(&floor));

    Ok(StackLayout {
        index: frame.index().clone(),
        split: k,
        negative: bands(&negative),
        positive: bands(&positive),
        floor,
    })
}

impl StackLayout {
    pub fn index(&self) -> &Arc<TimeIndex> {
        &self.index
    }

    /// Upper boundary of the positive block.
    pub fn top(&self) -> Vec<f64> {
        match self.positive.last() {
            Some(band) => band.upper.clone(),
            None => vec![0.0; self.index.len()],
        }
    }

    /// Band labels in drawing order: negative block first.
    pub fn legend(&self) -> Vec<&str> {
        self.negative
            .iter()
            .chain(&self.positive)
            .map(|band| band.label.as_str())
            .collect()
    }

    /// Curtailed power drawn below the floor of the negative block.
    pub fn curtailment_band(&self, curtailment: &Series) -> Result<StackBand> {
        curtailment.ensure_aligned("curtailment", &self.index)?;
        Ok(StackBand {
            label: CURTAILMENT_LABEL.to_string(),
            lower: self
                .floor
                .iter()
                .zip(curtailment.values())
                .map(|(f, c)| f - c)
                .collect(),
            upper: self.floor.clone(),
        })
    }
}
