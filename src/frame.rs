use crate::error::{AnalysisError, Result};
use crate::series::{mean, same_index, Series, TimeIndex};
use std::sync::Arc;

/// A labelled column of a [`DispatchFrame`].
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub label: String,
    pub values: Vec<f64>,
}

impl Column {
    pub fn mean(&self) -> f64 {
        mean(&self.values)
    }

    pub fn is_all_zero(&self) -> bool {
        self.values.iter().all(|&v| v == 0.0)
    }
}

/// Technology label to series mapping for a single zone.
///
/// Column order is significant: it is the stacking order. Generation and
/// import like columns are non-negative, consumption and export like
/// columns (flow out, storage charging) are negative.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchFrame {
    index: Arc<TimeIndex>,
    columns: Vec<Column>,
}

impl DispatchFrame {
    pub fn new(index: Arc<TimeIndex>) -> Self {
        Self {
            index,
            columns: Vec::default(),
        }
    }

    pub fn from_columns<L: Into<String>>(
        index: Arc<TimeIndex>,
        columns: impl IntoIterator<Item = (L, Vec<f64>)>,
    ) -> Result<Self> {
        let mut frame = Self::new(index);
        for (label, values) in columns {
            frame.push_values(label, values)?;
        }
        Ok(frame)
    }

    pub fn index(&self) -> &Arc<TimeIndex> {
        &self.index
    }

    /// Number of timesteps.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.label.as_str())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.position(label).is_some()
    }

    pub(crate) fn position(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.label == label)
    }

    pub fn column(&self, label: &str) -> Option<&[f64]> {
        self.position(label)
            .map(|i| self.columns[i].values.as_slice())
    }

    pub(crate) fn column_mut(&mut self, label: &str) -> Option<&mut Vec<f64>> {
        self.columns
            .iter_mut()
            .find(|c| c.label == label)
            .map(|c| &mut c.values)
    }

    pub fn series(&self, label: &str) -> Option<Series> {
        self.column(label)
            .map(|values| Series::from_parts(self.index.clone(), values.to_vec()))
    }

    /// Appends a column, or replaces the values of an existing column
    /// with the same label in place.
    pub fn push_values(&mut self, label: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let label = label.into();
        if values.len() != self.index.len() {
            return Err(AnalysisError::index_mismatch(
                &label,
                format!("{} values", self.index.len()),
                format!("{} values", values.len()),
            ));
        }
        match self.position(&label) {
            Some(i) => self.columns[i].values = values,
            None => self.columns.push(Column { label, values }),
        }
        Ok(())
    }

    /// Like [`push_values`](Self::push_values) but checks that the series
    /// shares the frame's index.
    pub fn insert(&mut self, label: impl Into<String>, series: &Series) -> Result<()> {
        let label = label.into();
        series.ensure_aligned(&label, &self.index)?;
        self.push_values(label, series.values().to_vec())
    }

    pub fn remove(&mut self, label: &str) -> Option<Vec<f64>> {
        self.position(label).map(|i| self.columns.remove(i).values)
    }

    pub fn is_aligned_with(&self, index: &Arc<TimeIndex>) -> bool {
        same_index(&self.index, index)
    }

    /// Sum over the columns `range` at every timestep.
    pub(crate) fn row_sums(&self, range: std::ops::Range<usize>) -> Vec<f64> {
        let mut sums = vec![0.0; self.len()];
        for column in &self.columns[range] {
            for (s, v) in sums.iter_mut().zip(&column.values) {
                *s += v;
            }
        }
        sums
    }

    /// Algebraic sum of all columns.
    pub fn total(&self) -> Series {
        Series::from_parts(self.index.clone(), self.row_sums(0..self.width()))
    }
}

/// Either a single series or a multi-column frame.
///
/// Storage levels, for instance, are reported per technology family or
/// collapsed into one zone-level series.
#[derive(Debug, Clone, PartialEq)]
pub enum Table {
    Series(Series),
    Frame(DispatchFrame),
}

impl Table {
    pub fn index(&self) -> &Arc<TimeIndex> {
        match self {
            Table::Series(series) => series.index(),
            Table::Frame(frame) => frame.index(),
        }
    }

    /// Sum over all the columns.
    pub fn total(&self) -> Series {
        match self {
            Table::Series(series) => series.clone(),
            Table::Frame(frame) => frame.total(),
        }
    }

    /// Frame view; a single series becomes a one-column frame labelled
    /// `label`.
    pub fn to_frame(&self, label: &str) -> DispatchFrame {
        match self {
            Table::Series(series) => DispatchFrame {
                index: series.index().clone(),
                columns: vec![Column {
                    label: label.to_string(),
                    values: series.values().to_vec(),
                }],
            },
            Table::Frame(frame) => frame.clone(),
        }
    }
}
