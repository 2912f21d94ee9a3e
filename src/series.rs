use crate::error::{AnalysisError, Result};
use crate::window::Window;
use chrono::{Duration, NaiveDateTime};
use itertools::Itertools;
use std::fmt;
use std::sync::Arc;

/// Ordered, gap-free sequence of timestamps shared by all the series of
/// one simulation run.
///
/// The index is stored as a start, a fixed positive step and a length, so
/// two indices are equal exactly when they enumerate the same timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimeIndex {
    start: NaiveDateTime,
    step: Duration,
    len: usize,
}

impl TimeIndex {
    pub fn new(start: NaiveDateTime, step: Duration, len: usize) -> Result<Self> {
        if len == 0 {
            return Err(AnalysisError::EmptyInput("time index".to_string()));
        }
        if step <= Duration::zero() {
            return Err(AnalysisError::IrregularIndex(format!(
                "step must be positive, got {}",
                step
            )));
        }
        let last = i32::try_from(len - 1)
            .ok()
            .and_then(|n| step.checked_mul(n))
            .and_then(|span| start.checked_add_signed(span));
        if last.is_none() {
            return Err(AnalysisError::IrregularIndex(format!(
                "{} steps of {} from {} overflow the calendar",
                len, step, start
            )));
        }
        Ok(Self { start, step, len })
    }

    pub fn hourly(start: NaiveDateTime, len: usize) -> Result<Self> {
        Self::new(start, Duration::hours(1), len)
    }

    /// Builds an index from explicit timestamps.
    ///
    /// The timestamps must be strictly increasing with a fixed step. A
    /// single timestamp is given an hourly step.
    pub fn from_timestamps(timestamps: &[NaiveDateTime]) -> Result<Self> {
        let start = match timestamps.first() {
            Some(&start) => start,
            None => return Err(AnalysisError::EmptyInput("time index".to_string())),
        };
        if timestamps.len() == 1 {
            return Self::hourly(start, 1);
        }

        let step = timestamps[1] - timestamps[0];
        if step <= Duration::zero() {
            return Err(AnalysisError::IrregularIndex(format!(
                "timestamps must be strictly increasing: {} followed by {}",
                timestamps[0], timestamps[1]
            )));
        }
        if let Some((a, b)) = timestamps
            .iter()
            .tuple_windows()
            .find(|(a, b)| **b - **a != step)
        {
            return Err(AnalysisError::IrregularIndex(format!(
                "step between {} and {} differs from {}",
                a, b, step
            )));
        }

        Self::new(start, step, timestamps.len())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false: an index holds at least one timestamp.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Last timestamp of the index.
    pub fn end(&self) -> NaiveDateTime {
        self.at(self.len - 1)
    }

    /// `i < len`, and `new` checked that the last step is representable.
    fn at(&self, i: usize) -> NaiveDateTime {
        let offset = i32::try_from(i)
            .ok()
            .and_then(|n| self.step.checked_mul(n))
            .unwrap_or_else(Duration::zero);
        self.start + offset
    }

    pub fn get(&self, i: usize) -> Option<NaiveDateTime> {
        if i < self.len {
            Some(self.at(i))
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        (0..self.len).map(|i| self.at(i))
    }

    /// Position of `timestamp` in the index, if it is one of its steps.
    pub fn position(&self, timestamp: NaiveDateTime) -> Option<usize> {
        let offset = timestamp - self.start;
        if offset < Duration::zero() {
            return None;
        }
        let step = self.step.num_nanoseconds()?;
        let offset = offset.num_nanoseconds()?;
        if step <= 0 || offset % step != 0 {
            return None;
        }
        let i = (offset / step) as usize;
        if i < self.len {
            Some(i)
        } else {
            None
        }
    }

    /// Window covering `start..=end`, or `None` when either end is not a
    /// timestamp of this index or the range is reversed.
    pub fn window(&self, start: NaiveDateTime, end: NaiveDateTime) -> Option<Window> {
        let (i, j) = (self.position(start)?, self.position(end)?);
        if i > j {
            return None;
        }
        Some(Window::new(i, j + 1))
    }

    pub fn full(&self) -> Window {
        Window::new(0, self.len)
    }
}

impl fmt::Display for TimeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} steps of {}s from {}",
            self.len,
            self.step.num_seconds(),
            self.start
        )
    }
}

/// Returns true if both indices enumerate the same timestamps.
pub(crate) fn same_index(a: &Arc<TimeIndex>, b: &Arc<TimeIndex>) -> bool {
    Arc::ptr_eq(a, b) || a == b
}

/// Values of one (zone, technology or line) pair over a [`TimeIndex`].
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    index: Arc<TimeIndex>,
    values: Vec<f64>,
}

impl Series {
    pub fn new(index: Arc<TimeIndex>, values: Vec<f64>) -> Result<Self> {
        if values.len() != index.len() {
            return Err(AnalysisError::index_mismatch(
                "series values",
                format!("{} values", index.len()),
                format!("{} values", values.len()),
            ));
        }
        Ok(Self { index, values })
    }

    /// Length must equal the index length.
    pub(crate) fn from_parts(index: Arc<TimeIndex>, values: Vec<f64>) -> Self {
        debug_assert_eq!(index.len(), values.len());
        Self { index, values }
    }

    pub fn constant(index: Arc<TimeIndex>, value: f64) -> Self {
        let values = vec![value; index.len()];
        Self { index, values }
    }

    pub fn zeros(index: Arc<TimeIndex>) -> Self {
        Self::constant(index, 0.0)
    }

    pub fn index(&self) -> &Arc<TimeIndex> {
        &self.index
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_aligned_with(&self, index: &Arc<TimeIndex>) -> bool {
        same_index(&self.index, index)
    }

    /// Fails with `IndexMismatch` unless this series is indexed by `index`.
    pub fn ensure_aligned(&self, name: &str, index: &Arc<TimeIndex>) -> Result<()> {
        if self.is_aligned_with(index) {
            Ok(())
        } else {
            Err(AnalysisError::index_mismatch(name, index, &self.index))
        }
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn mean(&self) -> f64 {
        mean(&self.values)
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn min(&self) -> f64 {
        self.values.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// True when both the maximum and the minimum are exactly zero.
    pub fn is_all_zero(&self) -> bool {
        self.max() == 0.0 && self.min() == 0.0
    }

    pub fn slice(&self, window: &Window) -> &[f64] {
        &self.values[window.range()]
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Series {
        Series {
            index: self.index.clone(),
            values: self.values.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Combines two aligned series element-wise. `name` identifies `other`
    /// in the error raised when the indices differ.
    pub fn zip_with(
        &self,
        other: &Series,
        name: &str,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Series> {
        other.ensure_aligned(name, &self.index)?;
        Ok(Series {
            index: self.index.clone(),
            values: self
                .values
                .iter()
                .zip(&other.values)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixtures::{hourly, t0};
    use anyhow::Result;

    #[test]
    fn test_from_timestamps_regular() -> Result<()> {
        let index = hourly(4);
        let timestamps = index.iter().collect::<Vec<_>>();
        let rebuilt = TimeIndex::from_timestamps(&timestamps)?;
        assert_eq!(*index, rebuilt);
        assert_eq!(rebuilt.end(), t0() + Duration::hours(3));
        Ok(())
    }

    #[test]
    fn test_from_timestamps_with_gap() {
        let timestamps = [
            t0(),
            t0() + Duration::hours(1),
            t0() + Duration::hours(3),
        ];
        let err = TimeIndex::from_timestamps(&timestamps).unwrap_err();
        assert!(matches!(err, AnalysisError::IrregularIndex(_)));
    }

    #[test]
    fn test_from_timestamps_decreasing() {
        let timestamps = [t0() + Duration::hours(1), t0()];
        let err = TimeIndex::from_timestamps(&timestamps).unwrap_err();
        assert!(matches!(err, AnalysisError::IrregularIndex(_)));
    }

    #[test]
    fn test_empty_index() {
        let err = TimeIndex::from_timestamps(&[]).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyInput(_)));
    }

    #[test]
    fn test_position_and_window() -> Result<()> {
        let index = hourly(24);
        assert_eq!(index.position(t0() + Duration::hours(5)), Some(5));
        assert_eq!(index.position(t0() + Duration::minutes(90)), None);
        assert_eq!(index.position(t0() - Duration::hours(1)), None);
        assert_eq!(index.position(t0() + Duration::hours(24)), None);

        let window = index
            .window(t0() + Duration::hours(2), t0() + Duration::hours(4))
            .ok_or_else(|| anyhow::format_err!("window must resolve"))?;
        assert_eq!(window.range(), 2..5);
        assert!(index.window(t0() + Duration::hours(4), t0()).is_none());
        Ok(())
    }

    #[test]
    fn test_sub_millisecond_step() -> Result<()> {
        let index = TimeIndex::new(t0(), Duration::microseconds(500), 4)?;
        assert_eq!(index.position(t0() + Duration::microseconds(1000)), Some(2));
        assert_eq!(index.position(t0() + Duration::microseconds(250)), None);
        let window = index
            .window(t0(), t0() + Duration::microseconds(1500))
            .ok_or_else(|| anyhow::format_err!("window must resolve"))?;
        assert_eq!(window.range(), 0..4);
        Ok(())
    }

    #[test]
    fn test_index_too_long() {
        let len = i32::MAX as usize + 2;
        let err = TimeIndex::hourly(t0(), len).unwrap_err();
        assert!(matches!(err, AnalysisError::IrregularIndex(_)));

        let err = TimeIndex::new(t0(), Duration::days(365 * 200_000), 3).unwrap_err();
        assert!(matches!(err, AnalysisError::IrregularIndex(_)));
    }

    #[test]
    fn test_series_length_must_match_index() {
        let err = Series::new(hourly(3), vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, AnalysisError::IndexMismatch { .. }));
    }

    #[test]
    fn test_zip_with_checks_index() -> Result<()> {
        let a = Series::new(hourly(3), vec![1.0, 2.0, 3.0])?;
        let b = Series::new(hourly(3), vec![1.0, 1.0, 1.0])?;
        assert_eq!(a.zip_with(&b, "b", |x, y| x - y)?.values(), &[0.0, 1.0, 2.0]);

        let shifted = Arc::new(TimeIndex::hourly(t0() + Duration::hours(1), 3)?);
        let c = Series::zeros(shifted);
        assert!(matches!(
            a.zip_with(&c, "c", |x, y| x + y),
            Err(AnalysisError::IndexMismatch { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_all_zero() -> Result<()> {
        assert!(Series::zeros(hourly(5)).is_all_zero());
        assert!(!Series::new(hourly(2), vec![0.0, -1.0])?.is_all_zero());
        Ok(())
    }
}
