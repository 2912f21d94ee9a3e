use crate::config::AnalysisConfig;
use crate::series::TimeIndex;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::ops::Range;

/// Half-open range of positions `[start, end)` into a [`TimeIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    start: usize,
    end: usize,
}

impl Window {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// True if every position of the window exists in `index`.
    pub fn fits(&self, index: &TimeIndex) -> bool {
        self.end <= index.len()
    }

    /// Resolves the inspection window for chart preparation.
    ///
    /// Without a requested range the first `default_window_steps` steps
    /// are used (at most `len - 1`, at least one). A requested range that
    /// does not lie within the index falls back to the same default.
    pub fn resolve(
        index: &TimeIndex,
        requested: Option<(NaiveDateTime, NaiveDateTime)>,
        config: &AnalysisConfig,
    ) -> Window {
        let default = Window::new(
            0,
            config
                .default_window_steps
                .min(index.len() - 1)
                .max(1),
        );

        match requested {
            None => {
                log::info!(
                    "no range specified, inspecting the first {} steps",
                    default.len()
                );
                default
            }
            Some((start, end)) => match index.window(start, end) {
                Some(window) => window,
                None => {
                    log::warn!(
                        "range {} to {} is not properly defined, inspecting the first {} steps",
                        start,
                        end,
                        default.len()
                    );
                    default
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixtures::{hourly, init_logger, t0};
    use chrono::Duration;

    #[test]
    fn test_default_is_first_week() {
        init_logger();
        let config = AnalysisConfig::default();
        let index = hourly(24 * 30);
        assert_eq!(Window::resolve(&index, None, &config).range(), 0..168);
    }

    #[test]
    fn test_default_on_short_horizon() {
        let config = AnalysisConfig::default();
        assert_eq!(Window::resolve(&hourly(10), None, &config).range(), 0..9);
        assert_eq!(Window::resolve(&hourly(1), None, &config).range(), 0..1);
    }

    #[test]
    fn test_requested_range() {
        let config = AnalysisConfig::default();
        let index = hourly(48);
        let requested = (t0() + Duration::hours(10), t0() + Duration::hours(20));
        let window = Window::resolve(&index, Some(requested), &config);
        assert_eq!(window.range(), 10..21);
        assert_eq!(window.len(), 11);
    }

    #[test]
    fn test_out_of_range_falls_back() {
        init_logger();
        let config = AnalysisConfig::default();
        let index = hourly(48);
        let requested = (t0() + Duration::hours(10), t0() + Duration::hours(100));
        assert_eq!(
            Window::resolve(&index, Some(requested), &config).range(),
            0..47
        );
    }
}
