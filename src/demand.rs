use crate::error::{AnalysisError, Result};
use crate::frame::DispatchFrame;
use crate::series::{Series, TimeIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone, Serialize, Deserialize)]
pub enum DemandKind {
    /// Day-ahead (inflexible) demand, "DA".
    DayAhead,
    /// Flexible demand, "Flex".
    Flexible,
}

impl fmt::Display for DemandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemandKind::DayAhead => f.write_str("DA"),
            DemandKind::Flexible => f.write_str("Flex"),
        }
    }
}

/// Demand series (MW) keyed by kind and zone.
#[derive(Debug, Clone, PartialEq)]
pub struct DemandTable {
    index: Arc<TimeIndex>,
    series: BTreeMap<(DemandKind, String), Series>,
}

impl DemandTable {
    pub fn new(index: Arc<TimeIndex>) -> Self {
        Self {
            index,
            series: BTreeMap::new(),
        }
    }

    pub fn index(&self) -> &Arc<TimeIndex> {
        &self.index
    }

    pub fn insert(&mut self, kind: DemandKind, zone: impl Into<String>, series: Series) -> Result<()> {
        let zone = zone.into();
        series.ensure_aligned(&format!("{} demand of {}", kind, zone), &self.index)?;
        self.series.insert((kind, zone), series);
        Ok(())
    }

    pub fn get(&self, kind: DemandKind, zone: &str) -> Option<&Series> {
        self.series.get(&(kind, zone.to_string()))
    }

    /// Zones with day-ahead demand.
    pub fn zones(&self) -> impl Iterator<Item = &str> {
        self.series
            .keys()
            .filter(|(kind, _)| *kind == DemandKind::DayAhead)
            .map(|(_, zone)| zone.as_str())
    }

    /// Total demand of a zone: day-ahead demand, plus the power consumed by
    /// the zone's power-to-X units (sum of the columns of
    /// `power_consumption`), plus flexible demand.
    pub fn zone_demand(&self, zone: &str, power_consumption: Option<&DispatchFrame>) -> Result<Series> {
        let day_ahead = self
            .get(DemandKind::DayAhead, zone)
            .ok_or_else(|| AnalysisError::EmptyInput(format!("no day-ahead demand for {}", zone)))?;

        let mut total = day_ahead.clone();
        if let Some(consumption) = power_consumption {
            if !consumption.is_aligned_with(&self.index) {
                return Err(AnalysisError::index_mismatch(
                    &format!("power consumption of {}", zone),
                    &self.index,
                    consumption.index(),
                ));
            }
            total = total.zip_with(&consumption.total(), "power consumption", |d, c| d + c)?;
        }
        if let Some(flexible) = self.get(DemandKind::Flexible, zone) {
            total = total.zip_with(flexible, "flexible demand", |d, f| d + f)?;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixtures::{frame, hourly, series};
    use anyhow::Result;

    #[test]
    fn test_zone_demand() -> Result<()> {
        let index = hourly(2);
        let mut table = DemandTable::new(index.clone());
        table.insert(DemandKind::DayAhead, "BE", series(&index, &[100.0, 110.0]))?;
        table.insert(DemandKind::Flexible, "BE", series(&index, &[5.0, 0.0]))?;
        table.insert(DemandKind::DayAhead, "FR", series(&index, &[300.0, 310.0]))?;

        let p2h = frame(&index, &[("BE_P2HT", &[1.0, 2.0]), ("BE_ELYS", &[3.0, 4.0])]);
        let demand = table.zone_demand("BE", Some(&p2h))?;
        assert_eq!(demand.values(), &[109.0, 116.0]);

        let demand = table.zone_demand("FR", None)?;
        assert_eq!(demand.values(), &[300.0, 310.0]);
        assert_eq!(table.zones().collect::<Vec<_>>(), ["BE", "FR"]);
        Ok(())
    }

    #[test]
    fn test_missing_zone() {
        let table = DemandTable::new(hourly(2));
        let err = table.zone_demand("BE", None).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyInput(_)));
    }

    #[test]
    fn test_insert_misaligned() {
        let mut table = DemandTable::new(hourly(2));
        let err = table
            .insert(DemandKind::DayAhead, "BE", series(&hourly(3), &[1.0, 1.0, 1.0]))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::IndexMismatch { .. }));
    }
}
