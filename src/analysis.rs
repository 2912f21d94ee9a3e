use crate::balance::{reconcile, Reconciliation};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::frame::{DispatchFrame, Table};
use crate::merit::arrange_by_merit_order;
use crate::netting::net_flows;
use crate::series::Series;
use crate::stack::{build_stack_layout, StackBand, StackLayout};
use crate::storage::{aggregate_storage, Aggregation, StorageUnit};
use crate::window::Window;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

/// Simulation results of one zone.
#[derive(Debug, Clone)]
pub struct ZoneInputs {
    pub zone: String,
    /// Power by fuel (MW), including the flow-in/flow-out and storage
    /// charging columns.
    pub dispatch: DispatchFrame,
    pub demand: Series,
    pub shed_load: Option<Series>,
    pub shifted_load: Option<Series>,
    pub curtailment: Option<Series>,
    pub storage_units: Vec<StorageUnit>,
    /// Availability factors of vehicle batteries, by unit name.
    pub availability: BTreeMap<String, Series>,
    pub aggregation: Aggregation,
    pub range: Option<(NaiveDateTime, NaiveDateTime)>,
}

impl ZoneInputs {
    pub fn new(zone: impl Into<String>, dispatch: DispatchFrame, demand: Series) -> Self {
        Self {
            zone: zone.into(),
            dispatch,
            demand,
            shed_load: None,
            shifted_load: None,
            curtailment: None,
            storage_units: Vec::default(),
            availability: BTreeMap::default(),
            aggregation: Aggregation::default(),
            range: None,
        }
    }

    pub fn with_shed_load(mut self, shed_load: Series) -> Self {
        self.shed_load = Some(shed_load);
        self
    }

    pub fn with_shifted_load(mut self, shifted_load: Series) -> Self {
        self.shifted_load = Some(shifted_load);
        self
    }

    pub fn with_curtailment(mut self, curtailment: Series) -> Self {
        self.curtailment = Some(curtailment);
        self
    }

    pub fn with_storage(mut self, units: Vec<StorageUnit>, availability: BTreeMap<String, Series>) -> Self {
        self.storage_units = units;
        self.availability = availability;
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn with_range(mut self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        self.range = Some((start, end));
        self
    }
}

/// Chart-ready dispatch of one zone.
#[derive(Debug, Clone)]
pub struct ZoneDispatch {
    pub zone: String,
    /// Netted, merit-ordered dispatch.
    pub frame: DispatchFrame,
    pub layout: StackLayout,
    pub curtailment_band: Option<StackBand>,
    pub reconciliation: Reconciliation,
    pub storage: Table,
    /// Stacked storage levels, `None` without storage in the zone.
    pub storage_layout: Option<StackLayout>,
    pub window: Window,
}

/// Prepares the dispatch of a zone for plotting.
pub fn analyse_zone(inputs: &ZoneInputs, config: &AnalysisConfig) -> Result<ZoneDispatch> {
    log::info!("analysing dispatch of {}", inputs.zone);
    let index = inputs.demand.index();

    let frame = arrange_by_merit_order(&net_flows(&inputs.dispatch, config), config)?;
    let layout = build_stack_layout(&frame)?;

    let reconciliation = reconcile(
        &inputs.demand,
        &frame,
        inputs.shed_load.as_ref(),
        inputs.shifted_load.as_ref(),
        inputs.curtailment.as_ref(),
        config,
    )?;
    if let Some(violation) = &reconciliation.report.violation {
        log::warn!("{}: {}", inputs.zone, violation);
    }

    let curtailment_band = match &reconciliation.curtailment {
        Some(curtailment) => Some(layout.curtailment_band(curtailment)?),
        None => None,
    };

    let storage = aggregate_storage(
        &inputs.storage_units,
        &inputs.zone,
        &inputs.availability,
        index,
        inputs.aggregation,
        config,
    )?;
    let storage_frame = storage.to_frame(&inputs.zone);
    let storage_layout = if storage_frame.is_empty() {
        None
    } else {
        Some(build_stack_layout(&storage_frame)?)
    };

    let window = Window::resolve(index, inputs.range, config);

    Ok(ZoneDispatch {
        zone: inputs.zone.clone(),
        frame,
        layout,
        curtailment_band,
        reconciliation,
        storage,
        storage_layout,
        window,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::series::TimeIndex;
    use crate::tests::fixtures::{frame, hourly, init_logger, series};
    use anyhow::{format_err, Result};
    use std::sync::Arc;

    fn inputs(zone: &str, index: &Arc<TimeIndex>) -> ZoneInputs {
        let dispatch = frame(
            index,
            &[
                ("WIN", &[40.0, 42.0, 30.0]),
                ("GAS", &[60.0, 60.0, 70.0]),
                ("FlowIn", &[0.0, 3.0, 5.0]),
                ("FlowOut", &[-5.0, -5.0, -5.0]),
            ],
        );
        ZoneInputs::new(zone, dispatch, series(index, &[95.0, 100.0, 100.0]))
    }

    #[test]
    fn test_analyse_zone() -> Result<()> {
        init_logger();
        let config = AnalysisConfig::default();
        let index = hourly(3);
        let units = vec![StorageUnit::new(
            "BE_HPHS",
            "BE",
            "HPHS",
            100.0,
            series(&index, &[10.0, 20.0, 30.0]),
        )];
        let z = inputs("BE", &index)
            .with_curtailment(series(&index, &[1.0, 0.0, 0.0]))
            .with_storage(units, BTreeMap::new());

        let dispatch = analyse_zone(&z, &config)?;
        assert_eq!(
            dispatch.frame.labels().collect::<Vec<_>>(),
            ["FlowOut", "GAS", "WIN"]
        );
        assert_eq!(dispatch.frame.column("FlowOut"), Some(&[-5.0, -2.0, 0.0][..]));
        assert!(!dispatch.frame.contains("FlowIn"));
        assert_eq!(dispatch.layout.split, 1);
        assert!(dispatch.reconciliation.report.is_balanced());

        let band = dispatch
            .curtailment_band
            .ok_or_else(|| format_err!("curtailment band expected"))?;
        assert_eq!(band.lower, [-6.0, -2.0, 0.0]);

        let storage_layout = dispatch
            .storage_layout
            .ok_or_else(|| format_err!("storage layout expected"))?;
        assert_eq!(storage_layout.legend(), ["HPHS"]);
        assert_eq!(dispatch.window.range(), 0..2);
        Ok(())
    }

    #[test]
    fn test_zone_without_storage() -> Result<()> {
        let config = AnalysisConfig::default();
        let index = hourly(3);
        let dispatch = analyse_zone(&inputs("FR", &index), &config)?;
        assert!(dispatch.storage_layout.is_none());
        assert!(dispatch.curtailment_band.is_none());
        Ok(())
    }

    #[test]
    fn test_zone_without_generation() -> Result<()> {
        let config = AnalysisConfig::default();
        let index = hourly(2);
        let dispatch = frame(&index, &[("GAS", &[0.0, 0.0]), ("FlowIn", &[0.0, 0.0])]);
        let z = ZoneInputs::new("LU", dispatch, series(&index, &[20.0, 0.0]))
            .with_shed_load(series(&index, &[20.0, 0.0]))
            .with_aggregation(Aggregation::Zone);

        let dispatch = analyse_zone(&z, &config)?;
        assert!(dispatch.frame.is_empty());
        assert!(dispatch.layout.legend().is_empty());
        assert_eq!(dispatch.layout.top(), [0.0, 0.0]);
        assert!(dispatch.reconciliation.report.is_balanced());
        assert_eq!(dispatch.reconciliation.adjusted_demand.values(), &[0.0, 0.0]);
        assert!(dispatch.storage_layout.is_none());
        Ok(())
    }

    #[test]
    fn test_misaligned_inputs() {
        let config = AnalysisConfig::default();
        let index = hourly(3);
        let z = inputs("BE", &index).with_shed_load(series(&hourly(2), &[0.0, 0.0]));
        let err = analyse_zone(&z, &config).unwrap_err();
        assert!(matches!(err, AnalysisError::IndexMismatch { .. }));
    }

    #[test]
    fn test_parallel_zones() -> Result<()> {
        let config = &AnalysisConfig::default();
        let index = hourly(3);
        let zones = ["BE", "FR", "DE", "NL"]
            .iter()
            .map(|z| inputs(z, &index))
            .collect::<Vec<ZoneInputs>>();

        let results = std::thread::scope(|s| {
            let handles = zones
                .iter()
                .map(|z| s.spawn(move || analyse_zone(z, config)))
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|h| h.join().map_err(|_| format_err!("analysis thread panicked")))
                .collect::<Result<Vec<_>>>()
        })?;

        for (z, result) in zones.iter().zip(results) {
            let dispatch = result?;
            assert_eq!(dispatch.zone, z.zone);
            assert_eq!(dispatch.layout.split, 1);
        }
        Ok(())
    }
}
