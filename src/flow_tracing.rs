use crate::error::Result;
use crate::network::{net_positions, FlowTable};
use crate::window::Window;
use serde::Serialize;
use std::collections::BTreeMap;

/// Zone by zone energy exchange (MWh), `values[i][j]` being the energy
/// produced in `zones[i]` and consumed in `zones[j]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangeMatrix {
    pub zones: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl ExchangeMatrix {
    /// Expresses every column as a percentage of the consuming zone's
    /// load. Zones without load get zero shares.
    pub fn share_of_load(&self, load: &BTreeMap<String, f64>) -> ExchangeMatrix {
        let values = self
            .values
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&self.zones)
                    .map(|(v, zone)| match load.get(zone) {
                        Some(&l) if l != 0.0 => v / l * 100.0,
                        _ => 0.0,
                    })
                    .collect()
            })
            .collect();
        ExchangeMatrix {
            zones: self.zones.clone(),
            values,
        }
    }
}

/// Power flow tracing: attributes consumption in each zone to the zones
/// where the energy was produced.
///
/// Only the two aggregates below are exposed; the attribution numerics
/// belong to the implementation.
pub trait FlowTracing {
    fn net_positions(&self, zones: &[String], window: &Window) -> Result<BTreeMap<String, f64>>;

    fn exchange_matrix(&self, zones: &[String], window: &Window) -> Result<ExchangeMatrix>;
}

/// Direct bilateral exchanges: energy is attributed to the neighbouring
/// zone it was imported from, without following transit.
impl FlowTracing for FlowTable {
    fn net_positions(&self, zones: &[String], window: &Window) -> Result<BTreeMap<String, f64>> {
        net_positions(self, zones, window)
    }

    fn exchange_matrix(&self, zones: &[String], window: &Window) -> Result<ExchangeMatrix> {
        let mut values = vec![vec![0.0; zones.len()]; zones.len()];
        let position = |zone: &str| zones.iter().position(|z| z == zone);
        for (line, total) in self.line_totals(window)? {
            if let (Some(i), Some(j)) = (position(line.from.as_str()), position(line.to.as_str())) {
                values[i][j] += total;
            }
        }
        Ok(ExchangeMatrix {
            zones: zones.to_vec(),
            values,
        })
    }
}
