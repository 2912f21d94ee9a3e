use crate::config::AnalysisConfig;
use crate::debug::{format_f64, format_percent};
use crate::error::{AnalysisError, Result};
use crate::frame::DispatchFrame;
use crate::series::Series;
use serde::Serialize;
use std::fmt;

/// Instantaneous energy balance of one reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceReport {
    /// `generation - demand + shifted load + shed load` at every timestep.
    pub residual: Vec<f64>,
    pub max_abs_residual: f64,
    /// `tolerance * max(demand)`.
    pub threshold: f64,
    pub violation: Option<BalanceViolation>,
}

/// Residual above the tolerated threshold. Advisory only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceViolation {
    pub max_abs_residual: f64,
    /// Largest residual as a percentage of peak demand.
    pub deviation_percent: f64,
}

impl BalanceViolation {
    pub fn deviation(&self) -> String {
        format_percent(self.deviation_percent)
    }
}

impl fmt::Display for BalanceViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "up to {} difference in the instantaneous energy balance ({} MW)",
            self.deviation(),
            format_f64(self.max_abs_residual)
        )
    }
}

impl BalanceReport {
    pub fn is_balanced(&self) -> bool {
        self.violation.is_none()
    }
}

/// Outcome of [`reconcile`].
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// `demand - shed load - shifted load`. May be negative.
    pub adjusted_demand: Series,
    pub report: BalanceReport,
    /// Curtailed power, passed through for the chart layout.
    pub curtailment: Option<Series>,
}

/// Reconstructs the adjusted demand of a zone and checks the energy
/// balance against the generation frame.
///
/// Missing shed or shifted load is taken as zero. Every supplied series
/// must share the demand's index exactly, otherwise `IndexMismatch` is
/// returned; nothing is realigned.
///
/// The balance is checked against the original demand compensated by the
/// deductions. A largest absolute residual above `balance_tolerance` times
/// the peak demand is logged and reported as a [`BalanceViolation`], but
/// the call still succeeds.
pub fn reconcile(
    demand: &Series,
    generation: &DispatchFrame,
    shed_load: Option<&Series>,
    shifted_load: Option<&Series>,
    curtailment: Option<&Series>,
    config: &AnalysisConfig,
) -> Result<Reconciliation> {
    let index = demand.index();
    if !generation.is_aligned_with(index) {
        return Err(AnalysisError::index_mismatch(
            "generation",
            index,
            generation.index(),
        ));
    }

    let zeros = Series::zeros(index.clone());
    let shed_load = shed_load.unwrap_or(&zeros);
    let shifted_load = shifted_load.unwrap_or(&zeros);
    shed_load.ensure_aligned("shed load", index)?;
    shifted_load.ensure_aligned("shifted load", index)?;
    if let Some(curtailment) = curtailment {
        curtailment.ensure_aligned("curtailment", index)?;
    }

    let deductions = shed_load.zip_with(shifted_load, "shifted load", |a, b| a + b)?;
    let adjusted_demand = demand.zip_with(&deductions, "shed load", |d, x| d - x)?;

    let generation = generation.total();
    let residual = generation
        .values()
        .iter()
        .zip(demand.values())
        .zip(deductions.values())
        .map(|((g, d), x)| g - d + x)
        .collect::<Vec<f64>>();

    let max_abs_residual = residual.iter().fold(0.0, |m: f64, r| m.max(r.abs()));
    let peak = demand.max();
    let threshold = config.balance_tolerance * peak;

    let violation = if max_abs_residual > threshold {
        let violation = BalanceViolation {
            max_abs_residual,
            deviation_percent: max_abs_residual / peak * 100.0,
        };
        log::error!("there is {}", violation);
        Some(violation)
    } else {
        None
    };

    Ok(Reconciliation {
        adjusted_demand,
        report: BalanceReport {
            residual,
            max_abs_residual,
            threshold,
            violation,
        },
        curtailment: curtailment.cloned(),
    })
}
