use crate::error::{AnalysisError, Result};
use crate::storage::StorageFamily;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Canonical stacking order of the dispatch chart. Columns before the
/// zero line are exports and storage charging.
pub const MERIT_ORDER: [&str; 19] = [
    "FlowOut", "Storage", "NUC", "LIG", "HRD", "PEA", "OIL", "GAS", "BIO", "AMO", "WST", "HYD",
    "GEO", "SUN", "WAT", "WIN", "OTH", "Other", "FlowIn",
];

/// Process-wide analysis settings.
///
/// Built once at start-up and passed by reference into every call; never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(default, build_fn(name = "pre_build", validate = "Self::validate"))]
#[serde(default)]
pub struct AnalysisConfig {
    /// Technology labels in stacking order.
    #[builder(setter(custom))]
    pub merit_order: Vec<String>,

    /// Storage technology code to family.
    #[builder(setter(custom))]
    pub storage_families: BTreeMap<String, StorageFamily>,

    /// Relative tolerance of the energy balance check, as a fraction of
    /// peak demand. Default value is 0.01.
    pub balance_tolerance: f64,

    /// Marker identifying rest-of-world borders in line labels.
    #[builder(setter(into))]
    pub rest_of_world: String,

    /// Bucket for technology labels without a mapping.
    #[builder(setter(into))]
    pub other_label: String,

    #[builder(setter(into))]
    pub flow_in_label: String,

    #[builder(setter(into))]
    pub flow_out_label: String,

    /// Length of the default inspection window (one week of hours).
    pub default_window_steps: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            merit_order: MERIT_ORDER.iter().map(|s| s.to_string()).collect(),
            storage_families: StorageFamily::ALL
                .iter()
                .map(|f| (f.code().to_string(), *f))
                .collect(),
            balance_tolerance: 0.01,
            rest_of_world: "RoW".to_string(),
            other_label: "Other".to_string(),
            flow_in_label: "FlowIn".to_string(),
            flow_out_label: "FlowOut".to_string(),
            default_window_steps: 7 * 24,
        }
    }
}

impl AnalysisConfigBuilder {
    pub fn merit_order<I, S>(&mut self, labels: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.merit_order = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    /// Maps an additional technology code onto a storage family.
    pub fn storage_family(&mut self, technology: impl Into<String>, family: StorageFamily) -> &mut Self {
        self.storage_families
            .get_or_insert_with(|| AnalysisConfig::default().storage_families)
            .insert(technology.into(), family);
        self
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(merit_order) = &self.merit_order {
            if merit_order.is_empty() {
                return Err("merit order must not be empty".to_string());
            }
            let mut seen = HashSet::new();
            if let Some(dup) = merit_order.iter().find(|l| !seen.insert(l.as_str())) {
                return Err(format!("duplicate merit order label: {}", dup));
            }
        }
        if let Some(tol) = self.balance_tolerance {
            if !(tol > 0.0) {
                return Err(format!("balance tolerance must be positive: {}", tol));
            }
        }
        for label in [
            &self.rest_of_world,
            &self.other_label,
            &self.flow_in_label,
            &self.flow_out_label,
        ]
        .into_iter()
        .flatten()
        {
            if label.is_empty() {
                return Err("labels and markers must not be empty".to_string());
            }
        }
        Ok(())
    }

    pub fn build(&self) -> Result<AnalysisConfig> {
        self.pre_build()
            .map_err(|err| AnalysisError::Config(err.to_string()))
    }
}

impl AnalysisConfig {
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Position of `label` in the merit order.
    pub fn merit_position(&self, label: &str) -> Option<usize> {
        self.merit_order.iter().position(|l| l == label)
    }

    pub fn family_of(&self, technology: &str) -> Option<StorageFamily> {
        self.storage_families.get(technology).copied()
    }

    /// True if the line label starts or ends with the rest-of-world marker.
    pub fn is_rest_of_world(&self, label: &str) -> bool {
        label.starts_with(&self.rest_of_world) || label.ends_with(&self.rest_of_world)
    }
}
