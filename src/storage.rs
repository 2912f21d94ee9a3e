use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::frame::{DispatchFrame, Table};
use crate::series::{Series, TimeIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone, Serialize, Deserialize)]
pub enum StorageFamily {
    /// Hydro dam (HDAM).
    HydroDam,
    /// Pumped hydro storage (HPHS).
    PumpedHydro,
    /// Battery electric vehicles (BEVS).
    BatteryVehicle,
    /// Stationary batteries (BATS).
    BatteryStationary,
    /// Thermal storage (SCSP).
    ThermalStorage,
    /// Power-to-gas hydrogen storage (P2GS).
    HydrogenStorage,
}

impl StorageFamily {
    /// All families, in the order their aggregates are reported.
    pub const ALL: [StorageFamily; 6] = [
        StorageFamily::HydroDam,
        StorageFamily::PumpedHydro,
        StorageFamily::BatteryVehicle,
        StorageFamily::BatteryStationary,
        StorageFamily::ThermalStorage,
        StorageFamily::HydrogenStorage,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            StorageFamily::HydroDam => "HDAM",
            StorageFamily::PumpedHydro => "HPHS",
            StorageFamily::BatteryVehicle => "BEVS",
            StorageFamily::BatteryStationary => "BATS",
            StorageFamily::ThermalStorage => "SCSP",
            StorageFamily::HydrogenStorage => "P2GS",
        }
    }
}

impl fmt::Display for StorageFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for StorageFamily {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        StorageFamily::ALL
            .iter()
            .find(|f| f.code() == s)
            .copied()
            .ok_or_else(|| format!("unknown storage family: {}", s))
    }
}

/// How a level series is expressed.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default, Serialize, Deserialize)]
pub enum LevelKind {
    /// Stored energy (MWh).
    #[default]
    Energy,
    /// Fraction of the unit's storage capacity.
    Fraction,
}

/// Whether family aggregates are reported separately or as one series.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum Aggregation {
    #[default]
    ByFamily,
    Zone,
}

/// A storage unit of the simulation results.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageUnit {
    pub name: String,
    pub zone: String,
    /// Technology code, mapped to a family by the configuration.
    pub technology: String,
    /// Storage capacity of one unit (MWh).
    pub capacity: f64,
    /// Number of identical units.
    pub n_units: f64,
    pub level: Series,
    pub level_kind: LevelKind,
}

impl StorageUnit {
    pub fn new(
        name: impl Into<String>,
        zone: impl Into<String>,
        technology: impl Into<String>,
        capacity: f64,
        level: Series,
    ) -> Self {
        Self {
            name: name.into(),
            zone: zone.into(),
            technology: technology.into(),
            capacity,
            n_units: 1.0,
            level,
            level_kind: LevelKind::Energy,
        }
    }

    pub fn with_level_kind(mut self, level_kind: LevelKind) -> Self {
        self.level_kind = level_kind;
        self
    }

    pub fn with_units(mut self, n_units: f64) -> Self {
        self.n_units = n_units;
        self
    }

    /// Level in MWh.
    pub fn energy(&self) -> Series {
        match self.level_kind {
            LevelKind::Energy => self.level.clone(),
            LevelKind::Fraction => self.level.map(|v| v * self.capacity),
        }
    }
}

/// Aggregation key: a known family or the catch-all bucket.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
enum FamilyKey {
    Family(StorageFamily),
    Other,
}

fn family_key(unit: &StorageUnit, config: &AnalysisConfig) -> FamilyKey {
    match config.family_of(&unit.technology) {
        Some(family) => FamilyKey::Family(family),
        None => FamilyKey::Other,
    }
}

/// Aggregates the storage levels of the units located in `zone`.
///
/// Vehicle batteries are weighted by their availability factor before
/// summation. Family aggregates that are identically zero are dropped.
/// Units with a technology that has no family mapping are summed into the
/// configured "Other" bucket.
///
/// With [`Aggregation::Zone`] the retained aggregates are collapsed into
/// a single series. A zone without any retained aggregate gives an empty
/// frame in both modes.
pub fn aggregate_storage(
    units: &[StorageUnit],
    zone: &str,
    availability: &BTreeMap<String, Series>,
    index: &Arc<TimeIndex>,
    aggregation: Aggregation,
    config: &AnalysisConfig,
) -> Result<Table> {
    let mut sums: BTreeMap<FamilyKey, Vec<f64>> = BTreeMap::new();

    for unit in units.iter().filter(|u| u.zone == zone) {
        unit.level.ensure_aligned(&unit.name, index)?;

        let key = family_key(unit, config);
        let mut energy = unit.energy().into_values();

        if key == FamilyKey::Family(StorageFamily::BatteryVehicle) {
            match availability.get(&unit.name) {
                Some(af) => {
                    af.ensure_aligned(&format!("availability factor of {}", unit.name), index)?;
                    energy
                        .iter_mut()
                        .zip(af.values())
                        .for_each(|(e, a)| *e *= a);
                }
                None => log::warn!(
                    "no availability factor for vehicle storage {}, assuming full availability",
                    unit.name
                ),
            }
        }

        let sum = sums.entry(key).or_insert_with(|| vec![0.0; index.len()]);
        sum.iter_mut().zip(&energy).for_each(|(s, e)| *s += e);
    }

    let mut frame = DispatchFrame::new(index.clone());
    for (key, values) in sums {
        let label = match key {
            FamilyKey::Family(family) => family.code(),
            FamilyKey::Other => config.other_label.as_str(),
        };
        let series = Series::new(index.clone(), values)?;
        if series.is_all_zero() {
            log::debug!("dropping empty storage aggregate {} of {}", label, zone);
            continue;
        }
        frame.insert(label, &series)?;
    }

    Ok(match aggregation {
        Aggregation::Zone if !frame.is_empty() => Table::Series(frame.total()),
        _ => Table::Frame(frame),
    })
}

/// Percentage deviation of a unit's level from an imposed minimum
/// profile, given as a fraction of capacity: `(level - profile * capacity)
/// / capacity * 100`.
///
/// Returns `None` for units without storage capacity.
pub fn storage_deviation(unit: &StorageUnit, minimum_profile: &Series) -> Result<Option<Series>> {
    if unit.capacity == 0.0 {
        return Ok(None);
    }
    let energy = unit.energy();
    let deviation = energy.zip_with(minimum_profile, &format!("profile of {}", unit.name), |l, p| {
        (l - p * unit.capacity) / unit.capacity * 100.0
    })?;
    Ok(Some(deviation))
}

/// Installed storage capacity (MWh) per family in `zone`.
pub fn storage_capacity_by_family(
    units: &[StorageUnit],
    zone: &str,
    config: &AnalysisConfig,
) -> BTreeMap<String, f64> {
    let mut capacity: BTreeMap<FamilyKey, f64> = BTreeMap::new();
    for unit in units.iter().filter(|u| u.zone == zone) {
        *capacity.entry(family_key(unit, config)).or_default() += unit.capacity * unit.n_units;
    }
    capacity
        .into_iter()
        .map(|(key, c)| {
            let label = match key {
                FamilyKey::Family(family) => family.code().to_string(),
                FamilyKey::Other => config.other_label.clone(),
            };
            (label, c)
        })
        .collect()
}
