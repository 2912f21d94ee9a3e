use crate::config::AnalysisConfig;
use crate::network::FlowTable;
use serde::Serialize;
use std::collections::BTreeMap;

/// A power plant as described in the simulation inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerPlant {
    pub name: String,
    pub zone: String,
    pub fuel: String,
    /// Power capacity of one unit (MW).
    pub power_capacity: f64,
    /// Storage capacity of one unit (MWh).
    pub storage_capacity: f64,
    pub n_units: f64,
}

/// Per-plant result indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantGeneration {
    pub zone: String,
    pub fuel: String,
    /// Energy generated over the horizon (MWh).
    pub generation: f64,
}

/// Zone by fuel table, fuels in merit order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FuelTable {
    pub fuels: Vec<String>,
    pub zones: BTreeMap<String, Vec<f64>>,
}

impl FuelTable {
    /// Sums `(zone, fuel, value)` entries. Fuels without merit order
    /// position go to the "Other" bucket.
    fn from_entries<'a>(
        entries: impl IntoIterator<Item = (&'a str, &'a str, f64)>,
        config: &AnalysisConfig,
    ) -> FuelTable {
        let mut sums: BTreeMap<&str, BTreeMap<String, f64>> = BTreeMap::new();
        for (zone, fuel, value) in entries {
            let fuel = match config.merit_position(fuel) {
                Some(_) => fuel.to_string(),
                None => config.other_label.clone(),
            };
            *sums.entry(zone).or_default().entry(fuel).or_default() += value;
        }

        let mut fuels = config
            .merit_order
            .iter()
            .filter(|f| sums.values().any(|row| row.contains_key(f.as_str())))
            .cloned()
            .collect::<Vec<String>>();
        if config.merit_position(&config.other_label).is_none()
            && sums.values().any(|row| row.contains_key(&config.other_label))
        {
            fuels.push(config.other_label.clone());
        }

        let zones = sums
            .into_iter()
            .map(|(zone, row)| {
                let values = fuels
                    .iter()
                    .map(|f| row.get(f).copied().unwrap_or(0.0))
                    .collect();
                (zone.to_string(), values)
            })
            .collect();
        FuelTable { fuels, zones }
    }

    pub fn get(&self, zone: &str, fuel: &str) -> Option<f64> {
        let j = self.fuels.iter().position(|f| f == fuel)?;
        self.zones.get(zone).map(|row| row[j])
    }

    /// Adds a fuel column at its merit order position (or last), zero for
    /// zones without a value.
    fn insert_column(&mut self, fuel: &str, values: &BTreeMap<String, f64>, config: &AnalysisConfig) {
        let position = match config.merit_position(fuel) {
            Some(p) => self
                .fuels
                .iter()
                .position(|f| config.merit_position(f).map_or(true, |q| q > p))
                .unwrap_or(self.fuels.len()),
            None => self.fuels.len(),
        };
        self.fuels.insert(position, fuel.to_string());
        for (zone, row) in self.zones.iter_mut() {
            row.insert(position, values.get(zone).copied().unwrap_or(0.0));
        }
    }
}

/// Installed power and storage capacity per zone and fuel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneCapacities {
    /// MW.
    pub power: FuelTable,
    /// MWh.
    pub storage: FuelTable,
}

/// Installed capacities (capacity of one unit times the number of units)
/// summed per zone and fuel.
pub fn zone_capacities(plants: &[PowerPlant], config: &AnalysisConfig) -> ZoneCapacities {
    let power = FuelTable::from_entries(
        plants
            .iter()
            .map(|p| (p.zone.as_str(), p.fuel.as_str(), p.power_capacity * p.n_units)),
        config,
    );
    let storage = FuelTable::from_entries(
        plants
            .iter()
            .map(|p| (p.zone.as_str(), p.fuel.as_str(), p.storage_capacity * p.n_units)),
        config,
    );
    ZoneCapacities { power, storage }
}

/// Generation per zone and fuel, with each zone's net imports over the
/// horizon added as flow-in when they are positive.
pub fn zone_energy_by_fuel(
    generation: &[PlantGeneration],
    flows: &FlowTable,
    config: &AnalysisConfig,
) -> FuelTable {
    let mut table = FuelTable::from_entries(
        generation
            .iter()
            .map(|g| (g.zone.as_str(), g.fuel.as_str(), g.generation)),
        config,
    );

    let imports = table
        .zones
        .keys()
        .map(|zone| (zone.clone(), flows.net_imports(zone)))
        .filter(|(_, net)| *net > 0.0)
        .collect::<BTreeMap<String, f64>>();

    if table.fuels.contains(&config.flow_in_label) {
        let j = table
            .fuels
            .iter()
            .position(|f| *f == config.flow_in_label)
            .unwrap_or_default();
        for (zone, net) in &imports {
            if let Some(row) = table.zones.get_mut(zone) {
                row[j] = *net;
            }
        }
    } else {
        table.insert_column(&config.flow_in_label, &imports, config);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixtures::{flow_table, hourly};

    fn plant(zone: &str, fuel: &str, power: f64, storage: f64, n: f64) -> PowerPlant {
        PowerPlant {
            name: format!("{}_{}", zone, fuel),
            zone: zone.to_string(),
            fuel: fuel.to_string(),
            power_capacity: power,
            storage_capacity: storage,
            n_units: n,
        }
    }

    #[test]
    fn test_zone_capacities() {
        let config = AnalysisConfig::default();
        let plants = vec![
            plant("BE", "WIN", 3.0, 0.0, 100.0),
            plant("BE", "NUC", 1000.0, 0.0, 2.0),
            plant("BE", "WAT", 100.0, 5000.0, 1.0),
            plant("FR", "NUC", 1300.0, 0.0, 4.0),
            plant("FR", "XYZ", 10.0, 0.0, 1.0),
        ];
        let cap = zone_capacities(&plants, &config);
        assert_eq!(cap.power.fuels, ["NUC", "WAT", "WIN", "Other"]);
        assert_eq!(cap.power.zones["BE"], [2000.0, 100.0, 300.0, 0.0]);
        assert_eq!(cap.power.get("FR", "NUC"), Some(5200.0));
        assert_eq!(cap.power.get("FR", "Other"), Some(10.0));
        assert_eq!(cap.storage.get("BE", "WAT"), Some(5000.0));
    }

    #[test]
    fn test_energy_by_fuel_with_imports() {
        let config = AnalysisConfig::default();
        let index = hourly(2);
        let flows = flow_table(&index, &[("FR", "BE", &[10.0, 20.0]), ("BE", "FR", &[5.0, 0.0])]);
        let generation = vec![
            PlantGeneration {
                zone: "BE".to_string(),
                fuel: "GAS".to_string(),
                generation: 100.0,
            },
            PlantGeneration {
                zone: "FR".to_string(),
                fuel: "NUC".to_string(),
                generation: 400.0,
            },
        ];
        let table = zone_energy_by_fuel(&generation, &flows, &config);
        assert_eq!(table.fuels, ["NUC", "GAS", "FlowIn"]);
        assert_eq!(table.get("BE", "FlowIn"), Some(25.0));
        assert_eq!(table.get("FR", "FlowIn"), Some(0.0));
        assert_eq!(table.get("BE", "GAS"), Some(100.0));
    }
}
