//! Island scenario wrapper: a complete run described as data.

use crate::simulation::BioSim;
use biosim_core::{PopulationStats, Result, ScenarioConfig, YearStats};
use serde::{Deserialize, Serialize};
use tracing::info;

/// A scenario that can be loaded from JSON and executed in one call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IslandScenario {
    pub config: ScenarioConfig,
}

impl IslandScenario {
    pub fn new(config: ScenarioConfig) -> Self {
        Self { config }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(ScenarioConfig::from_json(json)?))
    }

    /// Build the island, apply parameter overrides, place the initial
    /// population and run every configured year.
    pub fn build(&self) -> Result<BioSim> {
        let config = &self.config;
        let mut sim = BioSim::new(&config.island_map, &[], config.seed)?
            .with_log_interval(config.log_interval);

        for (species, params) in &config.species_params {
            sim.set_animal_parameters(*species, params)?;
        }
        for (terrain, params) in &config.terrain_params {
            sim.set_landscape_parameters(*terrain, params)?;
        }
        // Placed after the overrides so drawn birth weights use them
        sim.add_population(&config.ini_pop)?;
        Ok(sim)
    }

    /// Execute this scenario
    pub fn execute(&self) -> Result<IslandResult> {
        let mut sim = self.build()?;
        let trace = sim.simulate(self.config.years);
        info!(years = sim.year(), survivors = sim.num_animals(), "Scenario finished");

        Ok(IslandResult {
            seed: self.config.seed,
            trace,
            final_stats: sim.statistics(),
        })
    }
}

/// Result from executing an island scenario
#[derive(Debug, Serialize, Deserialize)]
pub struct IslandResult {
    pub seed: u64,
    pub trace: Vec<YearStats>,
    pub final_stats: PopulationStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use biosim_core::{Error, Species};

    fn scenario_json(extra: &str) -> String {
        format!(
            r#"{{
                "seed": 5,
                "island_map": "WWWW\nWLHW\nWWWW",
                "ini_pop": [{{"loc": [2, 2], "pop": [
                    {{"species": "Herbivore", "age": 5, "weight": 20}},
                    {{"species": "Herbivore", "age": 5, "weight": 20}},
                    {{"species": "Herbivore"}}
                ]}}],
                "years": 4{}
            }}"#,
            extra
        )
    }

    #[test]
    fn test_scenario_execution() {
        let scenario = IslandScenario::from_json(&scenario_json("")).unwrap();
        let result = scenario.execute().unwrap();
        assert_eq!(result.seed, 5);
        assert_eq!(result.trace.len(), 4);
        assert_eq!(result.trace.last().unwrap().total(), result.final_stats.total());
    }

    #[test]
    fn test_scenario_applies_overrides() {
        let scenario = IslandScenario::from_json(&scenario_json(
            r#", "species_params": {"Herbivore": {"F": 15.0}}, "terrain_params": {"H": {"f_max": 10}}"#,
        ))
        .unwrap();
        let sim = scenario.build().unwrap();
        assert_eq!(sim.grid().registry().species(Species::Herbivore).f, 15.0);
        assert_eq!(
            sim.grid().registry().max_fodder(biosim_core::Terrain::Highland),
            10.0
        );
        assert_eq!(sim.num_animals(), 3);
    }

    #[test]
    fn test_scenario_rejects_bad_override() {
        let scenario = IslandScenario::from_json(&scenario_json(
            r#", "terrain_params": {"D": {"f_max": 10}}"#,
        ))
        .unwrap();
        assert!(matches!(
            scenario.execute(),
            Err(Error::UnknownParameter { .. })
        ));
    }
}
