//! Configuration types for the simulation.

use crate::{Result, Species, Terrain};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// One animal in a population record. Missing age means newborn; missing
/// weight means a birth weight is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalSpec {
    pub species: Species,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub weight: Option<f64>,
}

impl AnimalSpec {
    pub fn new(species: Species, age: u32, weight: f64) -> Self {
        Self {
            species,
            age: Some(age),
            weight: Some(weight),
        }
    }
}

/// Animals to place in one cell. `loc` is 1-based (row, column).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationEntry {
    pub loc: (usize, usize),
    pub pop: Vec<AnimalSpec>,
}

impl PopulationEntry {
    /// `count` identical animals at `loc`
    pub fn uniform(loc: (usize, usize), species: Species, count: usize, age: u32, weight: f64) -> Self {
        Self {
            loc,
            pop: vec![AnimalSpec::new(species, age, weight); count],
        }
    }
}

/// Complete description of a simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Multi-line map of terrain codes
    pub island_map: String,
    /// Initial population
    #[serde(default)]
    pub ini_pop: Vec<PopulationEntry>,
    /// Species parameter overrides
    #[serde(default)]
    pub species_params: BTreeMap<Species, Value>,
    /// Terrain parameter overrides, keyed by map code
    #[serde(default)]
    pub terrain_params: BTreeMap<Terrain, Value>,
    /// Number of years to simulate
    pub years: u32,
    /// Years between population log snapshots
    #[serde(default = "default_log_interval")]
    pub log_interval: u32,
}

fn default_log_interval() -> u32 {
    10
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            island_map: "WWW\nWLW\nWWW".to_string(),
            ini_pop: Vec::new(),
            species_params: BTreeMap::new(),
            terrain_params: BTreeMap::new(),
            years: 100,
            log_interval: default_log_interval(),
        }
    }
}

impl ScenarioConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}
