//! Species and terrain parameter tables.
//!
//! Every table has a fixed whitelist of keys. Updates arrive as JSON objects and
//! are validated in full before anything is written, so a rejected update leaves
//! the registry untouched.

use crate::{Error, Result, Species, Terrain};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Physiological and behavioural constants for one species
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesParams {
    /// Mean birth weight
    pub w_birth: f64,
    /// Spread of the birth weight
    pub sigma_birth: f64,
    /// Weight gained per unit of food eaten
    pub beta: f64,
    /// Yearly metabolic weight loss rate
    pub eta: f64,
    pub a_half: f64,
    pub phi_age: f64,
    pub w_half: f64,
    pub phi_weight: f64,
    /// Migration coefficient
    pub mu: f64,
    /// Birth coefficient
    pub gamma: f64,
    /// Minimum weight for birth, in units of `w_birth + sigma_birth`
    pub zeta: f64,
    /// Weight a mother loses per unit of newborn weight
    pub xi: f64,
    /// Death coefficient
    pub omega: f64,
    /// Yearly food intake capacity
    #[serde(rename = "F")]
    pub f: f64,
    /// Fitness gap at which a kill becomes certain. Predators only.
    #[serde(rename = "DeltaPhiMax", default, skip_serializing_if = "Option::is_none")]
    pub delta_phi_max: Option<f64>,
}

impl SpeciesParams {
    pub fn herbivore() -> Self {
        Self {
            w_birth: 8.0,
            sigma_birth: 1.5,
            beta: 0.9,
            eta: 0.05,
            a_half: 40.0,
            phi_age: 0.6,
            w_half: 10.0,
            phi_weight: 0.1,
            mu: 0.25,
            gamma: 0.2,
            zeta: 3.5,
            xi: 1.2,
            omega: 0.4,
            f: 10.0,
            delta_phi_max: None,
        }
    }

    pub fn carnivore() -> Self {
        Self {
            w_birth: 6.0,
            sigma_birth: 1.0,
            beta: 0.75,
            eta: 0.125,
            a_half: 40.0,
            phi_age: 0.3,
            w_half: 4.0,
            phi_weight: 0.4,
            mu: 0.4,
            gamma: 0.8,
            zeta: 3.5,
            xi: 1.1,
            omega: 0.8,
            f: 50.0,
            delta_phi_max: Some(10.0),
        }
    }

    pub fn defaults_for(species: Species) -> Self {
        match species {
            Species::Herbivore => Self::herbivore(),
            Species::Carnivore => Self::carnivore(),
        }
    }

    /// Keys accepted for `species`
    pub fn keys(species: Species) -> &'static [&'static str] {
        const HERBIVORE: &[&str] = &[
            "w_birth", "sigma_birth", "beta", "eta", "a_half", "phi_age", "w_half",
            "phi_weight", "mu", "gamma", "zeta", "xi", "omega", "F",
        ];
        const CARNIVORE: &[&str] = &[
            "w_birth", "sigma_birth", "beta", "eta", "a_half", "phi_age", "w_half",
            "phi_weight", "mu", "gamma", "zeta", "xi", "omega", "F", "DeltaPhiMax",
        ];
        match species {
            Species::Herbivore => HERBIVORE,
            Species::Carnivore => CARNIVORE,
        }
    }

    /// Kill probability normaliser; zero for species that never hunt
    pub fn delta_phi_max(&self) -> f64 {
        self.delta_phi_max.unwrap_or(0.0)
    }

    fn set(&mut self, key: &str, value: f64) {
        let slot = match key {
            "w_birth" => &mut self.w_birth,
            "sigma_birth" => &mut self.sigma_birth,
            "beta" => &mut self.beta,
            "eta" => &mut self.eta,
            "a_half" => &mut self.a_half,
            "phi_age" => &mut self.phi_age,
            "w_half" => &mut self.w_half,
            "phi_weight" => &mut self.phi_weight,
            "mu" => &mut self.mu,
            "gamma" => &mut self.gamma,
            "zeta" => &mut self.zeta,
            "xi" => &mut self.xi,
            "omega" => &mut self.omega,
            "F" => &mut self.f,
            "DeltaPhiMax" => {
                self.delta_phi_max = Some(value);
                return;
            }
            _ => return,
        };
        *slot = value;
    }
}

/// Constants for one terrain type
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TerrainParams {
    /// Fodder available after yearly regrowth
    #[serde(default)]
    pub f_max: f64,
}

impl TerrainParams {
    pub fn defaults_for(terrain: Terrain) -> Self {
        let f_max = match terrain {
            Terrain::Lowland => 800.0,
            Terrain::Highland => 300.0,
            Terrain::Desert | Terrain::Water => 0.0,
        };
        Self { f_max }
    }

    /// Keys accepted for `terrain`. Desert and Water have no tunable constants.
    pub fn keys(terrain: Terrain) -> &'static [&'static str] {
        match terrain {
            Terrain::Lowland | Terrain::Highland => &["f_max"],
            Terrain::Desert | Terrain::Water => &[],
        }
    }
}

/// Explicit registry of every parameter table, threaded through the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRegistry {
    species: [SpeciesParams; 2],
    terrain: [TerrainParams; 4],
}

impl Default for ParameterRegistry {
    fn default() -> Self {
        Self {
            species: Species::ALL.map(SpeciesParams::defaults_for),
            terrain: Terrain::ALL.map(TerrainParams::defaults_for),
        }
    }
}

impl ParameterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn species(&self, species: Species) -> &SpeciesParams {
        &self.species[species.index()]
    }

    pub fn terrain(&self, terrain: Terrain) -> &TerrainParams {
        &self.terrain[terrain_index(terrain)]
    }

    /// Fodder cap for `terrain`
    pub fn max_fodder(&self, terrain: Terrain) -> f64 {
        match terrain {
            Terrain::Lowland | Terrain::Highland => self.terrain(terrain).f_max,
            Terrain::Desert | Terrain::Water => 0.0,
        }
    }

    /// Validate and apply a JSON object of species parameter overrides
    pub fn set_species_parameters(&mut self, species: Species, params: &Value) -> Result<()> {
        let updates = validate_update(species.name(), SpeciesParams::keys(species), params)
            .inspect_err(|e| warn!(%species, error = %e, "Rejected species parameters"))?;

        for (key, value) in &updates {
            let problem = match key.as_str() {
                "DeltaPhiMax" if *value <= 0.0 => Some("must be strictly positive"),
                "eta" if *value > 1.0 => Some("must not exceed 1"),
                _ => None,
            };
            if let Some(problem) = problem {
                let err = Error::InvalidParameter(format!(
                    "{} for {} {}, got {}",
                    key, species, problem, value
                ));
                warn!(%species, error = %err, "Rejected species parameters");
                return Err(err);
            }
        }

        let table = &mut self.species[species.index()];
        for (key, value) in updates {
            table.set(&key, value);
        }
        Ok(())
    }

    /// Validate and apply a JSON object of terrain parameter overrides
    pub fn set_terrain_parameters(&mut self, terrain: Terrain, params: &Value) -> Result<()> {
        let updates = validate_update(&terrain.to_string(), TerrainParams::keys(terrain), params)
            .inspect_err(|e| warn!(%terrain, error = %e, "Rejected terrain parameters"))?;

        let table = &mut self.terrain[terrain_index(terrain)];
        for (key, value) in updates {
            if key == "f_max" {
                table.f_max = value;
            }
        }
        Ok(())
    }
}

fn terrain_index(terrain: Terrain) -> usize {
    match terrain {
        Terrain::Water => 0,
        Terrain::Lowland => 1,
        Terrain::Highland => 2,
        Terrain::Desert => 3,
    }
}

/// Check every entry of `params` against `allowed` and return the numeric values.
fn validate_update(owner: &str, allowed: &[&str], params: &Value) -> Result<Vec<(String, f64)>> {
    let object = params.as_object().ok_or_else(|| {
        Error::InvalidParameter(format!("parameters for {} must be a JSON object", owner))
    })?;

    let mut updates = Vec::with_capacity(object.len());
    for (key, value) in object {
        if !allowed.contains(&key.as_str()) {
            return Err(Error::UnknownParameter {
                owner: owner.to_string(),
                key: key.clone(),
            });
        }
        let number = value.as_f64().ok_or_else(|| {
            Error::InvalidParameter(format!("{}.{} must be numeric, got {}", owner, key, value))
        })?;
        if !number.is_finite() || number < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "{}.{} must be a non-negative number, got {}",
                owner, key, number
            )));
        }
        updates.push((key.clone(), number));
    }
    Ok(updates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let registry = ParameterRegistry::default();
        assert_eq!(registry.species(Species::Herbivore).f, 10.0);
        assert_eq!(registry.species(Species::Carnivore).delta_phi_max(), 10.0);
        assert_eq!(registry.max_fodder(Terrain::Lowland), 800.0);
        assert_eq!(registry.max_fodder(Terrain::Highland), 300.0);
        assert_eq!(registry.max_fodder(Terrain::Desert), 0.0);
        assert_eq!(registry.max_fodder(Terrain::Water), 0.0);
    }

    #[test]
    fn test_set_species_parameters() {
        let mut registry = ParameterRegistry::default();
        registry
            .set_species_parameters(Species::Herbivore, &json!({"F": 20.0, "mu": 0}))
            .unwrap();
        let herb = registry.species(Species::Herbivore);
        assert_eq!(herb.f, 20.0);
        assert_eq!(herb.mu, 0.0);
        // Other species untouched
        assert_eq!(registry.species(Species::Carnivore).f, 50.0);
    }

    #[test]
    fn test_unknown_species_key_rejected() {
        let mut registry = ParameterRegistry::default();
        let err = registry
            .set_species_parameters(Species::Herbivore, &json!({"DeltaPhiMax": 5.0}))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownParameter { .. }));

        assert!(registry
            .set_species_parameters(Species::Carnivore, &json!({"DeltaPhiMax": 5.0}))
            .is_ok());
    }

    #[test]
    fn test_rejected_update_is_atomic() {
        let mut registry = ParameterRegistry::default();
        let before = registry.clone();
        let result = registry.set_species_parameters(
            Species::Carnivore,
            &json!({"F": 1.0, "lambda": 2.0}),
        );
        assert!(result.is_err());
        assert_eq!(registry, before);
    }

    #[test]
    fn test_non_numeric_and_negative_rejected() {
        let mut registry = ParameterRegistry::default();
        assert!(matches!(
            registry.set_terrain_parameters(Terrain::Lowland, &json!({"f_max": "800"})),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            registry.set_terrain_parameters(Terrain::Lowland, &json!({"f_max": -1.0})),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            registry.set_species_parameters(Species::Herbivore, &json!({"eta": -0.1})),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            registry.set_species_parameters(Species::Herbivore, &json!([1, 2])),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_delta_phi_max_must_be_positive() {
        let mut registry = ParameterRegistry::default();
        assert!(registry
            .set_species_parameters(Species::Carnivore, &json!({"DeltaPhiMax": 0.0}))
            .is_err());
        assert_eq!(registry.species(Species::Carnivore).delta_phi_max(), 10.0);
    }

    #[test]
    fn test_eta_above_one_rejected() {
        let mut registry = ParameterRegistry::default();
        let before = registry.clone();
        assert!(matches!(
            registry.set_species_parameters(Species::Herbivore, &json!({"eta": 1.5})),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            registry.set_species_parameters(Species::Carnivore, &json!({"F": 5.0, "eta": 1.01})),
            Err(Error::InvalidParameter(_))
        ));
        assert_eq!(registry, before);

        // Losing the whole body weight in a year is still allowed
        registry
            .set_species_parameters(Species::Herbivore, &json!({"eta": 1.0}))
            .unwrap();
        assert_eq!(registry.species(Species::Herbivore).eta, 1.0);
    }

    #[test]
    fn test_terrain_parameters() {
        let mut registry = ParameterRegistry::default();
        registry
            .set_terrain_parameters(Terrain::Highland, &json!({"f_max": 450}))
            .unwrap();
        assert_eq!(registry.max_fodder(Terrain::Highland), 450.0);

        assert!(matches!(
            registry.set_terrain_parameters(Terrain::Desert, &json!({"f_max": 10.0})),
            Err(Error::UnknownParameter { .. })
        ));
        assert!(registry
            .set_terrain_parameters(Terrain::Water, &json!({}))
            .is_ok());
    }

    #[test]
    fn test_species_params_serde_uses_canonical_keys() {
        let json = serde_json::to_value(SpeciesParams::carnivore()).unwrap();
        assert_eq!(json["F"], json!(50.0));
        assert_eq!(json["DeltaPhiMax"], json!(10.0));

        let herb = serde_json::to_value(SpeciesParams::herbivore()).unwrap();
        assert!(herb.get("DeltaPhiMax").is_none());
    }
}
