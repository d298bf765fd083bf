//! Animal state and physiology.
//!
//! Behaviour differs between species only through the [`SpeciesParams`] record
//! passed to each method, so one struct serves both herbivores and carnivores.

use biosim_core::{AnimalSpec, Error, Result, Species, SpeciesParams};
use rand::Rng;
use rand_distr::{Distribution, LogNormal};
use serde::{Deserialize, Serialize};

/// An animal on the island
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
    pub species: Species,
    pub age: u32,
    weight: f64,
    fitness: f64,
    pub has_migrated: bool,
}

impl Animal {
    pub fn new(species: Species, age: u32, weight: f64, params: &SpeciesParams) -> Result<Self> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(Error::InvalidAnimal(format!(
                "{} weight must be a non-negative number, got {}",
                species, weight
            )));
        }
        Ok(Self {
            species,
            age,
            weight,
            fitness: fitness(age, weight, params),
            has_migrated: false,
        })
    }

    /// A newborn of age 0 with a weight drawn from the species' birth distribution
    pub fn newborn<R: Rng + ?Sized>(species: Species, params: &SpeciesParams, rng: &mut R) -> Self {
        let weight = birth_weight(params, rng);
        Self {
            species,
            age: 0,
            weight,
            fitness: fitness(0, weight, params),
            has_migrated: false,
        }
    }

    /// Build from a population record, drawing a birth weight when none is given
    pub fn from_spec<R: Rng + ?Sized>(
        spec: &AnimalSpec,
        params: &SpeciesParams,
        rng: &mut R,
    ) -> Result<Self> {
        let age = spec.age.unwrap_or(0);
        match spec.weight {
            Some(weight) => Self::new(spec.species, age, weight, params),
            None => {
                let mut animal = Self::newborn(spec.species, params, rng);
                animal.age = age;
                animal.update_fitness(params);
                Ok(animal)
            }
        }
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    fn update_fitness(&mut self, params: &SpeciesParams) {
        self.fitness = fitness(self.age, self.weight, params);
    }

    pub fn grow_older(&mut self, params: &SpeciesParams) {
        self.age += 1;
        self.update_fitness(params);
    }

    /// Yearly metabolic loss of `eta * weight`
    pub fn lose_weight(&mut self, params: &SpeciesParams) {
        self.weight = (self.weight - self.weight * params.eta).max(0.0);
        self.update_fitness(params);
    }

    pub fn eat(&mut self, amount: f64, params: &SpeciesParams) {
        self.weight += amount * params.beta;
        self.update_fitness(params);
    }

    /// Probability of giving birth in a population of `population` same-species animals
    pub fn birth_probability(&self, population: usize, params: &SpeciesParams) -> f64 {
        if population <= 1 || self.weight < params.zeta * (params.w_birth + params.sigma_birth) {
            return 0.0;
        }
        (params.gamma * self.fitness * (population - 1) as f64).min(1.0)
    }

    pub fn gives_birth<R: Rng + ?Sized>(
        &self,
        population: usize,
        params: &SpeciesParams,
        rng: &mut R,
    ) -> bool {
        rng.gen::<f64>() < self.birth_probability(population, params)
    }

    /// Deduct `xi * newborn_weight` if the mother can afford it.
    /// Returns `false`, leaving the weight untouched, when she cannot.
    pub fn pay_birth_cost(&mut self, newborn_weight: f64, params: &SpeciesParams) -> bool {
        let cost = params.xi * newborn_weight;
        if self.weight < cost {
            return false;
        }
        self.weight -= cost;
        self.update_fitness(params);
        true
    }

    pub fn death_probability(&self, params: &SpeciesParams) -> f64 {
        if self.fitness == 0.0 {
            1.0
        } else {
            params.omega * (1.0 - self.fitness)
        }
    }

    pub fn dies<R: Rng + ?Sized>(&self, params: &SpeciesParams, rng: &mut R) -> bool {
        if self.fitness == 0.0 {
            return true;
        }
        rng.gen::<f64>() < self.death_probability(params)
    }

    /// Probability that this predator kills prey of fitness `target_fitness`
    pub fn kill_probability(&self, target_fitness: f64, params: &SpeciesParams) -> f64 {
        let gap = self.fitness - target_fitness;
        let delta_phi_max = params.delta_phi_max();
        if gap <= 0.0 {
            0.0
        } else if gap < delta_phi_max {
            gap / delta_phi_max
        } else {
            1.0
        }
    }

    pub fn kills<R: Rng + ?Sized>(
        &self,
        target_fitness: f64,
        params: &SpeciesParams,
        rng: &mut R,
    ) -> bool {
        rng.gen::<f64>() < self.kill_probability(target_fitness, params)
    }

    pub fn migration_probability(&self, params: &SpeciesParams) -> f64 {
        params.mu * self.fitness
    }

    pub fn will_migrate<R: Rng + ?Sized>(&self, params: &SpeciesParams, rng: &mut R) -> bool {
        rng.gen::<f64>() < self.migration_probability(params)
    }
}

/// Fitness in [0, 1] from age and weight; zero for a weightless animal
pub fn fitness(age: u32, weight: f64, params: &SpeciesParams) -> f64 {
    if weight == 0.0 {
        return 0.0;
    }
    let age_term = sigmoid(1.0, age as f64, params.a_half, params.phi_age);
    let weight_term = sigmoid(-1.0, weight, params.w_half, params.phi_weight);
    (age_term * weight_term).clamp(0.0, 1.0)
}

fn sigmoid(sign: f64, x: f64, x_half: f64, phi: f64) -> f64 {
    1.0 / (1.0 + (sign * phi * (x - x_half)).exp())
}

/// Draw a birth weight from the log-normal distribution whose mean is `w_birth`
/// and whose standard deviation is `sigma_birth`.
pub fn birth_weight<R: Rng + ?Sized>(params: &SpeciesParams, rng: &mut R) -> f64 {
    let w2 = params.w_birth * params.w_birth;
    let s2 = params.sigma_birth * params.sigma_birth;
    let mu = (w2 / (w2 + s2).sqrt()).ln();
    let sigma = (1.0 + s2 / w2).ln().sqrt();
    match LogNormal::new(mu, sigma) {
        Ok(dist) => dist.sample(rng),
        // w_birth == 0 leaves no valid distribution
        Err(_) => 0.0,
    }
}
