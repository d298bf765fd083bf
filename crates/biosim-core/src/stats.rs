//! Population statistics pulled from the island after each year.

use crate::Species;
use serde::{Deserialize, Serialize};

/// Flattened per-animal values for one species
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeciesStats {
    pub count: usize,
    pub ages: Vec<u32>,
    pub weights: Vec<f64>,
    pub fitness: Vec<f64>,
    /// Animals per cell, indexed `[row][col]`
    pub density: Vec<Vec<usize>>,
}

impl SpeciesStats {
    pub fn summary(&self) -> SpeciesSummary {
        SpeciesSummary {
            count: self.count,
            mean_age: mean(self.ages.iter().map(|&a| a as f64)),
            mean_weight: mean(self.weights.iter().copied()),
            mean_fitness: mean(self.fitness.iter().copied()),
        }
    }
}

/// Scalar digest of [`SpeciesStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeciesSummary {
    pub count: usize,
    pub mean_age: f64,
    pub mean_weight: f64,
    pub mean_fitness: f64,
}

/// Snapshot of the whole island
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationStats {
    pub herbivores: SpeciesStats,
    pub carnivores: SpeciesStats,
}

impl PopulationStats {
    pub fn species(&self, species: Species) -> &SpeciesStats {
        match species {
            Species::Herbivore => &self.herbivores,
            Species::Carnivore => &self.carnivores,
        }
    }

    pub fn species_mut(&mut self, species: Species) -> &mut SpeciesStats {
        match species {
            Species::Herbivore => &mut self.herbivores,
            Species::Carnivore => &mut self.carnivores,
        }
    }

    pub fn total(&self) -> usize {
        self.herbivores.count + self.carnivores.count
    }
}

/// Compact per-year record of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearStats {
    pub year: u32,
    pub herbivores: usize,
    pub carnivores: usize,
}

impl YearStats {
    pub fn total(&self) -> usize {
        self.herbivores + self.carnivores
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_means() {
        let stats = SpeciesStats {
            count: 2,
            ages: vec![2, 4],
            weights: vec![10.0, 20.0],
            fitness: vec![0.5, 0.7],
            density: vec![vec![0, 2]],
        };
        let summary = stats.summary();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.mean_age, 3.0);
        assert_eq!(summary.mean_weight, 15.0);
        assert!((summary.mean_fitness - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_empty_summary_is_zero() {
        let summary = SpeciesStats::default().summary();
        assert_eq!(summary, SpeciesSummary::default());
    }

    #[test]
    fn test_totals() {
        let mut stats = PopulationStats::default();
        stats.species_mut(Species::Herbivore).count = 7;
        stats.species_mut(Species::Carnivore).count = 3;
        assert_eq!(stats.total(), 10);
        assert_eq!(stats.species(Species::Carnivore).count, 3);

        let year = YearStats {
            year: 1,
            herbivores: 7,
            carnivores: 3,
        };
        assert_eq!(year.total(), 10);
    }
}
