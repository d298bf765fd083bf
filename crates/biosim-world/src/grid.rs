//! The island grid and its annual cycle.

use crate::animal::Animal;
use crate::cell::{Cell, Neighbour};
use crate::geography::Geography;
use biosim_core::{
    Direction, Error, Location, ParameterRegistry, PopulationEntry, PopulationStats, Result,
    Species, SpeciesStats, Terrain,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace, warn};

/// What happened on the island during one year
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearReport {
    pub births: usize,
    pub kills: usize,
    pub migrations: usize,
    pub deaths: usize,
}

/// A rectangular grid of cells with precomputed orthogonal adjacency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    pub rows: usize,
    pub cols: usize,
    cells: Vec<Cell>,
    /// In-bounds orthogonal neighbours of every cell, Water included
    neighbours: Vec<Vec<Neighbour>>,
    /// Indices of non-Water cells, row-major
    habitable: Vec<usize>,
    registry: ParameterRegistry,
}

impl Grid {
    pub fn new(geography: &Geography, registry: ParameterRegistry) -> Self {
        let (rows, cols) = (geography.rows, geography.cols);
        let cells: Vec<Cell> = geography
            .locations()
            .map(|loc| Cell::new(loc, geography.terrain_at(loc), &registry))
            .collect();

        let neighbours: Vec<Vec<Neighbour>> = geography
            .locations()
            .map(|loc| {
                Direction::all()
                    .into_iter()
                    .filter_map(|dir| loc.step(dir, rows, cols))
                    .map(|n| Neighbour {
                        index: n.row * cols + n.col,
                        terrain: geography.terrain_at(n),
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        let habitable: Vec<usize> = cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_habitable())
            .map(|(i, _)| i)
            .collect();

        Self {
            rows,
            cols,
            cells,
            neighbours,
            habitable,
            registry,
        }
    }

    /// Parse and validate `map`, then build the grid
    pub fn from_map(map: &str, registry: ParameterRegistry) -> Result<Self> {
        let geography = Geography::parse(map)?;
        Ok(Self::new(&geography, registry))
    }

    pub fn registry(&self) -> &ParameterRegistry {
        &self.registry
    }

    pub fn set_species_parameters(&mut self, species: Species, params: &Value) -> Result<()> {
        self.registry.set_species_parameters(species, params)
    }

    pub fn set_terrain_parameters(&mut self, terrain: Terrain, params: &Value) -> Result<()> {
        self.registry.set_terrain_parameters(terrain, params)
    }

    fn pos_to_index(&self, loc: Location) -> Option<usize> {
        (loc.row < self.rows && loc.col < self.cols).then(|| loc.row * self.cols + loc.col)
    }

    /// Get position from index
    pub fn index_to_pos(&self, index: usize) -> Location {
        Location::new(index / self.cols, index % self.cols)
    }

    pub fn cell(&self, loc: Location) -> Option<&Cell> {
        self.pos_to_index(loc).map(|i| &self.cells[i])
    }

    /// Iterator over all cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.iter()
    }

    /// Orthogonal neighbours of `loc` that lie on the map, Water included
    pub fn neighbours(&self, loc: Location) -> &[Neighbour] {
        match self.pos_to_index(loc) {
            Some(i) => &self.neighbours[i],
            None => &[],
        }
    }

    /// Neighbours of `loc` that can receive migrants
    pub fn habitable_neighbours(&self, loc: Location) -> Vec<Location> {
        self.neighbours(loc)
            .iter()
            .filter(|n| n.terrain.is_habitable())
            .map(|n| self.index_to_pos(n.index))
            .collect()
    }

    /// Place animals into the live populations of their cells. Every location
    /// and animal is validated before anything is placed.
    pub fn add_population<R: Rng + ?Sized>(
        &mut self,
        entries: &[PopulationEntry],
        rng: &mut R,
    ) -> Result<usize> {
        let mut placements = Vec::new();
        for entry in entries {
            let index = self.habitable_index(entry.loc).inspect_err(|e| {
                warn!(loc = ?entry.loc, error = %e, "Rejected population injection");
            })?;
            for spec in &entry.pop {
                let params = self.registry.species(spec.species);
                placements.push((index, Animal::from_spec(spec, params, rng)?));
            }
        }

        let added = placements.len();
        for (index, animal) in placements {
            self.cells[index].add_animal(animal);
        }
        debug!(added, total = self.total(), "Population added");
        Ok(added)
    }

    fn habitable_index(&self, (row, col): (usize, usize)) -> Result<usize> {
        let index = Location::from_one_based(row, col)
            .and_then(|loc| self.pos_to_index(loc))
            .ok_or_else(|| {
                Error::InvalidLocation(format!(
                    "({}, {}) is outside the {}x{} map",
                    row, col, self.rows, self.cols
                ))
            })?;
        let cell = &self.cells[index];
        if !cell.is_habitable() {
            return Err(Error::InvalidLocation(format!(
                "({}, {}) is {} and cannot hold animals",
                row, col, cell.terrain
            )));
        }
        Ok(index)
    }

    /// Run one annual cycle.
    ///
    /// Phase one (birth, feeding, emigration) completes on every habitable cell
    /// before phase two (arrival, aging, weight loss, death) starts anywhere, so
    /// an animal moves at most once per year.
    pub fn advance_one_year<R: Rng + ?Sized>(&mut self, rng: &mut R) -> YearReport {
        let mut report = YearReport::default();

        for &index in &self.habitable {
            let outcome = self.cells[index].phase_one(&self.neighbours[index], &self.registry, rng);
            report.births += outcome.births;
            report.kills += outcome.kills;
            report.migrations += outcome.emigrants.len();
            for emigrant in outcome.emigrants {
                self.cells[emigrant.destination].receive(emigrant.animal);
            }
        }

        for &index in &self.habitable {
            report.deaths += self.cells[index].phase_two(&self.registry, rng);
        }

        trace!(
            births = report.births,
            kills = report.kills,
            migrations = report.migrations,
            deaths = report.deaths,
            population = self.total(),
            "Year advanced"
        );
        report
    }

    pub fn count(&self, species: Species) -> usize {
        self.cells.iter().map(|c| c.count(species)).sum()
    }

    pub fn total(&self) -> usize {
        self.cells.iter().map(Cell::total).sum()
    }

    /// Animals of `species` per cell, indexed `[row][col]`
    pub fn population_matrix(&self, species: Species) -> Vec<Vec<usize>> {
        self.cells
            .chunks(self.cols)
            .map(|row| row.iter().map(|c| c.count(species)).collect())
            .collect()
    }

    fn live_animals(&self, species: Species) -> impl Iterator<Item = &Animal> + '_ {
        self.cells.iter().flat_map(move |c| c.animals(species))
    }

    pub fn ages(&self, species: Species) -> Vec<u32> {
        self.live_animals(species).map(|a| a.age).collect()
    }

    pub fn weights(&self, species: Species) -> Vec<f64> {
        self.live_animals(species).map(Animal::weight).collect()
    }

    pub fn fitness(&self, species: Species) -> Vec<f64> {
        self.live_animals(species).map(Animal::fitness).collect()
    }

    pub fn statistics(&self) -> PopulationStats {
        let mut stats = PopulationStats::default();
        for species in Species::ALL {
            *stats.species_mut(species) = SpeciesStats {
                count: self.count(species),
                ages: self.ages(species),
                weights: self.weights(species),
                fitness: self.fitness(species),
                density: self.population_matrix(species),
            };
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde_json::json;

    const SMALL_ISLAND: &str = "WWWWW\nWLHDW\nWLLLW\nWWWWW";

    fn grid(map: &str) -> Grid {
        Grid::from_map(map, ParameterRegistry::default()).unwrap()
    }

    #[test]
    fn test_grid_creation() {
        let grid = grid(SMALL_ISLAND);
        assert_eq!(grid.rows, 4);
        assert_eq!(grid.cols, 5);
        assert_eq!(grid.cells().count(), 20);
        assert_eq!(grid.habitable.len(), 6);
        assert_eq!(grid.cell(Location::new(1, 2)).unwrap().terrain, Terrain::Highland);
        assert!(grid.cell(Location::new(4, 0)).is_none());
    }

    #[test]
    fn test_invalid_map_rejected_before_construction() {
        let result = Grid::from_map("LWW\nWLW\nWWW", ParameterRegistry::default());
        assert!(matches!(result, Err(Error::InvalidMap(_))));
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        let grid = grid(SMALL_ISLAND);
        for (index, neighbours) in grid.neighbours.iter().enumerate() {
            for n in neighbours {
                assert!(grid.neighbours[n.index].iter().any(|back| back.index == index));
            }
        }
        // Corners have two neighbours, interior cells four
        assert_eq!(grid.neighbours(Location::new(0, 0)).len(), 2);
        assert_eq!(grid.neighbours(Location::new(1, 1)).len(), 4);
    }

    #[test]
    fn test_habitable_neighbours() {
        let grid = grid(SMALL_ISLAND);
        let mut around = grid.habitable_neighbours(Location::new(1, 1));
        around.sort();
        assert_eq!(around, vec![Location::new(1, 2), Location::new(2, 1)]);
    }

    #[test]
    fn test_add_population() {
        let mut grid = grid(SMALL_ISLAND);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let entries = vec![
            PopulationEntry::uniform((2, 2), Species::Herbivore, 10, 5, 20.0),
            PopulationEntry::uniform((3, 4), Species::Carnivore, 3, 5, 20.0),
        ];
        assert_eq!(grid.add_population(&entries, &mut rng).unwrap(), 13);
        assert_eq!(grid.count(Species::Herbivore), 10);
        assert_eq!(grid.count(Species::Carnivore), 3);
        assert_eq!(grid.population_matrix(Species::Herbivore)[1][1], 10);
        assert_eq!(grid.population_matrix(Species::Carnivore)[2][3], 3);
    }

    #[test]
    fn test_add_population_on_water_rejected() {
        let mut grid = grid(SMALL_ISLAND);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let entries = vec![
            PopulationEntry::uniform((2, 2), Species::Herbivore, 10, 5, 20.0),
            PopulationEntry::uniform((1, 1), Species::Herbivore, 10, 5, 20.0),
        ];
        let err = grid.add_population(&entries, &mut rng).unwrap_err();
        assert!(matches!(err, Error::InvalidLocation(_)));
        // Nothing from the valid entry was placed either
        assert_eq!(grid.total(), 0);

        for loc in [(0, 2), (9, 9)] {
            let entries = vec![PopulationEntry::uniform(loc, Species::Carnivore, 1, 5, 20.0)];
            assert!(matches!(
                grid.add_population(&entries, &mut rng),
                Err(Error::InvalidLocation(_))
            ));
        }
    }

    #[test]
    fn test_negative_weight_injection_rejected() {
        let mut grid = grid(SMALL_ISLAND);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let entries = vec![PopulationEntry::uniform((2, 2), Species::Herbivore, 2, 5, -1.0)];
        assert!(matches!(
            grid.add_population(&entries, &mut rng),
            Err(Error::InvalidAnimal(_))
        ));
        assert_eq!(grid.total(), 0);
    }

    #[test]
    fn test_herbivore_growth_bounded_by_intake() {
        let mut grid = grid("WWW\nWLW\nWWW");
        // No births, migration or death, so only feeding and upkeep change weight
        grid.set_species_parameters(Species::Herbivore, &json!({"gamma": 0.0, "mu": 0.0, "omega": 0.0}))
            .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let entries = vec![PopulationEntry::uniform((2, 2), Species::Herbivore, 30, 5, 20.0)];
        grid.add_population(&entries, &mut rng).unwrap();

        let params = grid.registry().species(Species::Herbivore).clone();
        let before: f64 = grid.weights(Species::Herbivore).iter().sum();
        grid.advance_one_year(&mut rng);
        let after: f64 = grid.weights(Species::Herbivore).iter().sum();

        assert_eq!(grid.count(Species::Herbivore), 30);
        assert!(after <= before + params.f * params.beta * 30.0);
        assert!(grid.cell(Location::new(1, 1)).unwrap().fodder() >= 0.0);
    }

    #[test]
    fn test_statistics_snapshot() {
        let mut grid = grid(SMALL_ISLAND);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let entries = vec![PopulationEntry::uniform((3, 3), Species::Herbivore, 4, 7, 15.0)];
        grid.add_population(&entries, &mut rng).unwrap();

        let stats = grid.statistics();
        assert_eq!(stats.total(), 4);
        assert_eq!(stats.herbivores.ages, vec![7; 4]);
        assert_eq!(stats.herbivores.weights, vec![15.0; 4]);
        assert_eq!(stats.herbivores.fitness.len(), 4);
        assert_eq!(stats.herbivores.density[2][2], 4);
        assert_eq!(stats.carnivores.count, 0);
    }

    proptest! {
        #[test]
        fn prop_migration_conserves_population(seed in 0u64..500) {
            let mut grid = grid("WWWWWW\nWLLHLW\nWDLLHW\nWLWLLW\nWWWWWW");
            for species in Species::ALL {
                // No births, no deaths, and animals are eager to move
                grid.set_species_parameters(species, &json!({"gamma": 0.0, "omega": 0.0, "mu": 5.0}))
                    .unwrap();
            }
            // Carnivores with no appetite never hunt
            grid.set_species_parameters(Species::Carnivore, &json!({"F": 0.0})).unwrap();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let entries = vec![
                PopulationEntry::uniform((2, 2), Species::Herbivore, 40, 5, 20.0),
                PopulationEntry::uniform((3, 4), Species::Herbivore, 25, 5, 20.0),
                PopulationEntry::uniform((2, 4), Species::Carnivore, 10, 5, 20.0),
                PopulationEntry::uniform((4, 5), Species::Carnivore, 5, 5, 20.0),
            ];
            grid.add_population(&entries, &mut rng).unwrap();

            for _ in 0..3 {
                let report = grid.advance_one_year(&mut rng);
                prop_assert_eq!(report.births, 0);
                prop_assert_eq!(report.kills, 0);
                prop_assert_eq!(report.deaths, 0);
                prop_assert_eq!(grid.count(Species::Herbivore), 65);
                prop_assert_eq!(grid.count(Species::Carnivore), 15);
            }
            // Water cells never hold animals
            for cell in grid.cells().filter(|c| !c.is_habitable()) {
                prop_assert_eq!(cell.total(), 0);
            }
        }
    }
}
