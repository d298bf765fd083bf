//! Simulation driver for running an island year by year.

use crate::grid::{Grid, YearReport};
use biosim_core::{
    ParameterRegistry, PopulationEntry, PopulationStats, Result, Species, Terrain, YearStats,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

pub struct BioSim {
    grid: Grid,
    rng: ChaCha8Rng,
    year: u32,
    log_interval: u32,
    // Running totals for the end-of-run summary
    totals: YearReport,
}

impl BioSim {
    /// Build an island from `island_map`, seed the generator and place `ini_pop`
    pub fn new(island_map: &str, ini_pop: &[PopulationEntry], seed: u64) -> Result<Self> {
        let grid = Grid::from_map(island_map, ParameterRegistry::default())?;
        let mut sim = Self {
            grid,
            rng: ChaCha8Rng::seed_from_u64(seed),
            year: 0,
            log_interval: 10,
            totals: YearReport::default(),
        };
        sim.add_population(ini_pop)?;
        info!(
            seed,
            rows = sim.grid.rows,
            cols = sim.grid.cols,
            population = sim.num_animals(),
            "Island created"
        );
        Ok(sim)
    }

    /// Years between population snapshots in the log; zero disables them
    pub fn with_log_interval(mut self, years: u32) -> Self {
        self.log_interval = years;
        self
    }

    pub fn set_animal_parameters(&mut self, species: Species, params: &Value) -> Result<()> {
        self.grid.set_species_parameters(species, params)
    }

    pub fn set_landscape_parameters(&mut self, terrain: Terrain, params: &Value) -> Result<()> {
        self.grid.set_terrain_parameters(terrain, params)
    }

    pub fn add_population(&mut self, population: &[PopulationEntry]) -> Result<usize> {
        self.grid.add_population(population, &mut self.rng)
    }

    /// Run `num_years` annual cycles and return the population after each
    pub fn simulate(&mut self, num_years: u32) -> Vec<YearStats> {
        self.simulate_with(num_years, |_, _| {})
    }

    /// Like [`simulate`](Self::simulate), handing the grid to `observer` after every year
    #[instrument(skip(self, observer))]
    pub fn simulate_with<F>(&mut self, num_years: u32, mut observer: F) -> Vec<YearStats>
    where
        F: FnMut(&Grid, &YearStats),
    {
        info!("Starting simulation for {} years", num_years);

        let mut trace = Vec::with_capacity(num_years as usize);
        for _ in 0..num_years {
            let report = self.grid.advance_one_year(&mut self.rng);
            self.year += 1;
            self.accumulate(&report);

            let stats = self.year_stats();
            observer(&self.grid, &stats);
            trace.push(stats);

            if self.log_interval > 0 && self.year % self.log_interval == 0 {
                self.emit_population_metrics(&report);
            }
        }

        self.emit_run_summary();
        trace
    }

    fn accumulate(&mut self, report: &YearReport) {
        self.totals.births += report.births;
        self.totals.kills += report.kills;
        self.totals.migrations += report.migrations;
        self.totals.deaths += report.deaths;
    }

    fn year_stats(&self) -> YearStats {
        YearStats {
            year: self.year,
            herbivores: self.grid.count(Species::Herbivore),
            carnivores: self.grid.count(Species::Carnivore),
        }
    }

    fn emit_population_metrics(&self, report: &YearReport) {
        let stats = self.grid.statistics();
        let herb = stats.herbivores.summary();
        let carn = stats.carnivores.summary();

        info!(
            event = "population_metrics",
            year = self.year,
            herbivores = herb.count,
            carnivores = carn.count,
            herbivore_mean_weight = format!("{:.2}", herb.mean_weight),
            carnivore_mean_weight = format!("{:.2}", carn.mean_weight),
            herbivore_mean_fitness = format!("{:.3}", herb.mean_fitness),
            carnivore_mean_fitness = format!("{:.3}", carn.mean_fitness),
            "Population snapshot"
        );
        debug!(
            year = self.year,
            births = report.births,
            kills = report.kills,
            migrations = report.migrations,
            deaths = report.deaths,
            "Yearly events"
        );
    }

    fn emit_run_summary(&self) {
        info!(
            event = "run_summary",
            final_year = self.year,
            herbivores = self.grid.count(Species::Herbivore),
            carnivores = self.grid.count(Species::Carnivore),
            births_total = self.totals.births,
            kills_total = self.totals.kills,
            migrations_total = self.totals.migrations,
            deaths_total = self.totals.deaths,
            "Simulation complete"
        );
    }

    /// Number of years simulated so far
    pub fn year(&self) -> u32 {
        self.year
    }

    pub fn num_animals(&self) -> usize {
        self.grid.total()
    }

    pub fn num_animals_per_species(&self) -> BTreeMap<Species, usize> {
        Species::ALL
            .into_iter()
            .map(|s| (s, self.grid.count(s)))
            .collect()
    }

    pub fn statistics(&self) -> PopulationStats {
        self.grid.statistics()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }
}
