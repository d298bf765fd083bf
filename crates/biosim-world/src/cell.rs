//! A single island cell and its yearly ecology.

use crate::animal::Animal;
use biosim_core::{Location, ParameterRegistry, Species, Terrain};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A neighbouring cell as seen from the migration step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbour {
    pub index: usize,
    pub terrain: Terrain,
}

/// Animal leaving its cell for the inbox of `destination`
#[derive(Debug, Clone)]
pub struct Emigrant {
    pub destination: usize,
    pub animal: Animal,
}

/// Counters produced by the first half of a cell's year
#[derive(Debug, Default)]
pub struct PhaseOneOutcome {
    pub births: usize,
    pub kills: usize,
    pub emigrants: Vec<Emigrant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub location: Location,
    pub terrain: Terrain,
    fodder: f64,
    population: [Vec<Animal>; 2],
    inbox: [Vec<Animal>; 2],
}

impl Cell {
    pub fn new(location: Location, terrain: Terrain, registry: &ParameterRegistry) -> Self {
        Self {
            location,
            terrain,
            fodder: registry.max_fodder(terrain),
            population: [Vec::new(), Vec::new()],
            inbox: [Vec::new(), Vec::new()],
        }
    }

    pub fn is_habitable(&self) -> bool {
        self.terrain.is_habitable()
    }

    pub fn fodder(&self) -> f64 {
        self.fodder
    }

    /// Live animals of `species`, excluding those still waiting in the inbox
    pub fn animals(&self, species: Species) -> &[Animal] {
        &self.population[species.index()]
    }

    /// Live animals plus pending arrivals of `species`
    pub fn count(&self, species: Species) -> usize {
        self.population[species.index()].len() + self.inbox[species.index()].len()
    }

    pub fn total(&self) -> usize {
        self.population.iter().map(Vec::len).sum::<usize>() + self.pending_arrivals()
    }

    pub fn pending_arrivals(&self) -> usize {
        self.inbox.iter().map(Vec::len).sum()
    }

    /// Place an animal directly in the live population
    pub(crate) fn add_animal(&mut self, animal: Animal) {
        debug_assert!(self.is_habitable(), "animal placed in {}", self.terrain);
        self.population[animal.species.index()].push(animal);
    }

    /// Stage an arriving animal until the phase boundary
    pub(crate) fn receive(&mut self, animal: Animal) {
        debug_assert!(self.is_habitable(), "animal migrated into {}", self.terrain);
        self.inbox[animal.species.index()].push(animal);
    }

    /// Reproduction, regrowth, feeding and outbound migration, in that order
    pub fn phase_one<R: Rng + ?Sized>(
        &mut self,
        neighbours: &[Neighbour],
        registry: &ParameterRegistry,
        rng: &mut R,
    ) -> PhaseOneOutcome {
        let births = self.give_birth(registry, rng);
        self.regrow_fodder(registry);
        self.feed_herbivores(registry, rng);
        let kills = self.feed_carnivores(registry, rng);
        let emigrants = self.emigrate(neighbours, registry, rng);
        PhaseOneOutcome {
            births,
            kills,
            emigrants,
        }
    }

    /// Merge arrivals, age, lose weight and die. Returns the number of deaths.
    pub fn phase_two<R: Rng + ?Sized>(&mut self, registry: &ParameterRegistry, rng: &mut R) -> usize {
        self.merge_arrivals();
        self.age_animals(registry);
        self.lose_weight(registry);
        self.cull(registry, rng)
    }

    /// Newborns join only after every parent has been evaluated, so none of
    /// them can give birth in the year they are born.
    pub fn give_birth<R: Rng + ?Sized>(&mut self, registry: &ParameterRegistry, rng: &mut R) -> usize {
        let mut births = 0;
        for species in Species::ALL {
            let params = registry.species(species);
            let animals = &mut self.population[species.index()];
            let population = animals.len();
            let mut newborns = Vec::new();

            for parent in animals.iter_mut() {
                if !parent.gives_birth(population, params, rng) {
                    continue;
                }
                let newborn = Animal::newborn(species, params, rng);
                if parent.pay_birth_cost(newborn.weight(), params) {
                    newborns.push(newborn);
                }
            }

            births += newborns.len();
            animals.extend(newborns);
        }
        births
    }

    pub fn regrow_fodder(&mut self, registry: &ParameterRegistry) {
        self.fodder = match self.terrain {
            Terrain::Lowland | Terrain::Highland => registry.max_fodder(self.terrain),
            Terrain::Desert | Terrain::Water => 0.0,
        };
    }

    /// Herbivores graze in random order until the fodder runs out
    pub fn feed_herbivores<R: Rng + ?Sized>(&mut self, registry: &ParameterRegistry, rng: &mut R) {
        let params = registry.species(Species::Herbivore);
        let herbivores = &mut self.population[Species::Herbivore.index()];
        herbivores.shuffle(rng);

        for herbivore in herbivores.iter_mut() {
            let eaten = params.f.min(self.fodder);
            self.fodder -= eaten;
            herbivore.eat(eaten, params);
        }
    }

    /// The fittest carnivore hunts first, always starting from the weakest
    /// remaining herbivore. Returns the number of herbivores killed.
    pub fn feed_carnivores<R: Rng + ?Sized>(&mut self, registry: &ParameterRegistry, rng: &mut R) -> usize {
        let carn_params = registry.species(Species::Carnivore);
        let [herbivores, carnivores] = &mut self.population;

        carnivores.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));
        herbivores.sort_by(|a, b| a.fitness().total_cmp(&b.fitness()));

        let mut kills = 0;
        for carnivore in carnivores.iter_mut() {
            let capacity = carn_params.f;
            let mut eaten = 0.0;
            let mut i = 0;

            while i < herbivores.len() && eaten < capacity {
                if carnivore.kills(herbivores[i].fitness(), carn_params, rng) {
                    let prey = herbivores.remove(i);
                    eaten += (capacity - eaten).min(prey.weight());
                    kills += 1;
                } else {
                    i += 1;
                }
            }

            carnivore.eat(eaten, carn_params);
        }
        kills
    }

    /// Every animal that has not moved this year may try once. A move into
    /// Water is refused and the animal stays where it is.
    pub fn emigrate<R: Rng + ?Sized>(
        &mut self,
        neighbours: &[Neighbour],
        registry: &ParameterRegistry,
        rng: &mut R,
    ) -> Vec<Emigrant> {
        let mut emigrants = Vec::new();
        if neighbours.is_empty() {
            return emigrants;
        }

        for species in Species::ALL {
            let params = registry.species(species);
            let animals = std::mem::take(&mut self.population[species.index()]);
            let mut staying = Vec::with_capacity(animals.len());

            for mut animal in animals {
                if animal.has_migrated || !animal.will_migrate(params, rng) {
                    staying.push(animal);
                    continue;
                }
                let Some(target) = neighbours.choose(rng) else {
                    staying.push(animal);
                    continue;
                };
                if !target.terrain.is_habitable() {
                    staying.push(animal);
                    continue;
                }
                animal.has_migrated = true;
                emigrants.push(Emigrant {
                    destination: target.index,
                    animal,
                });
            }

            self.population[species.index()] = staying;
        }
        emigrants
    }

    /// Move the inbox into the live population and clear every migration flag
    pub fn merge_arrivals(&mut self) {
        for species in Species::ALL {
            let arrivals = std::mem::take(&mut self.inbox[species.index()]);
            let animals = &mut self.population[species.index()];
            animals.extend(arrivals);
            for animal in animals.iter_mut() {
                animal.has_migrated = false;
            }
        }
    }

    pub fn age_animals(&mut self, registry: &ParameterRegistry) {
        for species in Species::ALL {
            let params = registry.species(species);
            for animal in &mut self.population[species.index()] {
                animal.grow_older(params);
            }
        }
    }

    pub fn lose_weight(&mut self, registry: &ParameterRegistry) {
        for species in Species::ALL {
            let params = registry.species(species);
            for animal in &mut self.population[species.index()] {
                animal.lose_weight(params);
            }
        }
    }

    /// Remove the animals that die this year. Returns the number removed.
    pub fn cull<R: Rng + ?Sized>(&mut self, registry: &ParameterRegistry, rng: &mut R) -> usize {
        let mut deaths = 0;
        for species in Species::ALL {
            let params = registry.species(species);
            let animals = &mut self.population[species.index()];
            let before = animals.len();
            animals.retain(|animal| !animal.dies(params, rng));
            deaths += before - animals.len();
        }
        deaths
    }
}
