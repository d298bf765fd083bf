//! Island ecosystem simulation engine.
//!
//! This module implements the grid of habitat cells where herbivores and
//! carnivores feed, reproduce, migrate, age and die, one year at a time.

pub mod animal;
pub mod cell;
pub mod geography;
pub mod grid;
pub mod simulation;
pub mod island;

pub use animal::Animal;
pub use cell::Cell;
pub use geography::Geography;
pub use grid::{Grid, YearReport};
pub use simulation::BioSim;
pub use island::{IslandResult, IslandScenario};
