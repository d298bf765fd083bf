//! Core types and utilities for the BioSim island population simulation.

pub mod types;
pub mod params;
pub mod config;
pub mod error;
pub mod stats;

pub use error::{Error, Result};
pub use types::*;
pub use params::*;
pub use config::*;
pub use stats::*;
