//! Core type definitions for the simulation.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two built-in animal species
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Species {
    Herbivore,
    Carnivore,
}

impl Species {
    pub const ALL: [Species; 2] = [Species::Herbivore, Species::Carnivore];

    pub fn name(&self) -> &'static str {
        match self {
            Species::Herbivore => "Herbivore",
            Species::Carnivore => "Carnivore",
        }
    }

    /// Dense index, used for per-species arrays
    pub fn index(&self) -> usize {
        match self {
            Species::Herbivore => 0,
            Species::Carnivore => 1,
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Species {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Herbivore" => Ok(Species::Herbivore),
            "Carnivore" => Ok(Species::Carnivore),
            other => Err(Error::UnknownSpecies(other.to_string())),
        }
    }
}

/// Terrain of a single island cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Terrain {
    #[serde(rename = "W")]
    Water,
    #[serde(rename = "L")]
    Lowland,
    #[serde(rename = "H")]
    Highland,
    #[serde(rename = "D")]
    Desert,
}

impl Terrain {
    pub const ALL: [Terrain; 4] = [
        Terrain::Water,
        Terrain::Lowland,
        Terrain::Highland,
        Terrain::Desert,
    ];

    pub fn from_code(code: char) -> Result<Self> {
        match code {
            'W' => Ok(Terrain::Water),
            'L' => Ok(Terrain::Lowland),
            'H' => Ok(Terrain::Highland),
            'D' => Ok(Terrain::Desert),
            other => Err(Error::UnknownTerrain(other.to_string())),
        }
    }

    pub fn code(&self) -> char {
        match self {
            Terrain::Water => 'W',
            Terrain::Lowland => 'L',
            Terrain::Highland => 'H',
            Terrain::Desert => 'D',
        }
    }

    /// Whether animals may live in (and migrate into) this terrain
    pub fn is_habitable(&self) -> bool {
        !matches!(self, Terrain::Water)
    }
}

impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Terrain::Water => "Water",
            Terrain::Lowland => "Lowland",
            Terrain::Highland => "Highland",
            Terrain::Desert => "Desert",
        };
        f.write_str(name)
    }
}

impl FromStr for Terrain {
    type Err = Error;

    /// Accepts either the single-letter map code or the full name
    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        if let (Some(code), None) = (chars.next(), chars.next()) {
            return Terrain::from_code(code);
        }
        match s {
            "Water" => Ok(Terrain::Water),
            "Lowland" => Ok(Terrain::Lowland),
            "Highland" => Ok(Terrain::Highland),
            "Desert" => Ok(Terrain::Desert),
            other => Err(Error::UnknownTerrain(other.to_string())),
        }
    }
}

/// Zero-based (row, column) position of a cell on the island
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub row: usize,
    pub col: usize,
}

impl Location {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Convert the 1-based coordinates used in population records.
    /// Returns `None` for a zero coordinate.
    pub fn from_one_based(row: usize, col: usize) -> Option<Self> {
        Some(Self {
            row: row.checked_sub(1)?,
            col: col.checked_sub(1)?,
        })
    }

    pub fn to_one_based(&self) -> (usize, usize) {
        (self.row + 1, self.col + 1)
    }

    /// Neighbouring location in `direction`, if it lies inside a `rows` x `cols` map
    pub fn step(&self, direction: Direction, rows: usize, cols: usize) -> Option<Location> {
        let (dr, dc) = direction.to_delta();
        let row = self.row.checked_add_signed(dr)?;
        let col = self.col.checked_add_signed(dc)?;
        (row < rows && col < cols).then_some(Location { row, col })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (row, col) = self.to_one_based();
        write!(f, "({}, {})", row, col)
    }
}

/// Orthogonal direction for migration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// (row, column) offset
    pub fn to_delta(&self) -> (isize, isize) {
        match self {
            Direction::North => (-1, 0),
            Direction::South => (1, 0),
            Direction::East => (0, 1),
            Direction::West => (0, -1),
        }
    }

    pub fn all() -> [Direction; 4] {
        [
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
        ]
    }
}
