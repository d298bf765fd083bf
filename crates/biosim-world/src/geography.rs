//! Island map parsing and validation.

use biosim_core::{Error, Location, Result, Terrain};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated rectangular, Water-bordered terrain map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geography {
    pub rows: usize,
    pub cols: usize,
    terrain: Vec<Terrain>,
}

impl Geography {
    /// Parse a multi-line map of `W`, `L`, `H`, `D` codes. Leading and
    /// trailing whitespace on each line is ignored.
    pub fn parse(map: &str) -> Result<Self> {
        let lines: Vec<&str> = map.trim().lines().map(str::trim).collect();
        let cols = lines.first().map_or(0, |line| line.chars().count());
        if cols == 0 {
            return Err(Error::InvalidMap("map is empty".to_string()));
        }

        let rows = lines.len();
        let mut terrain = Vec::with_capacity(rows * cols);
        for (row, line) in lines.iter().enumerate() {
            let width = line.chars().count();
            if width != cols {
                return Err(Error::InvalidMap(format!(
                    "row {} has length {}, expected {}",
                    row + 1,
                    width,
                    cols
                )));
            }
            for (col, code) in line.chars().enumerate() {
                let cell = Terrain::from_code(code).map_err(|_| {
                    Error::InvalidMap(format!(
                        "invalid character '{}' at ({}, {})",
                        code,
                        row + 1,
                        col + 1
                    ))
                })?;
                terrain.push(cell);
            }
        }

        let geography = Self {
            rows,
            cols,
            terrain,
        };
        geography.check_border()?;
        Ok(geography)
    }

    fn check_border(&self) -> Result<()> {
        for location in self.locations() {
            let on_edge = location.row == 0
                || location.col == 0
                || location.row == self.rows - 1
                || location.col == self.cols - 1;
            if on_edge && self.terrain_at(location) != Terrain::Water {
                return Err(Error::InvalidMap(format!(
                    "the edge of the map must be Water, found {} at {}",
                    self.terrain_at(location),
                    location
                )));
            }
        }
        Ok(())
    }

    pub fn terrain_at(&self, location: Location) -> Terrain {
        self.terrain[location.row * self.cols + location.col]
    }

    /// All locations in row-major order
    pub fn locations(&self) -> impl Iterator<Item = Location> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| Location::new(row, col)))
    }
}

/// Renders the map back as rows of terrain codes
impl fmt::Display for Geography {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cols == 0 {
            return Ok(());
        }
        for (row, line) in self.terrain.chunks(self.cols).enumerate() {
            if row > 0 {
                writeln!(f)?;
            }
            let codes: String = line.iter().map(Terrain::code).collect();
            f.write_str(&codes)?;
        }
        Ok(())
    }
}
