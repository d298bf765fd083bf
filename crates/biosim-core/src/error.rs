//! Error types for the simulation.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown parameter '{key}' for {owner}")]
    UnknownParameter { owner: String, key: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown species: {0}")]
    UnknownSpecies(String),

    #[error("Unknown terrain: {0}")]
    UnknownTerrain(String),

    #[error("Invalid map: {0}")]
    InvalidMap(String),

    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    #[error("Invalid animal: {0}")]
    InvalidAnimal(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
