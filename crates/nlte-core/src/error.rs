//! Error types for nlte-core.

use thiserror::Error;

use crate::species::{LevelKey, SpeciesKey};

#[derive(Debug, Error)]
pub enum Error {
    #[error("species not found: {0}")]
    SpeciesNotFound(SpeciesKey),

    #[error("level not found: {0}")]
    LevelNotFound(LevelKey),

    #[error("element not found: Z={0}")]
    ElementNotFound(u32),

    #[error("duplicate table key: {0}")]
    DuplicateKey(String),

    #[error("invalid atomic number: {0}")]
    InvalidAtomicNumber(u32),

    #[error("invalid species {species}: {reason}")]
    InvalidSpecies { species: SpeciesKey, reason: String },

    #[error("invalid dimensions for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("shell {shell} out of range ({num_shells} shells)")]
    ShellOutOfRange { shell: usize, num_shells: usize },

    #[error("bound-bound assembly supports exactly one excitation species, got {0}")]
    MultipleExcitationSpecies(usize),

    #[error("level {level} out of range for {number_of_levels} levels")]
    LevelOutOfRange {
        level: usize,
        number_of_levels: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
