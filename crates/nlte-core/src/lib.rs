//! Core data structures for NLTE ionization balance.
//!
//! This crate provides species and level keys, per-shell rate tables, the
//! rate-matrix index, and assembly of the rate matrix and its Jacobian from
//! Saha factors and aggregated rate coefficients.

pub mod bound_bound;
pub mod coefficients;
pub mod error;
pub mod index;
pub mod jacobian;
pub mod rate_matrix;
pub mod saha;
pub mod shell;
pub mod species;
pub mod table;
pub mod vectors;

pub use bound_bound::{
    BoundBoundRateAssembler, CollisionalTransition, ExcitationLine, RadiativeRates,
    collisional_rate_matrix,
};
pub use coefficients::{IonCoefficients, LevelRateCoefficients, aggregate, level_population_fraction};
pub use error::{Error, Result};
pub use index::{ElementBlock, IndexEntry, RateMatrixIndex};
pub use jacobian::{JacobianBuilder, deriv_matrix_block};
pub use rate_matrix::RateMatrixBuilder;
pub use saha::floor_zero_saha_factors;
pub use shell::{ElementRates, ShellInput};
pub use species::{LevelKey, SpeciesKey, Treatment};
pub use table::{ElementTable, IonTable, LevelTable, Table};
pub use vectors::{first_guess, solution_vector};
