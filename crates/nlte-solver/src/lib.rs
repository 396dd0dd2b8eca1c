//! Solvers for the NLTE ionization rate equations.
//!
//! This crate provides:
//! - Dense linear solves for the Newton step
//! - A damped Newton-Raphson root finder over a generic nonlinear system
//! - The rate equations of one shell as such a system
//! - Run orchestration over all shells, sequential or on rayon's pool
//! - JSON problem and solution files

pub mod config;
pub mod error;
pub mod io;
pub mod linear;
pub mod newton;
pub mod plasma;
pub mod shell;

pub use config::SolverConfig;
pub use error::{Error, Result};
pub use io::{ElementRecord, IonRecord, LevelRecord, PlasmaFile, SolutionFile};
pub use newton::{ConvergenceCriteria, NonlinearSystem, NrResult, solve_newton_raphson};
pub use plasma::{NlteRateEquationSolver, NlteSolution, PlasmaState};
pub use shell::{ShellProblem, ShellSolution};
