//! # NLTE
//!
//! Ionization balance of a plasma out of local thermodynamic equilibrium.
//!
//! Each shell of the simulated medium is solved independently: ion number
//! densities and the free-electron density follow from Saha balance for ions
//! in LTE and from explicit ionization/recombination rates for ions tagged
//! NLTE, closed by number and charge conservation.
//!
//! ## Quick Start
//!
//! ```rust
//! use nlte::prelude::*;
//!
//! let problem = r#"{
//!     "num_shells": 1,
//!     "levels": [{"atomic_number": 1, "ion_number": 0, "level_number": 0, "values": [2.0]}],
//!     "partition_function": [{"atomic_number": 1, "ion_number": 0, "values": [2.0]}],
//!     "phi": [{"atomic_number": 1, "ion_number": 1, "values": [1.0e8]}],
//!     "number_density": [{"atomic_number": 1, "values": [1.0e10]}]
//! }"#;
//!
//! let plasma: PlasmaFile = serde_json::from_str(problem).unwrap();
//! let plasma = plasma.into_state().unwrap();
//!
//! let solution = NlteRateEquationSolver::default().solve(&plasma).unwrap();
//! let ne = solution.electron_densities[0];
//! assert!(ne > 9.5e8 && ne < 9.52e8);
//! ```

// Re-export member crates
pub use nlte_core as core;
pub use nlte_solver as solver;

// ============================================================================
// Convenient re-exports from nlte_core
// ============================================================================

pub use nlte_core::{
    BoundBoundRateAssembler,
    CollisionalTransition,
    ElementTable,
    // Errors
    Error as CoreError,
    ExcitationLine,
    IonCoefficients,
    IonTable,
    // Assembly
    JacobianBuilder,
    // Keys
    LevelKey,
    LevelRateCoefficients,
    LevelTable,
    RateMatrixBuilder,
    RateMatrixIndex,
    ShellInput,
    SpeciesKey,
    // Tables
    Table,
    Treatment,
    aggregate,
    floor_zero_saha_factors,
};

// ============================================================================
// Convenient re-exports from nlte_solver
// ============================================================================

pub use nlte_solver::{
    ConvergenceCriteria,
    // Errors
    Error as SolverError,
    // Orchestration
    NlteRateEquationSolver,
    NlteSolution,
    // Newton-Raphson
    NonlinearSystem,
    NrResult,
    // Files
    PlasmaFile,
    PlasmaState,
    ShellProblem,
    ShellSolution,
    SolutionFile,
    SolverConfig,
    solve_newton_raphson,
};

/// Re-export of nalgebra's dynamic vector type.
pub use nalgebra::DVector;

/// Re-export of nalgebra's dynamic matrix type.
pub use nalgebra::DMatrix;

/// Prelude module containing commonly used types and traits.
///
/// ```rust
/// use nlte::prelude::*;
/// ```
pub mod prelude {
    // Keys and tables
    pub use crate::{ElementTable, IonTable, LevelKey, LevelTable, SpeciesKey};

    // Solver
    pub use crate::{
        ConvergenceCriteria, NlteRateEquationSolver, NlteSolution, PlasmaState, SolverConfig,
    };

    // Files
    pub use crate::{PlasmaFile, SolutionFile};

    // Common external types
    pub use crate::{DMatrix, DVector};
}
