//! Solver configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::newton::ConvergenceCriteria;

/// Configuration for a rate-equation run.
///
/// Every field has a default, so a config file only needs the values it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Newton convergence criteria, shared by every shell.
    pub criteria: ConvergenceCriteria,
    /// Solve shells on the rayon thread pool.
    pub parallel: bool,
    /// Minimum shells to use parallel execution (below this, sequential is faster).
    pub min_shells_for_parallel: usize,
    /// Replace zero Saha factors before assembly.
    pub floor_zero_saha_factors: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            criteria: ConvergenceCriteria::default(),
            parallel: true,
            min_shells_for_parallel: 4,
            floor_zero_saha_factors: true,
        }
    }
}

impl SolverConfig {
    /// Load a config from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Create config with parallel execution switched on or off.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create config with minimum parallel threshold.
    pub fn with_min_parallel(mut self, min: usize) -> Self {
        self.min_shells_for_parallel = min;
        self
    }

    /// Create config with the given convergence criteria.
    pub fn with_criteria(mut self, criteria: ConvergenceCriteria) -> Self {
        self.criteria = criteria;
        self
    }
}
