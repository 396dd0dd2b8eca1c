//! Run-level orchestration: all shells of one plasma state.

use nalgebra::{DMatrix, DVector};
use nlte_core::{
    ElementTable, IonCoefficients, IonTable, LevelRateCoefficients, LevelTable, RateMatrixIndex,
    ShellInput, SpeciesKey, aggregate, floor_zero_saha_factors,
};
use rayon::prelude::*;

use crate::config::SolverConfig;
use crate::error::{Error, Result};
use crate::shell::{ShellProblem, ShellSolution};

/// Everything the rate equations need for one run.
#[derive(Debug, Clone)]
pub struct PlasmaState {
    /// Per-level rate coefficients.
    pub coefficients: LevelRateCoefficients,
    pub partition_function: IonTable,
    pub level_boltzmann_factor: LevelTable,
    /// Saha factors, keyed by the upper ion of each ratio.
    pub phi: IonTable,
    /// Total number density per element.
    pub number_density: ElementTable,
    pub nlte_ionization_species: Vec<SpeciesKey>,
    pub nlte_excitation_species: Vec<SpeciesKey>,
}

impl PlasmaState {
    pub fn num_shells(&self) -> usize {
        self.number_density.num_shells()
    }

    /// Elements present in the plasma, ascending.
    pub fn atomic_numbers(&self) -> Vec<u32> {
        let mut elements = self.number_density.keys().to_vec();
        elements.sort_unstable();
        elements
    }
}

/// Converged populations of every shell.
#[derive(Debug, Clone)]
pub struct NlteSolution {
    /// Ion number densities, one row per species in index order.
    pub ion_number_densities: IonTable,
    pub electron_densities: Vec<f64>,
    /// Newton iterations used per shell.
    pub iterations: Vec<usize>,
}

impl NlteSolution {
    pub fn num_shells(&self) -> usize {
        self.electron_densities.len()
    }

    /// Unknown vector of one shell laid out along `index`.
    pub fn state_vector(&self, index: &RateMatrixIndex, shell: usize) -> Result<DVector<f64>> {
        self.ion_number_densities.check_shell(shell)?;
        let mut x = DVector::zeros(index.len());
        for (row, entry) in index.entries().iter().enumerate() {
            x[row] = self
                .ion_number_densities
                .get(&entry.species, shell)
                .ok_or(nlte_core::Error::SpeciesNotFound(entry.species))?;
        }
        x[index.electron_row()] = self.electron_densities[shell];
        Ok(x)
    }

    fn from_shells(index: &RateMatrixIndex, shells: Vec<ShellSolution>) -> Result<Self> {
        let mut densities = DMatrix::zeros(index.num_ions(), shells.len());
        let mut electron_densities = Vec::with_capacity(shells.len());
        let mut iterations = Vec::with_capacity(shells.len());
        for (column, shell) in shells.into_iter().enumerate() {
            densities.set_column(column, &shell.ion_number_densities);
            electron_densities.push(shell.electron_density);
            iterations.push(shell.iterations);
        }
        Ok(Self {
            ion_number_densities: IonTable::new(index.species(), densities)?,
            electron_densities,
            iterations,
        })
    }
}

/// Solves the NLTE ionization balance of every shell.
#[derive(Debug, Clone, Default)]
pub struct NlteRateEquationSolver {
    config: SolverConfig,
}

impl NlteRateEquationSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Rate-matrix index of the plasma composition.
    pub fn build_index(&self, plasma: &PlasmaState) -> Result<RateMatrixIndex> {
        Ok(RateMatrixIndex::new(
            &plasma.atomic_numbers(),
            &plasma.nlte_ionization_species,
            &plasma.nlte_excitation_species,
        )?)
    }

    /// Per-shell inputs laid out along `index`.
    ///
    /// Aggregates the level coefficients once and, if configured, floors zero
    /// Saha factors before extracting each shell.
    pub fn shell_inputs(
        &self,
        plasma: &PlasmaState,
        index: &RateMatrixIndex,
    ) -> Result<Vec<ShellInput>> {
        let coefficients: IonCoefficients = aggregate(
            &plasma.coefficients,
            &plasma.partition_function,
            &plasma.level_boltzmann_factor,
        )?;

        let floored;
        let phi = if self.config.floor_zero_saha_factors {
            floored = floor_zero_saha_factors(&plasma.phi);
            &floored
        } else {
            &plasma.phi
        };

        (0..plasma.num_shells())
            .map(|shell| {
                ShellInput::new(index, phi, &plasma.number_density, &coefficients, shell)
                    .map_err(|e| Error::from(e).in_shell(shell))
            })
            .collect()
    }

    /// Solve every shell from the default first guess.
    pub fn solve(&self, plasma: &PlasmaState) -> Result<NlteSolution> {
        self.run(plasma, None)
    }

    /// Solve every shell starting from a previous solution.
    pub fn solve_from(&self, plasma: &PlasmaState, previous: &NlteSolution) -> Result<NlteSolution> {
        if previous.num_shells() != plasma.num_shells() {
            return Err(Error::DimensionMismatch {
                expected: plasma.num_shells(),
                actual: previous.num_shells(),
            });
        }
        self.run(plasma, Some(previous))
    }

    fn run(&self, plasma: &PlasmaState, previous: Option<&NlteSolution>) -> Result<NlteSolution> {
        let index = self.build_index(plasma)?;
        let inputs = self.shell_inputs(plasma, &index)?;
        let num_shells = inputs.len();

        let use_parallel = self.config.parallel
            && num_shells >= self.config.min_shells_for_parallel
            && rayon::current_num_threads() > 1;

        log::info!(
            "Solving NLTE rate equations for {} shells ({} unknowns, {} NLTE ions, {})",
            num_shells,
            index.len(),
            index.nlte_ions().count(),
            if use_parallel { "parallel" } else { "sequential" }
        );

        let solve_one = |input: &ShellInput| -> Result<ShellSolution> {
            let guess = previous
                .map(|solution| solution.state_vector(&index, input.shell))
                .transpose()
                .map_err(|e| e.in_shell(input.shell))?;
            ShellProblem::new(&index, input).solve(&self.config.criteria, guess.as_ref())
        };

        let shells: Vec<ShellSolution> = if use_parallel {
            inputs.par_iter().map(solve_one).collect::<Result<_>>()?
        } else {
            inputs.iter().map(solve_one).collect::<Result<_>>()?
        };

        let solution = NlteSolution::from_shells(&index, shells)?;
        log::info!(
            "Converged {} shells in {} Newton iterations",
            num_shells,
            solution.iterations.iter().sum::<usize>()
        );
        Ok(solution)
    }
}
