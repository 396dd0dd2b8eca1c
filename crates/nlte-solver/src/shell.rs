//! Rate equations of one shell as a nonlinear system.

use nalgebra::{DMatrix, DVector};
use nlte_core::{
    JacobianBuilder, RateMatrixBuilder, RateMatrixIndex, ShellInput, first_guess, solution_vector,
};

use crate::error::{Error, Result};
use crate::newton::{ConvergenceCriteria, NonlinearSystem, solve_newton_raphson};

/// `F(x) = A(n_e) x - b` for one shell.
pub struct ShellProblem<'a> {
    index: &'a RateMatrixIndex,
    input: &'a ShellInput,
    matrix_builder: RateMatrixBuilder<'a>,
    jacobian_builder: JacobianBuilder<'a>,
    solution_vector: DVector<f64>,
}

/// Converged populations of one shell.
#[derive(Debug, Clone)]
pub struct ShellSolution {
    pub shell: usize,
    /// Ion number densities in rate-matrix index order.
    pub ion_number_densities: DVector<f64>,
    pub electron_density: f64,
    pub iterations: usize,
    pub residual_norm: f64,
}

impl ShellSolution {
    /// Ion densities followed by the electron density.
    pub fn state_vector(&self) -> DVector<f64> {
        let n = self.ion_number_densities.len();
        let mut x = self.ion_number_densities.clone().resize_vertically(n + 1, 0.0);
        x[n] = self.electron_density;
        x
    }
}

impl<'a> ShellProblem<'a> {
    pub fn new(index: &'a RateMatrixIndex, input: &'a ShellInput) -> Self {
        Self {
            index,
            input,
            matrix_builder: RateMatrixBuilder::new(index),
            jacobian_builder: JacobianBuilder::new(index),
            solution_vector: solution_vector(index, input),
        }
    }

    pub fn shell(&self) -> usize {
        self.input.shell
    }

    /// Rate matrix at the electron density stored in `x`.
    pub fn rate_matrix(&self, x: &DVector<f64>) -> DMatrix<f64> {
        self.matrix_builder
            .build(self.input, x[self.index.electron_row()])
    }

    /// Right-hand side `b`.
    pub fn solution_vector(&self) -> &DVector<f64> {
        &self.solution_vector
    }

    /// Everything singly ionized, `n_e` equal to the total number density.
    pub fn first_guess(&self) -> DVector<f64> {
        first_guess(self.index, self.input)
    }

    /// Solve the shell, starting from `initial_guess` or the default first guess.
    ///
    /// # Errors
    /// A run that hits the iteration cap is [`Error::ConvergenceFailed`]; any
    /// other failure is reported with the shell index attached.
    pub fn solve(
        &self,
        criteria: &ConvergenceCriteria,
        initial_guess: Option<&DVector<f64>>,
    ) -> Result<ShellSolution> {
        let shell = self.shell();
        let guess = match initial_guess {
            Some(guess) => guess.clone(),
            None => self.first_guess(),
        };

        let result =
            solve_newton_raphson(self, criteria, &guess).map_err(|e| e.in_shell(shell))?;

        if !result.converged {
            return Err(Error::ConvergenceFailed {
                shell,
                iterations: result.iterations,
                residual_norm: result.residual_norm,
            });
        }

        log::debug!(
            "Shell {} converged in {} iterations (|F| = {:e})",
            shell,
            result.iterations,
            result.residual_norm
        );

        let electron_row = self.index.electron_row();
        Ok(ShellSolution {
            shell,
            ion_number_densities: result.solution.rows(0, electron_row).into_owned(),
            electron_density: result.solution[electron_row],
            iterations: result.iterations,
            residual_norm: result.residual_norm,
        })
    }
}

impl NonlinearSystem for ShellProblem<'_> {
    fn size(&self) -> usize {
        self.index.len()
    }

    fn residual(&self, x: &DVector<f64>) -> DVector<f64> {
        self.rate_matrix(x) * x - &self.solution_vector
    }

    fn residual_and_jacobian(&self, x: &DVector<f64>) -> (DVector<f64>, DMatrix<f64>) {
        let matrix = self.rate_matrix(x);
        let residual = &matrix * x - &self.solution_vector;
        let jacobian = self.jacobian_builder.build(x, &matrix, self.input);
        (residual, jacobian)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::dvector;
    use nlte_core::ElementRates;

    fn hydrogen(phi: f64, density: f64) -> ShellInput {
        ShellInput {
            shell: 3,
            saha: vec![dvector![phi]],
            rates: vec![ElementRates::zeros(1)],
            number_density: dvector![density],
        }
    }

    /// Ionized density of a pure hydrogen Saha balance.
    fn saha_ionized(phi: f64, density: f64) -> f64 {
        2.0 * phi * density / (phi + (phi * phi + 4.0 * phi * density).sqrt())
    }

    #[test]
    fn test_hydrogen_saha_balance() {
        let index = RateMatrixIndex::lte(&[1]).unwrap();
        let input = hydrogen(1.0e8, 1.0e10);
        let problem = ShellProblem::new(&index, &input);

        let solution = problem.solve(&ConvergenceCriteria::default(), None).unwrap();

        let expected = saha_ionized(1.0e8, 1.0e10);
        assert_relative_eq!(solution.ion_number_densities[1], expected, max_relative = 1e-8);
        assert_relative_eq!(solution.electron_density, expected, max_relative = 1e-8);
        assert_relative_eq!(
            solution.ion_number_densities[0],
            1.0e10 - expected,
            max_relative = 1e-8
        );
        assert_eq!(solution.shell, 3);
    }

    #[test]
    fn test_weakly_ionized_hydrogen_resolves_trace_ions() {
        let index = RateMatrixIndex::lte(&[1]).unwrap();
        for phi in [1.0e-5, 1.0e-10] {
            let input = hydrogen(phi, 1.0e10);
            let problem = ShellProblem::new(&index, &input);

            let solution = problem.solve(&ConvergenceCriteria::default(), None).unwrap();

            let expected = saha_ionized(phi, 1.0e10);
            assert_relative_eq!(solution.ion_number_densities[1], expected, max_relative = 1e-8);
            assert_relative_eq!(solution.electron_density, expected, max_relative = 1e-8);
        }
    }

    #[test]
    fn test_residual_is_rate_matrix_times_state() {
        let index = RateMatrixIndex::lte(&[1]).unwrap();
        let input = hydrogen(1.0e8, 1.0e10);
        let problem = ShellProblem::new(&index, &input);

        let guess = problem.first_guess();
        assert_eq!(guess, dvector![0.0, 1.0e10, 1.0e10]);
        // -phi n0 + n_e n1 = 1e20; conservation rows satisfied by the guess
        assert_eq!(problem.residual(&guess), dvector![1.0e20, 0.0, 0.0]);
    }

    #[test]
    fn test_iteration_cap_is_convergence_failure() {
        let index = RateMatrixIndex::lte(&[1]).unwrap();
        let input = hydrogen(1.0e8, 1.0e10);
        let problem = ShellProblem::new(&index, &input);
        let criteria = ConvergenceCriteria {
            max_iterations: 1,
            ..Default::default()
        };

        let err = problem.solve(&criteria, None).unwrap_err();
        assert!(matches!(
            err,
            Error::ConvergenceFailed {
                shell: 3,
                iterations: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_zero_nlte_rates_are_singular() {
        let index =
            RateMatrixIndex::new(&[2], &[nlte_core::SpeciesKey::new(2, 0)], &[]).unwrap();
        let input = ShellInput {
            shell: 3,
            saha: vec![dvector![1.0e9, 1.0e6]],
            rates: vec![ElementRates::zeros(2)],
            number_density: dvector![1.0e9],
        };
        let problem = ShellProblem::new(&index, &input);

        let err = problem.solve(&ConvergenceCriteria::default(), None).unwrap_err();
        assert_eq!(err.shell(), Some(3));
        assert!(matches!(
            err,
            Error::Shell { ref source, .. } if matches!(**source, Error::SingularJacobian { iteration: 1 })
        ));
    }

    #[test]
    fn test_state_vector_round_trip() {
        let solution = ShellSolution {
            shell: 0,
            ion_number_densities: dvector![1.0, 2.0],
            electron_density: 3.0,
            iterations: 1,
            residual_norm: 0.0,
        };
        assert_eq!(solution.state_vector(), dvector![1.0, 2.0, 3.0]);
    }
}
