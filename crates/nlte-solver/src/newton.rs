//! Damped Newton-Raphson root finder.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::linear::solve_equilibrated;

/// Convergence criteria for Newton-Raphson iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergenceCriteria {
    /// Relative step tolerance, applied to every component.
    pub xtol: f64,
    /// Absolute step tolerance, for components that settle at zero.
    pub atol: f64,
    /// Maximum iterations before failure.
    pub max_iterations: usize,
    /// Maximum step halvings per iteration.
    pub max_backtracks: usize,
}

impl Default for ConvergenceCriteria {
    fn default() -> Self {
        Self {
            xtol: 1.49012e-8,
            atol: 1.0e-30,
            max_iterations: 100,
            max_backtracks: 8,
        }
    }
}

/// A square nonlinear system `F(x) = 0` with an analytic Jacobian.
pub trait NonlinearSystem {
    /// Number of unknowns (and equations).
    fn size(&self) -> usize;

    /// Residual `F(x)`.
    fn residual(&self, x: &DVector<f64>) -> DVector<f64>;

    /// Residual and Jacobian `dF/dx` at `x`.
    fn residual_and_jacobian(&self, x: &DVector<f64>) -> (DVector<f64>, DMatrix<f64>);
}

/// Result of Newton-Raphson iteration.
#[derive(Debug, Clone)]
pub struct NrResult {
    /// Solution vector.
    pub solution: DVector<f64>,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether convergence was achieved.
    pub converged: bool,
    /// `‖F‖₂` at the returned solution.
    pub residual_norm: f64,
}

/// Solve a nonlinear system using damped Newton-Raphson iteration.
///
/// Each iteration solves `J dx = -F` and tries the full step first. While the
/// trial residual norm exceeds the current one the step is halved, at most
/// `max_backtracks` times; the last trial is accepted regardless.
///
/// Converged once every component satisfies `|λ dx_i| ≤ xtol |x_i| + atol`,
/// so trace species are resolved to the same relative accuracy as the
/// dominant ones.
///
/// Non-convergence is not an error here: the returned result carries
/// `converged: false` and the caller decides what to do with it.
pub fn solve_newton_raphson(
    system: &dyn NonlinearSystem,
    criteria: &ConvergenceCriteria,
    initial_guess: &DVector<f64>,
) -> Result<NrResult> {
    let size = system.size();
    if initial_guess.len() != size {
        return Err(Error::DimensionMismatch {
            expected: size,
            actual: initial_guess.len(),
        });
    }

    let mut solution = initial_guess.clone();
    let (mut residual, mut jacobian) = system.residual_and_jacobian(&solution);
    let mut residual_norm = residual.norm();

    for iteration in 1..=criteria.max_iterations {
        if residual_norm == 0.0 {
            return Ok(NrResult {
                solution,
                iterations: iteration - 1,
                converged: true,
                residual_norm,
            });
        }

        let step = solve_equilibrated(&jacobian, &-&residual).map_err(|e| match e {
            Error::SingularMatrix => Error::SingularJacobian { iteration },
            other => other,
        })?;

        let mut lambda = 1.0;
        let mut trial = &solution + &step;
        let mut trial_norm = system.residual(&trial).norm();
        let mut backtracks = 0;
        while (trial_norm > residual_norm || trial_norm.is_nan())
            && backtracks < criteria.max_backtracks
        {
            lambda *= 0.5;
            trial = &solution + &step * lambda;
            trial_norm = system.residual(&trial).norm();
            backtracks += 1;
        }

        let step_norm = lambda * step.norm();
        let step_converged = step
            .iter()
            .zip(trial.iter())
            .all(|(dx, x)| (lambda * dx).abs() <= criteria.xtol * x.abs() + criteria.atol);
        solution = trial;
        (residual, jacobian) = system.residual_and_jacobian(&solution);
        residual_norm = residual.norm();

        log::trace!(
            "Newton iteration {}: |F| = {:e}, |dx| = {:e}, damping = {}",
            iteration,
            residual_norm,
            step_norm,
            lambda
        );

        if !residual_norm.is_finite() {
            return Ok(NrResult {
                solution,
                iterations: iteration,
                converged: false,
                residual_norm,
            });
        }
        if step_converged || residual_norm == 0.0 {
            return Ok(NrResult {
                solution,
                iterations: iteration,
                converged: true,
                residual_norm,
            });
        }
    }

    Ok(NrResult {
        solution,
        iterations: criteria.max_iterations,
        converged: false,
        residual_norm,
    })
}
