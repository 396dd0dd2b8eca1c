//! Right-hand side and starting point of the per-shell rate equations.

use nalgebra::DVector;

use crate::index::RateMatrixIndex;
use crate::shell::ShellInput;

/// Solution vector `b` of `A x = b`.
///
/// Zero everywhere except the number-conservation row of each element, which
/// carries the element's total number density. The charge row targets zero.
pub fn solution_vector(index: &RateMatrixIndex, shell: &ShellInput) -> DVector<f64> {
    let mut b = DVector::zeros(index.len());
    for (block, &density) in index.blocks().iter().zip(shell.number_density.iter()) {
        b[block.last_row()] = density;
    }
    b
}

/// First guess with every element singly ionized.
///
/// The electron density starts at the total number density of the shell.
pub fn first_guess(index: &RateMatrixIndex, shell: &ShellInput) -> DVector<f64> {
    let mut x = DVector::zeros(index.len());
    for (block, &density) in index.blocks().iter().zip(shell.number_density.iter()) {
        x[block.row(1)] = density;
    }
    x[index.electron_row()] = shell.total_number_density();
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::ElementRates;
    use nalgebra::dvector;

    fn shell() -> ShellInput {
        ShellInput {
            shell: 0,
            saha: vec![dvector![1.0], dvector![1.0, 1.0]],
            rates: vec![ElementRates::zeros(1), ElementRates::zeros(2)],
            number_density: dvector![1.0e10, 2.0e9],
        }
    }

    #[test]
    fn test_solution_vector() {
        let index = RateMatrixIndex::lte(&[1, 2]).unwrap();
        assert_eq!(
            solution_vector(&index, &shell()),
            dvector![0.0, 1.0e10, 0.0, 0.0, 2.0e9, 0.0]
        );
    }

    #[test]
    fn test_first_guess_singly_ionized() {
        let index = RateMatrixIndex::lte(&[1, 2]).unwrap();
        assert_eq!(
            first_guess(&index, &shell()),
            dvector![0.0, 1.0e10, 0.0, 2.0e9, 0.0, 1.2e10]
        );
    }
}
