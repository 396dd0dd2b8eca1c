//! Dense linear solves for the Newton step.

use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};

/// Solve `A x = b` by LU with partial pivoting, after scaling every row of
/// `A` and `b` to unit max-norm.
///
/// Rate equations mix Saha rows of order `n_e n` with conservation rows of
/// order `n`; pivoting on the unscaled matrix would always favour the former.
/// A row that is identically zero makes the system singular.
pub fn solve_equilibrated(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
    check_dimensions(a, b)?;

    let mut scaled = a.clone();
    let mut rhs = b.clone();
    for i in 0..scaled.nrows() {
        let scale = scaled.row(i).amax();
        if scale == 0.0 || !scale.is_finite() {
            return Err(Error::SingularMatrix);
        }
        let mut row = scaled.row_mut(i);
        row /= scale;
        rhs[i] /= scale;
    }

    scaled.lu().solve(&rhs).ok_or(Error::SingularMatrix)
}

fn check_dimensions(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<()> {
    if a.nrows() != a.ncols() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: a.ncols(),
        });
    }
    if a.nrows() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: b.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{dmatrix, dvector};

    #[test]
    fn test_dependent_rows_are_singular() {
        let a = dmatrix![1.0, 2.0; 2.0, 4.0];
        let b = dvector![1.0, 2.0];

        assert!(matches!(
            solve_equilibrated(&a, &b),
            Err(Error::SingularMatrix)
        ));
    }

    #[test]
    fn test_non_square_and_rhs_mismatch() {
        let a = dmatrix![1.0, 2.0; 3.0, 4.0];
        let b = dvector![1.0, 2.0, 3.0];
        assert!(matches!(
            solve_equilibrated(&a, &b),
            Err(Error::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));

        let a = DMatrix::from_element(2, 3, 1.0);
        let b = dvector![1.0, 2.0];
        assert!(matches!(
            solve_equilibrated(&a, &b),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_equilibrated_badly_scaled_rows() {
        // Saha row next to a conservation row
        let a = dmatrix![
            -1.0e8, 1.0e10, 0.0;
            1.0, 1.0, 0.0;
            0.0, 1.0, -1.0
        ];
        let x_true = dvector![9.0e9, 1.0e9, 1.0e9];
        let b = &a * &x_true;

        let x = solve_equilibrated(&a, &b).unwrap();
        for i in 0..3 {
            assert!((x[i] - x_true[i]).abs() <= 1.0e-9 * x_true[i]);
        }
    }

    #[test]
    fn test_equilibrated_zero_row_is_singular() {
        let a = dmatrix![1.0, 2.0; 0.0, 0.0];
        let b = dvector![1.0, 0.0];

        assert!(matches!(
            solve_equilibrated(&a, &b),
            Err(Error::SingularMatrix)
        ));
    }
}
