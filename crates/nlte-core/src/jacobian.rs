//! Analytic Jacobian of the rate-equation residual `F(x) = A(n_e) x - b`.
//!
//! For every unknown other than the electron density `dF/dx_j = A[:, j]`. The
//! electron-density column additionally picks up `(dA/dn_e) x`:
//! * Saha rows `-phi_k n_k + n_e n_(k+1)` give `n_(k+1)`;
//! * NLTE rows give the collisional-ionization, radiative-recombination and
//!   `2 n_e` collisional-recombination rows dotted with the element's ions;
//! * number-conservation rows do not depend on `n_e`.

use nalgebra::{DMatrix, DVector};

use crate::index::RateMatrixIndex;
use crate::rate_matrix::{ion_matrix_row, recomb_matrix_row};
use crate::shell::{ElementRates, ShellInput};
use crate::species::Treatment;

/// `(dA/dn_e) x` restricted to the rate rows `0..Z` of one element.
///
/// # Arguments
/// * `rates` - Unscaled coefficients of the element
/// * `ion_number_densities` - Current densities of ions `0..=Z`
/// * `electron_density` - Current electron density
pub fn deriv_matrix_block(
    rates: &ElementRates,
    ion_number_densities: &DVector<f64>,
    electron_density: f64,
) -> DVector<f64> {
    let z = rates.photo_ion.len();
    DVector::from_fn(z, |ion, _| {
        let deriv_row = recomb_matrix_row(&rates.rad_recomb, ion)
            + ion_matrix_row(&rates.coll_ion, ion)
            + recomb_matrix_row(&rates.coll_recomb, ion) * (2.0 * electron_density);
        deriv_row.dot(ion_number_densities)
    })
}

/// Builds Jacobians for one rate-matrix index.
#[derive(Debug, Clone, Copy)]
pub struct JacobianBuilder<'a> {
    index: &'a RateMatrixIndex,
}

impl<'a> JacobianBuilder<'a> {
    pub fn new(index: &'a RateMatrixIndex) -> Self {
        Self { index }
    }

    /// Jacobian at `populations` (ion densities followed by `n_e`).
    ///
    /// `rate_matrix` must have been built at `populations[n_e]`.
    pub fn build(
        &self,
        populations: &DVector<f64>,
        rate_matrix: &DMatrix<f64>,
        shell: &ShellInput,
    ) -> DMatrix<f64> {
        let ne_col = self.index.electron_row();
        let electron_density = populations[ne_col];
        let mut jacobian = rate_matrix.clone();

        for (block_idx, block) in self.index.blocks().iter().enumerate() {
            let block_populations = populations.rows(block.offset, block.len()).into_owned();
            let mut nlte_derivs = None;

            for row in block.offset..block.last_row() {
                jacobian[(row, ne_col)] = match self.index.treatment(row) {
                    Some(Treatment::NlteIon) => {
                        let derivs = nlte_derivs.get_or_insert_with(|| {
                            deriv_matrix_block(
                                &shell.rates[block_idx],
                                &block_populations,
                                electron_density,
                            )
                        });
                        derivs[row - block.offset]
                    }
                    _ => populations[row + 1],
                };
            }
            jacobian[(block.last_row(), ne_col)] = 0.0;
        }
        jacobian
    }
}
