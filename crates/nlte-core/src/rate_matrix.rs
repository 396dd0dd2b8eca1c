//! Rate-matrix assembly.
//!
//! The rate matrix `A` of one shell is block diagonal with one block per
//! element plus a final charge-conservation row:
//!
//! ```text
//!        [ B_H    0     0 ]   n_H    (0, N_H)
//!    A = [  0    B_He   0 ]   n_He   (0, 0, N_He)
//!        [ 0 1   0 1 2  -1]   n_e    0
//! ```
//!
//! Row `k < Z` of an element block is the Saha balance between ions `k` and
//! `k + 1` (`-phi_k n_k + n_e n_(k+1) = 0`) unless the ion is treated in NLTE,
//! in which case the row is the explicit ionization/recombination balance.
//! The last row of every block sums the element's ions (number conservation).

use nalgebra::{DMatrix, DVector};

use crate::index::RateMatrixIndex;
use crate::shell::{ElementRates, ShellInput};
use crate::species::Treatment;

/// Saha block of one element.
///
/// # Arguments
/// * `phi` - Saha factors of the element, `Z` entries
/// * `electron_density` - Current electron-density guess
pub fn lte_rate_matrix_block(phi: &DVector<f64>, electron_density: f64) -> DMatrix<f64> {
    let n = phi.len() + 1;
    let mut block = DMatrix::zeros(n, n);
    for k in 0..phi.len() {
        block[(k, k)] = -phi[k];
        block[(k, k + 1)] = electron_density;
    }
    block.row_mut(n - 1).fill(1.0);
    block
}

/// Row `ion_number` of the ionization matrix.
///
/// The matrix has `-c_i` on the diagonal (ionization out of ion `i`) and
/// `+c_(i-1)` on the sub-diagonal (ionization into ion `i`).
pub fn ion_matrix_row(ion_coefficients: &DVector<f64>, ion_number: usize) -> DVector<f64> {
    let z = ion_coefficients.len();
    let mut row = DVector::zeros(z + 1);
    if ion_number < z {
        row[ion_number] -= ion_coefficients[ion_number];
    }
    if (1..=z).contains(&ion_number) {
        row[ion_number - 1] += ion_coefficients[ion_number - 1];
    }
    row
}

/// Row `ion_number` of the recombination matrix.
///
/// The matrix has `-c_(i-1)` on the diagonal (recombination out of ion `i`)
/// and `+c_i` on the super-diagonal (recombination from ion `i + 1`).
pub fn recomb_matrix_row(recomb_coefficients: &DVector<f64>, ion_number: usize) -> DVector<f64> {
    let z = recomb_coefficients.len();
    let mut row = DVector::zeros(z + 1);
    if (1..=z).contains(&ion_number) {
        row[ion_number] -= recomb_coefficients[ion_number - 1];
    }
    if ion_number < z {
        row[ion_number + 1] += recomb_coefficients[ion_number];
    }
    row
}

/// Replace row `ion_number` of an element block with the NLTE rate balance.
///
/// `rates` must already be scaled to the current electron density. The bare
/// nucleus keeps its number-conservation row.
pub fn set_nlte_ion_rate(
    block: &mut DMatrix<f64>,
    atomic_number: u32,
    ion_number: u32,
    rates: &ElementRates,
) {
    if atomic_number == ion_number {
        return;
    }
    let ion = ion_number as usize;
    let row = ion_matrix_row(&rates.ionization(), ion) + recomb_matrix_row(&rates.recombination(), ion);
    block.set_row(ion, &row.transpose());
}

/// Charge-conservation row: ion charges for every element, `-1` for `n_e`.
pub fn charge_conservation_row(index: &RateMatrixIndex) -> DVector<f64> {
    let mut row = DVector::zeros(index.len());
    for entry_row in 0..index.num_ions() {
        row[entry_row] = index.entries()[entry_row].species.ion_number as f64;
    }
    row[index.electron_row()] = -1.0;
    row
}

/// Assembles rate matrices for one rate-matrix index.
#[derive(Debug, Clone)]
pub struct RateMatrixBuilder<'a> {
    index: &'a RateMatrixIndex,
    charge_row: DVector<f64>,
}

impl<'a> RateMatrixBuilder<'a> {
    pub fn new(index: &'a RateMatrixIndex) -> Self {
        Self {
            index,
            charge_row: charge_conservation_row(index),
        }
    }

    pub fn index(&self) -> &'a RateMatrixIndex {
        self.index
    }

    /// Block of one element, with NLTE rows applied.
    pub fn element_block(
        &self,
        block_idx: usize,
        shell: &ShellInput,
        electron_density: f64,
    ) -> DMatrix<f64> {
        let block = &self.index.blocks()[block_idx];
        let mut matrix = lte_rate_matrix_block(&shell.saha[block_idx], electron_density);

        let mut scaled = None;
        for row in block.rows() {
            if self.index.treatment(row) == Some(Treatment::NlteIon) {
                let rates = scaled.get_or_insert_with(|| shell.rates[block_idx].scaled(electron_density));
                let ion_number = (row - block.offset) as u32;
                set_nlte_ion_rate(&mut matrix, block.atomic_number, ion_number, rates);
            }
        }
        matrix
    }

    /// Full rate matrix of a shell at the given electron density.
    pub fn build(&self, shell: &ShellInput, electron_density: f64) -> DMatrix<f64> {
        let n = self.index.len();
        let mut matrix = DMatrix::zeros(n, n);
        for (block_idx, block) in self.index.blocks().iter().enumerate() {
            let element = self.element_block(block_idx, shell, electron_density);
            matrix
                .view_mut((block.offset, block.offset), (block.len(), block.len()))
                .copy_from(&element);
        }
        matrix.set_row(self.index.electron_row(), &self.charge_row.transpose());
        matrix
    }
}
