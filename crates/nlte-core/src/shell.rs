//! Per-shell inputs laid out along the rate-matrix index.
//!
//! All key lookups happen here, once per shell. Matrix and Jacobian assembly
//! afterwards work on plain vectors addressed by ion number.

use nalgebra::DVector;

use crate::coefficients::IonCoefficients;
use crate::error::{Error, Result};
use crate::index::RateMatrixIndex;
use crate::species::SpeciesKey;
use crate::table::{ElementTable, IonTable};

/// Rate coefficients of one element in one shell.
///
/// Each vector has one entry per ion `0..Z`. Ionization coefficients are
/// keyed by the ion being ionized, recombination coefficients by the ion
/// being recombined into.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementRates {
    pub photo_ion: DVector<f64>,
    pub rad_recomb: DVector<f64>,
    pub coll_ion: DVector<f64>,
    pub coll_recomb: DVector<f64>,
}

impl ElementRates {
    pub fn zeros(atomic_number: u32) -> Self {
        let n = atomic_number as usize;
        Self {
            photo_ion: DVector::zeros(n),
            rad_recomb: DVector::zeros(n),
            coll_ion: DVector::zeros(n),
            coll_recomb: DVector::zeros(n),
        }
    }

    /// Turn coefficients into rates at the given electron density.
    pub fn scaled(&self, electron_density: f64) -> Self {
        Self {
            photo_ion: self.photo_ion.clone(),
            rad_recomb: &self.rad_recomb * electron_density,
            coll_ion: &self.coll_ion * electron_density,
            coll_recomb: &self.coll_recomb * electron_density.powi(2),
        }
    }

    /// Total ionization out of each ion.
    pub fn ionization(&self) -> DVector<f64> {
        &self.photo_ion + &self.coll_ion
    }

    /// Total recombination into each ion.
    pub fn recombination(&self) -> DVector<f64> {
        &self.rad_recomb + &self.coll_recomb
    }
}

/// Everything one shell contributes to its rate equations.
#[derive(Debug, Clone)]
pub struct ShellInput {
    pub shell: usize,
    /// Saha factors per element; entry `i` relates ions `i` and `i + 1`.
    pub saha: Vec<DVector<f64>>,
    /// Unscaled rate coefficients per element.
    pub rates: Vec<ElementRates>,
    /// Total number density per element.
    pub number_density: DVector<f64>,
}

impl ShellInput {
    /// Extract one shell from the run-wide tables.
    ///
    /// `phi` is keyed by the upper ion of each ratio, `phi(Z, i) = n_i n_e / n_(i-1)`
    /// for `i = 1..=Z`; all of them must be present.
    pub fn new(
        index: &RateMatrixIndex,
        phi: &IonTable,
        number_density: &ElementTable,
        coefficients: &IonCoefficients,
        shell: usize,
    ) -> Result<Self> {
        phi.check_shell(shell)?;
        number_density.check_shell(shell)?;

        let mut saha = Vec::with_capacity(index.blocks().len());
        let mut rates = Vec::with_capacity(index.blocks().len());
        let mut densities = Vec::with_capacity(index.blocks().len());

        for block in index.blocks() {
            let z = block.atomic_number;

            let mut phi_block = DVector::zeros(z as usize);
            for ion_number in 1..=z {
                let species = SpeciesKey::new(z, ion_number);
                phi_block[ion_number as usize - 1] = phi
                    .get(&species, shell)
                    .ok_or(Error::SpeciesNotFound(species))?;
            }
            saha.push(phi_block);

            rates.push(ElementRates {
                photo_ion: element_coefficients(&coefficients.photo_ion, z, shell)?,
                rad_recomb: element_coefficients(&coefficients.rad_recomb, z, shell)?,
                coll_ion: element_coefficients(&coefficients.coll_ion, z, shell)?,
                coll_recomb: element_coefficients(&coefficients.coll_recomb, z, shell)?,
            });

            densities.push(
                number_density
                    .get(&z, shell)
                    .ok_or(Error::ElementNotFound(z))?,
            );
        }

        Ok(Self {
            shell,
            saha,
            rates,
            number_density: DVector::from_vec(densities),
        })
    }

    /// Sum of all element number densities.
    pub fn total_number_density(&self) -> f64 {
        self.number_density.sum()
    }
}

/// Coefficients of one element as a dense vector over ions `0..Z`.
///
/// Ions absent from the table contribute zero.
fn element_coefficients(table: &IonTable, atomic_number: u32, shell: usize) -> Result<DVector<f64>> {
    table.check_shell(shell)?;
    let mut values = DVector::zeros(atomic_number as usize);
    for (species, row) in table.element_rows(atomic_number) {
        if species.ion_number >= atomic_number {
            return Err(Error::InvalidSpecies {
                species,
                reason: "bare nucleus has no ionization or recombination target".into(),
            });
        }
        values[species.ion_number as usize] = table.values()[(row, shell)];
    }
    Ok(values)
}
