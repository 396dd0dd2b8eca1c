//! Aggregation of per-level rate coefficients into per-ion totals.
//!
//! Ionization proceeds out of individual bound levels, so level coefficients
//! are weighted by the fraction of the ion sitting in that level before they
//! are summed. Recombination is counted by the destination ion and is summed
//! without weighting.

use nalgebra::DMatrix;

use crate::error::{Error, Result};
use crate::species::LevelKey;
use crate::table::{IonTable, LevelTable};

/// Raw per-level coefficients as produced by the radiation-field and
/// collision-rate collaborators.
#[derive(Debug, Clone)]
pub struct LevelRateCoefficients {
    /// Photoionization rate coefficient.
    pub gamma: LevelTable,
    /// Spontaneous recombination rate coefficient.
    pub alpha_sp: LevelTable,
    /// Stimulated recombination rate coefficient.
    pub alpha_stim: LevelTable,
    /// Collisional ionization coefficient (Seaton approximation).
    pub coll_ion_coeff: LevelTable,
    /// Collisional recombination coefficient.
    pub coll_recomb_coeff: LevelTable,
}

/// Rate coefficients summed per `(atomic_number, ion_number)`.
///
/// Only the photoionization total is a rate; the others still have to be
/// multiplied by the electron density (`n_e` for radiative recombination and
/// collisional ionization, `n_e²` for collisional recombination).
#[derive(Debug, Clone)]
pub struct IonCoefficients {
    pub photo_ion: IonTable,
    pub rad_recomb: IonTable,
    pub coll_ion: IonTable,
    pub coll_recomb: IonTable,
}

/// Fraction of each ion's population in each level: `b_level / U_ion`.
///
/// `level_boltzmann_factor` defines the level index; every level's parent ion
/// must be present in `partition_function`.
pub fn level_population_fraction(
    partition_function: &IonTable,
    level_boltzmann_factor: &LevelTable,
) -> Result<LevelTable> {
    check_shells(
        "partition function shells",
        level_boltzmann_factor.num_shells(),
        partition_function.num_shells(),
    )?;

    let num_shells = level_boltzmann_factor.num_shells();
    let boltzmann = level_boltzmann_factor.values();
    let partition = partition_function.values();
    let mut fractions = DMatrix::zeros(level_boltzmann_factor.num_rows(), num_shells);
    for (row, level) in level_boltzmann_factor.keys().iter().enumerate() {
        let ion_row = partition_function
            .row(&level.species())
            .ok_or(Error::SpeciesNotFound(level.species()))?;
        for shell in 0..num_shells {
            fractions[(row, shell)] = boltzmann[(row, shell)] / partition[(ion_row, shell)];
        }
    }
    LevelTable::new(level_boltzmann_factor.keys().to_vec(), fractions)
}

/// Multiply each coefficient by the population fraction of its level.
fn weight_by_fraction(coefficients: &LevelTable, fraction: &LevelTable) -> Result<LevelTable> {
    check_shells(
        "coefficient shells",
        fraction.num_shells(),
        coefficients.num_shells(),
    )?;

    let mut weighted = coefficients.clone();
    for (row, level) in coefficients.keys().iter().enumerate() {
        let fraction_row = fraction.row(level).ok_or(Error::LevelNotFound(*level))?;
        let scaled = weighted
            .values()
            .row(row)
            .component_mul(&fraction.values().row(fraction_row));
        weighted.values_mut().set_row(row, &scaled);
    }
    Ok(weighted)
}

fn sum_by_ion(coefficients: &LevelTable) -> Result<IonTable> {
    coefficients.group_sum(|level: &LevelKey| level.species())
}

/// Add two ion tables over the union of their keys.
fn add_tables(a: &IonTable, b: &IonTable) -> Result<IonTable> {
    check_shells("coefficient shells", a.num_shells(), b.num_shells())?;

    let mut keys: Vec<_> = a.keys().iter().chain(b.keys()).copied().collect();
    keys.sort_unstable();
    keys.dedup();

    let mut sum = IonTable::zeros(keys, a.num_shells())?;
    for table in [a, b] {
        for (row, key) in table.keys().iter().enumerate() {
            if let Some(target) = sum.row(key) {
                let mut target_row = sum.values_mut().row_mut(target);
                target_row += table.values().row(row);
            }
        }
    }
    Ok(sum)
}

fn check_shells(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::DimensionMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Group level coefficients into per-ion totals.
///
/// Photoionization and collisional ionization are weighted by the level
/// population fraction; spontaneous plus stimulated recombination and
/// collisional recombination are plain sums.
pub fn aggregate(
    coefficients: &LevelRateCoefficients,
    partition_function: &IonTable,
    level_boltzmann_factor: &LevelTable,
) -> Result<IonCoefficients> {
    let fraction = level_population_fraction(partition_function, level_boltzmann_factor)?;

    let photo_ion = sum_by_ion(&weight_by_fraction(&coefficients.gamma, &fraction)?)?;
    let coll_ion = sum_by_ion(&weight_by_fraction(&coefficients.coll_ion_coeff, &fraction)?)?;
    let rad_recomb = add_tables(
        &sum_by_ion(&coefficients.alpha_sp)?,
        &sum_by_ion(&coefficients.alpha_stim)?,
    )?;
    let coll_recomb = sum_by_ion(&coefficients.coll_recomb_coeff)?;

    let num_shells = fraction.num_shells();
    for (what, table) in [
        ("radiative recombination shells", &rad_recomb),
        ("collisional recombination shells", &coll_recomb),
    ] {
        check_shells(what, num_shells, table.num_shells())?;
    }

    log::debug!(
        "Aggregated coefficients for {} ions over {} shells",
        photo_ion.num_rows().max(rad_recomb.num_rows()),
        num_shells
    );

    Ok(IonCoefficients {
        photo_ion,
        rad_recomb,
        coll_ion,
        coll_recomb,
    })
}
