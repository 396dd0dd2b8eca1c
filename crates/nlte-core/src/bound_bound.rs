//! Bound-bound (excitation/de-excitation) rate matrices for one ion.
//!
//! Matrices are `levels × levels` with the source level in the column and the
//! destination level in the row. Diagonals hold minus the column sum so every
//! column conserves population. These are building blocks for NLTE excitation
//! and are not yet added to the ionization rate matrix.

use std::collections::BTreeSet;

use nalgebra::DMatrix;

use crate::error::{Error, Result};
use crate::species::SpeciesKey;

/// One line of the excitation species.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExcitationLine {
    /// Row of the line in the run-wide line tables (mean intensities, Sobolev β).
    pub line_index: usize,
    pub level_number_lower: usize,
    pub level_number_upper: usize,
    /// Einstein coefficient for spontaneous emission.
    pub a_ul: f64,
    /// Einstein coefficient for stimulated emission.
    pub b_ul: f64,
    /// Einstein coefficient for absorption.
    pub b_lu: f64,
}

/// Collisional coupling of two levels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionalTransition {
    pub level_number_lower: usize,
    pub level_number_upper: usize,
    /// Excitation coefficient (lower to upper).
    pub excitation: f64,
    /// De-excitation coefficient (upper to lower).
    pub deexcitation: f64,
}

/// Radiative bound-bound rates of one shell, before Sobolev attenuation.
#[derive(Debug, Clone, PartialEq)]
pub struct RadiativeRates {
    /// Downward rates, `A_ul + B_ul J` at `[lower, upper]`.
    pub r_ul: DMatrix<f64>,
    /// Upward rates, `B_lu J` at `[upper, lower]`.
    pub r_lu: DMatrix<f64>,
}

/// Assembles bound-bound rates for the single ion treated in NLTE excitation.
#[derive(Debug, Clone)]
pub struct BoundBoundRateAssembler {
    species: SpeciesKey,
    number_of_levels: usize,
    lines: Vec<ExcitationLine>,
}

impl BoundBoundRateAssembler {
    /// # Errors
    /// Only one excitation species can be assembled at a time; any other
    /// count is rejected. Levels must lie in `0..number_of_levels` and each
    /// level pair may carry at most one line.
    pub fn new(
        excitation_species: &[SpeciesKey],
        number_of_levels: usize,
        lines: Vec<ExcitationLine>,
    ) -> Result<Self> {
        let species = match excitation_species {
            [species] => *species,
            other => return Err(Error::MultipleExcitationSpecies(other.len())),
        };

        let mut pairs = BTreeSet::new();
        for line in &lines {
            check_level(line.level_number_lower, number_of_levels)?;
            check_level(line.level_number_upper, number_of_levels)?;
            if !pairs.insert((line.level_number_lower, line.level_number_upper)) {
                return Err(Error::DuplicateKey(format!(
                    "line {} -> {} of {}",
                    line.level_number_lower, line.level_number_upper, species
                )));
            }
        }

        Ok(Self {
            species,
            number_of_levels,
            lines,
        })
    }

    pub fn species(&self) -> SpeciesKey {
        self.species
    }

    pub fn number_of_levels(&self) -> usize {
        self.number_of_levels
    }

    pub fn lines(&self) -> &[ExcitationLine] {
        &self.lines
    }

    /// Radiative rates from mean intensities in the blue wings of the lines.
    ///
    /// `j_blues` is `lines × shells`, addressed by [`ExcitationLine::line_index`].
    pub fn radiative_rates(&self, j_blues: &DMatrix<f64>, shell: usize) -> Result<RadiativeRates> {
        self.check_line_table(j_blues, shell)?;

        let n = self.number_of_levels;
        let mut r_ul = DMatrix::zeros(n, n);
        let mut r_lu = DMatrix::zeros(n, n);
        for line in &self.lines {
            let j_blue = j_blues[(line.line_index, shell)];
            r_ul[(line.level_number_lower, line.level_number_upper)] = line.a_ul + line.b_ul * j_blue;
            r_lu[(line.level_number_upper, line.level_number_lower)] = line.b_lu * j_blue;
        }
        Ok(RadiativeRates { r_ul, r_lu })
    }

    /// Sobolev-attenuated radiative rate matrix of one shell.
    ///
    /// `beta_sobolev` is `lines × shells`, addressed like `j_blues`.
    pub fn bound_bound_rate_matrix(
        &self,
        rates: &RadiativeRates,
        beta_sobolev: &DMatrix<f64>,
        shell: usize,
    ) -> Result<DMatrix<f64>> {
        self.check_line_table(beta_sobolev, shell)?;
        let n = self.number_of_levels;
        for (what, matrix) in [("r_ul", &rates.r_ul), ("r_lu", &rates.r_lu)] {
            if matrix.shape() != (n, n) {
                return Err(Error::DimensionMismatch {
                    what,
                    expected: n,
                    actual: matrix.nrows(),
                });
            }
        }

        let mut r_ul = rates.r_ul.clone();
        let mut r_lu = rates.r_lu.clone();
        for line in &self.lines {
            let beta = beta_sobolev[(line.line_index, shell)];
            r_ul[(line.level_number_lower, line.level_number_upper)] *= beta;
            r_lu[(line.level_number_upper, line.level_number_lower)] *= beta;
        }

        let mut matrix = r_ul + r_lu;
        close_columns(&mut matrix);
        Ok(matrix)
    }

    /// Collisional coefficient matrix of this ion.
    pub fn collisional_rate_matrix(&self, transitions: &[CollisionalTransition]) -> Result<DMatrix<f64>> {
        collisional_rate_matrix(transitions, self.number_of_levels)
    }

    fn check_line_table(&self, table: &DMatrix<f64>, shell: usize) -> Result<()> {
        if shell >= table.ncols() {
            return Err(Error::ShellOutOfRange {
                shell,
                num_shells: table.ncols(),
            });
        }
        if let Some(line) = self.lines.iter().find(|line| line.line_index >= table.nrows()) {
            return Err(Error::DimensionMismatch {
                what: "line table rows",
                expected: line.line_index + 1,
                actual: table.nrows(),
            });
        }
        Ok(())
    }
}

/// Collisional excitation/de-excitation coefficient matrix.
///
/// Excitation appears at `[upper, lower]` and de-excitation at `[lower, upper]`;
/// each level's diagonal loses everything that leaves it. Multiply by the
/// electron density before adding it to a rate matrix.
pub fn collisional_rate_matrix(
    transitions: &[CollisionalTransition],
    number_of_levels: usize,
) -> Result<DMatrix<f64>> {
    let mut matrix = DMatrix::zeros(number_of_levels, number_of_levels);
    for t in transitions {
        check_level(t.level_number_lower, number_of_levels)?;
        check_level(t.level_number_upper, number_of_levels)?;
        let (lower, upper) = (t.level_number_lower, t.level_number_upper);

        matrix[(upper, lower)] += t.excitation;
        matrix[(lower, lower)] -= t.excitation;
        matrix[(lower, upper)] += t.deexcitation;
        matrix[(upper, upper)] -= t.deexcitation;
    }
    Ok(matrix)
}

/// Set every diagonal entry to minus the off-diagonal sum of its column.
fn close_columns(matrix: &mut DMatrix<f64>) {
    for i in 0..matrix.ncols() {
        matrix[(i, i)] = 0.0;
        matrix[(i, i)] = -matrix.column(i).sum();
    }
}

fn check_level(level: usize, number_of_levels: usize) -> Result<()> {
    if level >= number_of_levels {
        return Err(Error::LevelOutOfRange {
            level,
            number_of_levels,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::dmatrix;

    fn two_level_assembler() -> BoundBoundRateAssembler {
        BoundBoundRateAssembler::new(
            &[SpeciesKey::new(1, 0)],
            2,
            vec![ExcitationLine {
                line_index: 1,
                level_number_lower: 0,
                level_number_upper: 1,
                a_ul: 1.0e8,
                b_ul: 2.0,
                b_lu: 6.0,
            }],
        )
        .unwrap()
    }

    #[test]
    fn test_single_species_precondition() {
        let none = BoundBoundRateAssembler::new(&[], 2, vec![]);
        assert!(matches!(none, Err(Error::MultipleExcitationSpecies(0))));

        let two = BoundBoundRateAssembler::new(
            &[SpeciesKey::new(1, 0), SpeciesKey::new(2, 0)],
            2,
            vec![],
        );
        assert!(matches!(two, Err(Error::MultipleExcitationSpecies(2))));
    }

    #[test]
    fn test_level_out_of_range() {
        let result = BoundBoundRateAssembler::new(
            &[SpeciesKey::new(1, 0)],
            2,
            vec![ExcitationLine {
                line_index: 0,
                level_number_lower: 0,
                level_number_upper: 2,
                a_ul: 1.0,
                b_ul: 1.0,
                b_lu: 1.0,
            }],
        );
        assert!(matches!(result, Err(Error::LevelOutOfRange { level: 2, .. })));
    }

    #[test]
    fn test_radiative_rates() {
        let assembler = two_level_assembler();
        let j_blues = dmatrix![0.0, 0.0; 1.0e-3, 2.0e-3];

        let rates = assembler.radiative_rates(&j_blues, 1).unwrap();
        assert_relative_eq!(rates.r_ul[(0, 1)], 1.0e8 + 4.0e-3);
        assert_relative_eq!(rates.r_lu[(1, 0)], 1.2e-2);
        assert_eq!(rates.r_ul[(1, 0)], 0.0);
    }

    #[test]
    fn test_bound_bound_matrix_columns_conserve() {
        let assembler = two_level_assembler();
        let j_blues = dmatrix![0.0; 1.0e-3];
        let beta = dmatrix![1.0; 0.5];

        let rates = assembler.radiative_rates(&j_blues, 0).unwrap();
        let matrix = assembler.bound_bound_rate_matrix(&rates, &beta, 0).unwrap();

        assert_relative_eq!(matrix[(0, 1)], 0.5 * (1.0e8 + 2.0e-3));
        assert_relative_eq!(matrix[(1, 0)], 3.0e-3);
        assert_relative_eq!(matrix[(0, 0)], -3.0e-3);
        assert_relative_eq!(matrix[(1, 1)], -0.5 * (1.0e8 + 2.0e-3));
        for col in 0..2 {
            assert_relative_eq!(matrix.column(col).sum(), 0.0, epsilon = 1.0e-6);
        }
    }

    #[test]
    fn test_line_table_too_short() {
        let assembler = two_level_assembler();
        let j_blues = dmatrix![1.0];
        assert!(matches!(
            assembler.radiative_rates(&j_blues, 0),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_collisional_matrix() {
        let transitions = [
            CollisionalTransition {
                level_number_lower: 0,
                level_number_upper: 1,
                excitation: 2.0,
                deexcitation: 5.0,
            },
            CollisionalTransition {
                level_number_lower: 0,
                level_number_upper: 2,
                excitation: 1.0,
                deexcitation: 3.0,
            },
        ];
        let matrix = collisional_rate_matrix(&transitions, 3).unwrap();
        assert_eq!(
            matrix,
            dmatrix![
                -3.0, 5.0, 3.0;
                2.0, -5.0, 0.0;
                1.0, 0.0, -3.0
            ]
        );
    }
}
