//! JSON problem and solution files.
//!
//! Every table is a list of records carrying the row key plus one value per
//! shell. Coefficient tables that a problem does not need may be omitted.

use std::path::Path;

use nlte_core::{
    ElementTable, IonTable, LevelKey, LevelRateCoefficients, LevelTable, SpeciesKey,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::plasma::{NlteSolution, PlasmaState};

/// Values of one bound level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelRecord {
    pub atomic_number: u32,
    pub ion_number: u32,
    pub level_number: u32,
    pub values: Vec<f64>,
}

/// Values of one ion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IonRecord {
    pub atomic_number: u32,
    pub ion_number: u32,
    pub values: Vec<f64>,
}

/// Values of one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    pub atomic_number: u32,
    pub values: Vec<f64>,
}

/// A rate-equation problem as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlasmaFile {
    pub num_shells: usize,
    /// Level Boltzmann factors; these define the level index.
    pub levels: Vec<LevelRecord>,
    #[serde(default)]
    pub gamma: Vec<LevelRecord>,
    #[serde(default)]
    pub alpha_sp: Vec<LevelRecord>,
    #[serde(default)]
    pub alpha_stim: Vec<LevelRecord>,
    #[serde(default)]
    pub coll_ion_coeff: Vec<LevelRecord>,
    #[serde(default)]
    pub coll_recomb_coeff: Vec<LevelRecord>,
    pub partition_function: Vec<IonRecord>,
    /// Saha factors keyed by the upper ion of each ratio.
    pub phi: Vec<IonRecord>,
    pub number_density: Vec<ElementRecord>,
    #[serde(default)]
    pub nlte_ionization_species: Vec<SpeciesKey>,
    #[serde(default)]
    pub nlte_excitation_species: Vec<SpeciesKey>,
}

impl PlasmaFile {
    /// Load a problem file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Build the in-memory tables, checking shell counts and duplicate keys.
    pub fn into_state(self) -> Result<PlasmaState> {
        let n = self.num_shells;
        Ok(PlasmaState {
            coefficients: LevelRateCoefficients {
                gamma: level_table(n, self.gamma)?,
                alpha_sp: level_table(n, self.alpha_sp)?,
                alpha_stim: level_table(n, self.alpha_stim)?,
                coll_ion_coeff: level_table(n, self.coll_ion_coeff)?,
                coll_recomb_coeff: level_table(n, self.coll_recomb_coeff)?,
            },
            partition_function: ion_table(n, self.partition_function)?,
            level_boltzmann_factor: level_table(n, self.levels)?,
            phi: ion_table(n, self.phi)?,
            number_density: ElementTable::from_records(
                n,
                self.number_density
                    .into_iter()
                    .map(|r| (r.atomic_number, r.values)),
            )?,
            nlte_ionization_species: self.nlte_ionization_species,
            nlte_excitation_species: self.nlte_excitation_species,
        })
    }
}

fn level_table(num_shells: usize, records: Vec<LevelRecord>) -> Result<LevelTable> {
    Ok(LevelTable::from_records(
        num_shells,
        records.into_iter().map(|r| {
            (
                LevelKey::new(r.atomic_number, r.ion_number, r.level_number),
                r.values,
            )
        }),
    )?)
}

fn ion_table(num_shells: usize, records: Vec<IonRecord>) -> Result<IonTable> {
    Ok(IonTable::from_records(
        num_shells,
        records
            .into_iter()
            .map(|r| (SpeciesKey::new(r.atomic_number, r.ion_number), r.values)),
    )?)
}

/// A solved run as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionFile {
    pub ion_number_densities: Vec<IonRecord>,
    pub electron_densities: Vec<f64>,
    pub iterations: Vec<usize>,
}

impl SolutionFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Back to tables, for warm-starting a later run.
    pub fn into_solution(self) -> Result<NlteSolution> {
        let n = self.electron_densities.len();
        Ok(NlteSolution {
            ion_number_densities: ion_table(n, self.ion_number_densities)?,
            electron_densities: self.electron_densities,
            iterations: self.iterations,
        })
    }
}

impl From<&NlteSolution> for SolutionFile {
    fn from(solution: &NlteSolution) -> Self {
        let table = &solution.ion_number_densities;
        let ion_number_densities = table
            .keys()
            .iter()
            .enumerate()
            .map(|(row, species)| IonRecord {
                atomic_number: species.atomic_number,
                ion_number: species.ion_number,
                values: table.values().row(row).iter().copied().collect(),
            })
            .collect();
        Self {
            ion_number_densities,
            electron_densities: solution.electron_densities.clone(),
            iterations: solution.iterations.clone(),
        }
    }
}
