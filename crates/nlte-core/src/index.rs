//! Rate-matrix index: the fixed ordering of unknowns and equations.
//!
//! Rows are grouped by element in ascending atomic number. Each element
//! contributes one row per ion `0..=Z`; a single electron-density row closes
//! the system. The same ordering addresses the rate matrix, the Jacobian, the
//! solution vector and the unknown vector of every shell.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{Error, Result};
use crate::species::{SpeciesKey, Treatment};

/// One ion row of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub species: SpeciesKey,
    pub treatment: Treatment,
}

/// Contiguous rows of one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementBlock {
    pub atomic_number: u32,
    /// First row of the block.
    pub offset: usize,
}

impl ElementBlock {
    /// Number of rows (ions `0..=Z`).
    pub fn len(&self) -> usize {
        self.atomic_number as usize + 1
    }

    /// Row of the given ion.
    pub fn row(&self, ion_number: u32) -> usize {
        self.offset + ion_number as usize
    }

    /// Row of the number-conservation equation (the top ion).
    pub fn last_row(&self) -> usize {
        self.offset + self.atomic_number as usize
    }

    pub fn rows(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len()
    }
}

/// Immutable mapping between species and matrix rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateMatrixIndex {
    entries: Vec<IndexEntry>,
    blocks: Vec<ElementBlock>,
    offsets: BTreeMap<SpeciesKey, usize>,
    excitation_species: Vec<SpeciesKey>,
}

impl RateMatrixIndex {
    /// Build the index from the plasma composition.
    ///
    /// # Arguments
    /// * `atomic_numbers` - Elements present in the plasma (any order)
    /// * `nlte_ionization_species` - Ions whose row is replaced by an explicit rate balance
    /// * `nlte_excitation_species` - Ions flagged for NLTE excitation (stored only)
    pub fn new(
        atomic_numbers: &[u32],
        nlte_ionization_species: &[SpeciesKey],
        nlte_excitation_species: &[SpeciesKey],
    ) -> Result<Self> {
        let mut elements = atomic_numbers.to_vec();
        elements.sort_unstable();
        for pair in elements.windows(2) {
            if pair[0] == pair[1] {
                return Err(Error::DuplicateKey(format!("Z={}", pair[0])));
            }
        }
        if let Some(&z) = elements.iter().find(|&&z| z == 0) {
            return Err(Error::InvalidAtomicNumber(z));
        }

        let nlte: BTreeSet<SpeciesKey> = nlte_ionization_species.iter().copied().collect();
        for species in nlte.iter().chain(nlte_excitation_species) {
            Self::check_species(*species, &elements)?;
        }
        if !nlte_excitation_species.is_empty() {
            log::warn!(
                "NLTE excitation requested for {} species; excitation does not enter the ionization rate matrix",
                nlte_excitation_species.len()
            );
        }

        let mut entries = Vec::new();
        let mut blocks = Vec::with_capacity(elements.len());
        let mut offsets = BTreeMap::new();
        for &atomic_number in &elements {
            blocks.push(ElementBlock {
                atomic_number,
                offset: entries.len(),
            });
            for ion_number in 0..=atomic_number {
                let species = SpeciesKey::new(atomic_number, ion_number);
                let treatment = if nlte.contains(&species) {
                    Treatment::NlteIon
                } else {
                    Treatment::LteIon
                };
                offsets.insert(species, entries.len());
                entries.push(IndexEntry { species, treatment });
            }
        }

        Ok(Self {
            entries,
            blocks,
            offsets,
            excitation_species: nlte_excitation_species.to_vec(),
        })
    }

    /// An index where every ion follows the Saha structure.
    pub fn lte(atomic_numbers: &[u32]) -> Result<Self> {
        Self::new(atomic_numbers, &[], &[])
    }

    fn check_species(species: SpeciesKey, elements: &[u32]) -> Result<()> {
        if elements.binary_search(&species.atomic_number).is_err() {
            return Err(Error::InvalidSpecies {
                species,
                reason: "element not present in the plasma".into(),
            });
        }
        if !species.is_valid() {
            return Err(Error::InvalidSpecies {
                species,
                reason: "ion number exceeds atomic number".into(),
            });
        }
        Ok(())
    }

    /// Total number of rows, including the electron-density row.
    pub fn len(&self) -> usize {
        self.entries.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of ion rows (everything but the electron-density row).
    pub fn num_ions(&self) -> usize {
        self.entries.len()
    }

    /// Row of the charge-conservation equation and column of the electron density.
    pub fn electron_row(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn blocks(&self) -> &[ElementBlock] {
        &self.blocks
    }

    pub fn atomic_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.blocks.iter().map(|block| block.atomic_number)
    }

    /// Row of a species.
    pub fn offset_of(&self, species: SpeciesKey) -> Option<usize> {
        self.offsets.get(&species).copied()
    }

    /// Treatment of an ion row, `None` for the electron-density row.
    pub fn treatment(&self, row: usize) -> Option<Treatment> {
        self.entries.get(row).map(|entry| entry.treatment)
    }

    /// Ions treated with an explicit rate balance.
    pub fn nlte_ions(&self) -> impl Iterator<Item = SpeciesKey> + '_ {
        self.entries
            .iter()
            .filter(|entry| entry.treatment == Treatment::NlteIon)
            .map(|entry| entry.species)
    }

    pub fn excitation_species(&self) -> &[SpeciesKey] {
        &self.excitation_species
    }

    /// Ion keys in row order.
    pub fn species(&self) -> Vec<SpeciesKey> {
        self.entries.iter().map(|entry| entry.species).collect()
    }
}

impl fmt::Display for RateMatrixIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, entry) in self.entries.iter().enumerate() {
            writeln!(
                f,
                "{:>5}  Z={:<3} ion={:<3} {}",
                row, entry.species.atomic_number, entry.species.ion_number, entry.treatment
            )?;
        }
        write!(f, "{:>5}  n_e", self.electron_row())
    }
}
