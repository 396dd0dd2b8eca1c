//! Species and level keys.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An ionization stage of one element.
///
/// `ion_number` is the charge of the ion, so `0` is the neutral atom and
/// `atomic_number` is the bare nucleus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpeciesKey {
    pub atomic_number: u32,
    pub ion_number: u32,
}

impl SpeciesKey {
    pub const fn new(atomic_number: u32, ion_number: u32) -> Self {
        Self {
            atomic_number,
            ion_number,
        }
    }

    /// Check that the ion number is a valid charge state for the element.
    pub fn is_valid(self) -> bool {
        self.atomic_number > 0 && self.ion_number <= self.atomic_number
    }

    /// Whether this is the fully stripped nucleus.
    pub fn is_bare(self) -> bool {
        self.ion_number == self.atomic_number
    }
}

impl fmt::Display for SpeciesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.atomic_number, self.ion_number)
    }
}

/// A bound level of one ion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LevelKey {
    pub atomic_number: u32,
    pub ion_number: u32,
    pub level_number: u32,
}

impl LevelKey {
    pub const fn new(atomic_number: u32, ion_number: u32, level_number: u32) -> Self {
        Self {
            atomic_number,
            ion_number,
            level_number,
        }
    }

    /// The ion this level belongs to.
    pub fn species(self) -> SpeciesKey {
        SpeciesKey::new(self.atomic_number, self.ion_number)
    }
}

impl fmt::Display for LevelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.atomic_number, self.ion_number, self.level_number
        )
    }
}

/// How the ionization balance of a species is modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Treatment {
    /// Saha (LTE or nebular) ionization.
    LteIon,
    /// Explicit ionization/recombination rate balance.
    NlteIon,
}

impl fmt::Display for Treatment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Treatment::LteIon => write!(f, "lte_ion"),
            Treatment::NlteIon => write!(f, "nlte_ion"),
        }
    }
}
