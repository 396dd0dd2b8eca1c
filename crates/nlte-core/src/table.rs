//! Row-keyed per-shell tables.
//!
//! Every plasma input arrives as a dense `rows × shells` matrix whose rows are
//! labelled by a species, level or element key. The key-to-row lookup is
//! built once when the table is created and never changes afterwards.

use std::collections::BTreeMap;
use std::fmt::Display;

use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};
use crate::species::{LevelKey, SpeciesKey};

/// Dense table with one row per key and one column per shell.
#[derive(Debug, Clone, PartialEq)]
pub struct Table<K: Ord + Copy> {
    keys: Vec<K>,
    rows: BTreeMap<K, usize>,
    values: DMatrix<f64>,
}

/// Values per bound level.
pub type LevelTable = Table<LevelKey>;
/// Values per ion.
pub type IonTable = Table<SpeciesKey>;
/// Values per element, keyed by atomic number.
pub type ElementTable = Table<u32>;

impl<K: Ord + Copy + Display> Table<K> {
    /// Create a table from row keys and a `keys.len() × num_shells` matrix.
    pub fn new(keys: Vec<K>, values: DMatrix<f64>) -> Result<Self> {
        if keys.len() != values.nrows() {
            return Err(Error::DimensionMismatch {
                what: "table rows",
                expected: keys.len(),
                actual: values.nrows(),
            });
        }
        let mut rows = BTreeMap::new();
        for (row, key) in keys.iter().enumerate() {
            if rows.insert(*key, row).is_some() {
                return Err(Error::DuplicateKey(key.to_string()));
            }
        }
        Ok(Self { keys, rows, values })
    }

    /// Create a table from `(key, per-shell values)` records.
    pub fn from_records<I>(num_shells: usize, records: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Vec<f64>)>,
    {
        let mut keys = Vec::new();
        let mut data = Vec::new();
        for (key, values) in records {
            if values.len() != num_shells {
                return Err(Error::DimensionMismatch {
                    what: "shell values",
                    expected: num_shells,
                    actual: values.len(),
                });
            }
            keys.push(key);
            data.extend(values);
        }
        let values = DMatrix::from_row_slice(keys.len(), num_shells, &data);
        Self::new(keys, values)
    }

    /// A table of zeros over the given keys.
    pub fn zeros(keys: Vec<K>, num_shells: usize) -> Result<Self> {
        let n = keys.len();
        Self::new(keys, DMatrix::zeros(n, num_shells))
    }

    /// Row keys in storage order.
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    /// Backing `rows × shells` matrix.
    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut DMatrix<f64> {
        &mut self.values
    }

    pub fn num_rows(&self) -> usize {
        self.keys.len()
    }

    pub fn num_shells(&self) -> usize {
        self.values.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Row index of a key.
    pub fn row(&self, key: &K) -> Option<usize> {
        self.rows.get(key).copied()
    }

    /// Value for a key in one shell, `None` if the key is absent.
    pub fn get(&self, key: &K, shell: usize) -> Option<f64> {
        self.row(key)
            .and_then(|row| self.values.get((row, shell)).copied())
    }

    /// Fails with [`Error::ShellOutOfRange`] past the last shell.
    pub fn check_shell(&self, shell: usize) -> Result<()> {
        if shell >= self.num_shells() {
            return Err(Error::ShellOutOfRange {
                shell,
                num_shells: self.num_shells(),
            });
        }
        Ok(())
    }

    /// Collapse rows onto a coarser key, summing rows that map to the same key.
    ///
    /// Output rows appear in ascending order of the grouped key.
    pub fn group_sum<G, F>(&self, group: F) -> Result<Table<G>>
    where
        G: Ord + Copy + Display,
        F: Fn(&K) -> G,
    {
        let mut sums: BTreeMap<G, DVector<f64>> = BTreeMap::new();
        for (row, key) in self.keys.iter().enumerate() {
            let values: DVector<f64> = self.values.row(row).transpose();
            match sums.get_mut(&group(key)) {
                Some(acc) => *acc += &values,
                None => {
                    sums.insert(group(key), values);
                }
            }
        }
        Table::from_records(
            self.num_shells(),
            sums.into_iter()
                .map(|(key, values)| (key, values.iter().copied().collect())),
        )
    }
}

impl IonTable {
    /// Rows belonging to one element, in ion order.
    pub fn element_rows(&self, atomic_number: u32) -> impl Iterator<Item = (SpeciesKey, usize)> + '_ {
        self.rows
            .range(SpeciesKey::new(atomic_number, 0)..=SpeciesKey::new(atomic_number, u32::MAX))
            .map(|(key, row)| (*key, *row))
    }
}
