//! Saha-factor conditioning.

use crate::table::IonTable;

/// Relative size of the value substituted for zero Saha factors.
pub const SAHA_FLOOR_FRACTION: f64 = 1.0e-10;

/// Replace zero Saha factors by a tiny positive value.
///
/// A zero factor decouples two ionization stages and leaves the LTE block
/// singular whenever the upper stage is empty. Every zero entry becomes
/// `1e-10 ×` the smallest positive entry of the whole table.
pub fn floor_zero_saha_factors(phi: &IonTable) -> IonTable {
    let min_positive = phi
        .values()
        .iter()
        .copied()
        .filter(|&value| value > 0.0)
        .fold(f64::INFINITY, f64::min);

    let mut floored = phi.clone();
    if !min_positive.is_finite() {
        if !phi.is_empty() {
            log::warn!("Saha factor table has no positive entry; leaving zeros in place");
        }
        return floored;
    }

    let floor = SAHA_FLOOR_FRACTION * min_positive;
    let mut replaced = 0usize;
    for value in floored.values_mut().iter_mut() {
        if *value == 0.0 {
            *value = floor;
            replaced += 1;
        }
    }
    if replaced > 0 {
        log::debug!("Floored {} zero Saha factors to {:e}", replaced, floor);
    }
    floored
}
