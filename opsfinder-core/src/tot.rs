//! Per-strip normalization of the energy proxy.
//!
//! Time over threshold is mapped to deposited energy with an exponential
//! calibration, scaled by a per-slot factor and mapped back.

use crate::hit::Hit;
use std::collections::HashMap;

const TOT_OFFSET: f64 = 1.1483e5;
const TOT_SLOPE: f64 = 23144.0;

/// Deposited energy (keV) for a time over threshold (ns).
#[must_use]
pub fn deposited_energy(tot_ns: f64) -> f64 {
    ((tot_ns * 1000.0 + TOT_OFFSET) / TOT_SLOPE).exp()
}

/// Time over threshold (ns) for a deposited energy (keV).
#[must_use]
pub fn tot_from_energy(energy_kev: f64) -> f64 {
    (-TOT_OFFSET + TOT_SLOPE * energy_kev.ln()) / 1000.0
}

/// Normalization factors keyed by slot id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TotNormalization {
    factors: HashMap<u16, f64>,
}

impl TotNormalization {
    /// Creates an empty table; every hit passes unchanged.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the factor of one slot.
    pub fn insert(&mut self, slot: u16, factor: f64) {
        self.factors.insert(slot, factor);
    }

    /// Returns the factor of a slot.
    #[must_use]
    pub fn factor(&self, slot: u16) -> Option<f64> {
        self.factors.get(&slot).copied()
    }

    /// Number of slots with a factor.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    /// Returns true if no factor is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// Normalized time over threshold of a hit.
    ///
    /// Returns the original value when the slot has no usable factor.
    #[must_use]
    pub fn normalized_tot(&self, hit: &Hit) -> f64 {
        match self.factor(hit.element.slot) {
            Some(factor) if factor > 0.0 => tot_from_energy(deposited_energy(hit.tot) * factor),
            _ => hit.tot,
        }
    }

    /// Rewrites the energy proxy of every hit; returns how many were left
    /// unchanged for lack of a factor.
    pub fn apply(&self, hits: &mut [Hit]) -> usize {
        let mut missing = 0;
        for hit in hits.iter_mut() {
            match self.factor(hit.element.slot) {
                Some(factor) if factor > 0.0 => {
                    hit.tot = tot_from_energy(deposited_energy(hit.tot) * factor);
                }
                _ => missing += 1,
            }
        }
        if missing > 0 {
            log::debug!("{missing} hits without TOT normalization factor");
        }
        missing
    }
}

impl FromIterator<(u16, f64)> for TotNormalization {
    fn from_iter<I: IntoIterator<Item = (u16, f64)>>(iter: I) -> Self {
        Self {
            factors: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hit::DetectorElement;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn hit(slot: u16, tot: f64) -> Hit {
        Hit::new(0.0, tot, Vector3::zeros(), DetectorElement::new(1, slot, 0.0))
    }

    #[test]
    fn test_energy_conversion_inverts() {
        for tot in [5.0, 15.0, 22.5, 60.0] {
            assert_relative_eq!(tot_from_energy(deposited_energy(tot)), tot, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_unit_factor_keeps_tot() {
        let table: TotNormalization = [(3, 1.0)].into_iter().collect();
        assert_relative_eq!(table.normalized_tot(&hit(3, 20.0)), 20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_factor_shifts_tot() {
        let table: TotNormalization = [(3, 2.0)].into_iter().collect();
        let expected = 20.0 + TOT_SLOPE * 2.0_f64.ln() / 1000.0;
        assert_relative_eq!(table.normalized_tot(&hit(3, 20.0)), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_apply_counts_missing() {
        let mut table = TotNormalization::new();
        table.insert(1, 0.5);
        let mut hits = vec![hit(1, 20.0), hit(2, 20.0)];
        let missing = table.apply(&mut hits);
        assert_eq!(missing, 1);
        assert!(hits[0].tot < 20.0);
        assert_eq!(hits[1].tot, 20.0);
    }
}
