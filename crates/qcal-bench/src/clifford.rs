//! The single-qubit Clifford group.
//!
//! The 24 Cliffords are indexed by their decomposition into at most three
//! physical pulses drawn from `{idle, x180, y180, ±x90, ±y90}`. The table
//! below is the standard decomposition used by single-qubit randomized
//! benchmarking and must stay bit-exact: index 0 is the identity (a wait of
//! one quarter pulse length in clock cycles), pulses within an entry are
//! played left to right.
//!
//! [`C1_TABLE`] is the Cayley table of the group in this indexing; it can be
//! re-derived from the SU(2) matrices with [`derive_clifford_table`].

use std::f64::consts::{FRAC_PI_2, PI};

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{BenchError, BenchResult};
use crate::group::{CayleyTable, InverseTable};

/// Number of single-qubit Clifford elements.
pub const NUM_CLIFFORDS: usize = 24;

/// Physical pulses a Clifford decomposes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhysicalGate {
    /// No-op; played as a wait.
    Idle,
    X180,
    Y180,
    X90,
    MinusX90,
    Y90,
    MinusY90,
}

/// Rotation axis of a physical pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl PhysicalGate {
    /// Operation name as configured on the control hardware.
    pub fn operation(self) -> &'static str {
        match self {
            PhysicalGate::Idle => "wait",
            PhysicalGate::X180 => "x180",
            PhysicalGate::Y180 => "y180",
            PhysicalGate::X90 => "x90",
            PhysicalGate::MinusX90 => "-x90",
            PhysicalGate::Y90 => "y90",
            PhysicalGate::MinusY90 => "-y90",
        }
    }

    /// Rotation axis and angle, `None` for the idle slot.
    pub fn rotation(self) -> Option<(Axis, f64)> {
        match self {
            PhysicalGate::Idle => None,
            PhysicalGate::X180 => Some((Axis::X, PI)),
            PhysicalGate::Y180 => Some((Axis::Y, PI)),
            PhysicalGate::X90 => Some((Axis::X, FRAC_PI_2)),
            PhysicalGate::MinusX90 => Some((Axis::X, -FRAC_PI_2)),
            PhysicalGate::Y90 => Some((Axis::Y, FRAC_PI_2)),
            PhysicalGate::MinusY90 => Some((Axis::Y, -FRAC_PI_2)),
        }
    }

    /// SU(2) matrix of the pulse.
    pub fn unitary(self) -> Unitary2 {
        match self.rotation() {
            None => Unitary2::identity(),
            Some((axis, angle)) => Unitary2::rotation(axis, angle),
        }
    }
}

use PhysicalGate::{Idle, MinusX90, MinusY90, X90, X180, Y90, Y180};

const DECOMPOSITIONS: [&[PhysicalGate]; NUM_CLIFFORDS] = [
    &[Idle],
    &[X180],
    &[Y180],
    &[Y180, X180],
    &[X90, Y90],
    &[X90, MinusY90],
    &[MinusX90, Y90],
    &[MinusX90, MinusY90],
    &[Y90, X90],
    &[Y90, MinusX90],
    &[MinusY90, X90],
    &[MinusY90, MinusX90],
    &[X90],
    &[MinusX90],
    &[Y90],
    &[MinusY90],
    &[MinusX90, Y90, X90],
    &[MinusX90, MinusY90, X90],
    &[X180, Y90],
    &[X180, MinusY90],
    &[Y180, X90],
    &[Y180, MinusX90],
    &[X90, Y90, X90],
    &[MinusX90, Y90, MinusX90],
];

/// Cayley table of the single-qubit Clifford group in decomposition order.
///
/// Entry `[s * 24 + g]` is the Clifford equal to applying `g` after `s`.
#[rustfmt::skip]
pub const C1_TABLE: [u8; NUM_CLIFFORDS * NUM_CLIFFORDS] = [
     0,  1,  2,  3,  4,  5,  6,  7,  8,  9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23,
     1,  0,  3,  2,  6,  7,  4,  5, 11, 10,  9,  8, 13, 12, 18, 19, 22, 23, 14, 15, 21, 20, 16, 17,
     2,  3,  0,  1,  7,  6,  5,  4, 10, 11,  8,  9, 20, 21, 15, 14, 23, 22, 19, 18, 12, 13, 17, 16,
     3,  2,  1,  0,  5,  4,  7,  6,  9,  8, 11, 10, 21, 20, 19, 18, 17, 16, 15, 14, 13, 12, 23, 22,
     4,  7,  5,  6, 11,  8,  9, 10,  2,  3,  1,  0, 22, 17, 21, 12, 14, 18, 13, 20, 23, 16, 15, 19,
     5,  6,  4,  7, 10,  9,  8, 11,  1,  0,  2,  3, 23, 16, 12, 21, 19, 15, 20, 13, 22, 17, 18, 14,
     6,  5,  7,  4,  8, 11, 10,  9,  3,  2,  0,  1, 16, 23, 20, 13, 18, 14, 12, 21, 17, 22, 19, 15,
     7,  4,  6,  5,  9, 10, 11,  8,  0,  1,  3,  2, 17, 22, 13, 20, 15, 19, 21, 12, 16, 23, 14, 18,
     8,  9, 11, 10,  1,  3,  2,  0,  7,  4,  5,  6, 19, 14, 22, 16, 20, 12, 23, 17, 15, 18, 13, 21,
     9,  8, 10, 11,  2,  0,  1,  3,  6,  5,  4,  7, 14, 19, 23, 17, 13, 21, 22, 16, 18, 15, 20, 12,
    10, 11,  9,  8,  3,  1,  0,  2,  4,  7,  6,  5, 18, 15, 17, 23, 12, 20, 16, 22, 14, 19, 21, 13,
    11, 10,  8,  9,  0,  2,  3,  1,  5,  6,  7,  4, 15, 18, 16, 22, 21, 13, 17, 23, 19, 14, 12, 20,
    12, 13, 21, 20, 18, 19, 14, 15, 22, 17, 23, 16,  1,  0,  4,  5,  8, 10,  6,  7,  2,  3, 11,  9,
    13, 12, 20, 21, 14, 15, 18, 19, 16, 23, 17, 22,  0,  1,  6,  7, 11,  9,  4,  5,  3,  2,  8, 10,
    14, 19, 15, 18, 22, 16, 23, 17, 20, 21, 12, 13,  8,  9,  2,  0,  6,  4,  1,  3, 10, 11,  7,  5,
    15, 18, 14, 19, 17, 23, 16, 22, 12, 13, 20, 21, 10, 11,  0,  2,  5,  7,  3,  1,  8,  9,  4,  6,
    16, 23, 22, 17, 12, 21, 20, 13, 19, 14, 15, 18,  5,  6,  8, 11,  3,  0, 10,  9,  7,  4,  1,  2,
    17, 22, 23, 16, 21, 12, 13, 20, 14, 19, 18, 15,  4,  7,  9, 10,  0,  3, 11,  8,  6,  5,  2,  1,
    18, 15, 19, 14, 16, 22, 17, 23, 21, 20, 13, 12, 11, 10,  3,  1,  4,  6,  0,  2,  9,  8,  5,  7,
    19, 14, 18, 15, 23, 17, 22, 16, 13, 12, 21, 20,  9,  8,  1,  3,  7,  5,  2,  0, 11, 10,  6,  4,
    20, 21, 13, 12, 19, 18, 15, 14, 17, 22, 16, 23,  3,  2,  7,  6, 10,  8,  5,  4,  0,  1,  9, 11,
    21, 20, 12, 13, 15, 14, 19, 18, 23, 16, 22, 17,  2,  3,  5,  4,  9, 11,  7,  6,  1,  0, 10,  8,
    22, 17, 16, 23, 13, 20, 21, 12, 15, 18, 19, 14,  7,  4, 11,  8,  2,  1,  9, 10,  5,  6,  0,  3,
    23, 16, 17, 22, 20, 13, 12, 21, 18, 15, 14, 19,  6,  5, 10,  9,  1,  2,  8, 11,  4,  7,  3,  0,
];

/// Pulses of Clifford `index`, in play order.
pub fn decomposition(index: usize) -> BenchResult<&'static [PhysicalGate]> {
    DECOMPOSITIONS
        .get(index)
        .copied()
        .ok_or(BenchError::UnknownClifford(index))
}

/// Average number of physical pulses per Clifford, counting the idle slot
/// as one pulse (45 / 24 = 1.875).
pub fn average_gates_per_clifford() -> f64 {
    let total: usize = DECOMPOSITIONS.iter().map(|d| d.len()).sum();
    total as f64 / NUM_CLIFFORDS as f64
}

/// The Clifford Cayley table.
pub fn clifford_table() -> CayleyTable {
    CayleyTable::from_validated(
        NUM_CLIFFORDS,
        C1_TABLE.iter().map(|&e| usize::from(e)).collect(),
    )
}

/// The Clifford inverse table.
pub fn clifford_inverses() -> BenchResult<InverseTable> {
    clifford_table().inverse_table()
}

/// A 2x2 unitary matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unitary2 {
    m: [[Complex64; 2]; 2],
}

impl Unitary2 {
    pub fn identity() -> Self {
        let one = Complex64::new(1.0, 0.0);
        let zero = Complex64::new(0.0, 0.0);
        Self {
            m: [[one, zero], [zero, one]],
        }
    }

    /// `exp(-i angle/2 σ_axis)`
    pub fn rotation(axis: Axis, angle: f64) -> Self {
        let c = Complex64::new((angle / 2.0).cos(), 0.0);
        let s = (angle / 2.0).sin();
        match axis {
            Axis::X => {
                let off = Complex64::new(0.0, -s);
                Self {
                    m: [[c, off], [off, c]],
                }
            }
            Axis::Y => Self {
                m: [
                    [c, Complex64::new(-s, 0.0)],
                    [Complex64::new(s, 0.0), c],
                ],
            },
        }
    }

    /// Matrix multiplication: `self * other`.
    pub fn mul(&self, other: &Unitary2) -> Unitary2 {
        let mut result = [[Complex64::new(0.0, 0.0); 2]; 2];
        for (i, row) in result.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = self.m[i][0] * other.m[0][j] + self.m[i][1] * other.m[1][j];
            }
        }
        Unitary2 { m: result }
    }

    /// Conjugate transpose.
    pub fn dagger(&self) -> Unitary2 {
        Unitary2 {
            m: [
                [self.m[0][0].conj(), self.m[1][0].conj()],
                [self.m[0][1].conj(), self.m[1][1].conj()],
            ],
        }
    }

    /// True when `self` and `other` differ only by a global phase.
    pub fn equals_up_to_phase(&self, other: &Unitary2, tol: f64) -> bool {
        let product = self.dagger().mul(other);
        let trace = product.m[0][0] + product.m[1][1];
        (trace.norm() - 2.0).abs() < tol
    }
}

/// SU(2) matrix of Clifford `index` (pulses applied left to right).
pub fn clifford_unitary(index: usize) -> BenchResult<Unitary2> {
    Ok(decomposition(index)?
        .iter()
        .fold(Unitary2::identity(), |acc, gate| gate.unitary().mul(&acc)))
}

/// Find the Clifford index equal to `target` up to global phase.
pub fn find_clifford_index(target: &Unitary2) -> Option<usize> {
    (0..NUM_CLIFFORDS).find(|&i| {
        clifford_unitary(i)
            .map(|u| u.equals_up_to_phase(target, 1e-6))
            .unwrap_or(false)
    })
}

/// Recompute the Cayley table from the SU(2) matrices of the decompositions.
pub fn derive_clifford_table() -> BenchResult<CayleyTable> {
    let unitaries = (0..NUM_CLIFFORDS)
        .map(clifford_unitary)
        .collect::<BenchResult<Vec<_>>>()?;

    let mut entries = Vec::with_capacity(NUM_CLIFFORDS * NUM_CLIFFORDS);
    for state in &unitaries {
        for generator in &unitaries {
            let product = generator.mul(state);
            let index = find_clifford_index(&product).ok_or_else(|| {
                BenchError::InvalidTable("decompositions are not closed under composition".into())
            })?;
            entries.push(index);
        }
    }
    CayleyTable::from_flat(NUM_CLIFFORDS, entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::IDENTITY;

    #[test]
    fn test_derived_table_matches_constant() {
        assert_eq!(derive_clifford_table().unwrap(), clifford_table());
    }

    #[test]
    fn test_clifford_table_is_a_group() {
        clifford_table().verify_group_axioms().unwrap();
    }

    #[test]
    fn test_decompositions_are_distinct() {
        for i in 0..NUM_CLIFFORDS {
            let u = clifford_unitary(i).unwrap();
            assert_eq!(find_clifford_index(&u), Some(i), "Clifford {i} is not unique");
        }
    }

    #[test]
    fn test_inverse_composes_to_identity_both_ways() {
        let table = clifford_table();
        let inv = clifford_inverses().unwrap();
        for g in 0..NUM_CLIFFORDS {
            assert_eq!(table.compose(g, inv.inverse(g)), IDENTITY);
            assert_eq!(table.compose(inv.inverse(g), g), IDENTITY);
        }
    }

    #[test]
    fn test_known_inverses() {
        let inv = clifford_inverses().unwrap();
        // Paulis and the 180° rotations 18..=23 are self-inverse.
        for g in [0, 1, 2, 3, 18, 19, 20, 21, 22, 23] {
            assert_eq!(inv.inverse(g), g);
        }
        assert_eq!(inv.inverse(4), 11);
        assert_eq!(inv.inverse(12), 13);
        assert_eq!(inv.inverse(14), 15);
        assert_eq!(inv.inverse(16), 17);
    }

    #[test]
    fn test_matrix_inverse_matches_table() {
        let inv = clifford_inverses().unwrap();
        for g in 0..NUM_CLIFFORDS {
            let u = clifford_unitary(g).unwrap();
            assert_eq!(find_clifford_index(&u.dagger()), Some(inv.inverse(g)));
        }
    }

    #[test]
    fn test_decomposition_lengths() {
        assert_eq!(decomposition(0).unwrap(), &[PhysicalGate::Idle]);
        assert!(
            (0..NUM_CLIFFORDS).all(|i| (1..=3).contains(&decomposition(i).unwrap().len()))
        );
        assert!(matches!(decomposition(24), Err(BenchError::UnknownClifford(24))));
    }

    #[test]
    fn test_average_gates_per_clifford() {
        assert!((average_gates_per_clifford() - 1.875).abs() < 1e-12);
    }

    #[test]
    fn test_rotation_is_unitary() {
        let u = Unitary2::rotation(Axis::Y, 0.3);
        assert!(u.dagger().mul(&u).equals_up_to_phase(&Unitary2::identity(), 1e-12));
    }
}
