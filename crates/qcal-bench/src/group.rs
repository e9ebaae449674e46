//! Finite-group multiplication tables.
//!
//! A [`CayleyTable`] of order `G` stores `G × G` entries; entry `(s, g)` is
//! the element reached by applying generator `g` after state `s`. Element 0
//! is always the identity.

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, BenchResult};

/// Index of the identity element.
pub const IDENTITY: usize = 0;

/// Multiplication table of a finite group, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CayleyTable {
    order: usize,
    entries: Vec<usize>,
}

impl CayleyTable {
    /// Build a table from a flattened row-major array.
    ///
    /// Fails if `entries.len() != order²` or an entry lies outside the group.
    pub fn from_flat(order: usize, entries: Vec<usize>) -> BenchResult<Self> {
        if order == 0 {
            return Err(BenchError::InvalidTable("group order must be positive".into()));
        }
        if entries.len() != order * order {
            return Err(BenchError::DimensionMismatch {
                context: "Cayley table",
                expected: order * order,
                actual: entries.len(),
            });
        }
        if let Some((pos, bad)) = entries.iter().enumerate().find(|(_, e)| **e >= order) {
            return Err(BenchError::InvalidTable(format!(
                "entry {bad} at ({}, {}) outside group of order {order}",
                pos / order,
                pos % order
            )));
        }
        Ok(Self { order, entries })
    }

    /// Build a table whose entries are already known to be in range.
    pub(crate) fn from_validated(order: usize, entries: Vec<usize>) -> Self {
        debug_assert_eq!(entries.len(), order * order);
        Self { order, entries }
    }

    /// Number of elements in the group.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Apply generator `generator` after state `state`.
    ///
    /// # Panics
    ///
    /// Panics if either index is `>= order()`.
    pub fn compose(&self, state: usize, generator: usize) -> usize {
        assert!(
            state < self.order && generator < self.order,
            "element out of range for group of order {}",
            self.order
        );
        self.entries[state * self.order + generator]
    }

    /// Compose a sequence of elements, starting from the identity.
    pub fn compose_all(&self, elements: impl IntoIterator<Item = usize>) -> usize {
        elements
            .into_iter()
            .fold(IDENTITY, |state, g| self.compose(state, g))
    }

    /// Row `state` of the table.
    ///
    /// # Panics
    ///
    /// Panics if `state >= order()`.
    pub fn row(&self, state: usize) -> &[usize] {
        assert!(
            state < self.order,
            "element out of range for group of order {}",
            self.order
        );
        &self.entries[state * self.order..(state + 1) * self.order]
    }

    /// The flattened table.
    pub fn as_flat(&self) -> &[usize] {
        &self.entries
    }

    /// Derive the inverse of every element: the column holding the
    /// identity in each row.
    pub fn inverse_table(&self) -> BenchResult<InverseTable> {
        (0..self.order)
            .map(|s| {
                self.row(s)
                    .iter()
                    .position(|&e| e == IDENTITY)
                    .ok_or_else(|| {
                        BenchError::InvalidTable(format!("row {s} has no identity entry"))
                    })
            })
            .collect::<BenchResult<Vec<_>>>()
            .map(InverseTable::new)
    }

    /// Check the group axioms: identity, Latin-square rows and columns,
    /// associativity.
    pub fn verify_group_axioms(&self) -> BenchResult<()> {
        let n = self.order;
        for s in 0..n {
            if self.compose(IDENTITY, s) != s || self.compose(s, IDENTITY) != s {
                return Err(BenchError::InvalidTable(format!(
                    "element {IDENTITY} is not an identity for {s}"
                )));
            }
        }

        let mut seen = vec![false; n];
        for s in 0..n {
            seen.fill(false);
            for g in 0..n {
                seen[self.compose(s, g)] = true;
            }
            if seen.iter().any(|v| !v) {
                return Err(BenchError::InvalidTable(format!("row {s} repeats an element")));
            }
            seen.fill(false);
            for g in 0..n {
                seen[self.compose(g, s)] = true;
            }
            if seen.iter().any(|v| !v) {
                return Err(BenchError::InvalidTable(format!(
                    "column {s} repeats an element"
                )));
            }
        }

        for a in 0..n {
            for b in 0..n {
                let ab = self.compose(a, b);
                for c in 0..n {
                    if self.compose(ab, c) != self.compose(a, self.compose(b, c)) {
                        return Err(BenchError::InvalidTable(format!(
                            "not associative at ({a}, {b}, {c})"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Element → inverse element lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InverseTable {
    inverses: Vec<usize>,
}

impl InverseTable {
    /// Wrap a precomputed inverse list.
    pub fn new(inverses: Vec<usize>) -> Self {
        Self { inverses }
    }

    pub fn len(&self) -> usize {
        self.inverses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inverses.is_empty()
    }

    /// Inverse of `element`.
    ///
    /// # Panics
    ///
    /// Panics if `element >= len()`.
    pub fn inverse(&self, element: usize) -> usize {
        assert!(
            element < self.inverses.len(),
            "element out of range for group of order {}",
            self.inverses.len()
        );
        self.inverses[element]
    }

    /// Inverse of `element`, or `None` when it is not a group element.
    pub fn get(&self, element: usize) -> Option<usize> {
        self.inverses.get(element).copied()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.inverses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Cyclic group Z_n: (s, g) -> s + g mod n.
    fn cyclic(n: usize) -> CayleyTable {
        let entries = (0..n).flat_map(|s| (0..n).map(move |g| (s + g) % n)).collect();
        CayleyTable::from_flat(n, entries).unwrap()
    }

    #[test]
    fn test_cyclic_inverse() {
        let table = cyclic(5);
        let inv = table.inverse_table().unwrap();
        assert_eq!(inv.as_slice(), &[0, 4, 3, 2, 1]);
        table.verify_group_axioms().unwrap();
    }

    #[test]
    fn test_compose_all() {
        let table = cyclic(4);
        assert_eq!(table.compose_all([1, 1, 3, 2]), 3);
        assert_eq!(table.compose_all(std::iter::empty()), IDENTITY);
    }

    #[test]
    fn test_inverse_lookup_bounds() {
        let inv = cyclic(3).inverse_table().unwrap();
        assert_eq!(inv.get(1), Some(2));
        assert_eq!(inv.get(3), None);
    }

    #[test]
    #[should_panic(expected = "element out of range")]
    fn test_inverse_out_of_range_panics() {
        cyclic(3).inverse_table().unwrap().inverse(3);
    }

    #[test]
    #[should_panic(expected = "element out of range")]
    fn test_row_out_of_range_panics() {
        cyclic(3).row(3);
    }

    #[test]
    fn test_wrong_size_rejected() {
        let err = CayleyTable::from_flat(3, vec![0; 8]).unwrap_err();
        assert!(matches!(
            err,
            BenchError::DimensionMismatch {
                expected: 9,
                actual: 8,
                ..
            }
        ));
    }

    #[test]
    fn test_out_of_range_entry_rejected() {
        let err = CayleyTable::from_flat(2, vec![0, 1, 1, 2]).unwrap_err();
        assert!(matches!(err, BenchError::InvalidTable(_)));
    }

    #[test]
    fn test_missing_identity_rejected() {
        let table = CayleyTable::from_flat(2, vec![0, 1, 1, 1]).unwrap();
        assert!(table.inverse_table().is_err());
        assert!(table.verify_group_axioms().is_err());
    }

    #[test]
    fn test_non_associative_rejected() {
        // Latin square with identity 0 that is not a group (order 5 loop).
        #[rustfmt::skip]
        let entries = vec![
            0, 1, 2, 3, 4,
            1, 0, 3, 4, 2,
            2, 4, 0, 1, 3,
            3, 2, 4, 0, 1,
            4, 3, 1, 2, 0,
        ];
        let table = CayleyTable::from_flat(5, entries).unwrap();
        assert!(table.verify_group_axioms().is_err());
    }
}
