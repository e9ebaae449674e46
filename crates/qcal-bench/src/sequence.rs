//! Random-walk sequence generation with running inverses.
//!
//! A single walk of length `D` serves every benchmarking depth `1..=D`:
//! at each step the generator records both the drawn element and the element
//! that undoes the product accumulated so far, so truncating at depth `d`
//! and appending `inverse_gate[d - 1]` always returns to the identity.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clifford::{NUM_CLIFFORDS, clifford_inverses, clifford_table};
use crate::error::{BenchError, BenchResult};
use crate::group::{CayleyTable, IDENTITY, InverseTable};

/// A generated walk and its inverse-tracking list.
///
/// Both lists have length `max_depth + 1`. Entry `i < max_depth` of
/// `inverse_gate` inverts the product of `sequence[0..=i]`; the trailing
/// entries hold the identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomSequence {
    sequence: Vec<usize>,
    inverse_gate: Vec<usize>,
}

impl RandomSequence {
    /// Maximum depth the walk was generated for.
    pub fn max_depth(&self) -> usize {
        self.sequence.len() - 1
    }

    pub fn sequence(&self) -> &[usize] {
        &self.sequence
    }

    pub fn inverse_gate(&self) -> &[usize] {
        &self.inverse_gate
    }

    /// Elements played at `depth`: the first `depth` steps followed by the
    /// recovery element, `depth + 1` elements in total.
    pub fn circuit(&self, depth: usize) -> BenchResult<Vec<usize>> {
        if depth == 0 || depth > self.max_depth() {
            return Err(BenchError::DepthOutOfRange {
                depth,
                max_depth: self.max_depth(),
            });
        }
        let mut elements = self.sequence[..depth].to_vec();
        elements.push(self.inverse_gate[depth - 1]);
        Ok(elements)
    }
}

/// Draws random walks over a finite group.
#[derive(Debug, Clone)]
pub struct SequenceGenerator {
    table: CayleyTable,
    inverses: InverseTable,
}

impl SequenceGenerator {
    /// Create a generator for a group of order `group_order`.
    ///
    /// Fails fast when the Cayley table or the inverse table do not match
    /// the declared order.
    pub fn new(
        group_order: usize,
        table: CayleyTable,
        inverses: InverseTable,
    ) -> BenchResult<Self> {
        if table.order() != group_order {
            return Err(BenchError::DimensionMismatch {
                context: "Cayley table",
                expected: group_order * group_order,
                actual: table.order() * table.order(),
            });
        }
        if inverses.len() != group_order {
            return Err(BenchError::DimensionMismatch {
                context: "inverse table",
                expected: group_order,
                actual: inverses.len(),
            });
        }
        if let Some(bad) = inverses.as_slice().iter().find(|&&g| g >= group_order) {
            return Err(BenchError::InvalidTable(format!(
                "inverse {bad} outside group of order {group_order}"
            )));
        }
        Ok(Self { table, inverses })
    }

    /// Generator over the single-qubit Clifford group.
    pub fn clifford() -> BenchResult<Self> {
        Self::new(NUM_CLIFFORDS, clifford_table(), clifford_inverses()?)
    }

    pub fn group_order(&self) -> usize {
        self.table.order()
    }

    pub fn table(&self) -> &CayleyTable {
        &self.table
    }

    pub fn inverses(&self) -> &InverseTable {
        &self.inverses
    }

    /// Generate a walk of `max_depth` steps drawing from `rng`.
    pub fn generate<R: Rng>(&self, max_depth: usize, rng: &mut R) -> RandomSequence {
        let order = self.table.order();
        let mut sequence = vec![IDENTITY; max_depth + 1];
        let mut inverse_gate = vec![IDENTITY; max_depth + 1];

        let mut current_state = IDENTITY;
        for i in 0..max_depth {
            let step = rng.gen_range(0..order);
            current_state = self.table.compose(current_state, step);
            sequence[i] = step;
            inverse_gate[i] = self.inverses.inverse(current_state);
        }

        debug!(
            "Generated walk of depth {} ending in element {}",
            max_depth, current_state
        );

        RandomSequence {
            sequence,
            inverse_gate,
        }
    }

    /// Generate a walk from a `StdRng` seeded with `seed`.
    pub fn generate_seeded(&self, max_depth: usize, seed: u64) -> RandomSequence {
        let mut rng = StdRng::seed_from_u64(seed);
        self.generate(max_depth, &mut rng)
    }
}
