//! Single-qubit Bloch-vector engine.
//!
//! The ground state is the north pole `(0, 0, 1)`. Rotations about an axis
//! in the equatorial plane use the right-hand rule, matching
//! `exp(-i θ σ/2)`. Depolarizing noise shrinks the vector isotropically.

use rand::Rng;

/// Probabilities within this distance of 0 or 1 are snapped.
const PROBABILITY_SNAP: f64 = 1e-12;

/// Equatorial rotation axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationAxis {
    X,
    Y,
}

impl RotationAxis {
    fn unit(self) -> [f64; 3] {
        match self {
            RotationAxis::X => [1.0, 0.0, 0.0],
            RotationAxis::Y => [0.0, 1.0, 0.0],
        }
    }
}

/// Qubit state as a (possibly mixed) Bloch vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlochVector {
    v: [f64; 3],
}

impl Default for BlochVector {
    fn default() -> Self {
        Self::ground()
    }
}

impl BlochVector {
    pub fn ground() -> Self {
        Self { v: [0.0, 0.0, 1.0] }
    }

    pub fn excited() -> Self {
        Self { v: [0.0, 0.0, -1.0] }
    }

    pub fn components(&self) -> [f64; 3] {
        self.v
    }

    /// Rotate by `angle` radians about `axis` (Rodrigues' formula).
    pub fn rotate(&mut self, axis: RotationAxis, angle: f64) {
        let k = axis.unit();
        let v = self.v;
        let (sin, cos) = angle.sin_cos();
        let dot = k[0] * v[0] + k[1] * v[1] + k[2] * v[2];
        let cross = [
            k[1] * v[2] - k[2] * v[1],
            k[2] * v[0] - k[0] * v[2],
            k[0] * v[1] - k[1] * v[0],
        ];
        for i in 0..3 {
            self.v[i] = v[i] * cos + cross[i] * sin + k[i] * dot * (1.0 - cos);
        }
    }

    /// Apply a depolarizing channel of strength `p`.
    pub fn depolarize(&mut self, p: f64) {
        let shrink = 1.0 - p.clamp(0.0, 1.0);
        for c in &mut self.v {
            *c *= shrink;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::ground();
    }

    /// Probability of finding the qubit in the ground state.
    pub fn ground_probability(&self) -> f64 {
        let p = (1.0 + self.v[2]) / 2.0;
        if p >= 1.0 - PROBABILITY_SNAP {
            1.0
        } else if p <= PROBABILITY_SNAP {
            0.0
        } else {
            p
        }
    }

    /// Projectively measure in the computational basis. Returns `true` for
    /// the ground state and collapses the vector onto the outcome.
    pub fn measure<R: Rng>(&mut self, rng: &mut R) -> bool {
        let ground = rng.r#gen::<f64>() < self.ground_probability();
        *self = if ground { Self::ground() } else { Self::excited() };
        ground
    }
}
