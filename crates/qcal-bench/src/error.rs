//! Error types for the bench crate.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors produced while building, running or analysing an experiment.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BenchError {
    /// Group size and table sizes disagree.
    #[error("{context}: expected {expected} entries, got {actual}")]
    DimensionMismatch {
        /// Which table was checked.
        context: &'static str,
        /// Size implied by the group order.
        expected: usize,
        /// Size actually supplied.
        actual: usize,
    },

    /// A table is malformed (out-of-range entry, missing identity, ...).
    #[error("Invalid group table: {0}")]
    InvalidTable(String),

    /// Index outside the Clifford decomposition table.
    #[error("Clifford index {0} out of range (0..24)")]
    UnknownClifford(usize),

    /// Requested depth is outside the generated sequence.
    #[error("Depth {depth} out of range (1..={max_depth})")]
    DepthOutOfRange {
        /// Requested depth.
        depth: usize,
        /// Maximum depth of the sequence.
        max_depth: usize,
    },

    /// Experiment configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Not enough points to fit the model.
    #[error("Need at least {needed} data points, got {got}")]
    InsufficientData {
        /// Minimum number of points.
        needed: usize,
        /// Number of points supplied.
        got: usize,
    },

    /// The least-squares fit did not converge.
    #[error("Fit did not converge after {evaluations} evaluations")]
    FitDidNotConverge {
        /// Number of model evaluations performed.
        evaluations: usize,
    },

    /// Normal equations are singular; parameters are not identifiable.
    #[error("Singular normal matrix in least-squares fit")]
    SingularMatrix,

    /// Control runtime failure.
    #[error("Runtime error: {0}")]
    Runtime(#[from] qcal_hal::RuntimeError),
}

/// Result type for bench operations.
pub type BenchResult<T> = Result<T, BenchError>;
