//! Single-qubit calibration experiments for qcal.
//!
//! - **Randomized Benchmarking (RB)**: random Clifford walks with running
//!   inverses, played at every depth and fitted to `a * p^m + b`
//! - **Bias-current sweep**: SFQ-driven Rabi oscillations versus bias current
//!
//! Experiments compile to [`qcal_hal::Program`]s and run on any
//! [`qcal_hal::ControlRuntime`].
//!
//! # Example
//!
//! ```ignore
//! use qcal_bench::{RbConfig, RbExperiment, rb::rb_result};
//! use qcal_adapter_sim::SimulatedRuntime;
//!
//! let experiment = RbExperiment::new(RbConfig::default())?;
//! let run = experiment.run(&SimulatedRuntime::new()).await?;
//! let fit = run.fit()?;
//! println!("{}", serde_json::to_string_pretty(&rb_result(&fit, &run.depths))?);
//! ```

pub mod clifford;
pub mod config;
pub mod error;
pub mod fit;
pub mod group;
pub mod rb;
pub mod sequence;
pub mod sweep;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use config::{ConfigError, RbConfig, RbElements};
pub use error::{BenchError, BenchResult};
pub use fit::{DecayFit, Estimate, FitOptions, RbFit, fit_exponential_decay};
pub use group::{CayleyTable, IDENTITY, InverseTable};
pub use rb::{RbExperiment, RbRun};
pub use sequence::{RandomSequence, SequenceGenerator};
pub use sweep::{BiasSweep, BiasSweepConfig, SweepResult};

/// Result of a benchmark run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Name of the benchmark.
    pub name: String,
    /// Primary metric value.
    pub value: f64,
    /// Unit of the primary metric.
    pub unit: String,
    /// Total wall-clock time.
    pub duration: Duration,
    /// Additional metrics.
    pub metrics: serde_json::Map<String, serde_json::Value>,
}

impl BenchmarkResult {
    /// Create a new benchmark result.
    pub fn new(name: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            unit: unit.into(),
            duration: Duration::ZERO,
            metrics: serde_json::Map::new(),
        }
    }

    /// Set the duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Add a metric.
    pub fn with_metric(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metrics.insert(key.into(), value.into());
        self
    }
}
