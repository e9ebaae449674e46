//! Experiment configuration.
//!
//! Parameters are loaded from, in order of precedence (highest first):
//! 1. Environment variables (`QCAL_RB_*`)
//! 2. A YAML configuration file
//! 3. Default values
//!
//! Configurations are immutable once validated and are passed explicitly to
//! the experiment builders.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use qcal_hal::{CLOCK_CYCLE_NS, ns_to_cycles};

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Shortest wait the controller accepts, in clock cycles.
pub const MIN_WAIT_CYCLES: u32 = 4;

/// Names of the hardware elements an RB shot touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RbElements {
    /// Qubit drive element the Clifford pulses are played on.
    pub qubit: String,
    /// Optical pumping laser used for initialization.
    pub init_laser: String,
    /// Resonant laser used for initialization and readout.
    pub readout_laser: String,
    /// Microwave switch enabled during initialization.
    pub microwave_switch: String,
    /// Photon detector performing the time-tagged readout.
    pub detector: String,
}

impl Default for RbElements {
    fn default() -> Self {
        Self {
            qubit: "Yb".into(),
            init_laser: "F_transition".into(),
            readout_laser: "A_transition".into(),
            microwave_switch: "excited_state_mw".into(),
            detector: "SNSPD".into(),
        }
    }
}

/// Configuration for a single-qubit randomized benchmarking run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RbConfig {
    /// Deepest sequence, in Cliffords before the recovery element.
    pub max_depth: usize,
    /// Step between consecutive depths.
    pub delta_depth: usize,
    /// Number of independent random walks.
    pub num_sequences: usize,
    /// Repetitions averaged per (sequence, depth) point.
    pub n_avg: usize,
    /// Seed of the walk generator.
    pub seed: u64,
    /// Length of a π pulse in nanoseconds; the identity Clifford idles for
    /// a quarter of it in clock cycles.
    pub pulse_length_ns: u32,
    /// Readout window in nanoseconds.
    pub readout_length_ns: u32,
    /// Delay after each shot, in clock cycles.
    pub cooldown_cycles: u32,
    #[serde(default)]
    pub elements: RbElements,
}

impl Default for RbConfig {
    fn default() -> Self {
        Self {
            max_depth: 100,
            delta_depth: 1,
            num_sequences: 50,
            n_avg: 1,
            seed: 345_324,
            pulse_length_ns: 100,
            readout_length_ns: 1000,
            cooldown_cycles: 100,
            elements: RbElements::default(),
        }
    }
}

impl RbConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from a YAML document.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: RbConfig = serde_yaml_ng::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `QCAL_RB_*` environment overrides.
    #[must_use]
    pub fn merge_env(self) -> Self {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    fn merge_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        fn parsed<T: std::str::FromStr>(
            var: &impl Fn(&str) -> Option<String>,
            key: &str,
        ) -> Option<T> {
            var(key).and_then(|v| v.trim().parse().ok())
        }

        if let Some(v) = parsed(&var, "QCAL_RB_MAX_DEPTH") {
            self.max_depth = v;
        }
        if let Some(v) = parsed(&var, "QCAL_RB_DELTA_DEPTH") {
            self.delta_depth = v;
        }
        if let Some(v) = parsed(&var, "QCAL_RB_NUM_SEQUENCES") {
            self.num_sequences = v;
        }
        if let Some(v) = parsed(&var, "QCAL_RB_N_AVG") {
            self.n_avg = v;
        }
        if let Some(v) = parsed(&var, "QCAL_RB_SEED") {
            self.seed = v;
        }
        self
    }

    /// Load configuration with full precedence handling.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.merge_env();
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("max_depth", self.max_depth),
            ("delta_depth", self.delta_depth),
            ("num_sequences", self.num_sequences),
            ("n_avg", self.n_avg),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be at least 1"
                )));
            }
        }

        if self.delta_depth > self.max_depth {
            return Err(ConfigError::ValidationError(format!(
                "delta_depth ({}) exceeds max_depth ({})",
                self.delta_depth, self.max_depth
            )));
        }

        if self.idle_cycles() < MIN_WAIT_CYCLES {
            return Err(ConfigError::ValidationError(format!(
                "pulse_length_ns must be at least {} ns so the identity wait lasts {MIN_WAIT_CYCLES} cycles",
                MIN_WAIT_CYCLES * CLOCK_CYCLE_NS
            )));
        }

        if ns_to_cycles(self.readout_length_ns) < MIN_WAIT_CYCLES {
            return Err(ConfigError::ValidationError(format!(
                "readout_length_ns must be at least {} ns",
                MIN_WAIT_CYCLES * CLOCK_CYCLE_NS
            )));
        }

        let elements = [
            &self.elements.qubit,
            &self.elements.init_laser,
            &self.elements.readout_laser,
            &self.elements.microwave_switch,
            &self.elements.detector,
        ];
        if elements.iter().any(|e| e.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "element names must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Depths probed by the experiment: `1, 1 + δ, 1 + 2δ, ... ≤ max_depth`.
    pub fn depths(&self) -> Vec<usize> {
        (1..=self.max_depth).step_by(self.delta_depth.max(1)).collect()
    }

    /// Length of the identity Clifford's wait, in clock cycles.
    pub fn idle_cycles(&self) -> u32 {
        ns_to_cycles(self.pulse_length_ns)
    }

    /// Total number of shots the program will contain.
    pub fn num_shots(&self) -> usize {
        self.num_sequences * self.depths().len() * self.n_avg
    }
}
