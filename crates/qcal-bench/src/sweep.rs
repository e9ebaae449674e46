//! SFQ-driven Rabi oscillations as a function of bias current.
//!
//! For each repetition, each bias voltage `V_b` on the grid
//! `V_min, V_min + dV, ...` (`N_V` points below `V_c`) and each pulse
//! duration `t` in `0, dt, ...` (`N_t` points), a shot drives the SFQ
//! circuit scaled by `V_b`, plays the qubit pulse for `t` cycles and
//! thresholds the resonator readout. Repetitions are averaged into a
//! `(N_V, N_t)` excited-state map.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use qcal_hal::{ControlRuntime, Program, Shot, StreamSpec};

use crate::config::ConfigError;
use crate::error::{BenchError, BenchResult};

/// Result names produced by the sweep program.
pub const CURRENTS_NAME: &str = "I_b";
pub const DURATIONS_NAME: &str = "t";
pub const STATE_NAME: &str = "state";

/// Absorbs floating-point error when counting grid points.
const GRID_EPSILON: f64 = 1e-9;

/// Hardware elements used by the sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepElements {
    pub sfq_driver: String,
    pub qubit: String,
    pub resonator: String,
}

impl Default for SweepElements {
    fn default() -> Self {
        Self {
            sfq_driver: "SFQ_driver".into(),
            qubit: "qubit".into(),
            resonator: "RR".into(),
        }
    }
}

/// Parameters of the bias-current sweep. Currents in amperes, resistance in
/// ohms, voltages in volts, durations in clock cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiasSweepConfig {
    pub critical_current: f64,
    pub min_current: f64,
    pub resistance: f64,
    pub voltage_step: f64,
    pub repetitions: usize,
    pub max_duration: u32,
    pub duration_step: u32,
    pub elements: SweepElements,
}

impl Default for BiasSweepConfig {
    fn default() -> Self {
        Self {
            critical_current: 130e-6,
            min_current: 90e-6,
            resistance: 1e3,
            voltage_step: 1e-3,
            repetitions: 3,
            max_duration: 125,
            duration_step: 1,
            elements: SweepElements::default(),
        }
    }
}

impl BiasSweepConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("critical_current", self.critical_current),
            ("resistance", self.resistance),
            ("voltage_step", self.voltage_step),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if !(self.min_current.is_finite() && self.min_current >= 0.0)
            || self.min_current >= self.critical_current
        {
            return Err(ConfigError::ValidationError(format!(
                "min_current ({}) must lie in [0, critical_current)",
                self.min_current
            )));
        }
        if self.repetitions == 0 {
            return Err(ConfigError::ValidationError(
                "repetitions must be at least 1".into(),
            ));
        }
        if self.duration_step == 0 || self.max_duration < self.duration_step {
            return Err(ConfigError::ValidationError(format!(
                "duration_step ({}) must be in 1..=max_duration ({})",
                self.duration_step, self.max_duration
            )));
        }
        if self.num_voltages() == 0 {
            return Err(ConfigError::ValidationError(
                "voltage grid is empty".into(),
            ));
        }
        Ok(())
    }

    /// `V_c = R · I_c`.
    pub fn critical_voltage(&self) -> f64 {
        self.resistance * self.critical_current
    }

    /// `V_min = R · I_min`.
    pub fn min_voltage(&self) -> f64 {
        self.resistance * self.min_current
    }

    /// `N_V = floor((V_c - V_min) / dV)`.
    pub fn num_voltages(&self) -> usize {
        ((self.critical_voltage() - self.min_voltage()) / self.voltage_step + GRID_EPSILON)
            .floor()
            .max(0.0) as usize
    }

    /// `N_t = t_max / dt`.
    pub fn num_durations(&self) -> usize {
        (self.max_duration / self.duration_step.max(1)) as usize
    }

    pub fn voltages(&self) -> Vec<f64> {
        let v_min = self.min_voltage();
        (0..self.num_voltages())
            .map(|k| v_min + k as f64 * self.voltage_step)
            .collect()
    }

    /// Bias currents `V_b / R` matching [`Self::voltages`].
    pub fn currents(&self) -> Vec<f64> {
        self.voltages()
            .into_iter()
            .map(|v| v / self.resistance)
            .collect()
    }

    pub fn durations(&self) -> Vec<u32> {
        (0..self.num_durations() as u32)
            .map(|k| k * self.duration_step)
            .collect()
    }
}

/// The bias-current sweep experiment.
#[derive(Debug, Clone)]
pub struct BiasSweep {
    config: BiasSweepConfig,
}

impl BiasSweep {
    pub fn new(config: BiasSweepConfig) -> BenchResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BiasSweepConfig {
        &self.config
    }

    pub fn build_program(&self) -> Program {
        let cfg = &self.config;
        let el = &cfg.elements;
        let v_c = cfg.critical_voltage();
        let voltages = cfg.voltages();
        let durations = cfg.durations();

        let mut program = Program::new("bias_current_sweep");
        for _ in 0..cfg.repetitions {
            for &v_b in &voltages {
                let last = durations.len() - 1;
                for (i, &t) in durations.iter().enumerate() {
                    let mut shot = Shot::new();
                    shot.play_scaled(&el.sfq_driver, "playOp", v_b, None)
                        .play_scaled(&el.qubit, "gauss_pulse", v_b / v_c, Some(t))
                        .align_elements(&[&el.qubit, &el.resonator])
                        .measure(&el.resonator, "meas_pulse", STATE_NAME)
                        .save(DURATIONS_NAME, f64::from(t));
                    if i == last {
                        shot.save(CURRENTS_NAME, v_b / cfg.resistance);
                    }
                    program.push_shot(shot);
                }
            }
        }

        let (n_v, n_t) = (voltages.len(), durations.len());
        program
            .add_stream(StreamSpec::new(CURRENTS_NAME).buffer(&[n_v]).save(CURRENTS_NAME))
            .add_stream(StreamSpec::new(DURATIONS_NAME).buffer(&[n_t]).save(DURATIONS_NAME))
            .add_stream(
                StreamSpec::new(STATE_NAME)
                    .boolean_to_int()
                    .buffer(&[n_v, n_t])
                    .average()
                    .save(STATE_NAME),
            );
        program
    }

    #[instrument(skip_all, fields(runtime = runtime.name()))]
    pub async fn run<R: ControlRuntime + ?Sized>(&self, runtime: &R) -> BenchResult<SweepResult> {
        let program = self.build_program();
        info!(
            "Running bias sweep: {} voltages x {} durations x {} repetitions",
            self.config.num_voltages(),
            self.config.num_durations(),
            self.config.repetitions
        );

        let handles = runtime.execute(&program).await?;
        let result = SweepResult {
            currents: handles.fetch_1d(CURRENTS_NAME)?,
            durations: handles.fetch_1d(DURATIONS_NAME)?,
            state: handles.fetch_2d(STATE_NAME)?,
        };

        let expected = (result.currents.len(), result.durations.len());
        if result.state.dim() != expected {
            return Err(BenchError::DimensionMismatch {
                context: "sweep state",
                expected: expected.0 * expected.1,
                actual: result.state.len(),
            });
        }
        Ok(result)
    }
}

/// Excited-state population per (bias current, duration).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepResult {
    pub currents: Array1<f64>,
    pub durations: Array1<f64>,
    pub state: Array2<f64>,
}

impl SweepResult {
    /// Peak-to-peak Rabi contrast for each bias current.
    pub fn rabi_contrast(&self) -> Array1<f64> {
        self.state.map_axis(Axis(1), |row| {
            let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let min = row.iter().copied().fold(f64::INFINITY, f64::min);
            if max.is_finite() && min.is_finite() {
                max - min
            } else {
                0.0
            }
        })
    }

    /// Bias current with the largest contrast.
    pub fn best_current(&self) -> Option<f64> {
        let contrast = self.rabi_contrast();
        contrast
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| self.currents[i])
    }
}
