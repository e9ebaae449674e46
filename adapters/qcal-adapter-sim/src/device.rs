//! Device model: what each `(element, operation)` pair does to the qubit.

use std::f64::consts::{FRAC_PI_2, PI};

use rustc_hash::FxHashMap;

use crate::bloch::RotationAxis;

/// Which measured state the runtime reports as 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrightState {
    Ground,
    Excited,
}

/// Effect of one operation on the simulated qubit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperationModel {
    /// Fixed rotation; a `Play` amplitude scales the angle.
    Rotation { axis: RotationAxis, angle: f64 },
    /// Continuous drive: angle = `rate` × amplitude × duration in cycles.
    Drive { axis: RotationAxis, rate: f64 },
    /// Prepare the ground state.
    Reset,
    /// No effect on the qubit.
    Idle,
    /// Projective readout.
    Readout { bright: BrightState },
}

/// Operations the simulator understands plus its noise parameters.
#[derive(Debug, Clone)]
pub struct DeviceModel {
    operations: FxHashMap<(String, String), OperationModel>,
    /// Depolarizing strength applied after every rotation or drive.
    pub gate_error: f64,
    /// Probability that a readout reports the wrong state.
    pub readout_error: f64,
    /// Seed of the measurement RNG.
    pub seed: u64,
    /// Length of a `Play` without explicit duration, in clock cycles.
    pub default_pulse_cycles: u32,
}

impl Default for DeviceModel {
    /// Noiseless device knowing both the spin-qubit RB elements and the
    /// SFQ-driven transmon elements.
    fn default() -> Self {
        let mut model = Self::empty();
        model.register_spin_qubit().register_sfq_transmon();
        model
    }
}

impl DeviceModel {
    /// A device with no registered operations.
    pub fn empty() -> Self {
        Self {
            operations: FxHashMap::default(),
            gate_error: 0.0,
            readout_error: 0.0,
            seed: 0,
            default_pulse_cycles: 25,
        }
    }

    /// Register an operation.
    pub fn with_operation(
        mut self,
        element: impl Into<String>,
        operation: impl Into<String>,
        model: OperationModel,
    ) -> Self {
        self.insert(element, operation, model);
        self
    }

    pub fn insert(
        &mut self,
        element: impl Into<String>,
        operation: impl Into<String>,
        model: OperationModel,
    ) -> &mut Self {
        self.operations
            .insert((element.into(), operation.into()), model);
        self
    }

    #[must_use]
    pub fn with_gate_error(mut self, p: f64) -> Self {
        self.gate_error = p;
        self
    }

    #[must_use]
    pub fn with_readout_error(mut self, p: f64) -> Self {
        self.readout_error = p;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn operation(&self, element: &str, operation: &str) -> Option<OperationModel> {
        self.operations
            .get(&(element.to_string(), operation.to_string()))
            .copied()
    }

    pub fn num_operations(&self) -> usize {
        self.operations.len()
    }

    /// Optically addressed spin qubit: microwave Clifford pulses on `Yb`,
    /// optical pumping for initialization and a photon-counting readout
    /// that is bright in the ground state.
    pub fn register_spin_qubit(&mut self) -> &mut Self {
        use OperationModel::*;
        use RotationAxis::*;

        let pulses = [
            ("x180", X, PI),
            ("y180", Y, PI),
            ("x90", X, FRAC_PI_2),
            ("-x90", X, -FRAC_PI_2),
            ("y90", Y, FRAC_PI_2),
            ("-y90", Y, -FRAC_PI_2),
        ];
        for (name, axis, angle) in pulses {
            self.insert("Yb", name, Rotation { axis, angle });
        }

        self.insert("F_transition", "laser_ON", Reset)
            .insert("A_transition", "laser_ON", Idle)
            .insert("excited_state_mw", "switch_ON", Idle)
            .insert(
                "SNSPD",
                "readout",
                Readout {
                    bright: BrightState::Ground,
                },
            )
    }

    /// Transmon driven by an SFQ pulse train: `gauss_pulse` on `qubit`
    /// completes a π rotation in 50 cycles at full amplitude, `RR` reads out
    /// the excited state.
    pub fn register_sfq_transmon(&mut self) -> &mut Self {
        use OperationModel::*;

        self.insert("SFQ_driver", "playOp", Idle)
            .insert(
                "qubit",
                "gauss_pulse",
                Drive {
                    axis: RotationAxis::X,
                    rate: PI / 50.0,
                },
            )
            .insert("qubit", "pi_pulse", Rotation {
                axis: RotationAxis::X,
                angle: PI,
            })
            .insert(
                "RR",
                "meas_pulse",
                Readout {
                    bright: BrightState::Excited,
                },
            )
    }
}
