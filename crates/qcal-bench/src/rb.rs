//! Randomized Benchmarking (RB).
//!
//! Measures gate fidelity by applying random sequences of Clifford gates
//! followed by the recovering inverse, then fitting the decay of the
//! survival probability to an exponential curve.
//!
//! One random walk per sequence index serves every depth: at depth `d` the
//! first `d` Cliffords are played followed by `inverse_gate[d - 1]`. Each
//! (sequence, depth) point is repeated `n_avg` times, averaged, and
//! buffered into the `res` array of shape `(num_sequences, num_depths)`.

use std::time::Duration;

use ndarray::{Array1, Array2, Axis};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use qcal_hal::{ControlRuntime, Instruction, Program, Shot, StreamSpec, ns_to_cycles};

use crate::BenchmarkResult;
use crate::clifford::{PhysicalGate, average_gates_per_clifford, decomposition};
use crate::config::RbConfig;
use crate::error::{BenchError, BenchResult};
use crate::fit::{FitOptions, RbFit, fit_exponential_decay};
use crate::sequence::{RandomSequence, SequenceGenerator};

/// Name of the averaged survival array.
pub const RESULT_NAME: &str = "res";

/// Stream the detector readout is saved to.
pub const COUNTS_STREAM: &str = "counts";

/// Measurement operation on the detector.
const READOUT_OPERATION: &str = "readout";

/// Instructions realising Clifford `index` on `element`.
///
/// The identity idles for `idle_cycles`; every other element plays its
/// physical pulses in order.
pub fn clifford_instructions(
    index: usize,
    element: &str,
    idle_cycles: u32,
) -> BenchResult<Vec<Instruction>> {
    Ok(decomposition(index)?
        .iter()
        .map(|gate| match gate {
            PhysicalGate::Idle => Instruction::Wait {
                element: element.to_string(),
                duration: idle_cycles,
            },
            pulse => Instruction::Play {
                element: element.to_string(),
                operation: pulse.operation().to_string(),
                duration: None,
                amplitude: None,
            },
        })
        .collect())
}

/// A configured single-qubit RB experiment.
#[derive(Debug, Clone)]
pub struct RbExperiment {
    config: RbConfig,
    generator: SequenceGenerator,
}

impl RbExperiment {
    /// Create an experiment over the single-qubit Clifford group.
    pub fn new(config: RbConfig) -> BenchResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            generator: SequenceGenerator::clifford()?,
        })
    }

    pub fn config(&self) -> &RbConfig {
        &self.config
    }

    /// Draw one walk per sequence index from a generator seeded once.
    pub fn generate_sequences(&self) -> Vec<RandomSequence> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        (0..self.config.num_sequences)
            .map(|_| self.generator.generate(self.config.max_depth, &mut rng))
            .collect()
    }

    /// Build one shot playing `circuit` between initialization and readout.
    fn build_shot(&self, circuit: &[usize]) -> BenchResult<Shot> {
        let el = &self.config.elements;
        let idle = self.config.idle_cycles();

        let mut shot = Shot::new();
        shot.play(&el.init_laser, "laser_ON")
            .align()
            .play(&el.readout_laser, "laser_ON")
            .play(&el.microwave_switch, "switch_ON")
            .align();

        for &index in circuit {
            shot.extend(clifford_instructions(index, &el.qubit, idle)?);
        }

        shot.align()
            .play_for(
                &el.readout_laser,
                "laser_ON",
                ns_to_cycles(self.config.readout_length_ns),
            )
            .align()
            .measure(&el.detector, READOUT_OPERATION, COUNTS_STREAM)
            .wait(&el.qubit, self.config.cooldown_cycles);
        Ok(shot)
    }

    /// Build the pulse program for the given walks.
    pub fn build_program(&self, sequences: &[RandomSequence]) -> BenchResult<Program> {
        if sequences.len() != self.config.num_sequences {
            return Err(BenchError::DimensionMismatch {
                context: "RB sequences",
                expected: self.config.num_sequences,
                actual: sequences.len(),
            });
        }

        let depths = self.config.depths();
        let mut program = Program::new("rb_1q");

        for sequence in sequences {
            for &depth in &depths {
                let shot = self.build_shot(&sequence.circuit(depth)?)?;
                for _ in 1..self.config.n_avg {
                    program.push_shot(shot.clone());
                }
                program.push_shot(shot);
            }
        }

        program.add_stream(
            StreamSpec::new(COUNTS_STREAM)
                .average_chunks(self.config.n_avg)
                .buffer(&[self.config.num_sequences, depths.len()])
                .save(RESULT_NAME),
        );

        debug!(
            "Built RB program: {} shots, {} instructions",
            program.num_shots(),
            program.num_instructions()
        );
        Ok(program)
    }

    /// Generate sequences, execute them on `runtime` and collect `res`.
    #[instrument(skip_all, fields(runtime = runtime.name()))]
    pub async fn run<R: ControlRuntime + ?Sized>(&self, runtime: &R) -> BenchResult<RbRun> {
        let sequences = self.generate_sequences();
        let program = self.build_program(&sequences)?;

        info!(
            "Running RB: {} sequences, max depth {}, {} shots",
            self.config.num_sequences,
            self.config.max_depth,
            program.num_shots()
        );

        let handles = runtime.execute(&program).await?;
        let res = handles.fetch_2d(RESULT_NAME)?;
        let depths = self.config.depths();

        if res.dim() != (sequences.len(), depths.len()) {
            return Err(BenchError::DimensionMismatch {
                context: "RB result",
                expected: sequences.len() * depths.len(),
                actual: res.len(),
            });
        }

        Ok(RbRun {
            sequences,
            depths,
            res,
            execution_time: handles.execution_time_ms.map(Duration::from_millis),
        })
    }
}

/// Outcome of an RB run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RbRun {
    /// The walks that were played, one per row of `res`.
    pub sequences: Vec<RandomSequence>,
    /// Depth of each column of `res`.
    pub depths: Vec<usize>,
    /// Survival indexed by (sequence index, depth index).
    pub res: Array2<f64>,
    pub execution_time: Option<Duration>,
}

impl RbRun {
    /// Sequence fidelity per depth, averaged over sequences.
    pub fn average_fidelity(&self) -> BenchResult<Array1<f64>> {
        self.res
            .mean_axis(Axis(0))
            .ok_or(BenchError::InsufficientData { needed: 1, got: 0 })
    }

    /// Fit the averaged curve with the default fit options.
    pub fn fit(&self) -> BenchResult<RbFit> {
        self.fit_with(&FitOptions::default())
    }

    pub fn fit_with(&self, options: &FitOptions) -> BenchResult<RbFit> {
        let fidelity = self.average_fidelity()?;
        let xs: Vec<f64> = self.depths.iter().map(|&d| d as f64).collect();
        let ys = fidelity.to_vec();
        let decay = fit_exponential_decay(&xs, &ys, options)?;
        Ok(RbFit::new(decay, 1, average_gates_per_clifford()))
    }
}

/// Create an RB benchmark result.
pub fn rb_result(fit: &RbFit, depths: &[usize]) -> BenchmarkResult {
    let r_c = fit.clifford_infidelity();
    let r_g = fit.gate_infidelity();
    let stdevs = fit.decay.stdevs();

    BenchmarkResult::new(
        format!("rb_{}q", fit.num_qubits),
        1.0 - r_c.value,
        "clifford_fidelity",
    )
    .with_metric("error_per_clifford", r_c.value)
    .with_metric("error_per_clifford_std", r_c.stdev)
    .with_metric("gate_infidelity", r_g.value)
    .with_metric("gate_infidelity_std", r_g.stdev)
    .with_metric("decay_parameter", fit.decay.p)
    .with_metric("decay_parameter_std", stdevs[2])
    .with_metric("amplitude", fit.decay.a)
    .with_metric("offset", fit.decay.b)
    .with_metric("num_qubits", u64::from(fit.num_qubits))
    .with_metric(
        "max_sequence_length",
        depths.last().copied().unwrap_or(0) as u64,
    )
}
