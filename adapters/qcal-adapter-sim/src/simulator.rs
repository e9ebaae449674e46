//! Simulated control runtime.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use qcal_hal::{
    ControlRuntime, Instruction, Job, JobId, JobStatus, PollPolicy, Program, ResultHandles,
    RuntimeError, RuntimeResult, Shot,
};

use crate::bloch::BlochVector;
use crate::device::{BrightState, DeviceModel, OperationModel};

/// Job data for the simulator.
struct SimJob {
    job: Job,
    result: Option<ResultHandles>,
}

/// Local control runtime executing programs on a one-qubit Bloch model.
///
/// Programs run to completion inside `submit`; status polling therefore
/// finds every accepted job already terminal.
pub struct SimulatedRuntime {
    name: String,
    device: DeviceModel,
    /// Active jobs.
    jobs: Arc<Mutex<FxHashMap<String, SimJob>>>,
    rng: Mutex<StdRng>,
}

impl SimulatedRuntime {
    /// Create a noiseless simulator with the default device model.
    pub fn new() -> Self {
        Self::with_device(DeviceModel::default())
    }

    pub fn with_device(device: DeviceModel) -> Self {
        Self {
            name: "simulator".into(),
            rng: Mutex::new(StdRng::seed_from_u64(device.seed)),
            device,
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
        }
    }

    pub fn device(&self) -> &DeviceModel {
        &self.device
    }

    /// Snapshot of a job's bookkeeping record.
    pub fn job(&self, job_id: &JobId) -> Option<Job> {
        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        jobs.get(&job_id.0).map(|j| j.job.clone())
    }

    fn update_job(&self, job_id: &JobId, status: JobStatus, result: Option<ResultHandles>) {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(sim_job) = jobs.get_mut(&job_id.0) {
            sim_job.job = sim_job.job.clone().with_status(status);
            if sim_job.job.status.is_success() {
                sim_job.result = result;
            }
        }
    }

    /// Execute one shot from the reset state, appending saved values.
    fn run_shot<R: Rng>(
        &self,
        shot: &Shot,
        rng: &mut R,
        streams: &mut FxHashMap<String, Vec<f64>>,
    ) -> RuntimeResult<()> {
        let mut qubit = BlochVector::ground();

        for instruction in shot.instructions() {
            match instruction {
                Instruction::Play {
                    element,
                    operation,
                    duration,
                    amplitude,
                } => {
                    let amplitude = amplitude.unwrap_or(1.0);
                    match self.lookup(element, operation)? {
                        OperationModel::Rotation { axis, angle } => {
                            qubit.rotate(axis, angle * amplitude);
                            qubit.depolarize(self.device.gate_error);
                        }
                        OperationModel::Drive { axis, rate } => {
                            let cycles = duration.unwrap_or(self.device.default_pulse_cycles);
                            qubit.rotate(axis, rate * amplitude * f64::from(cycles));
                            qubit.depolarize(self.device.gate_error);
                        }
                        OperationModel::Reset => qubit.reset(),
                        OperationModel::Idle => {}
                        OperationModel::Readout { .. } => {
                            return Err(RuntimeError::InvalidProgram(format!(
                                "'{operation}' on '{element}' is a measurement and cannot be played"
                            )));
                        }
                    }
                }
                Instruction::Measure {
                    element,
                    operation,
                    stream,
                } => {
                    let OperationModel::Readout { bright } = self.lookup(element, operation)? else {
                        return Err(RuntimeError::InvalidProgram(format!(
                            "'{operation}' on '{element}' is not a measurement"
                        )));
                    };
                    let mut ground = qubit.measure(rng);
                    if rng.r#gen::<f64>() < self.device.readout_error {
                        ground = !ground;
                    }
                    let bright_seen = match bright {
                        BrightState::Ground => ground,
                        BrightState::Excited => !ground,
                    };
                    streams
                        .entry(stream.clone())
                        .or_default()
                        .push(if bright_seen { 1.0 } else { 0.0 });
                }
                Instruction::Save { stream, value } => {
                    streams.entry(stream.clone()).or_default().push(*value);
                }
                Instruction::Wait { .. } | Instruction::Align { .. } => {}
            }
        }
        Ok(())
    }

    fn lookup(&self, element: &str, operation: &str) -> RuntimeResult<OperationModel> {
        self.device
            .operation(element, operation)
            .ok_or_else(|| RuntimeError::UnknownOperation {
                element: element.to_string(),
                operation: operation.to_string(),
            })
    }

    /// Run all shots, then apply the program's stream processing.
    #[instrument(skip_all, fields(program = program.name()))]
    fn run_program(&self, program: &Program) -> RuntimeResult<ResultHandles> {
        let start = Instant::now();
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let mut streams: FxHashMap<String, Vec<f64>> = FxHashMap::default();

        for (i, shot) in program.shots().iter().enumerate() {
            self.run_shot(shot, &mut *rng, &mut streams)?;
            if i > 0 && i % 10_000 == 0 {
                debug!("Completed {} shots", i);
            }
        }

        let mut handles = ResultHandles::new();
        for spec in program.streams() {
            let values = streams.get(spec.source()).map_or(&[][..], Vec::as_slice);
            handles.insert(spec.name(), spec.process(values)?);
        }

        let elapsed = start.elapsed();
        debug!("Simulation completed in {:?}", elapsed);
        Ok(handles.with_execution_time(elapsed.as_millis() as u64))
    }
}

impl Default for SimulatedRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ControlRuntime for SimulatedRuntime {
    fn name(&self) -> &str {
        &self.name
    }

    fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: std::time::Duration::from_millis(10),
            max_polls: 10,
        }
    }

    #[instrument(skip(self, program), fields(program = program.name()))]
    async fn submit(&self, program: &Program) -> RuntimeResult<JobId> {
        program.validate()?;

        let job_id = JobId::new(Uuid::new_v4().to_string());
        let job = Job::new(job_id.clone(), program.name(), program.num_shots())
            .with_runtime(self.name.clone());

        {
            let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
            jobs.insert(job_id.0.clone(), SimJob { job, result: None });
        }
        debug!("Submitted job: {}", job_id);

        self.update_job(&job_id, JobStatus::Running, None);
        match self.run_program(program) {
            Ok(result) => {
                self.update_job(&job_id, JobStatus::Completed, Some(result));
                Ok(job_id)
            }
            Err(e) => {
                warn!("Job {} failed: {}", job_id, e);
                self.update_job(&job_id, JobStatus::Failed(e.to_string()), None);
                Err(e)
            }
        }
    }

    async fn status(&self, job_id: &JobId) -> RuntimeResult<JobStatus> {
        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        jobs.get(&job_id.0)
            .map(|j| j.job.status.clone())
            .ok_or_else(|| RuntimeError::JobNotFound(job_id.0.clone()))
    }

    /// Hands the results out once; the job record stays for `status`.
    async fn results(&self, job_id: &JobId) -> RuntimeResult<ResultHandles> {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        let sim_job = jobs
            .get_mut(&job_id.0)
            .ok_or_else(|| RuntimeError::JobNotFound(job_id.0.clone()))?;
        match &sim_job.job.status {
            JobStatus::Completed => sim_job
                .result
                .take()
                .ok_or_else(|| RuntimeError::ResultsTaken(job_id.0.clone())),
            JobStatus::Failed(msg) => Err(RuntimeError::JobFailed(msg.clone())),
            JobStatus::Cancelled => Err(RuntimeError::JobCancelled),
            JobStatus::Queued | JobStatus::Running => Err(RuntimeError::JobFailed(format!(
                "job {job_id} has not finished"
            ))),
        }
    }

    async fn cancel(&self, job_id: &JobId) -> RuntimeResult<()> {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(sim_job) = jobs.get_mut(&job_id.0) {
            sim_job.job = sim_job.job.clone().with_status(JobStatus::Cancelled);
            Ok(())
        } else {
            Err(RuntimeError::JobNotFound(job_id.0.clone()))
        }
    }
}
