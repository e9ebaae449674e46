//! qcal Hardware Abstraction Layer
//!
//! This crate describes *what* a calibration experiment asks of the control
//! hardware, independent of the system that eventually plays the pulses:
//!
//! - [`Program`]: straight-line pulse programs made of [`Shot`]s
//! - [`StreamSpec`]: how saved values are reduced into named arrays
//! - [`ControlRuntime`]: the async job lifecycle (submit, poll, fetch)
//! - [`ResultHandles`]: the named result arrays of a finished job
//!
//! # Example: Running a Program
//!
//! ```ignore
//! use qcal_hal::{ControlRuntime, Program, Shot, StreamSpec};
//! use qcal_adapter_sim::SimulatedRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut program = Program::new("x180_check");
//!     for _ in 0..100 {
//!         let mut shot = Shot::new();
//!         shot.play("qubit", "x180").measure("readout", "readout", "state");
//!         program.push_shot(shot);
//!     }
//!     program.add_stream(StreamSpec::new("state").average().save("p0"));
//!
//!     let runtime = SimulatedRuntime::new();
//!     let results = runtime.execute(&program).await?;
//!     println!("P(|0>) = {}", results.get("p0")?);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod job;
pub mod program;
pub mod result;
pub mod runtime;
pub mod stream;

pub use error::{RuntimeError, RuntimeResult};
pub use job::{Job, JobId, JobStatus};
pub use program::{CLOCK_CYCLE_NS, Instruction, Program, Shot, ns_to_cycles};
pub use result::ResultHandles;
pub use runtime::{ControlRuntime, PollPolicy};
pub use stream::{SaveMode, StreamSpec, StreamStage};
