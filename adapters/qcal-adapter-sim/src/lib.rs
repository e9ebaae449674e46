//! qcal Local Control-Runtime Simulator
//!
//! Executes [`qcal_hal::Program`]s without hardware, for testing and
//! development of calibration experiments. Each shot evolves a single
//! qubit as a Bloch vector starting from the ground state.
//!
//! # Features
//!
//! - **Device model**: maps `(element, operation)` pairs to rotations,
//!   drives, resets, idles and readouts
//! - **Noise**: depolarizing gate error and symmetric readout error
//! - **Reproducible**: measurement sampling uses a seeded RNG
//! - **Stream processing**: the program's stream pipelines are applied after
//!   the last shot
//!
//! # Example
//!
//! ```ignore
//! use qcal_adapter_sim::{DeviceModel, SimulatedRuntime};
//! use qcal_hal::ControlRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let device = DeviceModel::default().with_gate_error(1e-3).with_seed(7);
//!     let runtime = SimulatedRuntime::with_device(device);
//!
//!     let results = runtime.execute(&program).await?;
//!     println!("res = {:?}", results.fetch_2d("res")?);
//!     Ok(())
//! }
//! ```

mod bloch;
mod device;
mod simulator;

pub use bloch::{BlochVector, RotationAxis};
pub use device::{BrightState, DeviceModel, OperationModel};
pub use simulator::SimulatedRuntime;
