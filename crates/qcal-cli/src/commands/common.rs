//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use qcal_adapter_sim::{DeviceModel, SimulatedRuntime};

/// Noise settings for the simulated device.
#[derive(Debug, Clone, Copy)]
pub struct Noise {
    pub gate_error: f64,
    pub readout_error: f64,
    pub seed: u64,
}

/// Create the simulated runtime used by experiment commands.
pub fn simulator(noise: Noise) -> Result<SimulatedRuntime> {
    for (name, p) in [
        ("gate error", noise.gate_error),
        ("readout error", noise.readout_error),
    ] {
        if !(0.0..=1.0).contains(&p) {
            anyhow::bail!("{name} must lie in [0, 1], got {p}");
        }
    }

    let device = DeviceModel::default()
        .with_gate_error(noise.gate_error)
        .with_readout_error(noise.readout_error)
        .with_seed(noise.seed);
    Ok(SimulatedRuntime::with_device(device))
}

/// Spinner shown while a job runs.
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Write `value` as pretty JSON to `path`.
pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize report")?;
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    fs::write(path, json).with_context(|| format!("Failed to write file: {path}"))
}
