//! Bias-current sweep command implementation.

use anyhow::Result;
use console::style;

use qcal_bench::{BiasSweep, BiasSweepConfig};

use super::common::{Noise, simulator, spinner, write_json};

/// Execute the sweep command.
pub async fn execute(
    repetitions: usize,
    max_duration: u32,
    noise: Noise,
    export: Option<&str>,
) -> Result<()> {
    let config = BiasSweepConfig {
        repetitions,
        max_duration,
        ..BiasSweepConfig::default()
    };
    let sweep = BiasSweep::new(config)?;
    let cfg = sweep.config();

    println!(
        "{} Bias sweep: {} currents ({:.1} µA to {:.1} µA) x {} durations, {} repetitions",
        style("→").cyan().bold(),
        style(cfg.num_voltages()).green(),
        cfg.min_current * 1e6,
        cfg.critical_current * 1e6,
        style(cfg.num_durations()).green(),
        cfg.repetitions
    );

    let runtime = simulator(noise)?;
    let spinner = spinner("Running sweep on the simulator...");
    let result = sweep.run(&runtime).await;
    spinner.finish_and_clear();
    let result = result?;

    let contrast = result.rabi_contrast();
    let mean_contrast = contrast.mean().unwrap_or(0.0);
    println!(
        "\n{} State map {:?}, mean Rabi contrast {:.3}",
        style("✓").green().bold(),
        result.state.dim(),
        mean_contrast
    );
    if let Some(best) = result.best_current() {
        println!(
            "  Largest contrast at I_b = {} µA",
            style(format!("{:.1}", best * 1e6)).yellow()
        );
    }

    if let Some(path) = export {
        write_json(path, &result)?;
        println!(
            "\n{} Result arrays written to {}",
            style("✓").green().bold(),
            style(path).green()
        );
    }

    Ok(())
}
