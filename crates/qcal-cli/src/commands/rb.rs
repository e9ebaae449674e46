//! Randomized benchmarking command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use serde_json::json;
use tracing::debug;

use qcal_bench::rb::rb_result;
use qcal_bench::{RbConfig, RbExperiment};

use super::common::{Noise, simulator, spinner, write_json};

/// Command-line overrides, applied on top of file and environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub max_depth: Option<usize>,
    pub delta_depth: Option<usize>,
    pub num_sequences: Option<usize>,
    pub n_avg: Option<usize>,
    pub seed: Option<u64>,
}

impl Overrides {
    fn apply(&self, mut config: RbConfig) -> RbConfig {
        if let Some(v) = self.max_depth {
            config.max_depth = v;
        }
        if let Some(v) = self.delta_depth {
            config.delta_depth = v;
        }
        if let Some(v) = self.num_sequences {
            config.num_sequences = v;
        }
        if let Some(v) = self.n_avg {
            config.n_avg = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
        config
    }
}

/// Execute the rb command.
pub async fn execute(
    config_path: Option<&str>,
    overrides: &Overrides,
    noise: Noise,
    export: Option<&str>,
) -> Result<()> {
    let config = RbConfig::load(config_path.map(Path::new)).context("Failed to load RB config")?;
    let config = overrides.apply(config);
    debug!("Effective RB config: {:?}", config);

    println!(
        "{} Randomized benchmarking: {} sequences, depths 1..={} step {}, n_avg {}",
        style("→").cyan().bold(),
        style(config.num_sequences).green(),
        style(config.max_depth).green(),
        config.delta_depth,
        config.n_avg
    );

    let experiment = RbExperiment::new(config)?;
    let runtime = simulator(noise)?;

    let spinner = spinner(&format!(
        "Running {} shots on the simulator...",
        experiment.config().num_shots()
    ));
    let run = experiment.run(&runtime).await;
    spinner.finish_and_clear();
    let run = run?;

    let fit = run.fit().context("Failed to fit the RB decay")?;
    let stdevs = fit.decay.stdevs();
    let error_rate = fit.error_rate();
    let r_c = fit.clifford_infidelity();
    let r_g = fit.gate_infidelity();

    println!("\n{}", style("Fitted parameters").bold());
    println!(
        "  A = {:.3} ({:.1e}), B = {:.3} ({:.1e}), p = {:.5} ({:.1e})",
        fit.decay.a, stdevs[0], fit.decay.b, stdevs[1], fit.decay.p, stdevs[2]
    );
    println!("  Covariance:");
    for row in &fit.decay.covariance {
        println!("    [{:>11.3e} {:>11.3e} {:>11.3e}]", row[0], row[1], row[2]);
    }

    println!("\n{}", style("Error rates").bold());
    println!(
        "  Error rate:              1-p = {:.2e} ({:.1e})",
        error_rate.value, error_rate.stdev
    );
    println!(
        "  Clifford set infidelity: r_c = {} ({:.1e})",
        style(format!("{:.2e}", r_c.value)).yellow(),
        r_c.stdev
    );
    println!(
        "  Gate infidelity:         r_g = {} ({:.1e})",
        style(format!("{:.2e}", r_g.value)).yellow(),
        r_g.stdev
    );

    let mut result = rb_result(&fit, &run.depths);
    if let Some(duration) = run.execution_time {
        result = result.with_duration(duration);
        println!("\n  Execution time: {} ms", style(duration.as_millis()).yellow());
    }

    if let Some(path) = export {
        let fidelity = run.average_fidelity()?;
        let report = json!({
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "result": result,
            "fit": fit,
            "depths": run.depths,
            "average_fidelity": fidelity.to_vec(),
            "res": run.res,
        });
        write_json(path, &report)?;
        println!(
            "\n{} Report written to {}",
            style("✓").green().bold(),
            style(path).green()
        );
    }

    Ok(())
}
