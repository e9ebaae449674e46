//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - single-qubit calibration experiments",
        style("qcal").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qcal-hal          Pulse programs, stream processing, control runtimes");
    println!("  qcal-bench        Randomized benchmarking and bias-current sweeps");
    println!("  qcal-adapter-sim  Local Bloch-vector simulator");
    println!("  qcal-cli          Command-line interface");
    println!();
    println!(
        "Repository: {}",
        style("https://github.com/qcal-lab/qcal").underlined()
    );
    println!("License:    {}", style("Apache-2.0").dim());
}
