//! Sequence command implementation.

use anyhow::Result;
use serde_json::json;

use qcal_bench::SequenceGenerator;

/// Execute the sequence command.
pub fn execute(seed: u64, depth: usize) -> Result<()> {
    let generator = SequenceGenerator::clifford()?;
    let walk = generator.generate_seeded(depth, seed);

    let report = json!({
        "seed": seed,
        "max_depth": depth,
        "sequence": walk.sequence(),
        "inverse_gate": walk.inverse_gate(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
