//! qcal Command-Line Interface
//!
//! Runs single-qubit calibration experiments on the local simulated
//! control runtime.
//!
//! ```text
//! qcal rb --max-depth 100 --num-sequences 50 --gate-error 1e-3
//! qcal sequence --seed 345324 --depth 10
//! qcal sweep --repetitions 3 --export sweep.json
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Args, Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{rb, sequence, sweep, version};

/// qcal - single-qubit calibration experiments
#[derive(Parser)]
#[command(name = "qcal")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Noise parameters of the simulated device.
#[derive(Args, Clone, Copy)]
struct SimArgs {
    /// Depolarizing error per physical pulse
    #[arg(long, default_value = "0.0")]
    gate_error: f64,

    /// Readout assignment error
    #[arg(long, default_value = "0.0")]
    readout_error: f64,

    /// Seed of the simulator's measurement RNG
    #[arg(long, default_value = "0")]
    sim_seed: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Run single-qubit randomized benchmarking and fit the decay
    Rb {
        /// YAML configuration file
        #[arg(short, long, env = "QCAL_RB_CONFIG")]
        config: Option<String>,

        /// Deepest sequence
        #[arg(long)]
        max_depth: Option<usize>,

        /// Step between depths
        #[arg(long)]
        delta_depth: Option<usize>,

        /// Number of random sequences
        #[arg(long)]
        num_sequences: Option<usize>,

        /// Repetitions averaged per point
        #[arg(long)]
        n_avg: Option<usize>,

        /// Seed of the sequence generator
        #[arg(long)]
        seed: Option<u64>,

        #[command(flatten)]
        sim: SimArgs,

        /// Output file for the JSON report
        #[arg(short, long)]
        export: Option<String>,
    },

    /// Print one random sequence and its inverse-tracking list as JSON
    Sequence {
        /// Generator seed
        #[arg(short, long, default_value = "345324")]
        seed: u64,

        /// Maximum depth
        #[arg(short, long, default_value = "100")]
        depth: usize,
    },

    /// Run the SFQ bias-current Rabi sweep
    Sweep {
        /// Repetitions averaged per grid point
        #[arg(short, long, default_value = "3")]
        repetitions: usize,

        /// Maximum pulse duration in clock cycles
        #[arg(long, default_value = "125")]
        max_duration: u32,

        #[command(flatten)]
        sim: SimArgs,

        /// Output file for the result arrays (JSON)
        #[arg(short, long)]
        export: Option<String>,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Rb {
            config,
            max_depth,
            delta_depth,
            num_sequences,
            n_avg,
            seed,
            sim,
            export,
        } => {
            let overrides = rb::Overrides {
                max_depth,
                delta_depth,
                num_sequences,
                n_avg,
                seed,
            };
            rb::execute(
                config.as_deref(),
                &overrides,
                sim.into(),
                export.as_deref(),
            )
            .await
        }

        Commands::Sequence { seed, depth } => sequence::execute(seed, depth),

        Commands::Sweep {
            repetitions,
            max_duration,
            sim,
            export,
        } => sweep::execute(repetitions, max_duration, sim.into(), export.as_deref()).await,

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}

impl From<SimArgs> for commands::common::Noise {
    fn from(args: SimArgs) -> Self {
        Self {
            gate_error: args.gate_error,
            readout_error: args.readout_error,
            seed: args.sim_seed,
        }
    }
}
