//! CLI command parsing and configuration tests.
//!
//! The CLI is a binary crate, so parsing is checked against mirrored clap
//! structs and configuration loading goes through `qcal_bench` directly.

// ============================================================================
// Configuration loading
// ============================================================================

mod config_loading {
    use std::io::Write;

    use qcal_bench::{RbConfig, RbExperiment};

    #[test]
    fn test_load_defaults_without_file() {
        let config = RbConfig::default();
        assert_eq!(config.max_depth, 100);
        assert_eq!(config.num_sequences, 50);
        assert_eq!(config.seed, 345_324);
    }

    #[test]
    fn test_load_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_depth: 12\nnum_sequences: 3\nn_avg: 2").unwrap();

        let config = RbConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_depth, 12);
        assert_eq!(config.num_sequences, 3);
        assert_eq!(config.n_avg, 2);
        assert_eq!(config.delta_depth, 1);

        let experiment = RbExperiment::new(config).unwrap();
        assert_eq!(experiment.config().num_shots(), 12 * 3 * 2);
    }

    #[test]
    fn test_load_missing_file() {
        let result = RbConfig::from_file(std::path::Path::new("/nonexistent/rb.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_depth: [not, a, number]").unwrap();
        assert!(RbConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_load_rejects_zero_depth() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_depth: 0").unwrap();
        assert!(RbConfig::from_file(file.path()).is_err());
    }
}

// ============================================================================
// Clap argument parsing (test via try_parse_from on equivalent structs)
// ============================================================================

mod clap_parsing {
    use clap::{Args, Parser, Subcommand};

    // Mirror the CLI struct for testing (since main.rs is a binary)
    #[derive(Parser)]
    #[command(name = "qcal")]
    struct TestCli {
        #[arg(short, long, action = clap::ArgAction::Count, global = true)]
        verbose: u8,

        #[command(subcommand)]
        command: TestCommands,
    }

    #[derive(Args, Clone, Copy)]
    struct TestSimArgs {
        #[arg(long, default_value = "0.0")]
        gate_error: f64,
        #[arg(long, default_value = "0.0")]
        readout_error: f64,
        #[arg(long, default_value = "0")]
        sim_seed: u64,
    }

    #[derive(Subcommand)]
    enum TestCommands {
        Rb {
            #[arg(short, long)]
            config: Option<String>,
            #[arg(long)]
            max_depth: Option<usize>,
            #[arg(long)]
            delta_depth: Option<usize>,
            #[arg(long)]
            num_sequences: Option<usize>,
            #[arg(long)]
            n_avg: Option<usize>,
            #[arg(long)]
            seed: Option<u64>,
            #[command(flatten)]
            sim: TestSimArgs,
            #[arg(short, long)]
            export: Option<String>,
        },
        Sequence {
            #[arg(short, long, default_value = "345324")]
            seed: u64,
            #[arg(short, long, default_value = "100")]
            depth: usize,
        },
        Sweep {
            #[arg(short, long, default_value = "3")]
            repetitions: usize,
            #[arg(long, default_value = "125")]
            max_duration: u32,
            #[command(flatten)]
            sim: TestSimArgs,
            #[arg(short, long)]
            export: Option<String>,
        },
        Version,
    }

    // --- rb ---

    #[test]
    fn test_rb_defaults() {
        let cli = TestCli::try_parse_from(["qcal", "rb"]).unwrap();
        match cli.command {
            TestCommands::Rb {
                config,
                max_depth,
                seed,
                sim,
                export,
                ..
            } => {
                assert!(config.is_none());
                assert!(max_depth.is_none());
                assert!(seed.is_none());
                assert_eq!(sim.gate_error, 0.0);
                assert_eq!(sim.readout_error, 0.0);
                assert_eq!(sim.sim_seed, 0);
                assert!(export.is_none());
            }
            _ => panic!("Expected Rb command"),
        }
    }

    #[test]
    fn test_rb_all_flags() {
        let cli = TestCli::try_parse_from([
            "qcal",
            "rb",
            "-c",
            "rb.yaml",
            "--max-depth",
            "60",
            "--delta-depth",
            "2",
            "--num-sequences",
            "10",
            "--n-avg",
            "40",
            "--seed",
            "7",
            "--gate-error",
            "0.001",
            "--readout-error",
            "0.02",
            "--sim-seed",
            "99",
            "-e",
            "report.json",
        ])
        .unwrap();
        match cli.command {
            TestCommands::Rb {
                config,
                max_depth,
                delta_depth,
                num_sequences,
                n_avg,
                seed,
                sim,
                export,
            } => {
                assert_eq!(config.as_deref(), Some("rb.yaml"));
                assert_eq!(max_depth, Some(60));
                assert_eq!(delta_depth, Some(2));
                assert_eq!(num_sequences, Some(10));
                assert_eq!(n_avg, Some(40));
                assert_eq!(seed, Some(7));
                assert!((sim.gate_error - 0.001).abs() < 1e-15);
                assert!((sim.readout_error - 0.02).abs() < 1e-15);
                assert_eq!(sim.sim_seed, 99);
                assert_eq!(export.as_deref(), Some("report.json"));
            }
            _ => panic!("Expected Rb command"),
        }
    }

    #[test]
    fn test_rb_rejects_negative_depth() {
        let result = TestCli::try_parse_from(["qcal", "rb", "--max-depth", "-3"]);
        assert!(result.is_err());
    }

    // --- sequence ---

    #[test]
    fn test_sequence_defaults() {
        let cli = TestCli::try_parse_from(["qcal", "sequence"]).unwrap();
        match cli.command {
            TestCommands::Sequence { seed, depth } => {
                assert_eq!(seed, 345_324);
                assert_eq!(depth, 100);
            }
            _ => panic!("Expected Sequence command"),
        }
    }

    #[test]
    fn test_sequence_short_flags() {
        let cli = TestCli::try_parse_from(["qcal", "sequence", "-s", "1", "-d", "5"]).unwrap();
        match cli.command {
            TestCommands::Sequence { seed, depth } => {
                assert_eq!(seed, 1);
                assert_eq!(depth, 5);
            }
            _ => panic!("Expected Sequence command"),
        }
    }

    // --- sweep ---

    #[test]
    fn test_sweep_defaults() {
        let cli = TestCli::try_parse_from(["qcal", "sweep"]).unwrap();
        match cli.command {
            TestCommands::Sweep {
                repetitions,
                max_duration,
                export,
                ..
            } => {
                assert_eq!(repetitions, 3);
                assert_eq!(max_duration, 125);
                assert!(export.is_none());
            }
            _ => panic!("Expected Sweep command"),
        }
    }

    #[test]
    fn test_sweep_with_noise() {
        let cli = TestCli::try_parse_from([
            "qcal",
            "sweep",
            "-r",
            "5",
            "--max-duration",
            "50",
            "--gate-error",
            "0.01",
            "-e",
            "sweep.json",
        ])
        .unwrap();
        match cli.command {
            TestCommands::Sweep {
                repetitions,
                max_duration,
                sim,
                export,
            } => {
                assert_eq!(repetitions, 5);
                assert_eq!(max_duration, 50);
                assert!((sim.gate_error - 0.01).abs() < 1e-15);
                assert_eq!(export.as_deref(), Some("sweep.json"));
            }
            _ => panic!("Expected Sweep command"),
        }
    }

    // --- version / verbosity ---

    #[test]
    fn test_version() {
        let cli = TestCli::try_parse_from(["qcal", "version"]).unwrap();
        assert!(matches!(cli.command, TestCommands::Version));
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_verbose_levels() {
        let cli = TestCli::try_parse_from(["qcal", "-v", "version"]).unwrap();
        assert_eq!(cli.verbose, 1);
        let cli = TestCli::try_parse_from(["qcal", "-vv", "version"]).unwrap();
        assert_eq!(cli.verbose, 2);
        let cli = TestCli::try_parse_from(["qcal", "rb", "-vvv"]).unwrap();
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn test_missing_subcommand() {
        assert!(TestCli::try_parse_from(["qcal"]).is_err());
    }

    #[test]
    fn test_unknown_subcommand() {
        assert!(TestCli::try_parse_from(["qcal", "calibrate"]).is_err());
    }
}
