//! End-to-end experiment runs on the simulated runtime.

use qcal_adapter_sim::{DeviceModel, SimulatedRuntime};
use qcal_bench::rb::rb_result;
use qcal_bench::{BiasSweep, BiasSweepConfig, RbConfig, RbExperiment};

#[tokio::test]
async fn test_noiseless_rb_survives_at_every_depth() {
    let config = RbConfig {
        max_depth: 30,
        delta_depth: 3,
        num_sequences: 5,
        n_avg: 2,
        ..RbConfig::default()
    };
    let experiment = RbExperiment::new(config).unwrap();
    let run = experiment.run(&SimulatedRuntime::new()).await.unwrap();

    assert_eq!(run.res.dim(), (5, 10));
    assert_eq!(run.depths[..3], [1, 4, 7]);
    assert!(run.res.iter().all(|&v| v == 1.0));
    assert_eq!(run.sequences.len(), 5);
}

#[tokio::test]
async fn test_noisy_rb_decays_and_fits() {
    let config = RbConfig {
        max_depth: 60,
        delta_depth: 2,
        num_sequences: 10,
        n_avg: 40,
        ..RbConfig::default()
    };
    let device = DeviceModel::default().with_gate_error(0.01).with_seed(2024);
    let runtime = SimulatedRuntime::with_device(device);

    let run = RbExperiment::new(config).unwrap().run(&runtime).await.unwrap();
    let fidelity = run.average_fidelity().unwrap();
    assert!(fidelity[0] > fidelity[fidelity.len() - 1] + 0.1);

    let fit = run.fit().unwrap();
    assert!(fit.decay.p > 0.95 && fit.decay.p < 1.0, "p = {}", fit.decay.p);
    assert!(fit.gate_infidelity().value > 0.0);

    let result = rb_result(&fit, &run.depths);
    assert_eq!(result.metrics["max_sequence_length"], 59);
    let json = serde_json::to_string(&result).unwrap();
    assert!(json.contains("gate_infidelity"));
}

#[tokio::test]
async fn test_noiseless_rb_fit_returns_parameters() {
    let config = RbConfig {
        max_depth: 20,
        num_sequences: 3,
        ..RbConfig::default()
    };
    let run = RbExperiment::new(config)
        .unwrap()
        .run(&SimulatedRuntime::new())
        .await
        .unwrap();

    let fit = run.fit().unwrap();
    for &m in &run.depths {
        let f = fit.decay.model(m as f64);
        assert!((f - 1.0).abs() < 1e-3, "F({m}) = {f}");
    }
    let rb = rb_result(&fit, &run.depths);
    assert_eq!(rb.metrics["max_sequence_length"], 20);
}

#[tokio::test]
async fn test_weak_noise_rb_fit_with_default_config() {
    let device = DeviceModel::default().with_gate_error(1e-3).with_seed(7);
    let runtime = SimulatedRuntime::with_device(device);

    let run = RbExperiment::new(RbConfig::default())
        .unwrap()
        .run(&runtime)
        .await
        .unwrap();
    let fit = run.fit().unwrap();

    assert!(fit.decay.p > 0.9 && fit.decay.p <= 1.0 + 1e-3, "p = {}", fit.decay.p);
    assert!(fit.decay.a.is_finite() && fit.decay.b.is_finite());
    let fidelity = run.average_fidelity().unwrap();
    let mean_residual = run
        .depths
        .iter()
        .zip(fidelity.iter())
        .map(|(&m, &y)| (fit.decay.model(m as f64) - y).abs())
        .sum::<f64>()
        / run.depths.len() as f64;
    assert!(mean_residual < 0.05, "mean residual {mean_residual}");
}

#[tokio::test]
async fn test_rb_is_reproducible() {
    let config = RbConfig {
        max_depth: 10,
        num_sequences: 3,
        ..RbConfig::default()
    };
    let device = DeviceModel::default().with_gate_error(0.05).with_seed(5);
    let experiment = RbExperiment::new(config).unwrap();

    let a = experiment
        .run(&SimulatedRuntime::with_device(device.clone()))
        .await
        .unwrap();
    let b = experiment
        .run(&SimulatedRuntime::with_device(device))
        .await
        .unwrap();
    assert_eq!(a.res, b.res);
    assert_eq!(a.sequences, b.sequences);
}

#[tokio::test]
async fn test_bias_sweep_shapes() {
    let config = BiasSweepConfig {
        repetitions: 2,
        ..BiasSweepConfig::default()
    };
    let sweep = BiasSweep::new(config).unwrap();
    let result = sweep.run(&SimulatedRuntime::new()).await.unwrap();

    assert_eq!(result.currents.len(), 40);
    assert_eq!(result.durations.len(), 125);
    assert_eq!(result.state.dim(), (40, 125));
    assert!((result.currents[0] - 90e-6).abs() < 1e-12);
    assert_eq!(result.durations[19], 19.0);

    // Zero-length pulse leaves the qubit in the ground state.
    assert!(result.state.column(0).iter().all(|&v| v == 0.0));
    assert!(result.state.iter().all(|&v| (0.0..=1.0).contains(&v)));
    // Every bias point drives through a π rotation within 125 cycles.
    assert!(result.rabi_contrast().iter().all(|&c| c > 0.5));
}

#[tokio::test]
async fn test_rb_config_from_yaml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rb.yaml");
    std::fs::write(
        &path,
        "max_depth: 8\nnum_sequences: 2\nn_avg: 3\nseed: 11\n",
    )
    .unwrap();

    let config = RbConfig::from_file(&path).unwrap();
    let run = RbExperiment::new(config)
        .unwrap()
        .run(&SimulatedRuntime::new())
        .await
        .unwrap();
    assert_eq!(run.res.dim(), (2, 8));
}
