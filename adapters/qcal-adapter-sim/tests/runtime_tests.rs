use qcal_adapter_sim::{DeviceModel, OperationModel, RotationAxis, SimulatedRuntime};
use qcal_hal::{ControlRuntime, Program, Shot, StreamSpec};

/// Rabi-style program: one drive of increasing length per shot, repeated.
fn rabi_program(durations: &[u32], repetitions: usize) -> Program {
    let mut program = Program::new("rabi");
    for _ in 0..repetitions {
        for &t in durations {
            let mut shot = Shot::new();
            shot.play_for("q", "drive", t)
                .align()
                .measure("q", "read", "state");
            program.push_shot(shot);
        }
    }
    program.add_stream(
        StreamSpec::new("state")
            .boolean_to_int()
            .buffer(&[durations.len()])
            .average()
            .save("state"),
    );
    program
}

fn rabi_device() -> DeviceModel {
    DeviceModel::empty()
        .with_operation(
            "q",
            "drive",
            OperationModel::Drive {
                axis: RotationAxis::Y,
                rate: std::f64::consts::PI / 10.0,
            },
        )
        .with_operation(
            "q",
            "read",
            OperationModel::Readout {
                bright: qcal_adapter_sim::BrightState::Excited,
            },
        )
}

#[tokio::test]
async fn test_noiseless_rabi_populations() {
    let runtime = SimulatedRuntime::with_device(rabi_device());
    let results = runtime
        .execute(&rabi_program(&[0, 10, 20], 4))
        .await
        .unwrap();

    let state = results.fetch_1d("state").unwrap();
    // 0, π and 2π rotations.
    assert_eq!(state.to_vec(), vec![0.0, 1.0, 0.0]);
}

#[tokio::test]
async fn test_half_rotation_is_balanced() {
    let runtime = SimulatedRuntime::with_device(rabi_device().with_seed(3));
    let results = runtime.execute(&rabi_program(&[5], 2000)).await.unwrap();

    let p = results.fetch_1d("state").unwrap()[0];
    assert!((p - 0.5).abs() < 0.05, "p = {p}");
}

#[tokio::test]
async fn test_invalid_program_rejected() {
    let runtime = SimulatedRuntime::new();
    let empty = Program::new("empty");
    assert!(runtime.submit(&empty).await.is_err());
}
