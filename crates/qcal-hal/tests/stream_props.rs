//! Property-based tests for stream processing.

use proptest::prelude::*;
use qcal_hal::StreamSpec;

proptest! {
    /// Chunk-averaging then buffering always yields the buffer shape and
    /// keeps every entry inside the range of the input values.
    #[test]
    fn averaged_buffer_has_requested_shape(
        rows in 1_usize..6,
        cols in 1_usize..8,
        n_avg in 1_usize..4,
        seed_values in prop::collection::vec(0.0_f64..1.0, 1..200),
    ) {
        let needed = rows * cols * n_avg;
        let values: Vec<f64> = seed_values.iter().copied().cycle().take(needed).collect();

        let res = StreamSpec::new("counts")
            .average_chunks(n_avg)
            .buffer(&[rows, cols])
            .save("res")
            .process(&values)
            .unwrap();

        prop_assert_eq!(res.shape(), &[rows, cols]);
        prop_assert!(res.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    /// Averaging boolean buffers across repetitions produces fractions in [0, 1].
    #[test]
    fn averaged_booleans_are_fractions(
        reps in 1_usize..5,
        len in 1_usize..10,
        bits in prop::collection::vec(any::<bool>(), 1..100),
    ) {
        let values: Vec<f64> = bits
            .iter()
            .map(|b| if *b { 1.0 } else { 0.0 })
            .cycle()
            .take(reps * len)
            .collect();

        let res = StreamSpec::new("state")
            .boolean_to_int()
            .buffer(&[len])
            .average()
            .save("state")
            .process(&values)
            .unwrap();

        prop_assert_eq!(res.len(), len);
        prop_assert!(res.iter().all(|v| (0.0..=1.0).contains(v)));
    }
}
