use opref::layout::DataFormat;
use opref::ops::conv_transpose::{
    validate_conv_transpose2d, ConvTranspose2dConfig, PaddingAlgorithm,
};
use opref::{conv_transpose2d, conv_transpose2d_gather, Element, OpError, Tensor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn random_tensor<T: Element>(dims: &[usize], seed: u64) -> Tensor<T> {
    let mut rng = StdRng::seed_from_u64(seed);
    let len = dims.iter().product();
    let data = (0..len).map(|_| T::from_f64(rng.gen::<f64>())).collect();
    Tensor::from_vec(dims, data).expect("random tensor")
}

fn assert_all_close<T: Element>(expected: &Tensor<T>, actual: &Tensor<T>, atol: f64, rtol: f64) {
    assert_eq!(expected.dims(), actual.dims(), "shape mismatch");
    for (idx, (e, a)) in expected.data().iter().zip(actual.data()).enumerate() {
        let (e, a) = (e.to_f64(), a.to_f64());
        let diff = (e - a).abs();
        let thresh = atol + rtol * e.abs().max(a.abs());
        assert!(
            diff <= thresh,
            "value mismatch at index {idx}: expected {e}, actual {a}, diff {diff}, thresh {thresh}"
        );
    }
}

#[test]
fn base_scenario_shape() {
    init_logging();
    let input = random_tensor::<f32>(&[2, 3, 5, 5], 1);
    let filter = random_tensor::<f32>(&[3, 6, 3, 3], 2);
    let out = conv_transpose2d(&input, &filter, &ConvTranspose2dConfig::new())
        .expect("conv_transpose2d");
    assert_eq!(out.dims(), &[2, 6, 7, 7]);
}

#[test]
fn hand_computed_overlap() {
    let input = Tensor::from_vec([1, 1, 2, 2], vec![1.0f64, 2.0, 3.0, 4.0]).expect("input");
    let filter = Tensor::<f64>::full([1, 1, 2, 2], 1.0);

    let out = conv_transpose2d(&input, &filter, &ConvTranspose2dConfig::new()).expect("stride 1");
    assert_eq!(
        out.data(),
        &[1.0, 3.0, 2.0, 4.0, 10.0, 6.0, 3.0, 7.0, 4.0]
    );

    let config = ConvTranspose2dConfig::new().with_strides([2, 2]);
    let out = conv_transpose2d(&input, &filter, &config).expect("stride 2");
    assert_eq!(out.dims(), &[1, 1, 4, 4]);
    assert_eq!(
        out.data(),
        &[
            1.0, 1.0, 2.0, 2.0, //
            1.0, 1.0, 2.0, 2.0, //
            3.0, 3.0, 4.0, 4.0, //
            3.0, 3.0, 4.0, 4.0,
        ]
    );
}

#[test]
fn dilation_spaces_out_taps() {
    let input = Tensor::from_vec([1, 1, 1, 1], vec![2.0f32]).expect("input");
    let filter = Tensor::from_vec([1, 1, 2, 2], vec![1.0f32, 2.0, 3.0, 4.0]).expect("filter");
    let config = ConvTranspose2dConfig::new().with_dilations([2, 2]);
    let out = conv_transpose2d(&input, &filter, &config).expect("dilated");
    assert_eq!(
        out.data(),
        &[2.0, 0.0, 4.0, 0.0, 0.0, 0.0, 6.0, 0.0, 8.0]
    );
}

#[test]
fn same_padding_ignores_requested_dilation() {
    let input = random_tensor::<f64>(&[2, 3, 6, 5], 3);
    let filter = random_tensor::<f64>(&[3, 6, 4, 3], 4);
    let dilated = ConvTranspose2dConfig::new()
        .with_strides([2, 1])
        .with_dilations([1, 2])
        .with_padding_algorithm(PaddingAlgorithm::Same);
    let plain = dilated.clone().with_dilations([1, 1]);

    let a = conv_transpose2d(&input, &filter, &dilated).expect("same, dilated");
    let b = conv_transpose2d(&input, &filter, &plain).expect("same, plain");
    assert_eq!(a.dims(), &[2, 6, 12, 5]);
    assert_eq!(a, b);
}

#[test]
fn valid_padding_resolves_to_zero() {
    let input = random_tensor::<f32>(&[2, 3, 5, 5], 5);
    let filter = random_tensor::<f32>(&[3, 6, 3, 3], 6);
    let valid = ConvTranspose2dConfig::new()
        .with_paddings([2, 1, 1, 2])
        .with_padding_algorithm(PaddingAlgorithm::Valid);
    let geometry = validate_conv_transpose2d(input.dims(), filter.dims(), &valid).expect("valid");
    assert_eq!(geometry.padding.as_hw_pairs(), [(0, 0), (0, 0)]);

    let unpadded = conv_transpose2d(&input, &filter, &ConvTranspose2dConfig::new()).expect("base");
    let out = conv_transpose2d(&input, &filter, &valid).expect("valid run");
    assert_eq!(out, unpadded);
}

#[test]
fn even_upsample_shapes() {
    let input = random_tensor::<f32>(&[2, 3, 7, 7], 7);
    let filter = random_tensor::<f32>(&[3, 6, 5, 5], 8);
    let base = ConvTranspose2dConfig::new()
        .with_strides([2, 2])
        .with_paddings([2, 2]);

    let sized = conv_transpose2d(&input, &filter, &base.clone().with_output_size([14, 14]))
        .expect("output_size");
    assert_eq!(sized.dims(), &[2, 6, 14, 14]);

    let padded = conv_transpose2d(&input, &filter, &base.clone().with_output_padding([1, 1]))
        .expect("output_padding");
    assert_eq!(padded.dims(), &[2, 6, 14, 14]);

    // Both runs crop the same window out of accumulators that differ only in a trailing zero row.
    assert_eq!(sized, padded);

    let natural = conv_transpose2d(&input, &filter, &base).expect("natural");
    assert_eq!(natural.dims(), &[2, 6, 13, 13]);
    for c in 0..6 {
        for y in 0..13 {
            for x in 0..13 {
                assert_eq!(sized.get(&[1, c, y, x]), natural.get(&[1, c, y, x]));
            }
        }
    }
}

#[test]
fn nhwc_matches_permuted_nchw() {
    let input = random_tensor::<f32>(&[2, 3, 5, 5], 9);
    let filter = random_tensor::<f32>(&[3, 6, 3, 3], 10);
    let config = ConvTranspose2dConfig::new()
        .with_strides([2, 2])
        .with_paddings([1, 0, 1, 2]);

    let nchw = conv_transpose2d(&input, &filter, &config).expect("nchw");
    let nhwc_input = input.permute(&DataFormat::PERM_NCHW_TO_NHWC).expect("permute");
    let nhwc = conv_transpose2d(
        &nhwc_input,
        &filter,
        &config.clone().with_data_format(DataFormat::Nhwc),
    )
    .expect("nhwc");

    assert_eq!(nhwc.dims(), &[2, 10, 8, 6]);
    assert_eq!(nhwc, nchw.permute(&DataFormat::PERM_NCHW_TO_NHWC).expect("permute"));
}

#[test]
fn groups_equal_concatenated_blocks() {
    let input = random_tensor::<f32>(&[2, 4, 5, 5], 11);
    let filter = random_tensor::<f32>(&[4, 3, 3, 3], 12);
    let grouped_config = ConvTranspose2dConfig::new()
        .with_groups(2)
        .with_paddings([1, 1])
        .with_strides([2, 1]);
    let grouped = conv_transpose2d(&input, &filter, &grouped_config).expect("grouped");
    assert_eq!(grouped.dims(), &[2, 6, 9, 5]);

    let single = grouped_config.clone().with_groups(1);
    let blocks: Vec<Tensor<f32>> = (0..2)
        .map(|g| {
            let x = input.narrow(1, g * 2, 2).expect("input block");
            let w = filter.narrow(0, g * 2, 2).expect("filter block");
            conv_transpose2d(&x, &w, &single).expect("block")
        })
        .collect();
    let joined = Tensor::concat(&[&blocks[0], &blocks[1]], 1).expect("concat");
    assert_eq!(joined, grouped);
}

#[test]
fn depthwise_groups_equal_channels() {
    let input = random_tensor::<f64>(&[2, 3, 5, 5], 13);
    let filter = random_tensor::<f64>(&[3, 6, 3, 3], 14);
    let config = ConvTranspose2dConfig::new().with_groups(3);
    let out = conv_transpose2d(&input, &filter, &config).expect("depthwise");
    assert_eq!(out.dims(), &[2, 18, 7, 7]);
}

#[test]
fn repeated_runs_are_bit_identical() {
    let input = random_tensor::<f32>(&[2, 3, 6, 5], 15);
    let filter = random_tensor::<f32>(&[3, 6, 4, 3], 16);
    let config = ConvTranspose2dConfig::new()
        .with_strides([2, 1])
        .with_dilations([1, 2])
        .with_paddings([1, 1]);
    let first = conv_transpose2d(&input, &filter, &config).expect("first");
    let second = conv_transpose2d(&input, &filter, &config).expect("second");
    let bits = |t: &Tensor<f32>| t.data().iter().map(|v| v.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&first), bits(&second));
}

#[test]
fn gather_agrees_with_scatter() {
    init_logging();
    let input = random_tensor::<f32>(&[2, 4, 5, 5], 17);
    let filter = random_tensor::<f32>(&[4, 3, 3, 3], 18);
    let configs = [
        ConvTranspose2dConfig::new().with_groups(2).with_paddings([1, 1]),
        ConvTranspose2dConfig::new()
            .with_strides([2, 2])
            .with_dilations([2, 1])
            .with_output_padding([1, 1]),
        ConvTranspose2dConfig::new()
            .with_padding_algorithm(PaddingAlgorithm::Same)
            .with_strides([2, 2])
            .with_data_format(DataFormat::Nhwc),
    ];
    for config in &configs {
        let input = match config.data_format {
            DataFormat::Nchw => input.clone(),
            DataFormat::Nhwc => input.permute(&DataFormat::PERM_NCHW_TO_NHWC).expect("permute"),
        };
        let scatter = conv_transpose2d(&input, &filter, config).expect("scatter");
        let gather = conv_transpose2d_gather(&input, &filter, config).expect("gather");
        assert_all_close(&scatter, &gather, 1e-5, 1e-5);
    }
}

#[test]
fn half_precision_tracks_double() {
    let input = random_tensor::<f64>(&[2, 3, 5, 5], 19);
    let filter = random_tensor::<f64>(&[3, 6, 3, 3], 20);
    let config = ConvTranspose2dConfig::new().with_paddings([1, 1]);
    let reference = conv_transpose2d(&input, &filter, &config).expect("f64");
    let half = conv_transpose2d(
        &input.cast::<half::f16>(),
        &filter.cast::<half::f16>(),
        &config,
    )
    .expect("f16");
    assert_all_close(&reference, &half.cast::<f64>(), 1e-2, 1e-2);
}

#[test]
fn invalid_arguments_are_reported() {
    let input = Tensor::<f32>::zeros([2, 3, 5, 5]);
    let filter = Tensor::<f32>::zeros([3, 6, 3, 3]);

    let narrow_filter = Tensor::<f32>::zeros([2, 6, 3, 3]);
    let err = conv_transpose2d(&input, &narrow_filter, &ConvTranspose2dConfig::new()).unwrap_err();
    assert!(matches!(err, OpError::ShapeMismatch(_)));

    let err = conv_transpose2d(&input, &filter, &ConvTranspose2dConfig::new().with_groups(2))
        .unwrap_err();
    assert!(matches!(err, OpError::ShapeMismatch(_)));

    let err = conv_transpose2d(
        &input,
        &filter,
        &ConvTranspose2dConfig::new().with_output_padding([1, 0]),
    )
    .unwrap_err();
    assert!(matches!(err, OpError::InvalidOutputPadding { axis: 0, .. }));

    let err = conv_transpose2d(
        &input,
        &filter,
        &ConvTranspose2dConfig::new().with_paddings([4, 4]),
    )
    .unwrap_err();
    assert!(matches!(err, OpError::NonPositiveOutput { axis: 0, .. }));

    assert_eq!(
        "NCWH".parse::<DataFormat>().unwrap_err(),
        OpError::InvalidLayout("NCWH".into())
    );
    assert_eq!(
        "same".parse::<PaddingAlgorithm>().unwrap_err(),
        OpError::InvalidPaddingAlgorithm("same".into())
    );
}
