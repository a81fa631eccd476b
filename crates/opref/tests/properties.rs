use opref::layout::DataFormat;
use opref::ops::conv_transpose::{
    validate_conv_transpose2d, ConvTranspose2dConfig, PaddingAlgorithm,
};
use opref::{conv_transpose2d, conv_transpose2d_gather, OpError, Tensor};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Case {
    input: [usize; 4],
    filter: [usize; 4],
    config: ConvTranspose2dConfig,
}

fn case() -> impl Strategy<Value = Case> {
    (
        (1usize..3, 1usize..4, 1usize..4, 1usize..4),
        (1usize..6, 1usize..6, 1usize..4, 1usize..4),
        (1usize..4, 1usize..4, 1usize..3, 1usize..3),
        proptest::array::uniform4(0usize..3),
        (0usize..3, 0usize..3),
    )
        .prop_map(
            |((n, groups, c_pg, oc_pg), (h, w, kh, kw), (sh, sw, dh, dw), pads, (oph, opw))| {
                let c_in = groups * c_pg;
                Case {
                    input: [n, c_in, h, w],
                    filter: [c_in, oc_pg, kh, kw],
                    config: ConvTranspose2dConfig::new()
                        .with_groups(groups)
                        .with_strides([sh, sw])
                        .with_dilations([dh, dw])
                        .with_paddings(pads)
                        .with_output_padding([oph % sh, opw % sw]),
                }
            },
        )
}

fn ramp(dims: [usize; 4], scale: f64) -> Tensor<f64> {
    let len = dims.iter().product();
    let data = (0..len).map(|i| ((i % 11) as f64 - 5.0) * scale).collect();
    Tensor::from_vec(dims, data).expect("ramp")
}

proptest! {
    #[test]
    fn output_shape_follows_extent_formula(case in case()) {
        let Case { input, filter, config } = case;
        let edges = config.paddings.edges();
        let output_padding = config.output_padding.unwrap_or([0, 0]);
        let mut expected = [0i64; 2];
        for axis in 0..2 {
            let effective = config.dilations[axis] * (filter[2 + axis] - 1) + 1;
            let pre_crop = (input[2 + axis] - 1) * config.strides[axis] + effective;
            expected[axis] = pre_crop as i64 + output_padding[axis] as i64
                - edges[2 * axis] as i64
                - edges[2 * axis + 1] as i64;
        }

        match validate_conv_transpose2d(&input, &filter, &config) {
            Ok(geometry) => {
                prop_assert!(expected.iter().all(|&e| e > 0));
                prop_assert_eq!(
                    geometry.output_dims(),
                    [input[0], filter[1] * config.groups, expected[0] as usize, expected[1] as usize]
                );
            }
            Err(OpError::NonPositiveOutput { axis, .. }) => {
                prop_assert!(expected[axis] <= 0);
            }
            Err(other) => prop_assert!(false, "unexpected error {other}"),
        }
    }

    #[test]
    fn valid_never_pads(case in case()) {
        let config = case.config.with_padding_algorithm(PaddingAlgorithm::Valid);
        let geometry = validate_conv_transpose2d(&case.input, &case.filter, &config)
            .expect("unpadded extents are always positive");
        prop_assert_eq!(geometry.padding.as_hw_pairs(), [(0, 0), (0, 0)]);
        prop_assert_eq!(geometry.dilations, config.dilations);
    }

    #[test]
    fn same_resets_dilation(case in case()) {
        let config = case
            .config
            .with_padding_algorithm(PaddingAlgorithm::Same)
            .with_output_padding([0, 0]);
        if let Ok(geometry) = validate_conv_transpose2d(&case.input, &case.filter, &config) {
            prop_assert_eq!(geometry.dilations, [1, 1]);
        }
    }

    #[test]
    fn layout_round_trip_and_determinism(case in case()) {
        let Case { input, filter, config } = case;
        prop_assume!(validate_conv_transpose2d(&input, &filter, &config).is_ok());
        let x = ramp(input, 0.25);
        let w = ramp(filter, 0.5);

        let nchw = conv_transpose2d(&x, &w, &config).expect("nchw");
        let again = conv_transpose2d(&x, &w, &config).expect("nchw again");
        prop_assert_eq!(&nchw, &again);

        let nhwc_config = config.clone().with_data_format(DataFormat::Nhwc);
        let x_nhwc = x.permute(&DataFormat::PERM_NCHW_TO_NHWC).expect("permute");
        let nhwc = conv_transpose2d(&x_nhwc, &w, &nhwc_config).expect("nhwc");
        prop_assert_eq!(nhwc, nchw.permute(&DataFormat::PERM_NCHW_TO_NHWC).expect("permute"));

        // Quarter-step inputs keep every partial sum exact, so both formulations agree exactly.
        let gathered = conv_transpose2d_gather(&x, &w, &config).expect("gather");
        prop_assert_eq!(gathered, nchw);
    }
}
