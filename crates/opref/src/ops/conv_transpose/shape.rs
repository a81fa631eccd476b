//! Argument validation and output extent calculation.

use super::config::ConvTranspose2dConfig;
use super::padding::{resolve_padding, Padding2d};
use crate::error::{OpError, Result};

/// Everything the kernels need once the arguments are known to be consistent.
///
/// All dims are in NCHW order regardless of the caller's layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvTranspose2dGeometry {
    pub batch: usize,
    pub c_in: usize,
    pub input_hw: [usize; 2],
    pub groups: usize,
    pub c_in_per_group: usize,
    pub c_out_per_group: usize,
    pub c_out: usize,
    pub kernel: [usize; 2],
    pub strides: [usize; 2],
    /// Dilation after padding resolution.
    pub dilations: [usize; 2],
    pub padding: Padding2d,
    pub output_padding: [usize; 2],
    /// Spatial extent before cropping and before `output_padding`.
    pub pre_crop: [usize; 2],
    /// Final spatial extent.
    pub output_hw: [usize; 2],
}

impl ConvTranspose2dGeometry {
    /// Spatial size of the zeroed buffer the scatter pass writes into.
    pub fn accumulator_hw(&self) -> [usize; 2] {
        [
            self.pre_crop[0] + self.output_padding[0],
            self.pre_crop[1] + self.output_padding[1],
        ]
    }

    pub fn output_dims(&self) -> [usize; 4] {
        [self.batch, self.c_out, self.output_hw[0], self.output_hw[1]]
    }
}

/// Validates NCHW input and filter dims against `config` and derives the output geometry.
pub fn validate_conv_transpose2d(
    input_dims: &[usize],
    filter_dims: &[usize],
    config: &ConvTranspose2dConfig,
) -> Result<ConvTranspose2dGeometry> {
    let input = rank4("conv_transpose2d input", input_dims)?;
    let filter = rank4("conv_transpose2d filter", filter_dims)?;
    let [batch, c_in, in_h, in_w] = input;
    let [f_c_in, c_out_per_group, k_h, k_w] = filter;

    if input.contains(&0) {
        return Err(OpError::invalid_argument(format!(
            "conv_transpose2d input dims must be positive, got {input:?}"
        )));
    }
    if filter.contains(&0) {
        return Err(OpError::invalid_argument(format!(
            "conv_transpose2d filter dims must be positive, got {filter:?}"
        )));
    }
    if config.strides.contains(&0) {
        return Err(OpError::invalid_argument(format!(
            "conv_transpose2d strides must be positive, got {:?}",
            config.strides
        )));
    }
    if config.dilations.contains(&0) {
        return Err(OpError::invalid_argument(format!(
            "conv_transpose2d dilations must be positive, got {:?}",
            config.dilations
        )));
    }
    if config.groups == 0 {
        return Err(OpError::invalid_argument("conv_transpose2d groups must be > 0"));
    }

    if f_c_in != c_in {
        return Err(OpError::shape_mismatch(format!(
            "filter input channels {f_c_in} must equal input channels {c_in} (filter {filter:?}, input {input:?})"
        )));
    }
    let groups = config.groups;
    if c_in % groups != 0 {
        return Err(OpError::shape_mismatch(format!(
            "input channels {c_in} must be divisible by groups {groups}"
        )));
    }

    let output_padding = config.output_padding.unwrap_or([0, 0]);
    for axis in 0..2 {
        if output_padding[axis] >= config.strides[axis] {
            return Err(OpError::InvalidOutputPadding {
                axis,
                value: output_padding[axis],
                stride: config.strides[axis],
            });
        }
    }

    let kernel = [k_h, k_w];
    let resolved = resolve_padding(
        config.padding_algorithm,
        config.paddings,
        [in_h, in_w],
        kernel,
        config.strides,
        config.dilations,
    );
    let pads = resolved.padding.as_hw_pairs();

    let mut pre_crop = [0usize; 2];
    let mut output_hw = [0usize; 2];
    for axis in 0..2 {
        let (pad_before, pad_after) = pads[axis];
        let footprint = scatter_extent(
            [in_h, in_w][axis],
            kernel[axis],
            config.strides[axis],
            resolved.dilations[axis],
        )?;
        let non_positive = |pre_crop: usize| OpError::NonPositiveOutput {
            axis,
            pre_crop,
            pad_before,
            pad_after,
            output_padding: output_padding[axis],
        };
        let pad_total = pad_before
            .checked_add(pad_after)
            .ok_or_else(|| non_positive(footprint))?;
        let extent = match config.output_size {
            Some(size) => {
                let requested = size[axis].checked_add(pad_total).ok_or_else(|| {
                    OpError::invalid_argument("conv_transpose2d output_size overflow")
                })?;
                if requested < footprint {
                    return Err(OpError::OutputSizeTooSmall {
                        axis,
                        requested: size[axis],
                        footprint: footprint.saturating_sub(pad_total),
                    });
                }
                requested
            }
            None => footprint,
        };
        let padded = extent
            .checked_add(output_padding[axis])
            .ok_or_else(|| OpError::invalid_argument("conv_transpose2d output extent overflow"))?;
        if padded <= pad_total {
            return Err(non_positive(extent));
        }
        pre_crop[axis] = extent;
        output_hw[axis] = padded - pad_total;
    }

    Ok(ConvTranspose2dGeometry {
        batch,
        c_in,
        input_hw: [in_h, in_w],
        groups,
        c_in_per_group: c_in / groups,
        c_out_per_group,
        c_out: c_out_per_group * groups,
        kernel,
        strides: config.strides,
        dilations: resolved.dilations,
        padding: resolved.padding,
        output_padding,
        pre_crop,
        output_hw,
    })
}

/// `(input - 1) * stride + dilation * (kernel - 1) + 1`, the rows or columns the scatter touches.
fn scatter_extent(input: usize, kernel: usize, stride: usize, dilation: usize) -> Result<usize> {
    let effective = (kernel - 1)
        .checked_mul(dilation)
        .and_then(|v| v.checked_add(1))
        .ok_or_else(|| OpError::invalid_argument("conv_transpose2d effective kernel overflow"))?;
    (input - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(effective))
        .ok_or_else(|| OpError::invalid_argument("conv_transpose2d output extent overflow"))
}

fn rank4(op: &'static str, dims: &[usize]) -> Result<[usize; 4]> {
    <[usize; 4]>::try_from(dims).map_err(|_| OpError::RankMismatch {
        op,
        expected: 4,
        got: dims.len(),
    })
}
