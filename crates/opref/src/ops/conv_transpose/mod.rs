//! Reference 2-D transposed convolution.
//!
//! Filters are laid out `[C_in, C_out / groups, KH, KW]`: groups split the output channels, so the
//! filter's leading dim always equals the input channel count.

pub mod config;
pub mod kernel;
pub mod padding;
pub mod shape;

use log::debug;

pub use config::{ConvTranspose2dConfig, ExplicitPadding, PaddingAlgorithm};
pub use padding::{resolve_padding, Padding2d, ResolvedPadding};
pub use shape::{validate_conv_transpose2d, ConvTranspose2dGeometry};

use crate::error::Result;
use crate::layout::{from_nchw, to_nchw};
use crate::tensor::{Float, Tensor};

/// Computes a transposed convolution by direct scatter accumulation.
///
/// Accumulation stays in `T`. The input may be NCHW or NHWC as declared by
/// `config.data_format`; the output uses the same layout.
pub fn conv_transpose2d<T: Float>(
    input: &Tensor<T>,
    filter: &Tensor<T>,
    config: &ConvTranspose2dConfig,
) -> Result<Tensor<T>> {
    run(input, filter, config, kernel::scatter::<T>)
}

/// Same contract as [`conv_transpose2d`], computed per output element with planes in parallel.
pub fn conv_transpose2d_gather<T: Float>(
    input: &Tensor<T>,
    filter: &Tensor<T>,
    config: &ConvTranspose2dConfig,
) -> Result<Tensor<T>> {
    run(input, filter, config, kernel::gather::<T>)
}

fn run<T: Float>(
    input: &Tensor<T>,
    filter: &Tensor<T>,
    config: &ConvTranspose2dConfig,
    accumulate: fn(&[T], &[T], &ConvTranspose2dGeometry) -> Vec<T>,
) -> Result<Tensor<T>> {
    let input = to_nchw(input, config.data_format)?;
    let geometry = validate_conv_transpose2d(input.dims(), filter.dims(), config)?;
    debug!(
        "conv_transpose2d {} input {} filter {}: algorithm {} padding {:?} dilations {:?} pre-crop {:?} output_padding {:?} -> {:?}",
        T::DTYPE,
        input.shape(),
        filter.shape(),
        config.padding_algorithm,
        geometry.padding,
        geometry.dilations,
        geometry.pre_crop,
        geometry.output_padding,
        geometry.output_dims(),
    );

    let data = accumulate(input.data(), filter.data(), &geometry);
    let output = Tensor::from_vec(geometry.output_dims(), data)?;
    from_nchw(output, config.data_format)
}
