use opref::{conv_transpose2d_gather, ConvTranspose2dConfig, Float, Tensor};

/// An implementation under test, checked against the scatter oracle.
///
/// Inputs arrive in the layout named by `config.data_format` and the output is expected in the
/// same layout.
pub trait ConvTranspose2dCandidate: Sync {
    fn name(&self) -> &str;

    fn conv_transpose2d<T: Float>(
        &self,
        input: &Tensor<T>,
        filter: &Tensor<T>,
        config: &ConvTranspose2dConfig,
    ) -> anyhow::Result<Tensor<T>>;
}

/// The in-tree output-stationary formulation.
#[derive(Debug, Clone, Copy, Default)]
pub struct GatherCandidate;

impl ConvTranspose2dCandidate for GatherCandidate {
    fn name(&self) -> &str {
        "gather"
    }

    fn conv_transpose2d<T: Float>(
        &self,
        input: &Tensor<T>,
        filter: &Tensor<T>,
        config: &ConvTranspose2dConfig,
    ) -> anyhow::Result<Tensor<T>> {
        Ok(conv_transpose2d_gather(input, filter, config)?)
    }
}
