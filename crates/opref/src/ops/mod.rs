//! Reference operators.

pub mod broadcast;
pub mod conv_transpose;
pub mod cumsum;
pub mod elementwise;
pub mod masked_select;

pub use broadcast::{broadcast_shape, broadcast_to, BroadcastIndexer};
pub use conv_transpose::{
    conv_transpose2d, conv_transpose2d_gather, ConvTranspose2dConfig, ExplicitPadding,
    PaddingAlgorithm,
};
pub use cumsum::{cumsum, cumsum_as, CumsumOptions};
pub use elementwise::{elementwise_binary, multiply, tanh, ElementwiseBinaryOp};
pub use masked_select::{masked_select, Mask};
