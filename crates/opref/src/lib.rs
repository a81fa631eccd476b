pub mod error;
pub mod layout;
pub mod ops;
pub mod tensor;

pub use error::{OpError, Result};
pub use layout::DataFormat;
pub use ops::{conv_transpose2d, conv_transpose2d_gather, ConvTranspose2dConfig};
pub use tensor::{DType, Element, Float, Shape, Tensor};
