//! Host tensors, shapes and element types.

pub mod element;
pub mod host;
pub mod shape;

pub use element::{DType, Element, Float};
pub use host::Tensor;
pub use shape::{compute_strides, unravel_index, Shape};
