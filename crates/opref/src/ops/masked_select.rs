use super::broadcast::{broadcast_shape, BroadcastIndexer};
use crate::error::{OpError, Result};
use crate::tensor::{Element, Shape, Tensor};

/// Boolean selection mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    shape: Shape,
    data: Vec<bool>,
}

impl Mask {
    pub fn from_vec(shape: impl Into<Shape>, data: Vec<bool>) -> Result<Self> {
        let shape = shape.into();
        if shape.rank() == 0 {
            return Err(OpError::RankMismatch {
                op: "Mask::from_vec",
                expected: 1,
                got: 0,
            });
        }
        if data.len() != shape.num_elements() {
            return Err(OpError::DataLength {
                dims: shape.dims().to_vec(),
                len: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn data(&self) -> &[bool] {
        &self.data
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&keep| keep).count()
    }
}

/// Collects the elements of `input` where `mask` is set, in row-major order of the broadcast
/// shape. The result is always rank 1; an all-false mask gives shape `[0]`.
pub fn masked_select<T: Element>(input: &Tensor<T>, mask: &Mask) -> Result<Tensor<T>> {
    let out_dims = broadcast_shape(input.dims(), mask.dims())?;
    let src = input.data();

    let selected: Vec<T> = if input.dims() == mask.dims() {
        src.iter()
            .zip(mask.data())
            .filter_map(|(&v, &keep)| keep.then_some(v))
            .collect()
    } else {
        let input_index = BroadcastIndexer::new(input.dims(), &out_dims)?;
        let mask_index = BroadcastIndexer::new(mask.dims(), &out_dims)?;
        let len: usize = out_dims.iter().product();
        (0..len)
            .filter(|&idx| mask.data()[mask_index.source_offset(idx)])
            .map(|idx| src[input_index.source_offset(idx)])
            .collect()
    };

    let count = selected.len();
    Tensor::from_vec([count], selected)
}
