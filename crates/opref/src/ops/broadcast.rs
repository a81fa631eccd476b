//! NumPy-style broadcasting over trailing axes.

use crate::error::{OpError, Result};
use crate::tensor::{compute_strides, unravel_index, Element, Tensor};

/// Result shape of broadcasting `lhs` against `rhs`.
///
/// Dims are aligned from the right; a pair is compatible when equal or when either side is 1.
pub fn broadcast_shape(lhs: &[usize], rhs: &[usize]) -> Result<Vec<usize>> {
    let rank = lhs.len().max(rhs.len());
    let mut out = vec![0usize; rank];
    for axis in 0..rank {
        let l = aligned_dim(lhs, rank, axis);
        let r = aligned_dim(rhs, rank, axis);
        out[axis] = match (l, r) {
            (a, b) if a == b => a,
            (1, b) => b,
            (a, 1) => a,
            _ => {
                return Err(OpError::Broadcast {
                    lhs: lhs.to_vec(),
                    rhs: rhs.to_vec(),
                })
            }
        };
    }
    Ok(out)
}

fn aligned_dim(dims: &[usize], rank: usize, axis: usize) -> usize {
    let offset = rank - dims.len();
    if axis < offset {
        1
    } else {
        dims[axis - offset]
    }
}

/// Maps flat offsets of a broadcast output back to offsets in one of its sources.
#[derive(Debug, Clone)]
pub struct BroadcastIndexer {
    out_dims: Vec<usize>,
    src_strides: Vec<usize>,
}

impl BroadcastIndexer {
    /// `src_dims` must already be broadcast-compatible with `out_dims`.
    pub fn new(src_dims: &[usize], out_dims: &[usize]) -> Result<Self> {
        let target = broadcast_shape(src_dims, out_dims)?;
        if target != out_dims {
            return Err(OpError::Broadcast {
                lhs: src_dims.to_vec(),
                rhs: out_dims.to_vec(),
            });
        }
        let rank = out_dims.len();
        let aligned: Vec<usize> = (0..rank).map(|axis| aligned_dim(src_dims, rank, axis)).collect();
        let strides = compute_strides(&aligned);
        let src_strides = aligned
            .iter()
            .zip(strides)
            .map(|(&dim, stride)| if dim == 1 { 0 } else { stride })
            .collect();
        Ok(Self {
            out_dims: out_dims.to_vec(),
            src_strides,
        })
    }

    pub fn source_offset(&self, out_index: usize) -> usize {
        unravel_index(out_index, &self.out_dims)
            .iter()
            .zip(&self.src_strides)
            .map(|(c, s)| c * s)
            .sum()
    }
}

/// Materializes `tensor` at `dims`.
pub fn broadcast_to<T: Element>(tensor: &Tensor<T>, dims: &[usize]) -> Result<Tensor<T>> {
    if tensor.dims() == dims {
        return Ok(tensor.clone());
    }
    let indexer = BroadcastIndexer::new(tensor.dims(), dims)?;
    let len: usize = dims.iter().product();
    let src = tensor.data();
    let data = (0..len).map(|idx| src[indexer.source_offset(idx)]).collect();
    Tensor::from_vec(dims, data)
}
