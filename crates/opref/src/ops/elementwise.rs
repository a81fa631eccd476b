use super::broadcast::{broadcast_shape, BroadcastIndexer};
use crate::error::Result;
use crate::tensor::{Element, Float, Tensor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementwiseBinaryOp {
    Add,
    Sub,
    Mul,
}

impl ElementwiseBinaryOp {
    fn apply<T: Element>(self, x: T, y: T) -> T {
        match self {
            ElementwiseBinaryOp::Add => x + y,
            ElementwiseBinaryOp::Sub => x - y,
            ElementwiseBinaryOp::Mul => x * y,
        }
    }
}

/// Applies `op` pairwise after broadcasting both operands to their common shape.
pub fn elementwise_binary<T: Element>(
    lhs: &Tensor<T>,
    rhs: &Tensor<T>,
    op: ElementwiseBinaryOp,
) -> Result<Tensor<T>> {
    let out_dims = broadcast_shape(lhs.dims(), rhs.dims())?;
    let (a, b) = (lhs.data(), rhs.data());

    if lhs.dims() == rhs.dims() {
        let data = a.iter().zip(b).map(|(&x, &y)| op.apply(x, y)).collect();
        return Tensor::from_vec(out_dims, data);
    }

    let lhs_index = BroadcastIndexer::new(lhs.dims(), &out_dims)?;
    let rhs_index = BroadcastIndexer::new(rhs.dims(), &out_dims)?;
    let len: usize = out_dims.iter().product();
    let data = (0..len)
        .map(|idx| {
            op.apply(
                a[lhs_index.source_offset(idx)],
                b[rhs_index.source_offset(idx)],
            )
        })
        .collect();
    Tensor::from_vec(out_dims, data)
}

pub fn multiply<T: Element>(lhs: &Tensor<T>, rhs: &Tensor<T>) -> Result<Tensor<T>> {
    elementwise_binary(lhs, rhs, ElementwiseBinaryOp::Mul)
}

pub fn tanh<T: Float>(input: &Tensor<T>) -> Tensor<T> {
    input.map(<T as Float>::tanh)
}
