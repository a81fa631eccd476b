//! Host-backed tensor used as the input and output of every reference operator.

use super::element::{DType, Element};
use super::shape::{compute_strides, unravel_index, Shape};
use crate::error::{OpError, Result};

/// Dense, contiguous, row-major tensor owned on the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T> {
    shape: Shape,
    data: Vec<T>,
}

impl<T: Element> Tensor<T> {
    /// Constructs a tensor from raw values, validating the length against the shape.
    pub fn from_vec(shape: impl Into<Shape>, data: Vec<T>) -> Result<Self> {
        let shape = shape.into();
        if shape.rank() == 0 {
            return Err(OpError::RankMismatch {
                op: "Tensor::from_vec",
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
        Ok(Tensor { shape, data })
    }

    /// Returns a zero-initialized tensor of the requested shape.
    pub fn zeros(shape: impl Into<Shape>) -> Self {
        Self::full(shape, T::zero())
    }

    /// Returns a tensor with every element set to `value`.
    pub fn full(shape: impl Into<Shape>, value: T) -> Self {
        let shape = shape.into();
        let data = vec![value; shape.num_elements()];
        Tensor { shape, data }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Reads the element at a full coordinate, returning `None` when out of bounds.
    pub fn get(&self, coord: &[usize]) -> Option<T> {
        if coord.len() != self.rank() {
            return None;
        }
        let mut offset = 0usize;
        for ((&c, &dim), stride) in coord
            .iter()
            .zip(self.dims())
            .zip(compute_strides(self.dims()))
        {
            if c >= dim {
                return None;
            }
            offset += c * stride;
        }
        self.data.get(offset).copied()
    }

    /// Applies `f` to every element, producing a tensor of the same shape.
    pub fn map<U: Element>(&self, f: impl Fn(T) -> U) -> Tensor<U> {
        Tensor {
            shape: self.shape.clone(),
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Converts every element through `f64` into another element type.
    pub fn cast<U: Element>(&self) -> Tensor<U> {
        self.map(|v| U::from_f64(v.to_f64()))
    }

    /// Copies the tensor into a new axis order: output axis `i` is input axis `perm[i]`.
    pub fn permute(&self, perm: &[usize]) -> Result<Tensor<T>> {
        let rank = self.rank();
        let mut seen = vec![false; rank];
        let valid = perm.len() == rank
            && perm.iter().all(|&axis| {
                if axis >= rank || seen[axis] {
                    return false;
                }
                seen[axis] = true;
                true
            });
        if !valid {
            return Err(OpError::InvalidPermutation {
                perm: perm.to_vec(),
                rank,
            });
        }

        let in_dims = self.dims();
        let out_dims: Vec<usize> = perm.iter().map(|&axis| in_dims[axis]).collect();
        let in_strides = compute_strides(in_dims);
        let mut data = Vec::with_capacity(self.len());
        for idx in 0..self.len() {
            let out_coord = unravel_index(idx, &out_dims);
            let mut in_index = 0usize;
            for (out_axis, &c) in out_coord.iter().enumerate() {
                in_index += c * in_strides[perm[out_axis]];
            }
            data.push(self.data[in_index]);
        }
        Ok(Tensor {
            shape: Shape::new(out_dims),
            data,
        })
    }

    /// Copies `len` entries starting at `start` along `axis`.
    pub fn narrow(&self, axis: usize, start: usize, len: usize) -> Result<Tensor<T>> {
        let dims = self.dims();
        if axis >= dims.len() {
            return Err(OpError::AxisOutOfRange {
                axis: axis as isize,
                rank: dims.len(),
            });
        }
        let end = start
            .checked_add(len)
            .ok_or_else(|| OpError::invalid_argument("narrow range overflow"))?;
        if end > dims[axis] {
            return Err(OpError::invalid_argument(format!(
                "narrow range {start}..{end} exceeds axis {axis} of size {}",
                dims[axis]
            )));
        }

        let outer: usize = dims[..axis].iter().product();
        let inner: usize = dims[axis + 1..].iter().product();
        let mut data = Vec::with_capacity(outer * len * inner);
        for o in 0..outer {
            let base = (o * dims[axis] + start) * inner;
            data.extend_from_slice(&self.data[base..base + len * inner]);
        }
        let mut out_dims = dims.to_vec();
        out_dims[axis] = len;
        Ok(Tensor {
            shape: Shape::new(out_dims),
            data,
        })
    }

    /// Joins tensors along `axis`; every other axis must agree.
    pub fn concat(parts: &[&Tensor<T>], axis: usize) -> Result<Tensor<T>> {
        let first = parts
            .first()
            .ok_or_else(|| OpError::invalid_argument("concat needs at least one tensor"))?;
        let rank = first.rank();
        if axis >= rank {
            return Err(OpError::AxisOutOfRange {
                axis: axis as isize,
                rank,
            });
        }
        for part in parts.iter().skip(1) {
            let compatible = part.rank() == rank
                && part
                    .dims()
                    .iter()
                    .zip(first.dims())
                    .enumerate()
                    .all(|(i, (a, b))| i == axis || a == b);
            if !compatible {
                return Err(OpError::shape_mismatch(format!(
                    "concat along axis {axis}: {} vs {}",
                    first.shape(),
                    part.shape()
                )));
            }
        }

        let outer: usize = first.dims()[..axis].iter().product();
        let inner: usize = first.dims()[axis + 1..].iter().product();
        let total_axis: usize = parts.iter().map(|p| p.dims()[axis]).sum();
        let mut data = Vec::with_capacity(outer * total_axis * inner);
        for o in 0..outer {
            for part in parts {
                let chunk = part.dims()[axis] * inner;
                data.extend_from_slice(&part.data[o * chunk..(o + 1) * chunk]);
            }
        }
        let mut out_dims = first.dims().to_vec();
        out_dims[axis] = total_axis;
        Ok(Tensor {
            shape: Shape::new(out_dims),
            data,
        })
    }
}
