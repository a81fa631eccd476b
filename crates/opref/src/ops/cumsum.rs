use crate::error::{OpError, Result};
use crate::tensor::{Element, Tensor};

/// Scan attributes for [`cumsum`].
///
/// `Default` holds the operator's own attribute defaults: scan the last axis, no flattening.
/// A call that names no axis at all flattens first; build that with [`CumsumOptions::flattened`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CumsumOptions {
    /// Scan axis; negative values count from the last axis. Ignored when `flatten` is set.
    pub axis: isize,
    /// Scan the row-major flattening and return a rank-1 tensor.
    pub flatten: bool,
    /// Leave each element out of its own prefix, so the first output is zero.
    pub exclusive: bool,
    /// Scan from the last element towards the first.
    pub reverse: bool,
}

impl Default for CumsumOptions {
    fn default() -> Self {
        Self {
            axis: -1,
            flatten: false,
            exclusive: false,
            reverse: false,
        }
    }
}

impl CumsumOptions {
    pub fn along(axis: isize) -> Self {
        Self {
            axis,
            ..Self::default()
        }
    }

    pub fn flattened() -> Self {
        Self {
            flatten: true,
            ..Self::default()
        }
    }

    pub fn exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }
}

/// Running sum along one axis, accumulated in `T`.
///
/// Integer sums that leave `T`'s range are an error rather than wrapping.
pub fn cumsum<T: Element>(input: &Tensor<T>, options: CumsumOptions) -> Result<Tensor<T>> {
    let (dims, axis) = if options.flatten {
        (vec![input.len()], 0)
    } else {
        let rank = input.rank();
        (input.dims().to_vec(), normalize_axis(options.axis, rank)?)
    };

    let outer: usize = dims[..axis].iter().product();
    let len = dims[axis];
    let inner: usize = dims[axis + 1..].iter().product();
    let src = input.data();
    let mut out = vec![T::zero(); src.len()];

    for o in 0..outer {
        for i in 0..inner {
            let at = |step: usize| {
                let pos = if options.reverse { len - 1 - step } else { step };
                (o * len + pos) * inner + i
            };
            let mut running = T::zero();
            for step in 0..len {
                let idx = at(step);
                if options.exclusive {
                    out[idx] = running;
                    // The full total is never written by an exclusive scan.
                    if step + 1 == len {
                        break;
                    }
                }
                running = running
                    .checked_add(src[idx])
                    .ok_or_else(|| overflow::<T>(idx))?;
                if !options.exclusive {
                    out[idx] = running;
                }
            }
        }
    }

    Tensor::from_vec(dims, out)
}

/// Casts `input` to `U` and scans in `U`, like requesting an output dtype.
///
/// The cast goes through `f64`: float to integer truncates toward zero, and `i64` values beyond
/// 2^53 lose precision.
pub fn cumsum_as<T: Element, U: Element>(
    input: &Tensor<T>,
    options: CumsumOptions,
) -> Result<Tensor<U>> {
    cumsum(&input.map(|v| U::from_f64(v.to_f64())), options)
}

fn overflow<T: Element>(idx: usize) -> OpError {
    OpError::invalid_argument(format!(
        "cumsum overflows {} at flat index {idx}",
        T::DTYPE
    ))
}

/// Resolves a possibly negative axis against `rank`.
pub fn normalize_axis(axis: isize, rank: usize) -> Result<usize> {
    let signed_rank = rank as isize;
    let resolved = if axis < 0 { axis + signed_rank } else { axis };
    if resolved < 0 || resolved >= signed_rank {
        return Err(OpError::AxisOutOfRange { axis, rank });
    }
    Ok(resolved as usize)
}
