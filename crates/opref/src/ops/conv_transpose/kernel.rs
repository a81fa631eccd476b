//! Accumulation kernels over NCHW buffers.
//!
//! [`scatter`] is the oracle: every input pixel paints a channel-reduced, filter-scaled patch into
//! an over-sized accumulator, in a fixed loop order. [`gather`] computes the same cropped output by
//! visiting output pixels instead, which gives every `(batch, channel)` plane a single writer.

use rayon::prelude::*;

use super::shape::ConvTranspose2dGeometry;
use crate::tensor::Float;

/// Scatter-adds into a zeroed `(N, C_out, acc_h, acc_w)` buffer and crops it to the output.
///
/// Loop order is batch, input row, input column, group, output channel; each patch is reduced over
/// the group's input channels before it is added, so results are reproducible bit for bit.
pub fn scatter<T: Float>(
    input: &[T],
    filter: &[T],
    geometry: &ConvTranspose2dGeometry,
) -> Vec<T> {
    let g = geometry;
    let [in_h, in_w] = g.input_hw;
    let [k_h, k_w] = g.kernel;
    let [s_h, s_w] = g.strides;
    let [d_h, d_w] = g.dilations;
    let [acc_h, acc_w] = g.accumulator_hw();

    let in_plane = in_h * in_w;
    let k_plane = k_h * k_w;
    let acc_plane = acc_h * acc_w;
    let mut acc = vec![T::zero(); g.batch * g.c_out * acc_plane];
    let mut patch = vec![T::zero(); k_plane];

    for n in 0..g.batch {
        for i in 0..in_h {
            for j in 0..in_w {
                for grp in 0..g.groups {
                    let c_begin = grp * g.c_in_per_group;
                    let c_end = c_begin + g.c_in_per_group;
                    for k in 0..g.c_out_per_group {
                        patch.fill(T::zero());
                        for c in c_begin..c_end {
                            let x = input[(n * g.c_in + c) * in_plane + i * in_w + j];
                            let f_base = (c * g.c_out_per_group + k) * k_plane;
                            for (p, w) in patch.iter_mut().zip(&filter[f_base..f_base + k_plane]) {
                                *p += x * *w;
                            }
                        }

                        let oc = grp * g.c_out_per_group + k;
                        let plane = &mut acc[(n * g.c_out + oc) * acc_plane..][..acc_plane];
                        for kh in 0..k_h {
                            let row = i * s_h + kh * d_h;
                            for kw in 0..k_w {
                                let col = j * s_w + kw * d_w;
                                plane[row * acc_w + col] += patch[kh * k_w + kw];
                            }
                        }
                    }
                }
            }
        }
    }

    crop(&acc, g)
}

/// Copies the `[pad_before, pad_before + out)` window of every accumulator plane.
fn crop<T: Float>(acc: &[T], g: &ConvTranspose2dGeometry) -> Vec<T> {
    let [acc_h, acc_w] = g.accumulator_hw();
    let [out_h, out_w] = g.output_hw;
    let (top, left) = (g.padding.top, g.padding.left);
    let planes = g.batch * g.c_out;

    let mut out = Vec::with_capacity(planes * out_h * out_w);
    for plane in acc.chunks_exact(acc_h * acc_w).take(planes) {
        for y in 0..out_h {
            let start = (y + top) * acc_w + left;
            out.extend_from_slice(&plane[start..start + out_w]);
        }
    }
    out
}

/// Output-stationary formulation: each output element sums every `(input pixel, kernel tap)` pair
/// whose strided, dilated position lands on it.
///
/// Planes are filled in parallel. Within a plane the reduction runs over kernel taps first and
/// channels last, so it agrees with [`scatter`] only up to floating-point reassociation.
pub fn gather<T: Float>(
    input: &[T],
    filter: &[T],
    geometry: &ConvTranspose2dGeometry,
) -> Vec<T> {
    let g = *geometry;
    let [out_h, out_w] = g.output_hw;
    let out_plane = out_h * out_w;
    let mut out = vec![T::zero(); g.batch * g.c_out * out_plane];
    if out_plane == 0 {
        return out;
    }

    out.par_chunks_mut(out_plane)
        .enumerate()
        .for_each(|(plane_idx, plane)| {
            let n = plane_idx / g.c_out;
            let oc = plane_idx % g.c_out;
            gather_plane(input, filter, &g, n, oc, plane);
        });
    out
}

fn gather_plane<T: Float>(
    input: &[T],
    filter: &[T],
    g: &ConvTranspose2dGeometry,
    n: usize,
    oc: usize,
    plane: &mut [T],
) {
    let [in_h, in_w] = g.input_hw;
    let [k_h, k_w] = g.kernel;
    let [out_h, out_w] = g.output_hw;
    let in_plane = in_h * in_w;
    let k_plane = k_h * k_w;
    let grp = oc / g.c_out_per_group;
    let k = oc % g.c_out_per_group;
    let c_begin = grp * g.c_in_per_group;

    for y in 0..out_h {
        let rows = taps(y + g.padding.top, in_h, k_h, g.strides[0], g.dilations[0]);
        for x in 0..out_w {
            let cols = taps(x + g.padding.left, in_w, k_w, g.strides[1], g.dilations[1]);
            let mut sum = T::zero();
            for &(i, kh) in &rows {
                for &(j, kw) in &cols {
                    for c in c_begin..c_begin + g.c_in_per_group {
                        let xv = input[(n * g.c_in + c) * in_plane + i * in_w + j];
                        let wv = filter[(c * g.c_out_per_group + k) * k_plane + kh * k_w + kw];
                        sum += xv * wv;
                    }
                }
            }
            plane[y * out_w + x] = sum;
        }
    }
}

/// `(input index, kernel tap)` pairs with `index * stride + tap * dilation == pos`.
fn taps(
    pos: usize,
    input: usize,
    kernel: usize,
    stride: usize,
    dilation: usize,
) -> Vec<(usize, usize)> {
    (0..kernel)
        .filter_map(|tap| {
            let offset = pos.checked_sub(tap * dilation)?;
            if offset % stride != 0 {
                return None;
            }
            let index = offset / stride;
            (index < input).then_some((index, tap))
        })
        .collect()
}
