use super::config::{ExplicitPadding, PaddingAlgorithm};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Padding2d {
    pub top: usize,
    pub bottom: usize,
    pub left: usize,
    pub right: usize,
}

impl Padding2d {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn from_edges([top, bottom, left, right]: [usize; 4]) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    /// `(before, after)` pairs for the height and width axes.
    pub fn as_hw_pairs(self) -> [(usize, usize); 2] {
        [(self.top, self.bottom), (self.left, self.right)]
    }
}

/// Padding plus the dilation the accumulation must actually use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPadding {
    pub padding: Padding2d,
    pub dilations: [usize; 2],
}

/// Turns a padding policy into concrete edge amounts.
///
/// `Same` resets dilation to `[1, 1]` and sizes the padding with the raw kernel extent. Callers
/// that pass a dilation alongside `Same` get an undilated convolution.
pub fn resolve_padding(
    algorithm: PaddingAlgorithm,
    paddings: ExplicitPadding,
    input_hw: [usize; 2],
    kernel_hw: [usize; 2],
    strides: [usize; 2],
    dilations: [usize; 2],
) -> ResolvedPadding {
    match algorithm {
        PaddingAlgorithm::Explicit => ResolvedPadding {
            padding: Padding2d::from_edges(paddings.edges()),
            dilations,
        },
        PaddingAlgorithm::Valid => ResolvedPadding {
            padding: Padding2d::zero(),
            dilations,
        },
        PaddingAlgorithm::Same => {
            let [top, bottom] = same_pads(input_hw[0], kernel_hw[0], strides[0]);
            let [left, right] = same_pads(input_hw[1], kernel_hw[1], strides[1]);
            ResolvedPadding {
                padding: Padding2d {
                    top,
                    bottom,
                    left,
                    right,
                },
                dilations: [1, 1],
            }
        }
    }
}

fn same_pads(input: usize, kernel: usize, stride: usize) -> [usize; 2] {
    let out = input.div_ceil(stride);
    let total = (out.saturating_sub(1) * stride + kernel).saturating_sub(input);
    let before = total / 2;
    [before, total - before]
}
