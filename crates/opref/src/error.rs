use thiserror::Error;

/// Errors raised by the reference operators.
///
/// Every operator validates its arguments before touching any output buffer, so an error always
/// means no output was produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpError {
    #[error("unknown data format '{0}', expected NCHW or NHWC")]
    InvalidLayout(String),

    #[error("unknown padding algorithm '{0}', expected EXPLICIT, SAME or VALID")]
    InvalidPaddingAlgorithm(String),

    #[error("unknown dtype '{0}', expected f16, f32 or f64")]
    InvalidDType(String),

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("output_padding {value} on axis {axis} must be smaller than stride {stride}")]
    InvalidOutputPadding {
        axis: usize,
        value: usize,
        stride: usize,
    },

    #[error("output extent on axis {axis} is not positive (pre-crop {pre_crop}, padding {pad_before}+{pad_after}, output_padding {output_padding})")]
    NonPositiveOutput {
        axis: usize,
        pre_crop: usize,
        pad_before: usize,
        pad_after: usize,
        output_padding: usize,
    },

    #[error("output_size {requested} on axis {axis} is smaller than the scatter footprint {footprint} once padding is added back")]
    OutputSizeTooSmall {
        axis: usize,
        requested: usize,
        footprint: usize,
    },

    #[error("explicit paddings must hold 2 or 4 values, got {0}")]
    InvalidPaddingLength(usize),

    #[error("tensor data length ({len}) does not match shape {dims:?}")]
    DataLength { dims: Vec<usize>, len: usize },

    #[error("rank mismatch: {op} expects rank {expected}, got {got}")]
    RankMismatch {
        op: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid permutation {perm:?} for rank {rank}")]
    InvalidPermutation { perm: Vec<usize>, rank: usize },

    #[error("axis {axis} out of range for rank {rank}")]
    AxisOutOfRange { axis: isize, rank: usize },

    #[error("shapes {lhs:?} and {rhs:?} are not broadcast-compatible")]
    Broadcast { lhs: Vec<usize>, rhs: Vec<usize> },
}

impl OpError {
    pub fn shape_mismatch(message: impl Into<String>) -> Self {
        OpError::ShapeMismatch(message.into())
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        OpError::InvalidArgument(message.into())
    }
}

/// Convenience alias for results returned by the reference operators.
pub type Result<T> = std::result::Result<T, OpError>;
