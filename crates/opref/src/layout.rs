//! Tensor layout helpers.
//!
//! The convolution kernels operate on channel-first tensors only. Channel-last callers are
//! normalized on the way in and restored on the way out; both directions are plain copies.

use std::fmt;
use std::str::FromStr;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::{OpError, Result};
use crate::tensor::{Element, Tensor};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataFormat {
    #[default]
    #[serde(rename = "NCHW")]
    Nchw,
    #[serde(rename = "NHWC")]
    Nhwc,
}

impl DataFormat {
    pub const PERM_NCHW_TO_NHWC: [usize; 4] = [0, 2, 3, 1];
    pub const PERM_NHWC_TO_NCHW: [usize; 4] = [0, 3, 1, 2];

    pub fn name(self) -> &'static str {
        match self {
            DataFormat::Nchw => "NCHW",
            DataFormat::Nhwc => "NHWC",
        }
    }

    /// Rearranges NCHW-ordered dims into this layout's order.
    pub fn dims_from_nchw(self, nchw: [usize; 4]) -> [usize; 4] {
        match self {
            DataFormat::Nchw => nchw,
            DataFormat::Nhwc => Self::PERM_NCHW_TO_NHWC.map(|axis| nchw[axis]),
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataFormat {
    type Err = OpError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "NCHW" => Ok(DataFormat::Nchw),
            "NHWC" => Ok(DataFormat::Nhwc),
            other => Err(OpError::InvalidLayout(other.to_string())),
        }
    }
}

/// Returns `tensor` in NCHW order, copying only when the declared layout is NHWC.
pub fn to_nchw<T: Element>(tensor: &Tensor<T>, format: DataFormat) -> Result<Tensor<T>> {
    expect_rank4(tensor)?;
    match format {
        DataFormat::Nchw => Ok(tensor.clone()),
        DataFormat::Nhwc => {
            trace!("normalizing NHWC tensor {} to NCHW", tensor.shape());
            tensor.permute(&DataFormat::PERM_NHWC_TO_NCHW)
        }
    }
}

/// Inverse of [`to_nchw`]: takes an NCHW tensor back to the caller's layout.
pub fn from_nchw<T: Element>(tensor: Tensor<T>, format: DataFormat) -> Result<Tensor<T>> {
    expect_rank4(&tensor)?;
    match format {
        DataFormat::Nchw => Ok(tensor),
        DataFormat::Nhwc => {
            trace!("restoring NCHW tensor {} to NHWC", tensor.shape());
            tensor.permute(&DataFormat::PERM_NCHW_TO_NHWC)
        }
    }
}

fn expect_rank4<T: Element>(tensor: &Tensor<T>) -> Result<()> {
    if tensor.rank() != 4 {
        return Err(OpError::RankMismatch {
            op: "layout normalization",
            expected: 4,
            got: tensor.rank(),
        });
    }
    Ok(())
}
