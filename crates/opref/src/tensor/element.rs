//! Scalar element types the reference operators run over.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};
use std::str::FromStr;

use half::f16;
use serde::{Deserialize, Serialize};

use crate::error::OpError;

/// Logical dtype identifier reported by each element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    /// 16-bit IEEE-754 half precision.
    F16,
    /// 32-bit IEEE-754 single precision.
    F32,
    /// 64-bit IEEE-754 double precision.
    F64,
    /// 32-bit signed integer.
    I32,
    /// 64-bit signed integer.
    I64,
}

impl DType {
    pub fn name(self) -> &'static str {
        match self {
            DType::F16 => "f16",
            DType::F32 => "f32",
            DType::F64 => "f64",
            DType::I32 => "i32",
            DType::I64 => "i64",
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, DType::F16 | DType::F32 | DType::F64)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DType {
    type Err = OpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "f16" | "float16" => Ok(DType::F16),
            "f32" | "float32" => Ok(DType::F32),
            "f64" | "float64" => Ok(DType::F64),
            "i32" | "int32" => Ok(DType::I32),
            "i64" | "int64" => Ok(DType::I64),
            _ => Err(OpError::InvalidDType(s.to_string())),
        }
    }
}

/// Numeric behaviour required by the reference kernels.
///
/// Arithmetic stays in the element type itself: an `f16` convolution accumulates in `f16`, the
/// same way the operator under test is expected to. Integer elements follow Rust's integer
/// arithmetic; scans that can run long use [`Element::checked_add`].
pub trait Element:
    Copy
    + Default
    + Send
    + Sync
    + PartialOrd
    + fmt::Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + AddAssign
    + 'static
{
    const DTYPE: DType;

    /// Returns the additive identity.
    fn zero() -> Self;
    /// Returns the multiplicative identity.
    fn one() -> Self;
    /// Rounds an `f64` into this element type. Integers truncate toward zero and saturate.
    fn from_f64(v: f64) -> Self;
    /// Widens the element to `f64` for comparisons and reporting.
    fn to_f64(self) -> f64;
    /// `None` when the sum overflows an integer type; floats always return the rounded sum.
    fn checked_add(self, rhs: Self) -> Option<Self>;
}

/// Floating-point elements: the dtypes the convolution parity runs and `tanh` cover.
pub trait Float: Element {
    /// Hyperbolic tangent evaluated at this element's precision.
    fn tanh(self) -> Self;
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;

    fn zero() -> Self {
        0.0
    }

    fn one() -> Self {
        1.0
    }

    fn from_f64(v: f64) -> Self {
        v as f32
    }

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn checked_add(self, rhs: Self) -> Option<Self> {
        Some(self + rhs)
    }
}

impl Float for f32 {
    fn tanh(self) -> Self {
        f32::tanh(self)
    }
}

impl Element for f64 {
    const DTYPE: DType = DType::F64;

    fn zero() -> Self {
        0.0
    }

    fn one() -> Self {
        1.0
    }

    fn from_f64(v: f64) -> Self {
        v
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn checked_add(self, rhs: Self) -> Option<Self> {
        Some(self + rhs)
    }
}

impl Float for f64 {
    fn tanh(self) -> Self {
        f64::tanh(self)
    }
}

impl Element for f16 {
    const DTYPE: DType = DType::F16;

    fn zero() -> Self {
        f16::ZERO
    }

    fn one() -> Self {
        f16::ONE
    }

    fn from_f64(v: f64) -> Self {
        f16::from_f64(v)
    }

    fn to_f64(self) -> f64 {
        f16::to_f64(self)
    }

    fn checked_add(self, rhs: Self) -> Option<Self> {
        Some(self + rhs)
    }
}

impl Float for f16 {
    // Evaluated in f32 and rounded once, like a half-precision device kernel would.
    fn tanh(self) -> Self {
        f16::from_f32(self.to_f32().tanh())
    }
}

macro_rules! impl_int_element {
    ($ty:ty, $dtype:expr) => {
        impl Element for $ty {
            const DTYPE: DType = $dtype;

            fn zero() -> Self {
                0
            }

            fn one() -> Self {
                1
            }

            fn from_f64(v: f64) -> Self {
                v as $ty
            }

            fn to_f64(self) -> f64 {
                self as f64
            }

            fn checked_add(self, rhs: Self) -> Option<Self> {
                <$ty>::checked_add(self, rhs)
            }
        }
    };
}

impl_int_element!(i32, DType::I32);
impl_int_element!(i64, DType::I64);
