use opref::{Element, Tensor};
use thiserror::Error;

use crate::tolerance::Tolerance;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParityError {
    #[error("length mismatch: expected {expected} values, actual {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("shape mismatch: expected {expected:?}, actual {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("value mismatch at index {index}: expected {expected}, actual {actual}, diff {diff}, thresh {thresh}")]
    ValueMismatch {
        index: usize,
        expected: f64,
        actual: f64,
        diff: f64,
        thresh: f64,
    },
}

/// Checks `|e - a| <= atol + rtol * max(|e|, |a|)` elementwise and reports the first violation.
///
/// NaN on either side never compares close.
pub fn allclose<T: Element>(
    expected: &[T],
    actual: &[T],
    atol: f64,
    rtol: f64,
) -> Result<(), ParityError> {
    if expected.len() != actual.len() {
        return Err(ParityError::LengthMismatch {
            expected: expected.len(),
            actual: actual.len(),
        });
    }
    let tolerance = Tolerance::new(atol, rtol);
    for (index, (e, a)) in expected.iter().zip(actual).enumerate() {
        let (e, a) = (e.to_f64(), a.to_f64());
        let diff = (e - a).abs();
        let thresh = tolerance.threshold(e, a);
        if diff.is_nan() || diff > thresh {
            return Err(ParityError::ValueMismatch {
                index,
                expected: e,
                actual: a,
                diff,
                thresh,
            });
        }
    }
    Ok(())
}

/// Shape-checked [`allclose`] over whole tensors.
pub fn allclose_tensors<T: Element>(
    expected: &Tensor<T>,
    actual: &Tensor<T>,
    tolerance: Tolerance,
) -> Result<(), ParityError> {
    if expected.dims() != actual.dims() {
        return Err(ParityError::ShapeMismatch {
            expected: expected.dims().to_vec(),
            actual: actual.dims().to_vec(),
        });
    }
    allclose(expected.data(), actual.data(), tolerance.atol, tolerance.rtol)
}

/// Largest absolute difference; NaN if any pair involves a NaN.
pub fn max_abs_diff<T: Element>(expected: &[T], actual: &[T]) -> f64 {
    expected
        .iter()
        .zip(actual)
        .map(|(e, a)| (e.to_f64() - a.to_f64()).abs())
        .fold(0.0, |acc, diff| {
            if acc.is_nan() || diff.is_nan() {
                f64::NAN
            } else {
                acc.max(diff)
            }
        })
}

/// Panicking form of [`allclose`] for use inside tests.
#[track_caller]
pub fn assert_close<T: Element>(expected: &[T], actual: &[T], tolerance: Tolerance) {
    if let Err(err) = allclose(expected, actual, tolerance.atol, tolerance.rtol) {
        panic!("{err}");
    }
}
