use std::{
    fmt::{self, Display},
    ops::Range,
};

use ndarray::{Array, Array2, ArrayD, Axis, Dimension, Ix2, Slice};
use serde::{Deserialize, Serialize};

use crate::{MlErr, Result};

/// The numeric type tag of a target array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DType {
    F32,
    F64,
    I32,
    I64,
    U8,
    Bool,
}

impl DType {
    pub fn is_float(self) -> bool {
        matches!(self, DType::F32 | DType::F64)
    }

    pub fn is_integer(self) -> bool {
        matches!(self, DType::I32 | DType::I64)
    }
}

impl Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DType::F32 => "float32",
            DType::F64 => "float64",
            DType::I32 => "int32",
            DType::I64 => "int64",
            DType::U8 => "uint8",
            DType::Bool => "bool",
        };

        f.write_str(s)
    }
}

/// A target array tagged with its element type. The first axis is always the sample axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TargetData {
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
    I32(ArrayD<i32>),
    I64(ArrayD<i64>),
    U8(ArrayD<u8>),
    Bool(ArrayD<bool>),
}

/// Applies `$body` to the inner array of every variant, rewrapping the result in the same variant.
macro_rules! map_variants {
    ($target:expr, $arr:ident => $body:expr) => {
        match $target {
            TargetData::F32($arr) => TargetData::F32($body),
            TargetData::F64($arr) => TargetData::F64($body),
            TargetData::I32($arr) => TargetData::I32($body),
            TargetData::I64($arr) => TargetData::I64($body),
            TargetData::U8($arr) => TargetData::U8($body),
            TargetData::Bool($arr) => TargetData::Bool($body),
        }
    };
}

/// Applies `$body` to the inner array of every variant.
macro_rules! with_variants {
    ($target:expr, $arr:ident => $body:expr) => {
        match $target {
            TargetData::F32($arr) => $body,
            TargetData::F64($arr) => $body,
            TargetData::I32($arr) => $body,
            TargetData::I64($arr) => $body,
            TargetData::U8($arr) => $body,
            TargetData::Bool($arr) => $body,
        }
    };
}

impl TargetData {
    /// Returns the numeric type tag of the elements.
    pub fn dtype(&self) -> DType {
        match self {
            TargetData::F32(_) => DType::F32,
            TargetData::F64(_) => DType::F64,
            TargetData::I32(_) => DType::I32,
            TargetData::I64(_) => DType::I64,
            TargetData::U8(_) => DType::U8,
            TargetData::Bool(_) => DType::Bool,
        }
    }

    pub fn shape(&self) -> &[usize] {
        with_variants!(self, a => a.shape())
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// The amount of samples, that is, the length of the first axis.
    pub fn nsamples(&self) -> usize {
        self.shape().first().copied().unwrap_or(0)
    }

    /// Drops every trailing axis of length one, the sample axis is always kept.
    pub fn squeeze(self) -> Self {
        map_variants!(self, a => squeeze_trailing(a))
    }

    /// Takes the samples in `rows`.
    pub fn select_rows(&self, rows: Range<usize>) -> Self {
        map_variants!(self, a => a.slice_axis(Axis(0), Slice::from(rows.clone())).to_owned())
    }

    /// Casts the targets into a `[n_samples, n_outputs]` floating point matrix.
    ///
    /// # Returns
    /// The matrix or a shape mismatch error if the targets have more than two axes.
    pub fn to_matrix(&self) -> Result<Array2<f64>> {
        match self {
            TargetData::F32(a) => as_matrix(a.mapv(f64::from)),
            TargetData::F64(a) => as_matrix(a.clone()),
            TargetData::I32(a) => as_matrix(a.mapv(f64::from)),
            TargetData::I64(a) => as_matrix(a.mapv(|v| v as f64)),
            TargetData::U8(a) => as_matrix(a.mapv(f64::from)),
            TargetData::Bool(a) => as_matrix(a.mapv(|v| if v { 1.0 } else { 0.0 })),
        }
    }
}

/// Removes trailing singleton axes, leaving at least one axis.
pub(crate) fn squeeze_trailing<T>(mut a: ArrayD<T>) -> ArrayD<T> {
    while a.ndim() > 1 && a.shape()[a.ndim() - 1] == 1 {
        let last = a.ndim() - 1;
        a = a.remove_axis(Axis(last));
    }

    a
}

fn as_matrix(a: ArrayD<f64>) -> Result<Array2<f64>> {
    let shape = a.shape().to_vec();
    let a = match a.ndim() {
        1 => a.insert_axis(Axis(1)),
        _ => a,
    };

    a.into_dimensionality::<Ix2>()
        .map_err(|_| MlErr::ShapeMismatch {
            what: "targets",
            train: shape.clone(),
            test: shape,
        })
}

macro_rules! impl_from_array {
    ($($elem:ty => $variant:ident),* $(,)?) => {
        $(
            impl<D: Dimension> From<Array<$elem, D>> for TargetData {
                fn from(value: Array<$elem, D>) -> Self {
                    TargetData::$variant(value.into_dyn())
                }
            }
        )*
    };
}

impl_from_array!(
    f32 => F32,
    f64 => F64,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    bool => Bool,
);
