use std::{
    error::Error,
    fmt::{self, Display},
};

use rand_distr::uniform::Error as UniformError;

use crate::NodeSet;

/// The result type used in the entire reservoir module.
pub type Result<T> = std::result::Result<T, ReservoirErr>;

/// The reservoir module's error type.
#[derive(Debug, Clone, PartialEq)]
pub enum ReservoirErr {
    NotSquare {
        rows: usize,
        cols: usize,
    },
    EmptyNodeSet(NodeSet),
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    InvalidParameter(String),
}

impl From<UniformError> for ReservoirErr {
    fn from(value: UniformError) -> Self {
        Self::InvalidParameter(value.to_string())
    }
}

impl Display for ReservoirErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReservoirErr::NotSquare { rows, cols } => {
                write!(f, "The weight matrix must be square, got {rows}x{cols}")
            }
            ReservoirErr::EmptyNodeSet(set) => write!(f, "The node set {set} has no nodes"),
            ReservoirErr::DimensionMismatch {
                what,
                expected,
                got,
            } => write!(f, "Expected {expected} {what} but got {got}"),
            ReservoirErr::InvalidParameter(reason) => write!(f, "Invalid parameter: {reason}"),
        }
    }
}

impl Error for ReservoirErr {}
