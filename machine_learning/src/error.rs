use std::{
    error::Error,
    fmt::{self, Display},
};

use crate::target::DType;

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug, Clone, PartialEq)]
pub enum MlErr {
    ShapeMismatch {
        what: &'static str,
        train: Vec<usize>,
        test: Vec<usize>,
    },
    UnsupportedTargetType(DType),
    TargetTypeMismatch {
        train: DType,
        test: DType,
    },
    UnknownMetric(String),
    Fit(String),
    Predict(String),
    Metric {
        metric: String,
        reason: String,
    },
    InvalidSplit {
        frac_train: f64,
        samples: usize,
    },
    LengthMismatch {
        inputs: usize,
        targets: usize,
    },
    ModuleMismatch {
        modules: usize,
        nodes: usize,
    },
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MlErr::ShapeMismatch { what, train, test } => format!(
                "The train and test {what} can't be reconciled, got shapes {train:?} and {test:?}"
            ),
            MlErr::UnsupportedTargetType(dtype) => {
                format!("Can't select a training strategy for targets of type {dtype}")
            }
            MlErr::TargetTypeMismatch { train, test } => format!(
                "The train targets are of type {train} but the test targets are of type {test}"
            ),
            MlErr::UnknownMetric(name) => format!("There's no metric registered as '{name}'"),
            MlErr::Fit(reason) => format!("Failed to fit the estimator: {reason}"),
            MlErr::Predict(reason) => format!("Failed to predict: {reason}"),
            MlErr::Metric { metric, reason } => {
                format!("Failed to compute metric '{metric}': {reason}")
            }
            MlErr::InvalidSplit {
                frac_train,
                samples,
            } => format!(
                "Can't split {samples} samples with a train fraction of {frac_train}, both partitions must be non empty"
            ),
            MlErr::LengthMismatch { inputs, targets } => {
                format!("Got {inputs} input samples but {targets} target samples")
            }
            MlErr::ModuleMismatch { modules, nodes } => {
                format!("Got {modules} readout module labels for {nodes} readout nodes")
            }
        };

        write!(f, "{s}")
    }
}

impl Error for MlErr {}
