use std::fmt::{self, Display};

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// How per-output values are reduced to the reported score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Multioutput {
    #[default]
    UniformAverage,
    Sum,
    RawValues,
}

/// How per-output values are made non negative before being reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nonnegative {
    Absolute,
    Squared,
}

/// Keyword arguments forwarded to every registry metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricConfig {
    pub multioutput: Multioutput,
    pub nonnegative: Option<Nonnegative>,
}

impl MetricConfig {
    /// Applies `nonnegative` and then `multioutput` to the given per-output values.
    pub fn reduce(&self, mut per_output: Array1<f64>) -> Score {
        match self.nonnegative {
            Some(Nonnegative::Absolute) => per_output.mapv_inplace(f64::abs),
            Some(Nonnegative::Squared) => per_output.mapv_inplace(|v| v * v),
            None => {}
        }

        match self.multioutput {
            Multioutput::UniformAverage => Score::Scalar(per_output.mean().unwrap_or(f64::NAN)),
            Multioutput::Sum => Score::Scalar(per_output.sum()),
            Multioutput::RawValues => Score::Vector(per_output.to_vec()),
        }
    }
}

/// The value of a metric, scalar for most of them, one per output for raw values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Score {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl Score {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Score::Scalar(v) => Some(*v),
            Score::Vector(_) => None,
        }
    }
}

impl Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Scalar(v) => write!(f, "{v}"),
            Score::Vector(values) => {
                write!(f, "[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}
