pub mod classification;
mod config;
pub mod regression;
mod registry;

pub use config::{MetricConfig, Multioutput, Nonnegative, Score};
pub use registry::{Metric, MetricFn, MetricRegistry, SCORE};
