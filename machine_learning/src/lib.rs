pub mod dataset;
pub mod error;
pub mod estimators;
pub mod metrics;
pub mod readout;
pub mod target;

pub use error::{MlErr, Result};
