mod estimator;
mod linalg;
mod ridge;
mod ridge_classifier;

pub use estimator::Estimator;
pub use ridge::{ModelConfig, Ridge};
pub use ridge_classifier::RidgeClassifier;
