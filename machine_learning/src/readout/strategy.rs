use serde::{Deserialize, Serialize};

use crate::{
    MlErr, Result,
    estimators::{Estimator, ModelConfig, Ridge, RidgeClassifier},
    target::DType,
};

/// The kind of training the targets call for.
///
/// Multi-output regression and multiclass or multilabel classification go through the same
/// paths as their single output counterparts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Regression,
    Classification,
}

impl Strategy {
    /// Builds the default estimator for this strategy.
    ///
    /// # Arguments
    /// * `config` - The estimator's constructor arguments.
    ///
    /// # Returns
    /// A fresh `Ridge` for regression or a fresh `RidgeClassifier` for classification.
    pub fn default_estimator(self, config: &ModelConfig) -> Box<dyn Estimator> {
        match self {
            Strategy::Regression => Box::new(Ridge::from_config(config)),
            Strategy::Classification => Box::new(RidgeClassifier::from_config(config)),
        }
    }
}

/// Selects the training strategy from the targets' numeric type tag.
///
/// # Returns
/// Regression for floating point targets, classification for integer targets, or an
/// unsupported target type error for any other tag.
pub fn select_strategy(dtype: DType) -> Result<Strategy> {
    if dtype.is_float() {
        Ok(Strategy::Regression)
    } else if dtype.is_integer() {
        Ok(Strategy::Classification)
    } else {
        Err(MlErr::UnsupportedTargetType(dtype))
    }
}
