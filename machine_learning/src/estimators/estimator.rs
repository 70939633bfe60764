use std::fmt::Debug;

use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::Result;

/// A trainable readout model.
///
/// Targets and predictions are always `[n_samples, n_outputs]` matrices, classifiers encode
/// their labels as floating point values.
pub trait Estimator: Debug + Send {
    /// Fits the model to the given samples.
    ///
    /// # Arguments
    /// * `x` - The features, one row per sample.
    /// * `y` - The targets, one row per sample.
    /// * `sample_weight` - An optional non negative weight per sample.
    ///
    /// # Returns
    /// A fit error if the data is rejected by the model.
    fn fit(
        &mut self,
        x: ArrayView2<f64>,
        y: ArrayView2<f64>,
        sample_weight: Option<ArrayView1<f64>>,
    ) -> Result<()>;

    /// Predicts the targets of the given samples.
    ///
    /// # Arguments
    /// * `x` - The features, one row per sample.
    ///
    /// # Returns
    /// The predictions or a predict error if the model is not fitted or the features mismatch.
    fn predict(&self, x: ArrayView2<f64>) -> Result<Array2<f64>>;

    /// The model's default score over the given samples.
    ///
    /// # Arguments
    /// * `x` - The features, one row per sample.
    /// * `y` - The expected targets.
    /// * `sample_weight` - An optional weight per sample.
    ///
    /// # Returns
    /// The coefficient of determination for regressors and the mean accuracy for classifiers.
    fn score(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView2<f64>,
        sample_weight: Option<ArrayView1<f64>>,
    ) -> Result<f64>;

    /// A human readable name of the model.
    fn name(&self) -> &'static str;

    /// Copies the model, fitted state included, into a new box.
    fn box_clone(&self) -> Box<dyn Estimator>;
}

impl Clone for Box<dyn Estimator> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}
