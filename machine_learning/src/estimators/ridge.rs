use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{
    Estimator,
    linalg::{cholesky, cholesky_solve},
};
use crate::{MlErr, Result, metrics::regression::r2_per_output};

/// Constructor arguments shared by the default ridge estimators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// The regularization strength.
    pub alpha: f64,
    pub fit_intercept: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            fit_intercept: true,
        }
    }
}

/// Linear least squares with l2 regularization.
#[derive(Debug, Clone)]
pub struct Ridge {
    alpha: f64,
    fit_intercept: bool,

    // [n_features, n_outputs]
    coef: Option<Array2<f64>>,
    intercept: Array1<f64>,
}

impl Ridge {
    /// Creates a new unfitted `Ridge`.
    ///
    /// # Arguments
    /// * `alpha` - The regularization strength, must be non negative.
    /// * `fit_intercept` - Whether to center the data and fit an intercept.
    pub fn new(alpha: f64, fit_intercept: bool) -> Self {
        Self {
            alpha,
            fit_intercept,
            coef: None,
            intercept: Array1::zeros(0),
        }
    }

    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(config.alpha, config.fit_intercept)
    }

    /// The fitted coefficients, `[n_features, n_outputs]`.
    pub fn coef(&self) -> Option<&Array2<f64>> {
        self.coef.as_ref()
    }

    pub fn intercept(&self) -> &Array1<f64> {
        &self.intercept
    }
}

impl Default for Ridge {
    fn default() -> Self {
        Self::from_config(&ModelConfig::default())
    }
}

impl Estimator for Ridge {
    fn fit(
        &mut self,
        x: ArrayView2<f64>,
        y: ArrayView2<f64>,
        sample_weight: Option<ArrayView1<f64>>,
    ) -> Result<()> {
        check_fit_data(x, y, sample_weight)?;

        if !(self.alpha >= 0.0) || !self.alpha.is_finite() {
            return Err(MlErr::Fit(format!(
                "alpha must be a finite non negative number, got {}",
                self.alpha
            )));
        }

        let n = x.nrows();
        let weights = match sample_weight {
            Some(w) => w.to_owned(),
            None => Array1::ones(n),
        };

        let wsum = weights.sum();
        if !(wsum > 0.0) {
            return Err(MlErr::Fit("the sample weights sum up to zero".into()));
        }

        let (x_mean, y_mean) = if self.fit_intercept {
            (x.t().dot(&weights) / wsum, y.t().dot(&weights) / wsum)
        } else {
            (Array1::zeros(x.ncols()), Array1::zeros(y.ncols()))
        };

        let sqrt_w = weights.mapv(f64::sqrt).insert_axis(Axis(1));
        let xw = (&x - &x_mean) * &sqrt_w;
        let yw = (&y - &y_mean) * &sqrt_w;

        let mut gram = xw.t().dot(&xw);
        gram.diag_mut().mapv_inplace(|d| d + self.alpha);
        let rhs = xw.t().dot(&yw);

        let l = cholesky(gram.view()).map_err(|(i, pivot)| {
            MlErr::Fit(format!(
                "the regularized gram matrix is not positive definite at row {i} (pivot {pivot:e}), try increasing alpha"
            ))
        })?;

        // Every output shares the same factorization.
        let columns: Vec<Array1<f64>> = (0..rhs.ncols())
            .into_par_iter()
            .map(|j| cholesky_solve(l.view(), rhs.column(j)))
            .collect();

        let mut coef = Array2::zeros((x.ncols(), y.ncols()));
        for (mut dst, src) in coef.columns_mut().into_iter().zip(&columns) {
            dst.assign(src);
        }

        self.intercept = &y_mean - &x_mean.dot(&coef);
        self.coef = Some(coef);
        Ok(())
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        let Some(coef) = &self.coef else {
            return Err(MlErr::Predict("the model hasn't been fitted".into()));
        };

        if x.ncols() != coef.nrows() {
            return Err(MlErr::Predict(format!(
                "the model was fitted with {} features but got {}",
                coef.nrows(),
                x.ncols()
            )));
        }

        Ok(x.dot(coef) + &self.intercept)
    }

    fn score(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView2<f64>,
        sample_weight: Option<ArrayView1<f64>>,
    ) -> Result<f64> {
        let y_pred = self.predict(x)?;
        let r2 = r2_per_output("score", y, y_pred.view(), sample_weight)?;
        Ok(r2.mean().unwrap_or(f64::NAN))
    }

    fn name(&self) -> &'static str {
        "Ridge"
    }

    fn box_clone(&self) -> Box<dyn Estimator> {
        Box::new(self.clone())
    }
}

/// Validates the data handed to `fit`, shared by every built-in estimator.
pub(super) fn check_fit_data(
    x: ArrayView2<f64>,
    y: ArrayView2<f64>,
    sample_weight: Option<ArrayView1<f64>>,
) -> Result<()> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(MlErr::Fit(format!(
            "expected a non empty feature matrix, got shape {:?}",
            x.shape()
        )));
    }

    if x.nrows() != y.nrows() {
        return Err(MlErr::Fit(format!(
            "found {} feature rows but {} target rows",
            x.nrows(),
            y.nrows()
        )));
    }

    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(MlErr::Fit("the data contains NaN or infinite values".into()));
    }

    if let Some(w) = sample_weight {
        if w.len() != x.nrows() {
            return Err(MlErr::Fit(format!(
                "found {} sample weights for {} samples",
                w.len(),
                x.nrows()
            )));
        }

        if w.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(MlErr::Fit(
                "sample weights must be finite and non negative".into(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use ndarray::{Array, array};

    use super::*;

    #[test]
    fn recovers_a_linear_relation() {
        let x = Array::linspace(0.0, 1.0, 20).insert_axis(Axis(1));
        let y = x.mapv(|v| 3.0 * v - 1.0);

        let mut ridge = Ridge::new(1e-9, true);
        ridge.fit(x.view(), y.view(), None).unwrap();

        let coef = ridge.coef().unwrap();
        assert!((coef[[0, 0]] - 3.0).abs() < 1e-6);
        assert!((ridge.intercept()[0] + 1.0).abs() < 1e-6);
        assert!(ridge.score(x.view(), y.view(), None).unwrap() > 0.999_999);
    }

    #[test]
    fn regularization_shrinks_the_coefficients() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![[2.0], [4.0], [6.0], [8.0]];

        let mut weak = Ridge::new(1e-6, true);
        let mut strong = Ridge::new(100.0, true);
        weak.fit(x.view(), y.view(), None).unwrap();
        strong.fit(x.view(), y.view(), None).unwrap();

        assert!(strong.coef().unwrap()[[0, 0]].abs() < weak.coef().unwrap()[[0, 0]].abs());
    }

    #[test]
    fn zero_weighted_samples_are_ignored() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![[0.0], [1.0], [2.0], [100.0]];
        let w = array![1.0, 1.0, 1.0, 0.0];

        let mut ridge = Ridge::new(1e-9, true);
        ridge.fit(x.view(), y.view(), Some(w.view())).unwrap();

        let pred = ridge.predict(array![[3.0]].view()).unwrap();
        assert!((pred[[0, 0]] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn non_finite_data_fails_to_fit() {
        let x = array![[0.0], [f64::NAN]];
        let y = array![[0.0], [1.0]];

        let mut ridge = Ridge::default();
        assert!(matches!(
            ridge.fit(x.view(), y.view(), None),
            Err(MlErr::Fit(_))
        ));
    }

    #[test]
    fn predicting_with_the_wrong_feature_count_fails() {
        let x = array![[0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
        let y = array![[0.0], [1.0], [2.0]];

        let mut ridge = Ridge::default();
        ridge.fit(x.view(), y.view(), None).unwrap();

        assert!(matches!(
            ridge.predict(array![[1.0]].view()),
            Err(MlErr::Predict(_))
        ));
    }

    #[test]
    fn unregularized_rank_deficient_data_fails() {
        let x = array![[1.0, 1.0], [1.0, 1.0], [1.0, 1.0], [1.0, 1.0]];
        let y = array![[1.0], [2.0], [3.0], [4.0]];

        let mut ridge = Ridge::new(0.0, false);
        assert!(matches!(
            ridge.fit(x.view(), y.view(), None),
            Err(MlErr::Fit(_))
        ));
    }
}
