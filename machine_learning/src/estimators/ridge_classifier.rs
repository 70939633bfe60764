use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use super::{Estimator, ModelConfig, Ridge, ridge::check_fit_data};
use crate::{MlErr, Result, metrics::classification::accuracy};

/// How the labels seen during `fit` were encoded as ridge targets.
#[derive(Debug, Clone)]
enum LabelLayout {
    /// A single column with two classes, the positive one being the greatest.
    Binary { classes: [f64; 2] },
    /// A single column with more than two classes, one indicator per class.
    Multiclass { classes: Vec<f64> },
    /// One {0, 1} indicator column per label.
    Multilabel,
}

/// A classifier built on top of `Ridge`.
///
/// Labels are turned into {-1, 1} indicators, regressed, and decoded back by sign or by the
/// greatest decision value.
#[derive(Debug, Clone)]
pub struct RidgeClassifier {
    ridge: Ridge,
    layout: Option<LabelLayout>,
}

impl RidgeClassifier {
    pub fn new(alpha: f64, fit_intercept: bool) -> Self {
        Self {
            ridge: Ridge::new(alpha, fit_intercept),
            layout: None,
        }
    }

    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(config.alpha, config.fit_intercept)
    }

    /// The distinct labels seen during `fit`, sorted, for single column targets.
    pub fn classes(&self) -> Option<&[f64]> {
        match self.layout.as_ref()? {
            LabelLayout::Binary { classes } => Some(classes.as_slice()),
            LabelLayout::Multiclass { classes } => Some(classes.as_slice()),
            LabelLayout::Multilabel => None,
        }
    }

    /// The raw ridge output for each sample.
    pub fn decision_function(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        self.ridge.predict(x)
    }

    fn encode(&self, y: ArrayView2<f64>) -> Result<(LabelLayout, Array2<f64>)> {
        let indicator = |hit: bool| if hit { 1.0 } else { -1.0 };

        if y.ncols() > 1 {
            return Ok((LabelLayout::Multilabel, y.mapv(|v| indicator(v > 0.0))));
        }

        let column = y.column(0);
        let mut classes = column.to_vec();
        classes.sort_by(f64::total_cmp);
        classes.dedup();

        match classes.len() {
            0 | 1 => Err(MlErr::Fit(format!(
                "a classifier needs samples of at least 2 classes, got {}",
                classes.len()
            ))),
            2 => {
                let encoded = column
                    .mapv(|v| indicator(v == classes[1]))
                    .insert_axis(Axis(1));
                let layout = LabelLayout::Binary {
                    classes: [classes[0], classes[1]],
                };
                Ok((layout, encoded))
            }
            k => {
                let encoded =
                    Array2::from_shape_fn((y.nrows(), k), |(i, c)| indicator(column[i] == classes[c]));
                Ok((LabelLayout::Multiclass { classes }, encoded))
            }
        }
    }
}

impl Default for RidgeClassifier {
    fn default() -> Self {
        Self::from_config(&ModelConfig::default())
    }
}

impl Estimator for RidgeClassifier {
    fn fit(
        &mut self,
        x: ArrayView2<f64>,
        y: ArrayView2<f64>,
        sample_weight: Option<ArrayView1<f64>>,
    ) -> Result<()> {
        check_fit_data(x, y, sample_weight)?;

        let (layout, encoded) = self.encode(y)?;
        self.ridge.fit(x, encoded.view(), sample_weight)?;
        self.layout = Some(layout);
        Ok(())
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        let Some(layout) = &self.layout else {
            return Err(MlErr::Predict("the model hasn't been fitted".into()));
        };

        let decision = self.ridge.predict(x)?;
        let labels = match layout {
            LabelLayout::Binary { classes } => decision.mapv(|d| {
                if d > 0.0 { classes[1] } else { classes[0] }
            }),
            LabelLayout::Multiclass { classes } => {
                let picked = decision.map_axis(Axis(1), |row| {
                    let mut best = 0;
                    for (c, &d) in row.iter().enumerate() {
                        if d > row[best] {
                            best = c;
                        }
                    }
                    classes[best]
                });
                picked.insert_axis(Axis(1))
            }
            LabelLayout::Multilabel => decision.mapv(|d| if d > 0.0 { 1.0 } else { 0.0 }),
        };

        Ok(labels)
    }

    fn score(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView2<f64>,
        sample_weight: Option<ArrayView1<f64>>,
    ) -> Result<f64> {
        let y_pred = self.predict(x)?;
        accuracy("score", y, y_pred.view(), sample_weight)
    }

    fn name(&self) -> &'static str {
        "RidgeClassifier"
    }

    fn box_clone(&self) -> Box<dyn Estimator> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn separates_two_classes() {
        let x = array![[-2.0], [-1.5], [-1.0], [1.0], [1.5], [2.0]];
        let y = array![[3.0], [3.0], [3.0], [7.0], [7.0], [7.0]];

        let mut clf = RidgeClassifier::default();
        clf.fit(x.view(), y.view(), None).unwrap();

        assert_eq!(clf.classes().unwrap(), [3.0, 7.0]);
        assert_eq!(clf.predict(x.view()).unwrap(), y);
        assert_eq!(clf.score(x.view(), y.view(), None).unwrap(), 1.0);
    }

    #[test]
    fn picks_the_greatest_decision_for_many_classes() {
        let x = array![
            [1.0, 0.0, 0.0],
            [0.9, 0.1, 0.0],
            [0.0, 1.0, 0.0],
            [0.1, 0.9, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.1, 0.9],
        ];
        let y = array![[0.0], [0.0], [1.0], [1.0], [2.0], [2.0]];

        let mut clf = RidgeClassifier::new(1e-3, true);
        clf.fit(x.view(), y.view(), None).unwrap();

        assert_eq!(clf.classes().unwrap(), [0.0, 1.0, 2.0]);
        assert_eq!(clf.predict(x.view()).unwrap(), y);
    }

    #[test]
    fn multilabel_targets_are_decoded_per_column() {
        let x = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.0, 0.0]];
        let y = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.0, 0.0]];

        let mut clf = RidgeClassifier::new(1e-3, true);
        clf.fit(x.view(), y.view(), None).unwrap();

        assert!(clf.classes().is_none());
        assert_eq!(clf.predict(x.view()).unwrap(), y);
    }

    #[test]
    fn a_single_class_fails_to_fit() {
        let x = array![[1.0], [2.0]];
        let y = array![[1.0], [1.0]];

        let mut clf = RidgeClassifier::default();
        assert!(matches!(clf.fit(x.view(), y.view(), None), Err(MlErr::Fit(_))));
    }
}
