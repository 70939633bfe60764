use log::debug;
use ndarray::{Array1, Array2, ArrayD, Axis, Ix2};

use super::{Strategy, select_strategy};
use crate::{
    MlErr, Result,
    estimators::{Estimator, ModelConfig},
    metrics::{Metric, MetricConfig, MetricRegistry, Score},
    target::{TargetData, squeeze_trailing},
};

/// One evaluation's scores, in the order the metrics were requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRow {
    scores: Vec<(String, Score)>,
}

impl ResultRow {
    pub fn get(&self, metric: &str) -> Option<&Score> {
        self.scores
            .iter()
            .find_map(|(name, score)| (name == metric).then_some(score))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Score)> {
        self.scores.iter().map(|(name, score)| (name.as_str(), score))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scores.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// The optional knobs of `evaluate`.
#[derive(Debug, Default)]
pub struct EvalOptions {
    /// Overrides the strategy derived from the train targets.
    pub strategy: Option<Strategy>,
    /// Overrides the strategy's default estimator.
    pub model: Option<Box<dyn Estimator>>,
    /// Constructor arguments for the default estimator.
    pub model_config: ModelConfig,
    /// Keyword arguments forwarded to the registry metrics.
    pub metric_config: MetricConfig,
    /// The train and test sample weights.
    pub sample_weight: (Option<Array1<f64>>, Option<Array1<f64>>),
}

/// Brings the train and test arrays to the shapes the estimators expect.
///
/// One dimensional states become single feature matrices, states with more than two axes lose
/// their trailing singleton axes, and so do the targets. Already normalized arrays are returned
/// untouched.
///
/// # Arguments
/// * `states` - The train and test reservoir states.
/// * `targets` - The train and test targets.
///
/// # Returns
/// The normalized `(x_train, x_test, y_train, y_test)`, or a shape mismatch error if train and
/// test can't be reconciled.
pub fn check_xy_dims(
    states: (ArrayD<f64>, ArrayD<f64>),
    targets: (TargetData, TargetData),
) -> Result<(Array2<f64>, Array2<f64>, TargetData, TargetData)> {
    let (mut x_train, mut x_test) = states;
    let (y_train, y_test) = targets;

    if x_train.ndim() == 1 && x_test.ndim() == 1 {
        x_train = x_train.insert_axis(Axis(1));
        x_test = x_test.insert_axis(Axis(1));
    } else if x_train.ndim() > 2 && x_test.ndim() > 2 {
        x_train = squeeze_trailing(x_train);
        x_test = squeeze_trailing(x_test);
    }

    let states_mismatch = |train: &ArrayD<f64>, test: &ArrayD<f64>| MlErr::ShapeMismatch {
        what: "reservoir states",
        train: train.shape().to_vec(),
        test: test.shape().to_vec(),
    };

    let (x_train, x_test) = match (
        x_train.clone().into_dimensionality::<Ix2>(),
        x_test.clone().into_dimensionality::<Ix2>(),
    ) {
        (Ok(train), Ok(test)) if train.ncols() == test.ncols() => (train, test),
        _ => return Err(states_mismatch(&x_train, &x_test)),
    };

    let y_train = y_train.squeeze();
    let y_test = y_test.squeeze();

    if y_train.ndim() != y_test.ndim() || y_train.shape()[1..] != y_test.shape()[1..] {
        return Err(MlErr::ShapeMismatch {
            what: "targets",
            train: y_train.shape().to_vec(),
            test: y_test.shape().to_vec(),
        });
    }

    if y_train.dtype() != y_test.dtype() {
        return Err(MlErr::TargetTypeMismatch {
            train: y_train.dtype(),
            test: y_test.dtype(),
        });
    }

    Ok((x_train, x_test, y_train, y_test))
}

/// Fits a readout on the train partition and scores it on the test partition.
///
/// Every metric name is resolved before fitting, and the first metric that fails aborts the
/// whole row, so a row is either complete or not returned at all.
///
/// # Arguments
/// * `states` - The train and test reservoir states, `[n_samples, n_nodes]` or a vector.
/// * `targets` - The train and test targets, `[n_samples, n_labels]` or a vector.
/// * `metrics` - The metric names, `score` stands for the estimator's own score.
/// * `registry` - Where metric names are looked up.
/// * `options` - Strategy, estimator and metric overrides.
///
/// # Returns
/// The scores and the fitted estimator.
pub fn evaluate<S: AsRef<str>>(
    states: (ArrayD<f64>, ArrayD<f64>),
    targets: (TargetData, TargetData),
    metrics: &[S],
    registry: &MetricRegistry,
    options: EvalOptions,
) -> Result<(ResultRow, Box<dyn Estimator>)> {
    let metrics = registry.resolve(metrics)?;
    evaluate_resolved(states, targets, &metrics, options)
}

pub(crate) fn evaluate_resolved(
    states: (ArrayD<f64>, ArrayD<f64>),
    targets: (TargetData, TargetData),
    metrics: &[Metric],
    options: EvalOptions,
) -> Result<(ResultRow, Box<dyn Estimator>)> {
    let EvalOptions {
        strategy,
        model,
        model_config,
        metric_config,
        sample_weight: (sw_train, sw_test),
    } = options;

    let (x_train, x_test, y_train, y_test) = check_xy_dims(states, targets)?;

    let strategy = match strategy {
        Some(strategy) => strategy,
        None => select_strategy(y_train.dtype())?,
    };

    let y_train = y_train.to_matrix()?;
    let y_test = y_test.to_matrix()?;

    let mut model = model.unwrap_or_else(|| strategy.default_estimator(&model_config));
    model.fit(
        x_train.view(),
        y_train.view(),
        sw_train.as_ref().map(|w| w.view()),
    )?;

    let sw_test = sw_test.as_ref().map(|w| w.view());
    let mut y_pred: Option<Array2<f64>> = None;
    let mut scores = Vec::with_capacity(metrics.len());

    for metric in metrics {
        let score = match metric {
            Metric::Score => Score::Scalar(model.score(x_test.view(), y_test.view(), sw_test)?),
            Metric::Registered { func, .. } => {
                let y_pred = match &mut y_pred {
                    Some(y_pred) => y_pred,
                    slot => slot.insert(model.predict(x_test.view())?),
                };
                func(y_test.view(), y_pred.view(), sw_test, &metric_config)?
            }
        };

        debug!(metric = metric.name(), model = model.name(); "{} = {score}", metric.name());
        scores.push((metric.name().to_string(), score));
    }

    Ok((ResultRow { scores }, model))
}
