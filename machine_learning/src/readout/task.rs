use std::collections::BTreeMap;

use log::debug;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use super::{EvalOptions, ResultRow, Strategy, pipeline::evaluate_resolved};
use crate::{
    MlErr, Result,
    estimators::{Estimator, ModelConfig},
    metrics::{Metric, MetricConfig, MetricRegistry},
    target::TargetData,
};

/// One evaluation of the readout, over every readout node or over the nodes of a single module.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRow {
    pub module: Option<String>,
    pub n_nodes: usize,
    pub scores: ResultRow,
}

/// The readout settings a task is run with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadoutConfig {
    /// Forces a strategy instead of deriving it from the targets.
    pub strategy: Option<Strategy>,
    pub model_config: ModelConfig,
    pub metric_config: MetricConfig,
}

/// Trains and scores readouts on reservoir states.
///
/// The metric names are resolved once on construction, so an unknown name fails before any
/// state is simulated or any estimator is fitted.
#[derive(Debug, Clone)]
pub struct Readout {
    metrics: Vec<Metric>,
    config: ReadoutConfig,
    /// Replaces the strategy's default estimator, every evaluation fits its own copy.
    model: Option<Box<dyn Estimator>>,
}

impl Readout {
    /// Creates a new `Readout`.
    ///
    /// # Arguments
    /// * `metrics` - The metric names to score, in output order.
    /// * `registry` - Where the metric names are looked up.
    /// * `config` - The strategy, estimator and metric settings.
    ///
    /// # Returns
    /// The readout or an unknown metric error.
    pub fn new<S: AsRef<str>>(
        metrics: &[S],
        registry: &MetricRegistry,
        config: ReadoutConfig,
    ) -> Result<Self> {
        let metrics = registry.resolve(metrics)?;
        Ok(Self {
            metrics,
            config,
            model: None,
        })
    }

    /// Uses a copy of `model` instead of the strategy's default estimator in every evaluation.
    pub fn with_model(mut self, model: Box<dyn Estimator>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn metric_names(&self) -> impl Iterator<Item = &str> {
        self.metrics.iter().map(Metric::name)
    }

    /// Evaluates the readout on the given states.
    ///
    /// # Arguments
    /// * `states` - The train and test reservoir states, `[n_samples, n_nodes]`.
    /// * `targets` - The train and test targets.
    /// * `sample_weight` - The train and test sample weights.
    /// * `modules` - An optional module label per readout node.
    ///
    /// # Returns
    /// A single row over every node, or a row per distinct module in sorted order.
    pub fn run_task(
        &self,
        states: (Array2<f64>, Array2<f64>),
        targets: (TargetData, TargetData),
        sample_weight: (Option<Array1<f64>>, Option<Array1<f64>>),
        modules: Option<&[String]>,
    ) -> Result<Vec<TaskRow>> {
        let Some(modules) = modules else {
            let n_nodes = states.0.ncols();
            let scores = self.evaluate(states, targets, sample_weight)?;
            return Ok(vec![TaskRow {
                module: None,
                n_nodes,
                scores,
            }]);
        };

        let n_nodes = states.0.ncols();
        if modules.len() != n_nodes {
            return Err(MlErr::ModuleMismatch {
                modules: modules.len(),
                nodes: n_nodes,
            });
        }

        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (node, module) in modules.iter().enumerate() {
            groups.entry(module.as_str()).or_default().push(node);
        }

        let mut rows = Vec::with_capacity(groups.len());
        for (module, nodes) in groups {
            debug!(module = module, n_nodes = nodes.len(); "evaluating readout module");

            let module_states = (
                states.0.select(Axis(1), &nodes),
                states.1.select(Axis(1), &nodes),
            );
            let scores =
                self.evaluate(module_states, targets.clone(), sample_weight.clone())?;

            rows.push(TaskRow {
                module: Some(module.to_string()),
                n_nodes: nodes.len(),
                scores,
            });
        }

        Ok(rows)
    }

    fn evaluate(
        &self,
        states: (Array2<f64>, Array2<f64>),
        targets: (TargetData, TargetData),
        sample_weight: (Option<Array1<f64>>, Option<Array1<f64>>),
    ) -> Result<ResultRow> {
        let options = EvalOptions {
            strategy: self.config.strategy,
            model: self.model.clone(),
            model_config: self.config.model_config,
            metric_config: self.config.metric_config,
            sample_weight,
        };

        let states = (states.0.into_dyn(), states.1.into_dyn());
        let (row, _) = evaluate_resolved(states, targets, &self.metrics, options)?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use ndarray::{Array, ArrayView1, ArrayView2, array};

    use super::*;
    use crate::metrics::Score;

    /// Predicts zeros and scores a quarter once fitted, counting its fits.
    #[derive(Debug, Clone, Default)]
    struct Constant {
        fits: Arc<AtomicUsize>,
        fitted: bool,
    }

    impl Estimator for Constant {
        fn fit(
            &mut self,
            _x: ArrayView2<f64>,
            _y: ArrayView2<f64>,
            _sample_weight: Option<ArrayView1<f64>>,
        ) -> Result<()> {
            self.fits.fetch_add(1, Ordering::SeqCst);
            self.fitted = true;
            Ok(())
        }

        fn predict(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
            Ok(Array2::zeros((x.nrows(), 1)))
        }

        fn score(
            &self,
            _x: ArrayView2<f64>,
            _y: ArrayView2<f64>,
            _sample_weight: Option<ArrayView1<f64>>,
        ) -> Result<f64> {
            match self.fitted {
                true => Ok(0.25),
                false => Err(MlErr::Predict("the model hasn't been fitted".into())),
            }
        }

        fn name(&self) -> &'static str {
            "Constant"
        }

        fn box_clone(&self) -> Box<dyn Estimator> {
            Box::new(self.clone())
        }
    }

    fn linear_task(n: usize) -> ((Array2<f64>, Array2<f64>), (TargetData, TargetData)) {
        let x = Array::from_shape_fn((n, 3), |(i, j)| ((i * (j + 1)) as f64 * 0.17).sin());
        let y = x.column(0).mapv(|v| 2.0 * v) + x.column(2);

        let split = n * 3 / 4;
        let states = (
            x.slice(ndarray::s![..split, ..]).to_owned(),
            x.slice(ndarray::s![split.., ..]).to_owned(),
        );
        let targets = (
            TargetData::from(y.slice(ndarray::s![..split]).to_owned()),
            TargetData::from(y.slice(ndarray::s![split..]).to_owned()),
        );
        (states, targets)
    }

    fn readout(metrics: &[&str]) -> Readout {
        let config = ReadoutConfig {
            model_config: ModelConfig {
                alpha: 1e-8,
                fit_intercept: true,
            },
            ..Default::default()
        };
        Readout::new(metrics, &MetricRegistry::new(), config).unwrap()
    }

    #[test]
    fn scores_every_node_without_modules() {
        let (states, targets) = linear_task(80);
        let rows = readout(&["score", "mean_squared_error"])
            .run_task(states, targets, (None, None), None)
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].module, None);
        assert_eq!(rows[0].n_nodes, 3);
        assert_eq!(
            rows[0].scores.names().collect::<Vec<_>>(),
            ["score", "mean_squared_error"]
        );

        let Some(Score::Scalar(r2)) = rows[0].scores.get("score") else {
            panic!("expected a scalar score");
        };
        assert!(*r2 > 0.999);
    }

    #[test]
    fn one_row_per_sorted_module() {
        let (states, targets) = linear_task(80);
        let modules = ["vis".to_string(), "dmn".to_string(), "vis".to_string()];

        let rows = readout(&["score"])
            .run_task(states, targets, (None, None), Some(&modules))
            .unwrap();

        let tags: Vec<_> = rows
            .iter()
            .map(|row| (row.module.as_deref(), row.n_nodes))
            .collect();
        assert_eq!(tags, [(Some("dmn"), 1), (Some("vis"), 2)]);
    }

    #[test]
    fn module_labels_must_cover_every_node() {
        let (states, targets) = linear_task(40);
        let modules = ["vis".to_string()];

        let err = readout(&["score"])
            .run_task(states, targets, (None, None), Some(&modules))
            .unwrap_err();

        assert_eq!(err, MlErr::ModuleMismatch { modules: 1, nodes: 3 });
    }

    #[test]
    fn unknown_metrics_fail_on_construction() {
        let err = Readout::new(
            &["corrcoef", "nope"],
            &MetricRegistry::new(),
            ReadoutConfig::default(),
        )
        .unwrap_err();

        assert_eq!(err, MlErr::UnknownMetric("nope".into()));
    }

    #[test]
    fn same_inputs_give_the_same_rows() {
        let (states, targets) = linear_task(60);
        let readout = readout(&["score", "corrcoef"]);
        let weights = (Some(Array1::linspace(0.5, 1.5, 45)), None);

        let first = readout
            .run_task(states.clone(), targets.clone(), weights.clone(), None)
            .unwrap();
        let second = readout.run_task(states, targets, weights, None).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn classification_scores_are_accuracies() {
        let x = array![[-2.0], [-1.0], [-0.5], [0.5], [1.0], [2.0], [-1.5], [1.5]];
        let y = array![0i64, 0, 0, 1, 1, 1, 0, 1];
        let states = (
            x.slice(ndarray::s![..6, ..]).to_owned(),
            x.slice(ndarray::s![6.., ..]).to_owned(),
        );
        let targets = (
            TargetData::from(y.slice(ndarray::s![..6]).to_owned()),
            TargetData::from(y.slice(ndarray::s![6..]).to_owned()),
        );

        let rows = readout(&["score", "accuracy_score"])
            .run_task(states, targets, (None, None), None)
            .unwrap();

        assert_eq!(rows[0].scores.get("score"), Some(&Score::Scalar(1.0)));
        assert_eq!(rows[0].scores.get("accuracy_score"), Some(&Score::Scalar(1.0)));
    }

    #[test]
    fn a_custom_model_replaces_the_default_estimator() {
        let (states, targets) = linear_task(80);
        let modules = ["vis".to_string(), "dmn".to_string(), "vis".to_string()];
        let model = Constant::default();
        let fits = Arc::clone(&model.fits);

        let readout = readout(&["score", "mean_squared_error"]).with_model(Box::new(model));
        let rows = readout
            .run_task(states, targets.clone(), (None, None), Some(&modules))
            .unwrap();

        assert_eq!(fits.load(Ordering::SeqCst), 2);
        for row in &rows {
            assert_eq!(row.scores.get("score"), Some(&Score::Scalar(0.25)));
        }

        // The zero predictions are scored against the real targets.
        let y_test = targets.1.to_matrix().unwrap();
        let mse = y_test.mapv(|y| y * y).mean().unwrap();
        let Some(Score::Scalar(got)) = rows[0].scores.get("mean_squared_error") else {
            panic!("expected a scalar error");
        };
        assert!((got - mse).abs() < 1e-12);
    }
}
