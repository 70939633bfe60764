use std::collections::HashMap;

use ndarray::{ArrayView1, ArrayView2};

use super::{MetricConfig, Score, classification, regression};
use crate::{MlErr, Result};

/// The name of the metric that delegates to the estimator's own `score`.
pub const SCORE: &str = "score";

/// The calling contract every registered metric follows.
///
/// # Arguments
/// * `y_true` - The expected targets, `[n_samples, n_outputs]`.
/// * `y_pred` - The predicted targets, same shape as `y_true`.
/// * `sample_weight` - An optional weight per sample.
/// * `config` - Extra keyword arguments.
pub type MetricFn = fn(
    y_true: ArrayView2<f64>,
    y_pred: ArrayView2<f64>,
    sample_weight: Option<ArrayView1<f64>>,
    config: &MetricConfig,
) -> Result<Score>;

/// A metric name already checked against a registry.
#[derive(Debug, Clone)]
pub enum Metric {
    /// The estimator's default score.
    Score,
    Registered { name: String, func: MetricFn },
}

impl Metric {
    pub fn name(&self) -> &str {
        match self {
            Metric::Score => SCORE,
            Metric::Registered { name, .. } => name,
        }
    }
}

/// Maps metric names to scoring functions.
#[derive(Debug, Clone)]
pub struct MetricRegistry {
    metrics: HashMap<String, MetricFn>,
}

impl MetricRegistry {
    /// Creates a registry with no metrics, only `score` can be resolved.
    pub fn empty() -> Self {
        Self {
            metrics: HashMap::new(),
        }
    }

    /// Creates a registry with every built-in metric.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register("r2_score", regression::r2_score);
        registry.register("mean_squared_error", regression::mean_squared_error);
        registry.register("root_mean_squared_error", regression::root_mean_squared_error);
        registry.register("mean_absolute_error", regression::mean_absolute_error);
        registry.register("corrcoef", regression::corrcoef);
        registry.register("accuracy_score", classification::accuracy_score);
        registry.register(
            "balanced_accuracy_score",
            classification::balanced_accuracy_score,
        );
        registry
    }

    /// Registers a metric under `name`, replacing any previous one. `score` is reserved and
    /// always resolves to the estimator's own score.
    ///
    /// # Returns
    /// The metric previously registered under that name.
    pub fn register(&mut self, name: impl Into<String>, func: MetricFn) -> Option<MetricFn> {
        self.metrics.insert(name.into(), func)
    }

    pub fn get(&self, name: &str) -> Option<MetricFn> {
        self.metrics.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        name == SCORE || self.metrics.contains_key(name)
    }

    /// Resolves every name, keeping their order.
    ///
    /// # Returns
    /// The resolved metrics or an unknown metric error for the first name not registered.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Metric>> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                if name == SCORE {
                    return Ok(Metric::Score);
                }

                let func = self
                    .get(name)
                    .ok_or_else(|| MlErr::UnknownMetric(name.to_string()))?;

                Ok(Metric::Registered {
                    name: name.to_string(),
                    func,
                })
            })
            .collect()
    }

    /// The registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.metrics.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(
        _: ArrayView2<f64>,
        _: ArrayView2<f64>,
        _: Option<ArrayView1<f64>>,
        _: &MetricConfig,
    ) -> Result<Score> {
        Ok(Score::Scalar(42.0))
    }

    #[test]
    fn resolves_in_the_given_order() {
        let registry = MetricRegistry::new();
        let metrics = registry.resolve(&["corrcoef", "score", "r2_score"]).unwrap();

        let names: Vec<_> = metrics.iter().map(Metric::name).collect();
        assert_eq!(names, ["corrcoef", "score", "r2_score"]);
        assert!(matches!(metrics[1], Metric::Score));
    }

    #[test]
    fn unknown_names_are_rejected() {
        let registry = MetricRegistry::new();
        let err = registry.resolve(&["score", "not_a_real_metric"]).unwrap_err();
        assert_eq!(err, MlErr::UnknownMetric("not_a_real_metric".into()));
    }

    #[test]
    fn custom_metrics_can_be_registered() {
        let mut registry = MetricRegistry::empty();
        assert!(!registry.contains("answer"));
        assert!(registry.contains(SCORE));

        registry.register("answer", constant);
        assert!(registry.contains("answer"));
        assert_eq!(registry.names(), ["answer"]);
    }
}
