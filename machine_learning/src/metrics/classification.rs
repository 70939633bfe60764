use ndarray::{ArrayView1, ArrayView2};

use super::{MetricConfig, Score, regression::check_targets};
use crate::{MlErr, Result};

/// Weighted fraction of samples whose every output was predicted exactly.
pub(crate) fn accuracy(
    metric: &str,
    y_true: ArrayView2<f64>,
    y_pred: ArrayView2<f64>,
    sample_weight: Option<ArrayView1<f64>>,
) -> Result<f64> {
    check_targets(metric, y_true, y_pred, sample_weight)?;

    let mut hits = 0.0;
    let mut total = 0.0;

    for (i, (t, p)) in y_true.rows().into_iter().zip(y_pred.rows()).enumerate() {
        let w = sample_weight.map_or(1.0, |w| w[i]);
        if t == p {
            hits += w;
        }
        total += w;
    }

    Ok(hits / total)
}

/// Subset accuracy, `multioutput` doesn't apply.
pub fn accuracy_score(
    y_true: ArrayView2<f64>,
    y_pred: ArrayView2<f64>,
    sample_weight: Option<ArrayView1<f64>>,
    _config: &MetricConfig,
) -> Result<Score> {
    accuracy("accuracy_score", y_true, y_pred, sample_weight).map(Score::Scalar)
}

/// The average of the recall obtained on each class, for single output targets.
pub fn balanced_accuracy_score(
    y_true: ArrayView2<f64>,
    y_pred: ArrayView2<f64>,
    sample_weight: Option<ArrayView1<f64>>,
    _config: &MetricConfig,
) -> Result<Score> {
    const NAME: &str = "balanced_accuracy_score";
    check_targets(NAME, y_true, y_pred, sample_weight)?;

    if y_true.ncols() != 1 {
        return Err(MlErr::Metric {
            metric: NAME.into(),
            reason: format!("expected a single output, got {}", y_true.ncols()),
        });
    }

    let truth = y_true.column(0);
    let pred = y_pred.column(0);

    let mut classes = truth.to_vec();
    classes.sort_by(f64::total_cmp);
    classes.dedup();

    let mut recall_sum = 0.0;
    let mut seen = 0;

    for class in &classes {
        let mut hits = 0.0;
        let mut support = 0.0;

        for (i, (t, p)) in truth.iter().zip(pred.iter()).enumerate() {
            if t != class {
                continue;
            }

            let w = sample_weight.map_or(1.0, |w| w[i]);
            support += w;
            if p == class {
                hits += w;
            }
        }

        if support > 0.0 {
            recall_sum += hits / support;
            seen += 1;
        }
    }

    if seen == 0 {
        return Err(MlErr::Metric {
            metric: NAME.into(),
            reason: "no class has a positive support".into(),
        });
    }

    Ok(Score::Scalar(recall_sum / seen as f64))
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn accuracy_counts_exact_rows() {
        let y = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.0, 0.0]];
        let pred = array![[1.0, 0.0], [0.0, 0.0], [1.0, 1.0], [0.0, 0.0]];

        let acc = accuracy_score(y.view(), pred.view(), None, &MetricConfig::default()).unwrap();
        assert_eq!(acc, Score::Scalar(0.75));
    }

    #[test]
    fn weighted_accuracy() {
        let y = array![[1.0], [0.0]];
        let pred = array![[1.0], [1.0]];
        let w = array![3.0, 1.0];

        assert_eq!(accuracy("accuracy", y.view(), pred.view(), Some(w.view())).unwrap(), 0.75);
    }

    #[test]
    fn balanced_accuracy_averages_recalls() {
        let y = array![[0.0], [0.0], [0.0], [1.0]];
        let pred = array![[0.0], [0.0], [0.0], [0.0]];

        let score =
            balanced_accuracy_score(y.view(), pred.view(), None, &MetricConfig::default()).unwrap();
        assert_eq!(score, Score::Scalar(0.5));
    }
}
