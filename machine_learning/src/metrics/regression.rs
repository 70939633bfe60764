use ndarray::{Array1, ArrayView1, ArrayView2, Axis, Zip};

use super::{MetricConfig, Score};
use crate::{MlErr, Result};

/// Checks that the targets and predictions line up with each other and with the weights.
pub(crate) fn check_targets(
    metric: &str,
    y_true: ArrayView2<f64>,
    y_pred: ArrayView2<f64>,
    sample_weight: Option<ArrayView1<f64>>,
) -> Result<()> {
    let fail = |reason: String| MlErr::Metric {
        metric: metric.to_string(),
        reason,
    };

    if y_true.shape() != y_pred.shape() {
        return Err(fail(format!(
            "targets of shape {:?} and predictions of shape {:?} differ",
            y_true.shape(),
            y_pred.shape()
        )));
    }

    if y_true.nrows() == 0 {
        return Err(fail("there are no samples to score".into()));
    }

    if let Some(w) = sample_weight {
        if w.len() != y_true.nrows() {
            return Err(fail(format!(
                "found {} sample weights for {} samples",
                w.len(),
                y_true.nrows()
            )));
        }
        let total = w.sum();
        if total.is_nan() || total <= 0.0 {
            return Err(fail("the sample weights don't sum up to a positive value".into()));
        }
    }

    Ok(())
}

fn weights_or_ones(sample_weight: Option<ArrayView1<f64>>, n: usize) -> Array1<f64> {
    match sample_weight {
        Some(w) => w.to_owned(),
        None => Array1::ones(n),
    }
}

/// Weighted mean of every column.
fn weighted_mean(a: ArrayView2<f64>, w: &Array1<f64>) -> Array1<f64> {
    a.t().dot(w) / w.sum()
}

/// Coefficient of determination for each output.
///
/// Constant targets score 1 when predicted exactly and 0 otherwise.
pub(crate) fn r2_per_output(
    metric: &str,
    y_true: ArrayView2<f64>,
    y_pred: ArrayView2<f64>,
    sample_weight: Option<ArrayView1<f64>>,
) -> Result<Array1<f64>> {
    check_targets(metric, y_true, y_pred, sample_weight)?;

    let w = weights_or_ones(sample_weight, y_true.nrows());
    let mean = weighted_mean(y_true, &w);

    let residual = (&y_pred - &y_true).mapv(|e| e * e).t().dot(&w);
    let total = (&y_true - &mean).mapv(|e| e * e).t().dot(&w);

    let r2 = Zip::from(&residual).and(&total).map_collect(|&res, &tot| {
        if tot != 0.0 {
            1.0 - res / tot
        } else if res == 0.0 {
            1.0
        } else {
            0.0
        }
    });

    Ok(r2)
}

pub fn r2_score(
    y_true: ArrayView2<f64>,
    y_pred: ArrayView2<f64>,
    sample_weight: Option<ArrayView1<f64>>,
    config: &MetricConfig,
) -> Result<Score> {
    let r2 = r2_per_output("r2_score", y_true, y_pred, sample_weight)?;
    Ok(config.reduce(r2))
}

pub fn mean_squared_error(
    y_true: ArrayView2<f64>,
    y_pred: ArrayView2<f64>,
    sample_weight: Option<ArrayView1<f64>>,
    config: &MetricConfig,
) -> Result<Score> {
    let mse = mse_per_output("mean_squared_error", y_true, y_pred, sample_weight)?;
    Ok(config.reduce(mse))
}

pub fn root_mean_squared_error(
    y_true: ArrayView2<f64>,
    y_pred: ArrayView2<f64>,
    sample_weight: Option<ArrayView1<f64>>,
    config: &MetricConfig,
) -> Result<Score> {
    let mse = mse_per_output("root_mean_squared_error", y_true, y_pred, sample_weight)?;
    Ok(config.reduce(mse.mapv(f64::sqrt)))
}

fn mse_per_output(
    metric: &str,
    y_true: ArrayView2<f64>,
    y_pred: ArrayView2<f64>,
    sample_weight: Option<ArrayView1<f64>>,
) -> Result<Array1<f64>> {
    check_targets(metric, y_true, y_pred, sample_weight)?;
    let w = weights_or_ones(sample_weight, y_true.nrows());
    Ok(weighted_mean((&y_pred - &y_true).mapv(|e| e * e).view(), &w))
}

pub fn mean_absolute_error(
    y_true: ArrayView2<f64>,
    y_pred: ArrayView2<f64>,
    sample_weight: Option<ArrayView1<f64>>,
    config: &MetricConfig,
) -> Result<Score> {
    check_targets("mean_absolute_error", y_true, y_pred, sample_weight)?;
    let w = weights_or_ones(sample_weight, y_true.nrows());
    let mae = weighted_mean((&y_pred - &y_true).mapv(f64::abs).view(), &w);
    Ok(config.reduce(mae))
}

/// Pearson correlation between each target column and its prediction. Outputs with no
/// variance yield NaN.
pub fn corrcoef(
    y_true: ArrayView2<f64>,
    y_pred: ArrayView2<f64>,
    sample_weight: Option<ArrayView1<f64>>,
    config: &MetricConfig,
) -> Result<Score> {
    check_targets("corrcoef", y_true, y_pred, sample_weight)?;
    let w = weights_or_ones(sample_weight, y_true.nrows());

    let true_dev = &y_true - &weighted_mean(y_true, &w);
    let pred_dev = &y_pred - &weighted_mean(y_pred, &w);

    let per_output = Zip::from(true_dev.axis_iter(Axis(1)))
        .and(pred_dev.axis_iter(Axis(1)))
        .map_collect(|t, p| {
            let cov = (&t * &p).dot(&w);
            let var_t = t.mapv(|v| v * v).dot(&w);
            let var_p = p.mapv(|v| v * v).dot(&w);
            cov / (var_t * var_p).sqrt()
        });

    Ok(config.reduce(per_output))
}
