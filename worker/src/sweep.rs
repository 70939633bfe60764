use std::path::PathBuf;

use log::{debug, info};
use machine_learning::{
    dataset::Dataset,
    metrics::MetricRegistry,
    readout::{Readout, TaskRow},
};
use ndarray::{Array1, Array2, s};
use reservoir::{Conn, EchoStateNetwork};

use crate::{JobSpec, Result, SweepConfig, WorkerErr, table::ResultTable};

/// Sweeps a single network over the configured scaling factors.
///
/// The network is scaled and normalized once, the data is split once, and every factor is
/// evaluated on the same partitions in the configured order. The first failing factor aborts
/// the whole sweep.
///
/// # Arguments
/// * `conn` - The network to sweep.
/// * `dataset` - The input signal and its targets.
/// * `config` - The sweep settings.
/// * `registry` - Where the metric names are looked up.
///
/// # Returns
/// A table with the rows of every factor, in sweep order.
pub fn run_sweep(
    conn: Conn,
    dataset: &Dataset,
    config: &SweepConfig,
    registry: &MetricRegistry,
) -> Result<ResultTable> {
    let readout = Readout::new(&config.metrics, registry, config.readout.clone())?;
    run_sweep_with(conn, dataset, config, &readout)
}

/// Like `run_sweep`, but scores with an already built readout, e.g. one with a custom model.
///
/// The readout's metrics replace `config.metrics`.
pub fn run_sweep_with(
    mut conn: Conn,
    dataset: &Dataset,
    config: &SweepConfig,
    readout: &Readout,
) -> Result<ResultTable> {
    if config.alphas.is_empty() {
        return Err(WorkerErr::EmptySweep);
    }

    conn.scale_and_normalize()?;
    let input_nodes = conn.get_nodes(config.input_nodes)?;
    let output_nodes = conn.get_nodes(config.output_nodes)?;

    // Every input channel drives every input node.
    let mut w_in: Array2<f64> = Array2::zeros((dataset.x().ncols(), conn.n_nodes()));
    for &node in &input_nodes {
        w_in.column_mut(node).fill(1.0);
    }

    let (train, test) = dataset.split(config.frac_train)?;
    let sample_weight = split_weights(config.sample_weight.as_ref(), dataset.len(), train.len())?;

    debug!(
        input_nodes = input_nodes.len(),
        output_nodes = output_nodes.len(),
        n_train = train.len(),
        n_test = test.len();
        "sweep ready"
    );

    let metrics = readout.metric_names().map(String::from).collect();
    let mut table = ResultTable::new(metrics);

    for &alpha in &config.alphas {
        let esn = EchoStateNetwork::new(conn.w() * alpha, config.activation)?;
        let rs_train = esn.simulate(train.x().view(), w_in.view(), &output_nodes)?;
        let rs_test = esn.simulate(test.x().view(), w_in.view(), &output_nodes)?;

        let rows: Vec<TaskRow> = readout.run_task(
            (rs_train, rs_test),
            (train.y().clone(), test.y().clone()),
            sample_weight.clone(),
            config.modules.as_deref(),
        )?;

        debug!(alpha = alpha, rows = rows.len(); "evaluated sweep value");
        table.extend(alpha, rows)?;
    }

    Ok(table)
}

/// Runs a job's sweep and persists its table.
///
/// # Arguments
/// * `job` - The job to run.
/// * `registry` - Where the metric names are looked up.
///
/// # Returns
/// The path of the persisted table.
pub fn run_job(job: JobSpec, registry: &MetricRegistry) -> Result<PathBuf> {
    let JobSpec {
        output_id,
        w,
        roles,
        x,
        y,
        sweep,
    } = job;

    if output_id.is_empty() || output_id.contains(['/', '\\']) {
        return Err(WorkerErr::InvalidJob(format!(
            "'{output_id}' can't be used as an output identifier"
        )));
    }

    info!(job = output_id.as_str(), alphas = sweep.alphas.len(); "starting sweep");

    let conn = Conn::new(w, roles)?;
    let dataset = Dataset::new(x, y)?;
    let table = run_sweep(conn, &dataset, &sweep, registry)?;
    let path = table.persist(&sweep.output_dir, &output_id)?;

    info!(job = output_id.as_str(), rows = table.len(); "finished sweep");
    Ok(path)
}

type WeightPair = (Option<Array1<f64>>, Option<Array1<f64>>);

fn split_weights(weights: Option<&Array1<f64>>, n: usize, n_train: usize) -> Result<WeightPair> {
    let Some(weights) = weights else {
        return Ok((None, None));
    };

    if weights.len() != n {
        return Err(WorkerErr::InvalidJob(format!(
            "got {} sample weights for {n} samples",
            weights.len()
        )));
    }

    Ok((
        Some(weights.slice(s![..n_train]).to_owned()),
        Some(weights.slice(s![n_train..]).to_owned()),
    ))
}
