pub mod configs;
pub mod error;
pub mod execution;
pub mod scheduler;

use std::sync::Arc;

use log::info;
use machine_learning::metrics::MetricRegistry;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tokio::runtime::Runtime;

pub use error::{JobFailure, OrchestratorError};
pub use scheduler::{EnsembleReport, EnsembleScheduler};

use crate::{
    configs::{Adapter, ExecutorConfig, Experiment, ExperimentConfig},
    execution::{Executor, InProcessExecutor, ProcessExecutor},
};

/// Runs a whole experiment on a fresh runtime, blocking until every table is persisted.
///
/// # Errors
/// Returns an `OrchestratorError` if the configuration is invalid, the empirical sweep of a
/// connectome fails, or any of its nulls fail.
pub fn run(config: ExperimentConfig) -> Result<Vec<EnsembleReport>, OrchestratorError> {
    let runtime = Runtime::new()?;
    runtime.block_on(run_experiment(config))
}

/// Validates the configuration, loads its data and runs the ensemble of every connectome, one
/// connectome at a time.
///
/// # Arguments
/// * `config` - The experiment to run.
///
/// # Returns
/// A report per connectome, in configuration order.
pub async fn run_experiment(
    config: ExperimentConfig,
) -> Result<Vec<EnsembleReport>, OrchestratorError> {
    let registry = Arc::new(MetricRegistry::new());
    let experiment = Adapter::new(&registry).adapt_config(config)?;

    match &experiment.ensemble.executor {
        ExecutorConfig::Process { program } => {
            let executor = match program {
                Some(program) => ProcessExecutor::new(program.clone()),
                None => ProcessExecutor::sibling()?,
            };
            info!("running null jobs with {}", executor.program().display());
            run_ensembles(executor, registry, experiment).await
        }
        ExecutorConfig::InProcess => {
            let executor = InProcessExecutor::new(Arc::clone(&registry));
            run_ensembles(executor, registry, experiment).await
        }
    }
}

async fn run_ensembles<E>(
    executor: E,
    registry: Arc<MetricRegistry>,
    experiment: Experiment,
) -> Result<Vec<EnsembleReport>, OrchestratorError>
where
    E: Executor + Clone + Sync + 'static,
{
    let Experiment {
        connectomes,
        dataset,
        sweep,
        ensemble,
    } = experiment;

    let seed = ensemble.seed.unwrap_or_else(|| {
        let seed = rand::random();
        info!(seed = seed; "no ensemble seed given, drew one");
        seed
    });
    let mut rng = StdRng::seed_from_u64(seed);

    let scheduler = EnsembleScheduler::new(executor, registry, &ensemble);
    let dataset = Arc::new(dataset);
    let sweep = Arc::new(sweep);

    let mut reports = Vec::with_capacity(connectomes.len());
    for (id, conn) in connectomes {
        let report = scheduler
            .run_ensemble(&id, conn, Arc::clone(&dataset), Arc::clone(&sweep), rng.random())
            .await?;
        reports.push(report);
    }

    Ok(reports)
}
