use std::{
    collections::{HashMap, HashSet},
    io,
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use log::{info, warn};
use machine_learning::{dataset::Dataset, metrics::MetricRegistry};
use rand::{Rng, SeedableRng, rngs::StdRng};
use reservoir::Conn;
use tokio::{
    sync::Semaphore,
    task::{self, JoinSet},
    time,
};
use worker::{JobSpec, SweepConfig, run_job};

use crate::{
    configs::EnsembleConfig,
    error::{JobFailure, OrchestratorError},
    execution::Executor,
};

/// The tables persisted for one connectome.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleReport {
    pub connectome: String,
    pub empirical: PathBuf,
    /// One table per null, in null index order.
    pub nulls: Vec<PathBuf>,
}

impl EnsembleReport {
    /// Every table of the ensemble, the empirical one first.
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        std::iter::once(&self.empirical).chain(&self.nulls)
    }
}

/// Sweeps a network and a batch of its randomized nulls.
///
/// The empirical sweep runs first, on the caller's runtime. The nulls are then all submitted at
/// once and run by the executor, at most `n_workers` at a time, and every one of them is waited
/// for before the ensemble is reported.
pub struct EnsembleScheduler<E> {
    executor: E,
    registry: Arc<MetricRegistry>,
    n_nulls: usize,
    n_workers: usize,
    swaps: usize,
    timeout: Option<Duration>,
}

impl<E> EnsembleScheduler<E>
where
    E: Executor + Clone + Sync + 'static,
{
    /// Creates a new `EnsembleScheduler`.
    ///
    /// # Arguments
    /// * `executor` - Where the null jobs run.
    /// * `registry` - Where the empirical sweep looks its metrics up.
    /// * `config` - The size and limits of the ensemble. A time limit is only enforced if dropping
    ///   the executor's future stops the job, as with `ProcessExecutor`.
    pub fn new(executor: E, registry: Arc<MetricRegistry>, config: &EnsembleConfig) -> Self {
        Self {
            executor,
            registry,
            n_nulls: config.n_nulls,
            n_workers: config.n_workers.max(1),
            swaps: config.swaps,
            timeout: config.timeout_secs.map(Duration::from_secs),
        }
    }

    /// Runs the empirical sweep of `conn` and then the sweeps of its nulls.
    ///
    /// # Arguments
    /// * `id` - The connectome's id, prefix of every output identifier.
    /// * `conn` - The network, as loaded.
    /// * `dataset` - The input signal and targets every job is swept with.
    /// * `sweep` - The sweep settings every job shares.
    /// * `seed` - Seeds the null networks.
    ///
    /// # Returns
    /// The persisted tables, the empirical sweep's error if it failed, or the failures of every
    /// null that didn't persist its table.
    pub async fn run_ensemble(
        &self,
        id: &str,
        conn: Conn,
        dataset: Arc<Dataset>,
        sweep: Arc<SweepConfig>,
        seed: u64,
    ) -> Result<EnsembleReport, OrchestratorError> {
        let empirical_id = format!("{id}_empirical");
        let null_ids: Vec<String> = (0..self.n_nulls).map(|i| format!("{id}_null_{i}")).collect();
        check_unique(std::iter::once(&empirical_id).chain(&null_ids))?;

        info!(job = empirical_id.as_str(); "running empirical sweep");
        let job = build_job(empirical_id, &conn, &dataset, &sweep);
        let registry = Arc::clone(&self.registry);
        let empirical = task::spawn_blocking(move || run_job(job, &registry))
            .await
            .map_err(io::Error::other)??;

        let nulls = self.run_nulls(conn, dataset, sweep, null_ids, seed).await?;
        info!(connectome = id, nulls = nulls.len(); "ensemble finished");

        Ok(EnsembleReport {
            connectome: id.to_string(),
            empirical,
            nulls,
        })
    }

    async fn run_nulls(
        &self,
        conn: Conn,
        dataset: Arc<Dataset>,
        sweep: Arc<SweepConfig>,
        null_ids: Vec<String>,
        seed: u64,
    ) -> Result<Vec<PathBuf>, OrchestratorError> {
        let conn = Arc::new(conn);
        let semaphore = Arc::new(Semaphore::new(self.n_workers));
        let mut rng = StdRng::seed_from_u64(seed);

        let mut jobs = JoinSet::new();
        let mut submitted = HashMap::new();

        for (index, output_id) in null_ids.iter().enumerate() {
            let null = NullJob {
                output_id: output_id.clone(),
                seed: rng.random(),
                swaps: self.swaps,
                conn: Arc::clone(&conn),
                dataset: Arc::clone(&dataset),
                sweep: Arc::clone(&sweep),
            };

            let executor = self.executor.clone();
            let semaphore = Arc::clone(&semaphore);
            let timeout = self.timeout;

            let handle = jobs.spawn(async move {
                let _permit = semaphore.acquire_owned().await.map_err(io::Error::other)?;
                let job = task::spawn_blocking(move || null.build())
                    .await
                    .map_err(io::Error::other)??;

                match timeout {
                    Some(limit) => time::timeout(limit, executor.execute(job))
                        .await
                        .map_err(|_| OrchestratorError::Timeout(limit))?,
                    None => executor.execute(job).await,
                }
            });

            submitted.insert(handle.id(), (index, output_id.clone()));
        }

        info!(jobs = submitted.len(), workers = self.n_workers; "submitted null jobs");

        let mut paths = vec![None; null_ids.len()];
        let mut failures = Vec::new();

        while let Some(joined) = jobs.join_next_with_id().await {
            let (id, outcome) = match joined {
                Ok((id, outcome)) => (id, outcome),
                Err(e) => (e.id(), Err(io::Error::other(e.to_string()).into())),
            };

            let Some((index, output_id)) = submitted.remove(&id) else {
                continue;
            };

            match outcome {
                Ok(path) => {
                    info!(job = output_id.as_str(); "persisted {}", path.display());
                    paths[index] = Some(path);
                }
                Err(e) => {
                    warn!(job = output_id.as_str(); "null job failed: {e}");
                    failures.push(JobFailure {
                        index,
                        output_id,
                        message: e.to_string(),
                    });
                }
            }
        }

        if !failures.is_empty() {
            failures.sort_by_key(|failure| failure.index);
            return Err(OrchestratorError::JobsFailed(failures));
        }

        Ok(paths.into_iter().flatten().collect())
    }
}

/// Everything needed to build a null's job, shared with the other nulls until it is built.
struct NullJob {
    output_id: String,
    seed: u64,
    swaps: usize,
    conn: Arc<Conn>,
    dataset: Arc<Dataset>,
    sweep: Arc<SweepConfig>,
}

impl NullJob {
    /// Randomizes the network and copies everything into a self contained job.
    fn build(self) -> Result<JobSpec, OrchestratorError> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let null = self.conn.randomize(self.swaps, &mut rng)?;
        Ok(build_job(self.output_id, &null, &self.dataset, &self.sweep))
    }
}

fn build_job(output_id: String, conn: &Conn, dataset: &Dataset, sweep: &SweepConfig) -> JobSpec {
    JobSpec {
        output_id,
        w: conn.w().clone(),
        roles: conn.roles().to_vec(),
        x: dataset.x().clone(),
        y: dataset.y().clone(),
        sweep: sweep.clone(),
    }
}

fn check_unique<'a>(ids: impl Iterator<Item = &'a String>) -> Result<(), OrchestratorError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(OrchestratorError::DuplicateOutputId(id.clone()));
        }
    }
    Ok(())
}
