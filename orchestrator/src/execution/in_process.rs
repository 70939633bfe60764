use std::{path::PathBuf, sync::Arc};

use machine_learning::metrics::MetricRegistry;
use tokio::task;
use worker::{JobSpec, run_job};

use super::Executor;
use crate::error::OrchestratorError;

/// Runs jobs on the runtime's blocking thread pool.
#[derive(Debug, Clone)]
pub struct InProcessExecutor {
    registry: Arc<MetricRegistry>,
}

impl InProcessExecutor {
    pub fn new(registry: Arc<MetricRegistry>) -> Self {
        Self { registry }
    }
}

impl Executor for InProcessExecutor {
    async fn execute(&self, job: JobSpec) -> Result<PathBuf, OrchestratorError> {
        let registry = Arc::clone(&self.registry);
        let path = task::spawn_blocking(move || run_job(job, &registry))
            .await
            .map_err(std::io::Error::other)??;

        Ok(path)
    }
}
