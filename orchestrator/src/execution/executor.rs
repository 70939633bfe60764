use std::path::PathBuf;

use worker::JobSpec;

use crate::error::OrchestratorError;

/// Runs a single job to completion.
///
/// An `Executor` owns nothing the job needs: every input travels inside the `JobSpec`, and the
/// only output is the table it persists.
#[trait_variant::make(Executor: Send)]
pub trait ExecutorTemplate: Clone {
    /// Should run the job's sweep and persist its table.
    ///
    /// # Arguments
    /// * `job` - The job to run.
    ///
    /// # Returns
    /// The path of the persisted table or the reason the job failed.
    async fn execute(&self, job: JobSpec) -> Result<PathBuf, OrchestratorError>;
}
