use std::{fmt, time::Duration};

use machine_learning::MlErr;
use reservoir::ReservoirErr;
use worker::WorkerErr;

/// The diagnosis of a null job that didn't produce its table.
#[derive(Debug, Clone, PartialEq)]
pub struct JobFailure {
    /// The null's index within its ensemble.
    pub index: usize,
    pub output_id: String,
    pub message: String,
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job {} ({}): {}", self.index, self.output_id, self.message)
    }
}

/// All errors that can occur in the orchestrator.
#[derive(Debug)]
pub enum OrchestratorError {
    /// Invalid configuration, caught before any job runs.
    InvalidConfig(String),
    /// Two jobs would persist to the same table.
    DuplicateOutputId(String),
    /// Every null job ran, these ones failed.
    JobsFailed(Vec<JobFailure>),
    /// A worker process exited unsuccessfully.
    WorkerProcess { status: String, stderr: String },
    /// A job ran past its time limit and its worker process was killed.
    Timeout(Duration),
    /// An in process sweep failed, the empirical one included.
    Worker(WorkerErr),
    Ml(MlErr),
    Reservoir(ReservoirErr),
    Json(serde_json::Error),
    /// An underlying I/O error not covered by the above variants.
    Io(std::io::Error),
}

impl fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::DuplicateOutputId(id) => write!(f, "more than one job persists to '{id}'"),
            Self::JobsFailed(failures) => {
                write!(f, "{} job(s) failed", failures.len())?;
                for failure in failures {
                    write!(f, "\n  {failure}")?;
                }
                Ok(())
            }
            Self::WorkerProcess { status, stderr } => {
                write!(f, "worker process {status}")?;
                if !stderr.is_empty() {
                    write!(f, ": {stderr}")?;
                }
                Ok(())
            }
            Self::Timeout(limit) => {
                write!(f, "job ran past its {}s limit, its worker was killed", limit.as_secs())
            }
            Self::Worker(e) => write!(f, "worker error: {e}"),
            Self::Ml(e) => write!(f, "readout error: {e}"),
            Self::Reservoir(e) => write!(f, "reservoir error: {e}"),
            Self::Json(e) => write!(f, "json error: {e}"),
            Self::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl std::error::Error for OrchestratorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Worker(e) => Some(e),
            Self::Ml(e) => Some(e),
            Self::Reservoir(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for OrchestratorError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<WorkerErr> for OrchestratorError {
    fn from(e: WorkerErr) -> Self {
        Self::Worker(e)
    }
}

impl From<MlErr> for OrchestratorError {
    fn from(e: MlErr) -> Self {
        Self::Ml(e)
    }
}

impl From<ReservoirErr> for OrchestratorError {
    fn from(e: ReservoirErr) -> Self {
        Self::Reservoir(e)
    }
}

impl From<serde_json::Error> for OrchestratorError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
