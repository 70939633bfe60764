use std::{error::Error, fmt, io};

use machine_learning::MlErr;
use reservoir::ReservoirErr;

/// The worker module's result type.
pub type Result<T> = std::result::Result<T, WorkerErr>;

/// Sweep failures.
#[derive(Debug)]
pub enum WorkerErr {
    Ml(MlErr),
    Reservoir(ReservoirErr),
    Io(io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    /// The sweep has no values, it would persist an empty table.
    EmptySweep,
    InvalidJob(String),
}

impl fmt::Display for WorkerErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerErr::Ml(e) => write!(f, "readout error: {e}"),
            WorkerErr::Reservoir(e) => write!(f, "reservoir error: {e}"),
            WorkerErr::Io(e) => write!(f, "io error: {e}"),
            WorkerErr::Csv(e) => write!(f, "csv error: {e}"),
            WorkerErr::Json(e) => write!(f, "malformed job: {e}"),
            WorkerErr::EmptySweep => write!(f, "the sweep has no values"),
            WorkerErr::InvalidJob(msg) => write!(f, "invalid job: {msg}"),
        }
    }
}

impl Error for WorkerErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WorkerErr::Ml(e) => Some(e),
            WorkerErr::Reservoir(e) => Some(e),
            WorkerErr::Io(e) => Some(e),
            WorkerErr::Csv(e) => Some(e),
            WorkerErr::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MlErr> for WorkerErr {
    fn from(value: MlErr) -> Self {
        Self::Ml(value)
    }
}

impl From<ReservoirErr> for WorkerErr {
    fn from(value: ReservoirErr) -> Self {
        Self::Reservoir(value)
    }
}

impl From<io::Error> for WorkerErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for WorkerErr {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<serde_json::Error> for WorkerErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Boundary conversion for binaries / I/O APIs.
impl From<WorkerErr> for io::Error {
    fn from(value: WorkerErr) -> Self {
        match value {
            WorkerErr::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
