use std::{num::NonZeroUsize, path::PathBuf, thread};

use machine_learning::target::TargetData;
use ndarray::{Array1, Array2};
use reservoir::{MemoryCapacity, NodeRole};
use serde::{Deserialize, Serialize};
use worker::SweepConfig;

/// A whole experiment: every connectome is swept once as is and `n_nulls` times randomized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub connectomes: Vec<ConnectomeConfig>,
    #[serde(default)]
    pub task: TaskConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub ensemble: EnsembleConfig,
}

/// A named network, its id prefixes the output identifiers of its ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectomeConfig {
    pub id: String,
    pub network: NetworkConfig,
}

/// Where a network's weights and node roles come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum NetworkConfig {
    /// A json file holding `{ "w": [[...]], "roles": [...] }`.
    Local { path: PathBuf },
    Inline {
        w: Vec<Vec<f64>>,
        roles: Vec<NodeRole>,
    },
}

/// Where the input signal and its targets come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskConfig {
    /// Generated memory capacity data, reproducible through `seed`.
    MemoryCapacity {
        #[serde(flatten)]
        params: MemoryCapacity,
        #[serde(default)]
        seed: Option<u64>,
    },
    /// A json file holding a `TaskData`.
    Local { path: PathBuf },
    Inline(TaskData),
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self::MemoryCapacity {
            params: MemoryCapacity::default(),
            seed: None,
        }
    }
}

/// An input signal and its targets, as read from json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskData {
    pub x: Signal,
    pub y: Targets,
}

/// A single channel series or a `[n_samples, n_channels]` matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Signal {
    Series(Vec<f64>),
    Channels(Vec<Vec<f64>>),
}

/// Target values, integers are read as class labels and anything else as real values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Targets {
    Labels(Vec<i64>),
    Values(Vec<f64>),
    MultiLabels(Vec<Vec<i64>>),
    MultiValues(Vec<Vec<f64>>),
}

/// How the null jobs are generated and run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    /// Randomized networks per connectome.
    pub n_nulls: usize,
    /// Jobs running at once.
    pub n_workers: usize,
    /// Rewiring attempts per edge of each null.
    pub swaps: usize,
    /// Seeds the null networks, a random one is drawn and logged when missing.
    pub seed: Option<u64>,
    pub executor: ExecutorConfig,
    /// Kills a null job that runs for longer than this, only with the process executor.
    pub timeout_secs: Option<u64>,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            n_nulls: 500,
            n_workers: thread::available_parallelism().map_or(1, NonZeroUsize::get),
            swaps: 10,
            seed: None,
            executor: ExecutorConfig::default(),
            timeout_secs: None,
        }
    }
}

/// Where the null jobs run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutorConfig {
    /// A `worker` child process per job. Without a `program`, the `worker` binary next to the
    /// current executable is used.
    Process {
        #[serde(default)]
        program: Option<PathBuf>,
    },
    /// A blocking thread per job, sharing the coordinator's memory.
    InProcess,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self::Process { program: None }
    }
}

impl Signal {
    pub(super) fn into_array(self) -> Result<Array2<f64>, String> {
        match self {
            Signal::Series(values) => {
                let n = values.len();
                Array2::from_shape_vec((n, 1), values).map_err(|e| e.to_string())
            }
            Signal::Channels(rows) => to_matrix(rows),
        }
    }
}

impl Targets {
    pub(super) fn into_target(self) -> Result<TargetData, String> {
        Ok(match self {
            Targets::Labels(labels) => TargetData::from(Array1::from(labels)),
            Targets::Values(values) => TargetData::from(Array1::from(values)),
            Targets::MultiLabels(rows) => TargetData::from(to_matrix(rows)?),
            Targets::MultiValues(rows) => TargetData::from(to_matrix(rows)?),
        })
    }
}

/// Packs row vectors into a matrix, every row must have the same length.
pub(super) fn to_matrix<T: Clone>(rows: Vec<Vec<T>>) -> Result<Array2<T>, String> {
    let ncols = rows.first().map_or(0, Vec::len);
    if let Some(i) = rows.iter().position(|row| row.len() != ncols) {
        return Err(format!(
            "row {i} has {} values, expected {ncols}",
            rows[i].len()
        ));
    }

    let nrows = rows.len();
    let flat = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((nrows, ncols), flat).map_err(|e| e.to_string())
}
