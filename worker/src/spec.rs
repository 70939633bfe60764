use std::path::PathBuf;

use machine_learning::{readout::ReadoutConfig, target::TargetData};
use ndarray::{Array1, Array2};
use reservoir::{Activation, NodeRole, NodeSet};
use serde::{Deserialize, Serialize};

/// The default sweep, `0.05, 0.10, ..., 2.0`.
pub fn default_alphas() -> Vec<f64> {
    (1..=40).map(|i| i as f64 / 20.0).collect()
}

/// How a single network is swept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// The factors the normalized weights are scaled by, evaluated in this order.
    pub alphas: Vec<f64>,
    /// The metric names, one column each in the persisted table.
    pub metrics: Vec<String>,
    pub readout: ReadoutConfig,
    /// The fraction of samples used to train the readout.
    pub frac_train: f64,
    /// An optional weight per sample, split along with the samples.
    pub sample_weight: Option<Array1<f64>>,
    /// An optional module label per output node.
    pub modules: Option<Vec<String>>,
    pub activation: Activation,
    /// The nodes that receive the input signal.
    pub input_nodes: NodeSet,
    /// The nodes whose states are read out.
    pub output_nodes: NodeSet,
    /// Where the result tables are written to.
    pub output_dir: PathBuf,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            alphas: default_alphas(),
            metrics: vec!["score".into()],
            readout: ReadoutConfig::default(),
            frac_train: 0.8,
            sample_weight: None,
            modules: None,
            activation: Activation::Tanh,
            input_nodes: NodeSet::Role(NodeRole::Input),
            output_nodes: NodeSet::Role(NodeRole::Output),
            output_dir: PathBuf::from("results"),
        }
    }
}

/// Everything a worker needs to sweep one network, owned so it can cross a process boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    /// Names the persisted table, unique within an experiment.
    pub output_id: String,
    /// The network's weights, not yet normalized.
    pub w: Array2<f64>,
    pub roles: Vec<NodeRole>,
    /// The input signal, `[n_samples, n_channels]`.
    pub x: Array2<f64>,
    pub y: TargetData,
    pub sweep: SweepConfig,
}
