mod adapter;
mod experiment;

pub use adapter::{Adapter, Experiment};
pub use experiment::{
    ConnectomeConfig, EnsembleConfig, ExecutorConfig, ExperimentConfig, NetworkConfig, Signal,
    TaskConfig, TaskData, Targets,
};
