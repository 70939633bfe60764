use std::{collections::HashSet, fs, path::Path};

use log::info;
use machine_learning::{dataset::Dataset, metrics::MetricRegistry};
use rand::{SeedableRng, rngs::StdRng};
use reservoir::{Conn, NodeRole};
use serde::Deserialize;
use worker::SweepConfig;

use super::{
    ConnectomeConfig, EnsembleConfig, ExecutorConfig, ExperimentConfig, NetworkConfig,
    TaskConfig, TaskData, experiment::to_matrix,
};
use crate::error::OrchestratorError;

/// A validated experiment, with its networks and data loaded.
#[derive(Debug, Clone)]
pub struct Experiment {
    pub connectomes: Vec<(String, Conn)>,
    pub dataset: Dataset,
    pub sweep: SweepConfig,
    pub ensemble: EnsembleConfig,
}

#[derive(Deserialize)]
struct NetworkFile {
    w: Vec<Vec<f64>>,
    roles: Vec<NodeRole>,
}

pub struct Adapter<'a> {
    registry: &'a MetricRegistry,
}

impl<'a> Adapter<'a> {
    /// Creates a new `Adapter`.
    ///
    /// # Arguments
    /// * `registry` - Where the configured metric names are looked up.
    pub fn new(registry: &'a MetricRegistry) -> Self {
        Self { registry }
    }

    /// Validates the configuration and loads everything it points to.
    ///
    /// Nothing is simulated before the whole configuration has been checked.
    ///
    /// # Returns
    /// The loaded experiment or the first problem found in the configuration.
    pub fn adapt_config(&self, config: ExperimentConfig) -> Result<Experiment, OrchestratorError> {
        self.validate_sweep(&config.sweep)?;
        self.validate_ensemble(&config.ensemble)?;
        self.validate_connectome_ids(&config)?;

        let connectomes = config
            .connectomes
            .into_iter()
            .map(|c| Ok((c.id, self.adapt_network(c.network)?)))
            .collect::<Result<Vec<_>, OrchestratorError>>()?;

        let dataset = self.adapt_task(config.task)?;
        info!(
            connectomes = connectomes.len(),
            samples = dataset.len(),
            alphas = config.sweep.alphas.len();
            "loaded experiment"
        );

        Ok(Experiment {
            connectomes,
            dataset,
            sweep: config.sweep,
            ensemble: config.ensemble,
        })
    }

    // -------------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------------

    fn validate_sweep(&self, sweep: &SweepConfig) -> Result<(), OrchestratorError> {
        if sweep.alphas.is_empty() {
            return Err(OrchestratorError::InvalidConfig(
                "the sweep needs at least one alpha".into(),
            ));
        }

        if let Some(alpha) = sweep.alphas.iter().find(|a| !a.is_finite()) {
            return Err(OrchestratorError::InvalidConfig(format!(
                "alphas must be finite, got {alpha}"
            )));
        }

        if !(sweep.frac_train > 0.0 && sweep.frac_train < 1.0) {
            return Err(OrchestratorError::InvalidConfig(format!(
                "frac_train must be in (0, 1), got {}",
                sweep.frac_train
            )));
        }

        if sweep.metrics.is_empty() {
            return Err(OrchestratorError::InvalidConfig(
                "at least one metric is required".into(),
            ));
        }

        self.registry.resolve(&sweep.metrics)?;
        Ok(())
    }

    fn validate_ensemble(&self, ensemble: &EnsembleConfig) -> Result<(), OrchestratorError> {
        if ensemble.n_workers == 0 {
            return Err(OrchestratorError::InvalidConfig(
                "n_workers must be greater than 0".into(),
            ));
        }

        if ensemble.timeout_secs == Some(0) {
            return Err(OrchestratorError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        // A blocking thread can't be stopped, only a worker process can.
        if ensemble.timeout_secs.is_some() && ensemble.executor == ExecutorConfig::InProcess {
            return Err(OrchestratorError::InvalidConfig(
                "timeout_secs needs the process executor, in process jobs can't be stopped".into(),
            ));
        }

        Ok(())
    }

    fn validate_connectome_ids(&self, config: &ExperimentConfig) -> Result<(), OrchestratorError> {
        if config.connectomes.is_empty() {
            return Err(OrchestratorError::InvalidConfig(
                "at least one connectome is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        for ConnectomeConfig { id, .. } in &config.connectomes {
            if id.is_empty() || id.contains(['/', '\\']) {
                return Err(OrchestratorError::InvalidConfig(format!(
                    "'{id}' can't be used as a connectome id"
                )));
            }

            if !seen.insert(id.as_str()) {
                return Err(OrchestratorError::InvalidConfig(format!(
                    "connectome id '{id}' is used more than once"
                )));
            }
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    fn adapt_network(&self, network: NetworkConfig) -> Result<Conn, OrchestratorError> {
        let (w, roles) = match network {
            NetworkConfig::Inline { w, roles } => (w, roles),
            NetworkConfig::Local { path } => {
                let NetworkFile { w, roles } = read_json(&path)?;
                (w, roles)
            }
        };

        let w = to_matrix(w).map_err(OrchestratorError::InvalidConfig)?;
        Ok(Conn::new(w, roles)?)
    }

    fn adapt_task(&self, task: TaskConfig) -> Result<Dataset, OrchestratorError> {
        let TaskData { x, y } = match task {
            TaskConfig::MemoryCapacity { params, seed } => {
                let mut rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_os_rng(),
                };
                let (x, y) = params.fetch_data(&mut rng)?;
                return Ok(Dataset::new(x, y.into())?);
            }
            TaskConfig::Inline(data) => data,
            TaskConfig::Local { path } => read_json(&path)?,
        };

        let x = x.into_array().map_err(OrchestratorError::InvalidConfig)?;
        let y = y.into_target().map_err(OrchestratorError::InvalidConfig)?;
        Ok(Dataset::new(x, y)?)
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, OrchestratorError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
