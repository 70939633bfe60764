use std::{env, fs};

use anyhow::{Context, Result, bail};
use orchestrator::configs::ExperimentConfig;

fn main() -> Result<()> {
    env_logger::init();

    let Some(path) = env::args().nth(1) else {
        bail!("usage: orchestrator <config.json>");
    };

    let raw = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let config: ExperimentConfig =
        serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))?;

    let reports = orchestrator::run(config)?;
    for report in &reports {
        println!(
            "{}: {} table(s), empirical at {}",
            report.connectome,
            report.nulls.len() + 1,
            report.empirical.display()
        );
    }

    Ok(())
}
