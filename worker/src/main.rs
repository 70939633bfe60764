use std::io::{self, Read};

use log::{error, info};
use machine_learning::metrics::MetricRegistry;

use worker::{JobSpec, WorkerErr, run_job};

/// Runs the single job read from stdin and prints the path of its table.
fn main() -> io::Result<()> {
    env_logger::init();

    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;

    let job: JobSpec = serde_json::from_str(&input).map_err(WorkerErr::from)?;
    let output_id = job.output_id.clone();
    info!(job = output_id.as_str(); "received job");

    match run_job(job, &MetricRegistry::new()) {
        Ok(path) => {
            println!("{}", path.display());
            Ok(())
        }
        Err(e) => {
            error!(job = output_id.as_str(); "sweep of {output_id} failed: {e}");
            Err(e.into())
        }
    }
}
