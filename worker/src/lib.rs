pub mod error;
pub mod spec;
pub mod sweep;
pub mod table;

pub use error::{Result, WorkerErr};
pub use spec::{JobSpec, SweepConfig};
pub use sweep::{run_job, run_sweep, run_sweep_with};
pub use table::{ResultTable, TableRow, scores_path};
