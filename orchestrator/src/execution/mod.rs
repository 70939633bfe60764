mod executor;
mod in_process;
mod process;

pub use executor::{Executor, ExecutorTemplate};
pub use in_process::InProcessExecutor;
pub use process::ProcessExecutor;
