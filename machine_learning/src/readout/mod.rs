mod pipeline;
mod strategy;
mod task;

pub use pipeline::{EvalOptions, ResultRow, check_xy_dims, evaluate};
pub use strategy::{Strategy, select_strategy};
pub use task::{Readout, ReadoutConfig, TaskRow};
