pub mod conn;
pub mod error;
pub mod esn;
pub mod tasks;

pub use conn::{Conn, NodeRole, NodeSet};
pub use error::{ReservoirErr, Result};
pub use esn::{Activation, EchoStateNetwork};
pub use tasks::MemoryCapacity;
