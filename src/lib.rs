pub mod core;
pub mod error;
pub mod scheduler;
pub mod sim;

pub use crate::core::SchedEvent;
pub use error::{ConfigError, SimError};
pub use scheduler::Scheduler;
pub use sim::{Job, JobKind, Report, Sim};
