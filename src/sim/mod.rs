pub mod driver;
pub mod job;
pub mod metrics;

pub use driver::Sim;
pub use job::{Job, JobId, JobKind};
pub use metrics::{ClassAverages, Report, Summary, TaskMetrics};
