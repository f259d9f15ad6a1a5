use thiserror::Error;

use crate::core::{Pid, Ticks};

/// Rejected before any simulation state is built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("scheduler needs at least one queue")]
    NoQueues,

    #[error("time quantum must be positive")]
    ZeroQuantum,

    #[error("time quantum for level {level} overflows")]
    QuantumOverflow { level: usize },

    #[error("priority boost interval must be positive")]
    ZeroBoostInterval,

    #[error("I/O slice divisor must be positive")]
    ZeroIoDivisor,

    #[error("I/O slice of quantum {quantum} / {divisor} is empty")]
    EmptyIoSlice { quantum: Ticks, divisor: Ticks },

    #[error("no jobs to simulate")]
    NoJobs,

    #[error("duplicate job id {0}")]
    DuplicateJob(Pid),

    #[error("job {0} has zero burst time")]
    ZeroBurst(Pid),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Nothing runnable, nothing pending, yet tasks remain incomplete.
    #[error("no runnable or pending task at t={now} with {incomplete} task(s) incomplete")]
    Stalled { now: Ticks, incomplete: usize },

    /// A dispatched task was handed zero ticks of service.
    #[error("scheduler gave P{pid} an empty slice at t={now}")]
    EmptySlice { now: Ticks, pid: Pid },
}
