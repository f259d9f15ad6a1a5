pub use crate::core::JobKind;
use crate::core::{Pid, Ticks};

pub type JobId = Pid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub arrival_time: Ticks,
    pub burst_time: Ticks,
    pub kind: JobKind,
}

impl Job {
    pub fn new(id: JobId, arrival_time: Ticks, burst_time: Ticks, kind: JobKind) -> Self {
        Self {
            id,
            arrival_time,
            burst_time,
            kind,
        }
    }

    pub fn cpu(id: JobId, arrival_time: Ticks, burst_time: Ticks) -> Self {
        Self::new(id, arrival_time, burst_time, JobKind::CpuBound)
    }

    pub fn io(id: JobId, arrival_time: Ticks, burst_time: Ticks) -> Self {
        Self::new(id, arrival_time, burst_time, JobKind::IoBound)
    }

    pub fn is_io_bound(&self) -> bool {
        self.kind == JobKind::IoBound
    }
}
