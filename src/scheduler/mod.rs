pub mod bank;
pub mod fifo;
pub mod mlfq;
pub mod rr;

use crate::core::{
    Level, Ticks,
    state::{KernelCtx, TaskId},
};
pub use bank::QueueBank;
pub use fifo::FifoScheduler;
pub use mlfq::{MlfqConfig, MlfqScheduler};
pub use rr::RoundRobinScheduler;

pub type EnqueueFlags = u64;

// Task arrived or came back from I/O
pub const ENQ_WAKEUP: EnqueueFlags = 1 << 0;
// Task was preempted and goes back on a run queue
pub const ENQ_REENQ: EnqueueFlags = 1 << 1;

/// What happens to a task that stopped running without finishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stop {
    /// Leave the run queues until `duration` ticks of simulated I/O pass.
    Block { duration: Ticks },
    /// Full quantum used; the scheduler already moved the task to `to`.
    Demote { from: Level, to: Level },
    Requeue,
}

pub trait Scheduler {
    /// Create run queues. Called once before any task arrives.
    fn init(&mut self, ctx: &mut KernelCtx);

    fn name(&self) -> &'static str;

    /// Number of priority levels a task's `level` may take.
    fn levels(&self) -> usize {
        1
    }

    fn enqueue(&mut self, ctx: &mut KernelCtx, task: TaskId, flags: EnqueueFlags);

    /// Runs every step after admissions and before dispatch.
    fn tick(&mut self, _ctx: &mut KernelCtx) {}

    /// Remove and return the next task to run.
    fn dispatch(&mut self, ctx: &mut KernelCtx) -> Option<TaskId>;

    /// Service the dispatched task may receive before it stops.
    fn slice(&self, ctx: &KernelCtx, task: TaskId) -> Ticks;

    /// Reclassify a task that ran for `ran` ticks and still has work left.
    fn stopping(&mut self, ctx: &mut KernelCtx, task: TaskId, ran: Ticks) -> Stop;
}
