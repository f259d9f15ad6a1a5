use super::{EnqueueFlags, KernelCtx, Scheduler, Stop, TaskId};
use crate::{
    core::{QueueId, Ticks},
    error::ConfigError,
};

pub const RR_QUANTUM: Ticks = 5;

/// Single queue, fixed quantum, preempted tasks go to the tail.
pub struct RoundRobinScheduler {
    quantum: Ticks,
    queue: Option<QueueId>,
}

impl RoundRobinScheduler {
    pub fn new(quantum: Ticks) -> Result<Self, ConfigError> {
        if quantum == 0 {
            return Err(ConfigError::ZeroQuantum);
        }
        Ok(Self {
            quantum,
            queue: None,
        })
    }

    fn queue(&self) -> QueueId {
        self.queue.expect("RoundRobinScheduler used before init()")
    }
}

impl Scheduler for RoundRobinScheduler {
    fn init(&mut self, ctx: &mut KernelCtx) {
        self.queue = Some(ctx.create_queue(Some(self.quantum)));
    }

    fn name(&self) -> &'static str {
        "rr"
    }

    fn enqueue(&mut self, ctx: &mut KernelCtx, task: TaskId, _flags: EnqueueFlags) {
        ctx.queue_push_back(self.queue(), task);
    }

    fn dispatch(&mut self, ctx: &mut KernelCtx) -> Option<TaskId> {
        ctx.queue_pop_front(self.queue())
    }

    fn slice(&self, ctx: &KernelCtx, task: TaskId) -> Ticks {
        ctx.queue(self.queue()).slice_for(ctx.task(task).remaining_time)
    }

    fn stopping(&mut self, ctx: &mut KernelCtx, task: TaskId, _ran: Ticks) -> Stop {
        ctx.task_mut(task).consumed_timeslice = 0;
        Stop::Requeue
    }
}
