use super::{EnqueueFlags, KernelCtx, Scheduler, Stop, TaskId};
use crate::core::{QueueId, Ticks};

/// First come, first served: every task runs to completion.
#[derive(Default)]
pub struct FifoScheduler {
    queue: Option<QueueId>,
}

impl FifoScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self) -> QueueId {
        self.queue.expect("FifoScheduler used before init()")
    }
}

impl Scheduler for FifoScheduler {
    fn init(&mut self, ctx: &mut KernelCtx) {
        self.queue = Some(ctx.create_queue(None));
    }

    fn name(&self) -> &'static str {
        "fifo"
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

    fn stopping(&mut self, _ctx: &mut KernelCtx, _task: TaskId, _ran: Ticks) -> Stop {
        Stop::Requeue
    }
}
