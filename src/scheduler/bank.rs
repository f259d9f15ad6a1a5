use crate::core::{
    Level, QueueId, Ticks,
    state::{KernelCtx, TaskId},
};

/// One FIFO run queue per priority level, level 0 highest.
#[derive(Debug, Default)]
pub struct QueueBank {
    levels: Vec<QueueId>,
}

impl QueueBank {
    pub fn new(ctx: &mut KernelCtx, quanta: impl IntoIterator<Item = Ticks>) -> Self {
        let levels = quanta
            .into_iter()
            .map(|quantum| ctx.create_queue(Some(quantum)))
            .collect();
        Self { levels }
    }

    pub fn levels(&self) -> usize {
        self.levels.len()
    }

    pub fn queue_id(&self, level: Level) -> QueueId {
        self.levels[level]
    }

    pub fn lowest(&self) -> Level {
        self.levels.len().saturating_sub(1)
    }

    pub fn enqueue(&self, ctx: &mut KernelCtx, level: Level, task: TaskId) {
        ctx.task_mut(task).level = level;
        ctx.queue_push_back(self.levels[level], task);
    }

    // Head of the highest-priority non-empty level
    pub fn dequeue(&self, ctx: &mut KernelCtx) -> Option<(Level, TaskId)> {
        self.levels
            .iter()
            .enumerate()
            .find_map(|(level, &queue)| ctx.queue_pop_front(queue).map(|task| (level, task)))
    }

    /// Move every task below `to` up into `to`, preserving level then FIFO
    /// order. Moved tasks start a fresh quantum.
    pub fn move_all(&self, ctx: &mut KernelCtx, to: Level) -> usize {
        let mut moved = 0;
        for &queue in &self.levels[to + 1..] {
            for task in ctx.queue_drain(queue) {
                ctx.task_mut(task).consumed_timeslice = 0;
                self.enqueue(ctx, to, task);
                moved += 1;
            }
        }
        moved
    }

    pub fn is_empty(&self, ctx: &KernelCtx) -> bool {
        self.levels.iter().all(|&q| ctx.queue(q).is_empty())
    }
}
