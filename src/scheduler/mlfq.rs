use log::{debug, trace};

use super::{ENQ_WAKEUP, EnqueueFlags, QueueBank, Scheduler, Stop};
use crate::{
    core::{
        Level, SchedEvent, Ticks,
        state::{KernelCtx, TaskId},
    },
    error::ConfigError,
};

pub const NUM_QUEUES: usize = 3;
pub const BASE_QUANTUM: Ticks = 10;
pub const BOOST_INTERVAL: Ticks = 50;
pub const IO_DURATION: Ticks = 10;
pub const IO_SLICE_DIVISOR: Ticks = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MlfqConfig {
    pub num_queues: usize,
    /// Quantum of level 0; each lower level doubles it.
    pub base_quantum: Ticks,
    pub boost_interval: Ticks,
    /// How long an I/O-bound task stays blocked after yielding.
    pub io_duration: Ticks,
    /// I/O-bound tasks run `quantum / io_slice_divisor` before yielding.
    pub io_slice_divisor: Ticks,
}

impl Default for MlfqConfig {
    fn default() -> Self {
        Self {
            num_queues: NUM_QUEUES,
            base_quantum: BASE_QUANTUM,
            boost_interval: BOOST_INTERVAL,
            io_duration: IO_DURATION,
            io_slice_divisor: IO_SLICE_DIVISOR,
        }
    }
}

impl MlfqConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_queues == 0 {
            return Err(ConfigError::NoQueues);
        }
        if self.base_quantum == 0 {
            return Err(ConfigError::ZeroQuantum);
        }
        let lowest = self.num_queues - 1;
        u32::try_from(lowest)
            .ok()
            .and_then(|shift| 2u64.checked_pow(shift))
            .and_then(|scale| self.base_quantum.checked_mul(scale))
            .ok_or(ConfigError::QuantumOverflow { level: lowest })?;
        if self.boost_interval == 0 {
            return Err(ConfigError::ZeroBoostInterval);
        }
        if self.io_slice_divisor == 0 {
            return Err(ConfigError::ZeroIoDivisor);
        }
        if self.base_quantum / self.io_slice_divisor == 0 {
            return Err(ConfigError::EmptyIoSlice {
                quantum: self.base_quantum,
                divisor: self.io_slice_divisor,
            });
        }
        Ok(())
    }

    /// `base_quantum * 2^level`. Only meaningful on a validated config.
    pub fn quantum(&self, level: Level) -> Ticks {
        self.base_quantum << level
    }
}

pub struct MlfqScheduler {
    config: MlfqConfig,
    bank: QueueBank,
    last_boost: Ticks,
    boosts: u64,
}

impl MlfqScheduler {
    pub fn new(config: MlfqConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            bank: QueueBank::default(),
            last_boost: 0,
            boosts: 0,
        })
    }

    pub fn bank(&self) -> &QueueBank {
        &self.bank
    }

    pub fn last_boost(&self) -> Ticks {
        self.last_boost
    }

    pub fn boosts(&self) -> u64 {
        self.boosts
    }

    fn quantum_of(&self, ctx: &KernelCtx, task: TaskId) -> Ticks {
        let level = ctx.task(task).level;
        ctx.queue(self.bank.queue_id(level))
            .quantum
            .expect("MLFQ levels always carry a quantum")
    }
}

impl Scheduler for MlfqScheduler {
    fn init(&mut self, ctx: &mut KernelCtx) {
        let quanta = (0..self.config.num_queues).map(|level| self.config.quantum(level));
        self.bank = QueueBank::new(ctx, quanta);
    }

    fn name(&self) -> &'static str {
        "mlfq"
    }

    fn levels(&self) -> usize {
        self.config.num_queues
    }

    fn enqueue(&mut self, ctx: &mut KernelCtx, task: TaskId, flags: EnqueueFlags) {
        // New arrivals and I/O returns always start on top with a fresh quantum
        if flags & ENQ_WAKEUP != 0 {
            ctx.task_mut(task).consumed_timeslice = 0;
            self.bank.enqueue(ctx, 0, task);
            return;
        }
        let level = ctx.task(task).level;
        self.bank.enqueue(ctx, level, task);
    }

    // Priority boost
    fn tick(&mut self, ctx: &mut KernelCtx) {
        if ctx.now.saturating_sub(self.last_boost) < self.config.boost_interval {
            return;
        }

        let moved = self.bank.move_all(ctx, 0);
        self.last_boost = ctx.now;
        self.boosts += 1;
        debug!("t={} priority boost moved {moved} task(s)", ctx.now);
        ctx.emit(SchedEvent::Boost { moved });
    }

    fn dispatch(&mut self, ctx: &mut KernelCtx) -> Option<TaskId> {
        let (level, task) = self.bank.dequeue(ctx)?;
        trace!("dispatching task {task} from level {level}");
        Some(task)
    }

    fn slice(&self, ctx: &KernelCtx, task: TaskId) -> Ticks {
        let quantum = self.quantum_of(ctx, task);
        let task = ctx.task(task);
        if task.is_io_bound() {
            (quantum / self.config.io_slice_divisor).min(task.remaining_time)
        } else {
            task.remaining_time
                .min(quantum.saturating_sub(task.consumed_timeslice))
        }
    }

    fn stopping(&mut self, ctx: &mut KernelCtx, task_id: TaskId, ran: Ticks) -> Stop {
        let quantum = self.quantum_of(ctx, task_id);
        let lowest = self.bank.lowest();
        let task = ctx.task_mut(task_id);

        // Gave up the CPU before the quantum ran out: keep the level
        if task.is_io_bound() && ran < quantum {
            task.consumed_timeslice = 0;
            return Stop::Block {
                duration: self.config.io_duration,
            };
        }

        if task.consumed_timeslice >= quantum {
            let from = task.level;
            let to = (from + 1).min(lowest);
            task.level = to;
            task.consumed_timeslice = 0;
            return Stop::Demote { from, to };
        }

        Stop::Requeue
    }
}
