use log::{debug, error, trace};

use super::{
    event::SchedEvent,
    observer::Observer,
    state::{KernelCtx, TaskId, TaskState, Ticks},
};
use crate::{
    error::SimError,
    scheduler::{ENQ_REENQ, ENQ_WAKEUP, Scheduler, Stop},
};

pub struct SchedCore<S: Scheduler> {
    pub ctx: KernelCtx,
    pub scheduler: S,
    observer: Observer,
}

impl<S: Scheduler> SchedCore<S> {
    pub fn new(mut scheduler: S) -> Self {
        let mut ctx = KernelCtx::new();
        scheduler.init(&mut ctx);
        Self {
            ctx,
            scheduler,
            observer: Observer::new(),
        }
    }

    /// One pass of the loop: admit, tick, then run or idle. Returns the
    /// events the pass produced.
    pub fn tick(&mut self) -> Result<Vec<(Ticks, SchedEvent)>, SimError> {
        self.admit_ready();
        self.scheduler.tick(&mut self.ctx);

        match self.scheduler.dispatch(&mut self.ctx) {
            Some(task) => self.run_task(task)?,
            None => self.idle()?,
        }

        self.observer.observe(&self.ctx, self.scheduler.levels());
        Ok(self.ctx.drain_events())
    }

    // New arrivals and I/O returns whose time has come, earliest first
    fn admit_ready(&mut self) {
        while let Some(task_id) = self.ctx.pop_ready() {
            let task = self.ctx.task(task_id);
            let event = if task.state == TaskState::New {
                SchedEvent::Arrived {
                    pid: task.pid,
                    burst: task.burst_time,
                    kind: task.kind,
                }
            } else {
                SchedEvent::IoReturned { pid: task.pid }
            };
            trace!("t={} admit task {task_id}", self.ctx.now);

            self.ctx.mark_runnable(task_id);
            self.ctx.emit(event);
            self.scheduler.enqueue(&mut self.ctx, task_id, ENQ_WAKEUP);
        }
    }

    fn run_task(&mut self, task_id: TaskId) -> Result<(), SimError> {
        let remaining = self.ctx.task(task_id).remaining_time;
        let slice = self.scheduler.slice(&self.ctx, task_id).min(remaining);
        if slice == 0 {
            let pid = self.ctx.task(task_id).pid;
            error!("t={}: {} gave P{pid} an empty slice", self.ctx.now, self.scheduler.name());
            return Err(SimError::EmptySlice {
                now: self.ctx.now,
                pid,
            });
        }

        let start = self.ctx.now;
        self.ctx.set_running(task_id);
        let (pid, level) = {
            let task = self.ctx.task_mut(task_id);
            if task.first_run_time.is_none() {
                task.first_run_time = Some(start);
            }
            (task.pid, task.level)
        };
        self.ctx.emit(SchedEvent::Dispatched {
            pid,
            level,
            remaining,
            slice,
        });

        self.ctx.advance_time(slice);
        {
            let task = self.ctx.task_mut(task_id);
            task.remaining_time -= slice;
            task.consumed_timeslice = task.consumed_timeslice.saturating_add(slice);
        }
        self.ctx.clear_running();

        if self.ctx.task(task_id).remaining_time == 0 {
            self.ctx.mark_completed(task_id);
            debug!("t={} P{pid} completed", self.ctx.now);
            self.ctx.emit(SchedEvent::Completed { pid });
            return Ok(());
        }

        match self.scheduler.stopping(&mut self.ctx, task_id, slice) {
            Stop::Block { duration } => {
                let until = self.ctx.now.saturating_add(duration);
                self.ctx.mark_blocked(task_id, until);
                self.ctx.emit(SchedEvent::IoYield { pid, level, until });
            }
            Stop::Demote { from, to } => {
                self.ctx.mark_runnable(task_id);
                self.ctx.emit(SchedEvent::Demoted { pid, from, to });
                self.scheduler.enqueue(&mut self.ctx, task_id, ENQ_REENQ);
            }
            Stop::Requeue => {
                self.ctx.mark_runnable(task_id);
                self.ctx.emit(SchedEvent::Requeued { pid, level });
                self.scheduler.enqueue(&mut self.ctx, task_id, ENQ_REENQ);
            }
        }
        Ok(())
    }

    // Nothing to dispatch: jump the clock to the next admission
    fn idle(&mut self) -> Result<(), SimError> {
        if let Some(until) = self.ctx.next_ready_at() {
            trace!("t={} idle until {until}", self.ctx.now);
            self.ctx.emit(SchedEvent::Idle { until });
            self.ctx.now = until;
            return Ok(());
        }

        let incomplete = self.ctx.incomplete();
        if incomplete == 0 {
            return Ok(());
        }

        error!(
            "t={}: nothing runnable or pending but {incomplete} task(s) incomplete",
            self.ctx.now
        );
        Err(SimError::Stalled {
            now: self.ctx.now,
            incomplete,
        })
    }

    pub fn now(&self) -> Ticks {
        self.ctx.now
    }
}
