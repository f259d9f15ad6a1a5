use log::info;
use rustc_hash::FxHashSet;

use super::{
    job::Job,
    metrics::Report,
};
use crate::{
    core::{SchedCore, SchedEvent, Task, Ticks},
    error::{ConfigError, SimError},
    scheduler::Scheduler,
};

pub struct Sim<S: Scheduler> {
    pub core: SchedCore<S>,
    log: Vec<(Ticks, SchedEvent)>,
}

impl<S: Scheduler> Sim<S> {
    /// Jobs keep the caller's order; tasks arriving at the same instant are
    /// admitted in that order.
    pub fn new(jobs: Vec<Job>, scheduler: S) -> Result<Self, ConfigError> {
        if jobs.is_empty() {
            return Err(ConfigError::NoJobs);
        }

        let mut seen = FxHashSet::default();
        for job in &jobs {
            if !seen.insert(job.id) {
                return Err(ConfigError::DuplicateJob(job.id));
            }
            if job.burst_time == 0 {
                return Err(ConfigError::ZeroBurst(job.id));
            }
        }

        let mut core = SchedCore::new(scheduler);
        for job in &jobs {
            core.ctx
                .create_task(job.id, job.kind, job.arrival_time, job.burst_time);
        }

        Ok(Self {
            core,
            log: Vec::new(),
        })
    }

    /// Advance by one scheduling pass. Events land in the simulator's log
    /// whether or not the pass fails.
    pub fn step(&mut self) -> Result<Vec<(Ticks, SchedEvent)>, SimError> {
        match self.core.tick() {
            Ok(events) => {
                self.log.extend(events.iter().cloned());
                Ok(events)
            }
            Err(err) => {
                self.log.extend(self.core.ctx.drain_events());
                Err(err)
            }
        }
    }

    /// Step until every job completes. On a stall the error is returned and
    /// the simulator keeps whatever state and events it reached.
    pub fn run(&mut self) -> Result<Report, SimError> {
        info!(
            "simulating {} job(s) under {}",
            self.tasks().len(),
            self.core.scheduler.name()
        );

        while !self.all_jobs_completed() {
            self.step()?;
        }

        info!("all jobs completed at t={}", self.now());
        Ok(self.report())
    }

    /// Snapshot of the run so far; partial if the run has not finished.
    pub fn report(&self) -> Report {
        Report::collect(self.tasks(), self.log.clone())
    }

    pub fn events(&self) -> &[(Ticks, SchedEvent)] {
        &self.log
    }

    pub fn all_jobs_completed(&self) -> bool {
        self.core.ctx.all_completed()
    }

    pub fn now(&self) -> Ticks {
        self.core.now()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.core.ctx.tasks
    }

    pub fn scheduler(&self) -> &S {
        &self.core.scheduler
    }
}
