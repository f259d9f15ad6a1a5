use mlfq_model::{
    ConfigError, Job, JobKind, SchedEvent, Sim, SimError,
    core::{KernelCtx, TaskId, Ticks},
    scheduler::{EnqueueFlags, FifoScheduler, MlfqConfig, MlfqScheduler, Scheduler, Stop},
};
use rand::prelude::*;

fn mlfq() -> MlfqScheduler {
    MlfqScheduler::new(MlfqConfig::default()).unwrap()
}

fn reference_jobs() -> Vec<Job> {
    vec![
        Job::cpu(1, 0, 100),
        Job::io(2, 0, 5),
        Job::io(3, 0, 5),
        Job::cpu(4, 10, 80),
        Job::io(5, 20, 15),
    ]
}

fn random_jobs(seed: u64, ticks: Ticks) -> Vec<Job> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut jobs = Vec::new();
    for t in 0..ticks {
        if rng.random::<f64>() < 0.15 {
            let kind = if rng.random::<bool>() {
                JobKind::IoBound
            } else {
                JobKind::CpuBound
            };
            jobs.push(Job::new(
                jobs.len() as u64 + 1,
                t,
                rng.random_range(1..=90),
                kind,
            ));
        }
    }
    jobs
}

#[test]
fn reference_workload_schedule() {
    let mut sim = Sim::new(reference_jobs(), mlfq()).unwrap();
    let report = sim.run().unwrap();

    let expected = [
        // pid, first run, completion, turnaround, waiting, response
        (1, 0, 205, 205, 105, 0),
        (2, 10, 53, 53, 48, 10),
        (3, 12, 54, 54, 49, 12),
        (4, 14, 195, 185, 105, 4),
        (5, 24, 185, 165, 150, 4),
    ];
    for (pid, first, completion, turnaround, waiting, response) in expected {
        let t = report.task(pid).unwrap();
        assert_eq!(t.first_run_time, first, "P{pid} first run");
        assert_eq!(t.completion_time, completion, "P{pid} completion");
        assert_eq!(t.turnaround_time, turnaround, "P{pid} turnaround");
        assert_eq!(t.waiting_time, waiting, "P{pid} waiting");
        assert_eq!(t.response_time, response, "P{pid} response");
    }

    let summary = &report.summary;
    assert_eq!(summary.makespan, 205);
    assert_eq!(summary.idle_time, 0);
    assert_eq!(summary.boosts, 3);
    assert_eq!(summary.dispatches, 27);
    assert_eq!(sim.scheduler().boosts(), 3);

    let overall = summary.overall.as_ref().unwrap();
    assert!((overall.turnaround - 662.0 / 5.0).abs() < 1e-9);
    assert!((overall.response - 30.0 / 5.0).abs() < 1e-9);
    let io = summary.io_bound.as_ref().unwrap();
    assert!((io.turnaround - 272.0 / 3.0).abs() < 1e-9);
    let cpu = summary.cpu_bound.as_ref().unwrap();
    assert!((cpu.response - 2.0).abs() < 1e-9);
}

#[test]
fn reference_workload_opening_events() {
    let mut sim = Sim::new(reference_jobs(), mlfq()).unwrap();
    let mut events = Vec::new();
    for _ in 0..3 {
        events.extend(sim.step().unwrap());
    }

    let expected = vec![
        (0, SchedEvent::Arrived { pid: 1, burst: 100, kind: JobKind::CpuBound }),
        (0, SchedEvent::Arrived { pid: 2, burst: 5, kind: JobKind::IoBound }),
        (0, SchedEvent::Arrived { pid: 3, burst: 5, kind: JobKind::IoBound }),
        (0, SchedEvent::Dispatched { pid: 1, level: 0, remaining: 100, slice: 10 }),
        (10, SchedEvent::Demoted { pid: 1, from: 0, to: 1 }),
        (10, SchedEvent::Arrived { pid: 4, burst: 80, kind: JobKind::CpuBound }),
        (10, SchedEvent::Dispatched { pid: 2, level: 0, remaining: 5, slice: 2 }),
        (12, SchedEvent::IoYield { pid: 2, level: 0, until: 22 }),
        (12, SchedEvent::Dispatched { pid: 3, level: 0, remaining: 5, slice: 2 }),
        (14, SchedEvent::IoYield { pid: 3, level: 0, until: 24 }),
    ];
    assert_eq!(events, expected);
}

#[test]
fn cpu_bound_job_returns_to_top_only_after_boost() {
    let mut sim = Sim::new(reference_jobs(), mlfq()).unwrap();
    let report = sim.run().unwrap();

    let mut boosted = false;
    let mut first = true;
    for (_, event) in &report.events {
        match *event {
            SchedEvent::Boost { .. } => boosted = true,
            SchedEvent::Dispatched { pid: 1, level, .. } => {
                if level == 0 && !first {
                    assert!(boosted, "P1 back at level 0 without a boost");
                }
                first = false;
                boosted = false;
            }
            _ => {}
        }
    }
}

#[test]
fn equal_priority_jobs_alternate_in_arrival_order() {
    let jobs = vec![Job::cpu(1, 0, 30), Job::cpu(2, 0, 30)];
    let mut sim = Sim::new(jobs, mlfq()).unwrap();
    let report = sim.run().unwrap();

    let runs: Vec<_> = report
        .events
        .iter()
        .filter_map(|(at, e)| match *e {
            SchedEvent::Dispatched { pid, level, slice, .. } => Some((*at, pid, level, slice)),
            _ => None,
        })
        .collect();
    assert_eq!(
        runs,
        vec![(0, 1, 0, 10), (10, 2, 0, 10), (20, 1, 1, 20), (40, 2, 1, 20)]
    );
    assert_eq!(report.task(1).unwrap().completion_time, 40);
    assert_eq!(report.task(2).unwrap().completion_time, 60);
}

#[test]
fn short_job_finishes_on_first_dispatch() {
    let jobs = vec![Job::cpu(1, 7, 4), Job::io(2, 30, 2)];
    let mut sim = Sim::new(jobs, mlfq()).unwrap();
    let report = sim.run().unwrap();

    for pid in [1, 2] {
        let t = report.task(pid).unwrap();
        assert_eq!(t.first_run_time, t.arrival_time);
        assert_eq!(t.completion_time, t.arrival_time + t.burst_time);
        assert_eq!(t.io_blocks, 0);
    }
    let dispatches = report
        .events
        .iter()
        .filter(|(_, e)| matches!(e, SchedEvent::Dispatched { .. }))
        .count();
    assert_eq!(dispatches, 2);
    assert_eq!(report.summary.idle_time, 7 + 19);
}

#[test]
fn io_yield_resumes_after_io_duration() {
    let config = MlfqConfig {
        io_duration: 3,
        ..MlfqConfig::default()
    };
    let jobs = vec![Job::io(9, 0, 5)];
    let mut sim = Sim::new(jobs, MlfqScheduler::new(config).unwrap()).unwrap();
    let report = sim.run().unwrap();

    let expected = vec![
        (0, SchedEvent::Arrived { pid: 9, burst: 5, kind: JobKind::IoBound }),
        (0, SchedEvent::Dispatched { pid: 9, level: 0, remaining: 5, slice: 2 }),
        (2, SchedEvent::IoYield { pid: 9, level: 0, until: 5 }),
        (2, SchedEvent::Idle { until: 5 }),
        (5, SchedEvent::IoReturned { pid: 9 }),
        (5, SchedEvent::Dispatched { pid: 9, level: 0, remaining: 3, slice: 2 }),
        (7, SchedEvent::IoYield { pid: 9, level: 0, until: 10 }),
        (7, SchedEvent::Idle { until: 10 }),
        (10, SchedEvent::IoReturned { pid: 9 }),
        (10, SchedEvent::Dispatched { pid: 9, level: 0, remaining: 1, slice: 1 }),
        (11, SchedEvent::Completed { pid: 9 }),
    ];
    assert_eq!(report.events, expected);

    let t = report.task(9).unwrap();
    assert_eq!(t.arrival_time, 0);
    assert_eq!(t.turnaround_time, 11);
    assert_eq!(t.waiting_time, 6);
    assert_eq!(t.io_blocks, 2);
}

#[test]
fn invariants_hold_on_random_workloads() {
    let config = MlfqConfig::default();
    for seed in 0..20 {
        let jobs = random_jobs(seed, 300);
        let mut sim = Sim::new(jobs.clone(), mlfq()).unwrap();
        let report = sim.run().unwrap();
        assert_eq!(report.tasks.len(), jobs.len(), "seed {seed}");

        for t in &report.tasks {
            assert_eq!(t.turnaround_time, t.completion_time - t.arrival_time);
            assert_eq!(t.waiting_time, t.turnaround_time - t.burst_time);
            assert!(t.first_run_time >= t.arrival_time);
            assert!(t.completion_time >= t.arrival_time + t.burst_time);
        }

        let mut last_at = 0;
        let mut last_boost = None;
        let mut served = vec![0; jobs.len() + 1];
        for (at, event) in &report.events {
            assert!(*at >= last_at, "seed {seed}: clock went backwards");
            last_at = *at;

            match *event {
                SchedEvent::Dispatched { pid, level, slice, .. } => {
                    assert!(level < config.num_queues);
                    assert!(slice <= config.quantum(level));
                    served[pid as usize] += slice;
                }
                SchedEvent::Demoted { pid, from, to } => {
                    assert_eq!(to, (from + 1).min(config.num_queues - 1));
                    assert_eq!(jobs[pid as usize - 1].kind, JobKind::CpuBound);
                }
                SchedEvent::Boost { .. } => {
                    if let Some(prev) = last_boost {
                        assert!(*at - prev >= config.boost_interval);
                    }
                    last_boost = Some(*at);
                }
                _ => {}
            }
        }

        for job in &jobs {
            assert_eq!(served[job.id as usize], job.burst_time, "seed {seed}");
        }
    }
}

#[test]
fn bad_config_is_rejected_before_simulation() {
    let config = MlfqConfig {
        num_queues: 0,
        ..MlfqConfig::default()
    };
    assert_eq!(MlfqScheduler::new(config).err(), Some(ConfigError::NoQueues));
}

// Loses every task it is handed
struct Lossy;

impl Scheduler for Lossy {
    fn init(&mut self, _ctx: &mut KernelCtx) {}

    fn name(&self) -> &'static str {
        "lossy"
    }

    fn enqueue(&mut self, _ctx: &mut KernelCtx, _task: TaskId, _flags: EnqueueFlags) {}

    fn dispatch(&mut self, _ctx: &mut KernelCtx) -> Option<TaskId> {
        None
    }

    fn slice(&self, _ctx: &KernelCtx, _task: TaskId) -> Ticks {
        0
    }

    fn stopping(&mut self, _ctx: &mut KernelCtx, _task: TaskId, _ran: Ticks) -> Stop {
        Stop::Requeue
    }
}

#[test]
fn stall_is_reported_and_state_preserved() {
    let jobs = vec![Job::cpu(1, 5, 10), Job::io(2, 5, 10)];
    let mut sim = Sim::new(jobs, Lossy).unwrap();

    assert_eq!(
        sim.run().err(),
        Some(SimError::Stalled {
            now: 5,
            incomplete: 2
        })
    );
    assert_eq!(sim.now(), 5);
    assert!(sim.tasks().iter().all(|t| t.completion.is_none()));

    // Events from every pass, the failing one included, stay on the log
    assert_eq!(
        sim.events(),
        &[
            (0, SchedEvent::Idle { until: 5 }),
            (
                5,
                SchedEvent::Arrived {
                    pid: 1,
                    burst: 10,
                    kind: JobKind::CpuBound
                }
            ),
            (
                5,
                SchedEvent::Arrived {
                    pid: 2,
                    burst: 10,
                    kind: JobKind::IoBound
                }
            ),
        ]
    );
    assert_eq!(sim.report().summary.idle_time, 5);
}

// FIFO order, but never grants any service
struct Starving(FifoScheduler);

impl Scheduler for Starving {
    fn init(&mut self, ctx: &mut KernelCtx) {
        self.0.init(ctx);
    }

    fn name(&self) -> &'static str {
        "starving"
    }

    fn enqueue(&mut self, ctx: &mut KernelCtx, task: TaskId, flags: EnqueueFlags) {
        self.0.enqueue(ctx, task, flags);
    }

    fn dispatch(&mut self, ctx: &mut KernelCtx) -> Option<TaskId> {
        self.0.dispatch(ctx)
    }

    fn slice(&self, _ctx: &KernelCtx, _task: TaskId) -> Ticks {
        0
    }

    fn stopping(&mut self, _ctx: &mut KernelCtx, _task: TaskId, _ran: Ticks) -> Stop {
        Stop::Requeue
    }
}

#[test]
fn empty_slice_is_an_error_not_a_spin() {
    let jobs = vec![Job::cpu(1, 0, 10), Job::cpu(2, 0, 10)];
    let mut sim = Sim::new(jobs, Starving(FifoScheduler::new())).unwrap();

    assert_eq!(
        sim.run().err(),
        Some(SimError::EmptySlice { now: 0, pid: 1 })
    );
    assert_eq!(sim.now(), 0);
    assert_eq!(sim.tasks()[0].remaining_time, 10);
    assert_eq!(sim.tasks()[0].first_run_time, None);
}
