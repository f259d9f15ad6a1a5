use average::{Estimate, Mean};

use crate::core::{JobKind, Pid, SchedEvent, Task, Ticks};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskMetrics {
    pub pid: Pid,
    pub kind: JobKind,
    pub arrival_time: Ticks,
    pub burst_time: Ticks,
    pub first_run_time: Ticks,
    pub completion_time: Ticks,
    pub turnaround_time: Ticks,
    pub waiting_time: Ticks,
    pub response_time: Ticks,
    pub io_blocks: u32,
}

impl TaskMetrics {
    /// `None` until the task has completed.
    pub fn from_task(task: &Task) -> Option<Self> {
        let done = task.completion?;
        let first_run_time = task.first_run_time?;
        Some(Self {
            pid: task.pid,
            kind: task.kind,
            arrival_time: task.arrival_time,
            burst_time: task.burst_time,
            first_run_time,
            completion_time: done.completion_time,
            turnaround_time: done.turnaround_time,
            waiting_time: done.waiting_time,
            response_time: first_run_time - task.arrival_time,
            io_blocks: task.io_blocks,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassAverages {
    pub count: u64,
    pub turnaround: f64,
    pub waiting: f64,
    pub response: f64,
}

impl ClassAverages {
    pub fn of<'a>(tasks: impl IntoIterator<Item = &'a TaskMetrics>) -> Option<Self> {
        let mut turnaround = Mean::new();
        let mut waiting = Mean::new();
        let mut response = Mean::new();
        for t in tasks {
            turnaround.add(t.turnaround_time as f64);
            waiting.add(t.waiting_time as f64);
            response.add(t.response_time as f64);
        }

        if turnaround.len() == 0 {
            return None;
        }
        Some(Self {
            count: turnaround.len(),
            turnaround: turnaround.estimate(),
            waiting: waiting.estimate(),
            response: response.estimate(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub overall: Option<ClassAverages>,
    pub io_bound: Option<ClassAverages>,
    pub cpu_bound: Option<ClassAverages>,
    pub makespan: Ticks,
    pub idle_time: Ticks,
    pub dispatches: u64,
    pub boosts: u64,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub tasks: Vec<TaskMetrics>,
    pub summary: Summary,
    pub events: Vec<(Ticks, SchedEvent)>,
}

impl Report {
    /// Aggregate completed tasks; incomplete ones are left out.
    pub fn collect(tasks: &[Task], events: Vec<(Ticks, SchedEvent)>) -> Self {
        let tasks: Vec<TaskMetrics> = tasks.iter().filter_map(TaskMetrics::from_task).collect();
        let of_kind = |kind| ClassAverages::of(tasks.iter().filter(|t| t.kind == kind));

        let mut idle_time = 0;
        let mut dispatches = 0;
        let mut boosts = 0;
        for (at, event) in &events {
            match event {
                SchedEvent::Idle { until } => idle_time += until - at,
                SchedEvent::Dispatched { .. } => dispatches += 1,
                SchedEvent::Boost { .. } => boosts += 1,
                _ => {}
            }
        }

        let summary = Summary {
            overall: ClassAverages::of(&tasks),
            io_bound: of_kind(JobKind::IoBound),
            cpu_bound: of_kind(JobKind::CpuBound),
            makespan: tasks.iter().map(|t| t.completion_time).max().unwrap_or(0),
            idle_time,
            dispatches,
            boosts,
        };

        Self {
            tasks,
            summary,
            events,
        }
    }

    pub fn task(&self, pid: Pid) -> Option<&TaskMetrics> {
        self.tasks.iter().find(|t| t.pid == pid)
    }
}
