use keyed_priority_queue::KeyedPriorityQueue;
use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};
use std::collections::VecDeque;

use super::event::SchedEvent;

// Index into Task Vec
pub type TaskId = usize;
pub type Pid = u64;
pub type Ticks = u64;
pub type Level = usize;
new_key_type! {
    pub struct QueueId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    CpuBound,
    /// Gives up the CPU early to wait on simulated I/O.
    IoBound,
}

impl JobKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::CpuBound => "CPU-bound",
            Self::IoBound => "I/O-bound",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    // Not yet arrived
    New,
    Runnable,
    Running,
    // Waiting on simulated I/O
    Blocked,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub completion_time: Ticks,
    pub turnaround_time: Ticks,
    pub waiting_time: Ticks,
}

#[derive(Debug)]
pub struct Task {
    pub id: TaskId,
    pub pid: Pid,
    pub kind: JobKind,
    pub state: TaskState,
    pub arrival_time: Ticks,
    /// Next admission time: the arrival itself, then each return from I/O.
    pub ready_at: Ticks,
    pub burst_time: Ticks,
    pub remaining_time: Ticks,
    pub level: Level,
    /// Service consumed since the task last entered its current level.
    pub consumed_timeslice: Ticks,
    pub first_run_time: Option<Ticks>,
    pub completion: Option<Completion>,
    pub io_blocks: u32,
}

impl Task {
    pub fn is_io_bound(&self) -> bool {
        self.kind == JobKind::IoBound
    }

    pub fn response_time(&self) -> Option<Ticks> {
        self.first_run_time.map(|t| t - self.arrival_time)
    }
}

#[derive(Debug)]
pub struct RunQueue {
    /// `None` for queues that let a task run to completion.
    pub quantum: Option<Ticks>,
    tasks: VecDeque<TaskId>,
}

impl RunQueue {
    pub fn new(quantum: Option<Ticks>) -> Self {
        Self {
            quantum,
            tasks: VecDeque::new(),
        }
    }

    /// Service a task owing `remaining` ticks gets from one turn here.
    pub fn slice_for(&self, remaining: Ticks) -> Ticks {
        self.quantum.map_or(remaining, |q| remaining.min(q))
    }

    pub fn contains(&self, task_id: TaskId) -> bool {
        self.tasks.contains(&task_id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.tasks.iter().copied()
    }
}

// Admission key. KeyedPriorityQueue is a max-heap, so flip the Ord to pop the
// earliest time first, ties going to the lower task index.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub struct ReadyAt {
    pub at: Ticks,
    pub task: TaskId,
}

impl PartialOrd for ReadyAt {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReadyAt {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (other.at, other.task).cmp(&(self.at, self.task))
    }
}

#[derive(Debug)]
pub struct KernelCtx {
    pub now: Ticks,
    pub current: Option<TaskId>,
    pub tasks: Vec<Task>,
    pub queues: SlotMap<QueueId, RunQueue>,
    pub task_to_queue: FxHashMap<TaskId, QueueId>,
    // New and Blocked tasks, keyed by when they become runnable
    pending: KeyedPriorityQueue<TaskId, ReadyAt>,
    events: Vec<(Ticks, SchedEvent)>,
}

impl Default for KernelCtx {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelCtx {
    pub fn new() -> Self {
        Self {
            now: 0,
            current: None,
            tasks: Vec::new(),
            queues: SlotMap::with_key(),
            task_to_queue: FxHashMap::default(),
            pending: KeyedPriorityQueue::new(),
            events: Vec::new(),
        }
    }

    pub fn create_task(
        &mut self,
        pid: Pid,
        kind: JobKind,
        arrival_time: Ticks,
        burst_time: Ticks,
    ) -> TaskId {
        let id = self.tasks.len();
        let task = Task {
            id,
            pid,
            kind,
            state: TaskState::New,
            arrival_time,
            ready_at: arrival_time,
            burst_time,
            remaining_time: burst_time,
            level: 0,
            consumed_timeslice: 0,
            first_run_time: None,
            completion: None,
            io_blocks: 0,
        };
        self.tasks.push(task);
        self.pending.push(
            id,
            ReadyAt {
                at: arrival_time,
                task: id,
            },
        );

        id
    }

    pub fn advance_time(&mut self, delta: Ticks) {
        self.now = self.now.saturating_add(delta);
    }

    pub fn create_queue(&mut self, quantum: Option<Ticks>) -> QueueId {
        self.queues.insert(RunQueue::new(quantum))
    }

    pub fn queue(&self, queue_id: QueueId) -> &RunQueue {
        &self.queues[queue_id]
    }

    pub fn queue_push_back(&mut self, queue_id: QueueId, task_id: TaskId) {
        assert!(
            !self.task_to_queue.contains_key(&task_id),
            "Task {task_id} already present in some queue"
        );

        let task = self.task(task_id);
        debug_assert_eq!(
            task.state,
            TaskState::Runnable,
            "Task {task_id} must be Runnable when enqueued"
        );

        let queue = self.queues.get_mut(queue_id).expect("Unknown queue");
        queue.tasks.push_back(task_id);
        self.task_to_queue.insert(task_id, queue_id);
    }

    pub fn queue_pop_front(&mut self, queue_id: QueueId) -> Option<TaskId> {
        let task = self.queues.get_mut(queue_id)?.tasks.pop_front()?;

        let removed = self.task_to_queue.remove(&task);
        debug_assert!(removed.is_some(), "Task {task} missing queue membership");

        Some(task)
    }

    // Empty a queue, handing back its tasks in FIFO order
    pub fn queue_drain(&mut self, queue_id: QueueId) -> Vec<TaskId> {
        let Some(queue) = self.queues.get_mut(queue_id) else {
            return Vec::new();
        };
        let drained: Vec<TaskId> = queue.tasks.drain(..).collect();
        for task in &drained {
            self.task_to_queue.remove(task);
        }
        drained
    }

    pub fn task_in_any_queue(&self, task_id: TaskId) -> bool {
        self.task_to_queue.contains_key(&task_id)
    }

    pub fn task(&self, task_id: TaskId) -> &Task {
        &self.tasks[task_id]
    }

    pub fn task_mut(&mut self, task_id: TaskId) -> &mut Task {
        &mut self.tasks[task_id]
    }

    /// Earliest time a New or Blocked task becomes runnable.
    pub fn next_ready_at(&self) -> Option<Ticks> {
        self.pending.peek().map(|(_, ready)| ready.at)
    }

    // Pop the next pending task whose ready time has been reached
    pub fn pop_ready(&mut self) -> Option<TaskId> {
        if self.next_ready_at()? > self.now {
            return None;
        }
        self.pending.pop().map(|(task, _)| task)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn mark_runnable(&mut self, task_id: TaskId) {
        let task = self.task_mut(task_id);
        debug_assert!(
            task.state != TaskState::Completed,
            "Completed task {} cannot be runnable",
            task.id
        );
        task.state = TaskState::Runnable;
    }

    pub fn mark_blocked(&mut self, task_id: TaskId, until: Ticks) {
        debug_assert!(
            !self.task_to_queue.contains_key(&task_id),
            "Blocking task {task_id} that is still enqueued"
        );
        let task = self.task_mut(task_id);
        task.state = TaskState::Blocked;
        task.ready_at = until;
        task.io_blocks += 1;
        self.pending.push(task_id, ReadyAt { at: until, task: task_id });
    }

    pub fn mark_completed(&mut self, task_id: TaskId) {
        debug_assert!(
            !self.task_to_queue.contains_key(&task_id),
            "Completing task {task_id} that is still enqueued"
        );

        let now = self.now;
        let task = &mut self.tasks[task_id];
        debug_assert!(
            task.state == TaskState::Running,
            "Task {task_id} must have been running before marked complete"
        );
        debug_assert!(task.completion.is_none(), "Task {task_id} completed twice");

        let turnaround_time = now - task.arrival_time;
        task.state = TaskState::Completed;
        task.remaining_time = 0;
        task.completion = Some(Completion {
            completion_time: now,
            turnaround_time,
            waiting_time: turnaround_time - task.burst_time,
        });
    }

    // Return previous state (always Runnable for a dispatched task)
    pub fn set_running(&mut self, task_id: TaskId) -> TaskState {
        debug_assert!(
            !self.task_to_queue.contains_key(&task_id),
            "Running task {task_id} must not be enqueued"
        );
        debug_assert!(self.current.is_none(), "CPU already running a task");

        self.current = Some(task_id);
        let task = self.task_mut(task_id);
        let prev_state = task.state;
        task.state = TaskState::Running;
        prev_state
    }

    pub fn clear_running(&mut self) {
        self.current = None;
    }

    pub fn incomplete(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.state != TaskState::Completed)
            .count()
    }

    pub fn all_completed(&self) -> bool {
        self.tasks.iter().all(|t| t.state == TaskState::Completed)
    }

    pub fn emit(&mut self, event: SchedEvent) {
        self.events.push((self.now, event));
    }

    pub fn drain_events(&mut self) -> Vec<(Ticks, SchedEvent)> {
        std::mem::take(&mut self.events)
    }
}
