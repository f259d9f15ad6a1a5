use super::state::{KernelCtx, TaskState};

#[derive(Debug, Default)]
pub struct Observer {
    step: u64,
}

impl Observer {
    pub fn new() -> Self {
        Self { step: 0 }
    }

    pub fn observe(&mut self, core: &KernelCtx, levels: usize) {
        self.step += 1;

        debug_assert!(
            core.current.is_none(),
            "CPU must be released between steps (step {})",
            self.step
        );

        for task in &core.tasks {
            debug_assert!(
                task.level < levels,
                "Task {} at level {} outside of {levels} levels",
                task.id,
                task.level
            );
            debug_assert!(
                task.remaining_time <= task.burst_time,
                "Task {} owes more service than its burst",
                task.id
            );
            debug_assert_eq!(
                task.state == TaskState::Completed,
                task.completion.is_some(),
                "Task {} completion record out of sync with state",
                task.id
            );
            debug_assert_eq!(
                task.state == TaskState::Runnable,
                core.task_in_any_queue(task.id),
                "Runnable task {} must sit in exactly one queue",
                task.id
            );
        }

        for (&task_id, &queue_id) in &core.task_to_queue {
            let task = core.task(task_id);
            debug_assert_eq!(
                task.state,
                TaskState::Runnable,
                "Task {task_id} in queue {queue_id:?} must be Runnable"
            );
            if let Some(queue) = core.queues.get(queue_id) {
                debug_assert!(
                    queue.contains(task_id),
                    "task_to_queue claims task {task_id} in queue {queue_id:?}, but queue does not contain it"
                );
            } else {
                debug_assert!(false, "task_to_queue references unknown queue {queue_id:?}");
            }
        }

        let queued: usize = core.queues.values().map(|q| q.len()).sum();
        debug_assert_eq!(
            queued,
            core.task_to_queue.len(),
            "A task is present in more than one queue slot"
        );
    }
}
