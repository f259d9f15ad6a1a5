pub mod driver;
pub mod event;
pub mod observer;
pub mod state;

pub use driver::SchedCore;
pub use event::SchedEvent;
pub use state::{
    Completion, JobKind, KernelCtx, Level, Pid, QueueId, RunQueue, Task, TaskId, TaskState, Ticks,
};
