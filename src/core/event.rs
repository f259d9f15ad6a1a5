use std::fmt;

use crate::core::{JobKind, Level, Pid, Ticks};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedEvent {
    Arrived {
        pid: Pid,
        burst: Ticks,
        kind: JobKind,
    },
    IoReturned {
        pid: Pid,
    },
    // Every task waiting below the top level was moved back up
    Boost {
        moved: usize,
    },
    Dispatched {
        pid: Pid,
        level: Level,
        remaining: Ticks,
        slice: Ticks,
    },
    Completed {
        pid: Pid,
    },
    IoYield {
        pid: Pid,
        level: Level,
        until: Ticks,
    },
    Demoted {
        pid: Pid,
        from: Level,
        to: Level,
    },
    Requeued {
        pid: Pid,
        level: Level,
    },
    // Nothing runnable; clock jumps to `until`
    Idle {
        until: Ticks,
    },
}

impl fmt::Display for SchedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Arrived { pid, burst, kind } => {
                write!(f, "P{pid} arrives (burst={burst}, type={})", kind.label())
            }
            Self::IoReturned { pid } => write!(f, "P{pid} returns from I/O"),
            Self::Boost { moved } => write!(f, "priority boost ({moved} moved to level 0)"),
            Self::Dispatched {
                pid,
                level,
                remaining,
                slice,
            } => write!(
                f,
                "running P{pid} (priority={level}, remaining={remaining}, slice={slice})"
            ),
            Self::Completed { pid } => write!(f, "P{pid} completed"),
            Self::IoYield { pid, level, until } => write!(
                f,
                "P{pid} yields for I/O until t={until} (keeps priority={level})"
            ),
            Self::Demoted { pid, from, to } => {
                write!(f, "P{pid} used full quantum at priority={from}, demoted to {to}")
            }
            Self::Requeued { pid, level } => {
                write!(f, "P{pid} returned to queue (priority={level})")
            }
            Self::Idle { until } => write!(f, "CPU idle until t={until}"),
        }
    }
}
