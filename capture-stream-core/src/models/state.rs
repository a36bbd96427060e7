use std::fmt;

use serde::{Deserialize, Serialize};

/// Capture session state machine.
///
/// ```text
/// idle → prepared → running
///   ↓       ↓          ↓
///   └──── closed ←─────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Prepared,
    Running,
    Closed,
}

impl SessionState {
    pub fn has_transport(&self) -> bool {
        matches!(self, Self::Prepared | Self::Running)
    }
}

/// Capture worker thread lifecycle.
///
/// ```text
/// created → running → stopping → exited
/// ```
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerState {
    Created = 0,
    Running = 1,
    Stopping = 2,
    Exited = 3,
}

impl WorkerState {
    pub(crate) fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Created,
            1 => Self::Running,
            2 => Self::Stopping,
            _ => Self::Exited,
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Exited => "exited",
        };
        f.write_str(name)
    }
}
