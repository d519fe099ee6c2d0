//! Shared identifier and priority types that cross the wire.

use serde::{Deserialize, Serialize};

/// Identity of a remesh task. Repeated submissions for the same task share it.
pub type TaskId = u64;

/// Grouping key used for the output path of a task.
pub type CellId = u64;

/// Process-unique identifier of one execution attempt.
pub type AttemptId = u64;

/// Scheduling tier of a remesh request.
///
/// Ordering follows urgency, so `Priority::High > Priority::Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Drained only while the high tier is empty.
    Low,
    /// Always dequeued ahead of pending low-priority work.
    High,
}

impl Priority {
    /// Lowercase label used in logs and telemetry.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
