//! Tracks the newest attempt per task so superseded attempts never publish.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::util::serde::{AttemptId, TaskId};

struct RegistryState {
    next_attempt: AttemptId,
    current: HashMap<TaskId, AttemptId>,
}

/// Mapping `task_id -> latest attempt_id`.
///
/// Attempt ids come from a single process-wide counter and are never reused. Every
/// operation takes the same lock, so two attempts for one task can never both be current.
pub struct StalenessRegistry {
    state: Mutex<RegistryState>,
}

impl Default for StalenessRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StalenessRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState {
                next_attempt: 0,
                current: HashMap::new(),
            }),
        }
    }

    /// Allocate a fresh attempt id and make it current for `task_id`.
    pub fn register(&self, task_id: TaskId) -> AttemptId {
        let mut state = self.state.lock();
        let attempt_id = state.next_attempt;
        state.next_attempt += 1;
        if let Some(previous) = state.current.insert(task_id, attempt_id) {
            tracing::debug!(task_id, previous, attempt_id, "attempt superseded in registry");
        }
        attempt_id
    }

    /// Whether `attempt_id` is still the newest attempt for `task_id`.
    #[must_use]
    pub fn is_current(&self, task_id: TaskId, attempt_id: AttemptId) -> bool {
        self.state.lock().current.get(&task_id) == Some(&attempt_id)
    }

    /// Remove the entry for `task_id` if it still belongs to `attempt_id`.
    ///
    /// Returns `true` if an entry was removed. A newer attempt's entry is left alone.
    pub fn clear(&self, task_id: TaskId, attempt_id: AttemptId) -> bool {
        let mut state = self.state.lock();
        if state.current.get(&task_id) == Some(&attempt_id) {
            state.current.remove(&task_id);
            true
        } else {
            false
        }
    }

    /// Current attempt for `task_id`, if any.
    #[must_use]
    pub fn current(&self, task_id: TaskId) -> Option<AttemptId> {
        self.state.lock().current.get(&task_id).copied()
    }

    /// Number of tasks with a registered attempt.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().current.len()
    }

    /// True when no task has a registered attempt.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
