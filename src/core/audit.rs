//! Attempt audit trail.
//!
//! Every attempt transition the scheduler observes (dispatch, terminal outcome, retry
//! exhaustion) is recorded as an [`AuditEvent`].

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::util::clock::now_ms;
use crate::util::serde::{AttemptId, TaskId};

/// Attempt lifecycle actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    /// A request was accepted into the queue.
    Submitted,
    /// An attempt was admitted and started.
    Dispatched,
    /// An attempt wrote all its meshes.
    Published,
    /// An attempt finished after a newer one was dispatched.
    Superseded,
    /// An attempt failed and its request was requeued.
    Failed,
    /// A request was abandoned after exhausting its retries.
    Dropped,
}

impl AuditAction {
    /// Lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Dispatched => "dispatched",
            Self::Published => "published",
            Self::Superseded => "superseded",
            Self::Failed => "failed",
            Self::Dropped => "dropped",
        }
    }
}

/// Audit event structure.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// Related task.
    pub task_id: TaskId,
    /// Related attempt, absent for queue-level events.
    pub attempt_id: Option<AttemptId>,
    /// What happened.
    pub action: AuditAction,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context, such as an error message.
    pub detail: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: AuditEvent);
}

/// Bounded in-memory audit sink. Clones share the same buffer.
#[derive(Clone)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<VecDeque<AuditEvent>>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events))),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Stored events for one task, oldest first.
    #[must_use]
    pub fn events_for(&self, task_id: TaskId) -> Vec<AuditEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.task_id == task_id)
            .cloned()
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Helper to build an audit event stamped with the current time.
#[must_use]
pub fn build_audit_event(
    task_id: TaskId,
    attempt_id: Option<AttemptId>,
    action: AuditAction,
    detail: Option<String>,
) -> AuditEvent {
    AuditEvent {
        task_id,
        attempt_id,
        action,
        created_at_ms: now_ms(),
        detail,
    }
}
