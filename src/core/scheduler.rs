//! The remesh scheduler: queueing, admission and attempt lifecycle bookkeeping.
//!
//! Admission is re-evaluated on every submission and every attempt completion; there is
//! no polling loop. Queue, in-flight set and retry counters live behind one
//! `parking_lot::Mutex`, so a dequeue and the matching in-flight increment are atomic
//! with respect to each other.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::Serialize;

use parking_lot::Mutex;

use crate::core::audit::{build_audit_event, AuditAction};
use crate::core::{
    AdmissionDecision, AdmissionPolicy, Attempt, AttemptExecutor, AttemptOutcome, AuditSink,
    EnqueueReport, QueueLengths, RemeshError, RemeshRequest, Spawn, StalenessRegistry, TaskQueue,
};
use crate::util::clock::now_ms;
use crate::util::memory::{MemoryProbe, SystemMemoryProbe};
use crate::util::serde::{AttemptId, TaskId};

/// An attempt currently holding a capacity slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActiveAttempt {
    /// Attempt identifier.
    pub attempt_id: AttemptId,
    /// Task the attempt belongs to.
    pub task_id: TaskId,
}

/// Point-in-time view of the scheduler, used for status logging and the API surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulerSnapshot {
    /// Requests waiting in the high tier.
    pub high: usize,
    /// Requests waiting in the low tier.
    pub low: usize,
    /// Attempts holding a slot.
    pub in_flight: usize,
    /// Configured slots.
    pub capacity: usize,
    /// Attempts holding a slot, oldest first.
    pub active: Vec<ActiveAttempt>,
}

struct SchedulerState<Q> {
    queue: Q,
    active: BTreeMap<AttemptId, TaskId>,
    failures: HashMap<TaskId, u32>,
}

/// Two-tier remesh scheduler.
///
/// Cloning is cheap; clones share all state. Attempts run on `S` and report back through
/// [`AttemptExecutor::execute`]'s outcome, which releases the slot and pumps the queue.
pub struct RemeshScheduler<Q, E, S> {
    state: Arc<Mutex<SchedulerState<Q>>>,
    registry: Arc<StalenessRegistry>,
    policy: AdmissionPolicy,
    memory: Arc<dyn MemoryProbe>,
    max_retries: Option<u32>,
    audit: Option<Arc<dyn AuditSink>>,
    executor: E,
    spawner: S,
}

impl<Q, E: Clone, S: Clone> Clone for RemeshScheduler<Q, E, S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            registry: Arc::clone(&self.registry),
            policy: self.policy,
            memory: Arc::clone(&self.memory),
            max_retries: self.max_retries,
            audit: self.audit.clone(),
            executor: self.executor.clone(),
            spawner: self.spawner.clone(),
        }
    }
}

impl<Q, E, S> RemeshScheduler<Q, E, S> {
    /// Create a scheduler sampling host memory from `/proc/meminfo`.
    pub fn new(policy: AdmissionPolicy, queue: Q, executor: E, spawner: S) -> Self {
        Self {
            state: Arc::new(Mutex::new(SchedulerState {
                queue,
                active: BTreeMap::new(),
                failures: HashMap::new(),
            })),
            registry: Arc::new(StalenessRegistry::new()),
            policy,
            memory: Arc::new(SystemMemoryProbe),
            max_retries: None,
            audit: None,
            executor,
            spawner,
        }
    }

    /// Replace the memory probe.
    #[must_use]
    pub fn with_memory_probe(mut self, probe: Arc<dyn MemoryProbe>) -> Self {
        self.memory = probe;
        self
    }

    /// Give up on a task after `max_retries` consecutive failed attempts.
    ///
    /// Every dispatched attempt counts, so `Some(0)` and `Some(1)` both drop a task on its
    /// first failure. Configuration rejects `Some(0)`.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: Option<u32>) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// The staleness registry shared with executors.
    #[must_use]
    pub fn registry(&self) -> &Arc<StalenessRegistry> {
        &self.registry
    }

    /// Configured slots.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.policy.capacity()
    }

    /// Attempts currently holding a slot.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.state.lock().active.len()
    }

    fn record(
        &self,
        task_id: TaskId,
        attempt_id: Option<AttemptId>,
        action: AuditAction,
        detail: Option<String>,
    ) {
        if let Some(sink) = self.audit.as_ref() {
            sink.record(build_audit_event(task_id, attempt_id, action, detail));
        }
    }
}

impl<Q, E, S> RemeshScheduler<Q, E, S>
where
    Q: TaskQueue + Send + 'static,
{
    /// Pending requests per tier.
    #[must_use]
    pub fn lengths(&self) -> QueueLengths {
        self.state.lock().queue.lengths()
    }

    /// Capture queue lengths and in-flight attempts.
    #[must_use]
    pub fn snapshot(&self) -> SchedulerSnapshot {
        let state = self.state.lock();
        let lengths = state.queue.lengths();
        SchedulerSnapshot {
            high: lengths.high,
            low: lengths.low,
            in_flight: state.active.len(),
            capacity: self.policy.capacity(),
            active: state
                .active
                .iter()
                .map(|(&attempt_id, &task_id)| ActiveAttempt {
                    attempt_id,
                    task_id,
                })
                .collect(),
        }
    }
}

impl<Q, E, S> RemeshScheduler<Q, E, S>
where
    Q: TaskQueue + Send + 'static,
    E: AttemptExecutor,
    S: Spawn + Clone + Send + Sync + 'static,
{
    /// Accept a request, queue it and dispatch whatever admission now allows.
    ///
    /// A fresh submission resets the task's failure count.
    ///
    /// # Errors
    ///
    /// [`RemeshError::InvalidRequest`] when the request breaks a data-model invariant, or
    /// the queue backend's error.
    pub fn submit(&self, request: RemeshRequest) -> Result<EnqueueReport, RemeshError> {
        request.validate()?;
        let task_id = request.task_id;
        let priority = request.priority;

        let report = {
            let mut state = self.state.lock();
            let report = state.queue.enqueue(request)?;
            state.failures.remove(&task_id);
            report
        };

        tracing::info!(
            task_id,
            priority = %priority,
            preempted = report.preempted,
            follow_up = report.follow_up,
            "added to queue"
        );
        self.record(task_id, None, AuditAction::Submitted, None);
        self.pump();
        Ok(report)
    }

    /// Dispatch queued requests until admission declines.
    pub fn pump(&self) {
        loop {
            let attempt = {
                let mut state = self.state.lock();
                let lengths = state.queue.lengths();
                let in_flight = state.active.len();
                let decision = self
                    .policy
                    .decide(in_flight, lengths, || self.memory.memory_pressure());
                if decision != AdmissionDecision::Admit {
                    if decision == AdmissionDecision::MemoryPressure {
                        tracing::debug!(in_flight, "memory pressure, holding queue");
                    }
                    return;
                }
                let Some(request) = state.queue.dequeue_next() else {
                    return;
                };
                let attempt_id = self.registry.register(request.task_id);
                state.active.insert(attempt_id, request.task_id);
                Attempt {
                    attempt_id,
                    dispatched_at_ms: now_ms(),
                    request,
                }
            };

            tracing::info!(
                task_id = attempt.task_id(),
                attempt_id = attempt.attempt_id,
                priority = %attempt.request.priority,
                preview = attempt.request.is_preview(),
                "dispatching attempt"
            );
            self.record(
                attempt.task_id(),
                Some(attempt.attempt_id),
                AuditAction::Dispatched,
                None,
            );
            self.spawn_attempt(attempt);
        }
    }

    fn spawn_attempt(&self, attempt: Attempt) {
        let this = self.clone();
        self.spawner.spawn(async move {
            let registry = Arc::clone(&this.registry);
            let outcome = AssertUnwindSafe(this.executor.execute(attempt.clone(), registry))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    let reason = panic_message(panic.as_ref());
                    tracing::error!(
                        task_id = attempt.task_id(),
                        attempt_id = attempt.attempt_id,
                        reason,
                        "attempt panicked"
                    );
                    AttemptOutcome::Failed(RemeshError::Generation(format!(
                        "attempt panicked: {reason}"
                    )))
                });
            this.finish(attempt, outcome);
        });
    }

    /// Release the attempt's slot, requeue or drop on failure, then pump.
    fn finish(&self, attempt: Attempt, outcome: AttemptOutcome) {
        let task_id = attempt.task_id();
        let attempt_id = attempt.attempt_id;

        let action = {
            let mut state = self.state.lock();
            state.active.remove(&attempt_id);
            match &outcome {
                AttemptOutcome::Published { .. } => {
                    state.failures.remove(&task_id);
                    AuditAction::Published
                }
                AttemptOutcome::Superseded => AuditAction::Superseded,
                AttemptOutcome::Failed(_) if !self.registry.is_current(task_id, attempt_id) => {
                    AuditAction::Superseded
                }
                AttemptOutcome::Failed(e) if e.is_requeueable() => {
                    let failures = state.failures.entry(task_id).or_insert(0);
                    *failures += 1;
                    let failures = *failures;
                    if self.max_retries.is_some_and(|max| failures >= max) {
                        state.failures.remove(&task_id);
                        tracing::error!(task_id, failures, "retries exhausted, dropping request");
                        AuditAction::Dropped
                    } else {
                        match state.queue.requeue(attempt.request.clone()) {
                            Ok(()) => {
                                tracing::info!(task_id, failures, "requeued after failure");
                                AuditAction::Failed
                            }
                            Err(requeue_err) => {
                                tracing::error!(task_id, error = %requeue_err, "requeue failed");
                                AuditAction::Dropped
                            }
                        }
                    }
                }
                AttemptOutcome::Failed(e) => {
                    tracing::warn!(task_id, error = %e, "unrecoverable failure, dropping request");
                    state.failures.remove(&task_id);
                    AuditAction::Dropped
                }
            }
        };

        self.registry.clear(task_id, attempt_id);
        let detail = match &outcome {
            AttemptOutcome::Failed(e) => Some(e.to_string()),
            _ => None,
        };
        self.record(task_id, Some(attempt_id), action, detail);
        self.pump();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
