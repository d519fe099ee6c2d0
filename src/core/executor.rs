//! Attempt execution traits and outcome types.

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::{RemeshError, RemeshRequest, StalenessRegistry};
use crate::util::serde::{AttemptId, TaskId};

/// One dispatched execution of a [`RemeshRequest`].
#[derive(Debug, Clone)]
pub struct Attempt {
    /// Process-unique attempt identifier from the staleness registry.
    pub attempt_id: AttemptId,
    /// Dispatch time in milliseconds since epoch.
    pub dispatched_at_ms: u128,
    /// The request being executed.
    pub request: RemeshRequest,
}

impl Attempt {
    /// Task this attempt belongs to.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.request.task_id
    }
}

/// Terminal state of an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Every level of detail was written.
    Published {
        /// Number of levels written.
        lods: usize,
    },
    /// A newer attempt for the same task was dispatched; nothing was written.
    Superseded,
    /// The attempt failed.
    Failed(RemeshError),
}

impl AttemptOutcome {
    /// Short label used in logs and audit records.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Published { .. } => "published",
            Self::Superseded => "superseded",
            Self::Failed(_) => "failed",
        }
    }
}

/// Drives one attempt from dispatch to a terminal state.
///
/// The scheduler owns the capacity slot; the executor owns everything between fetch and
/// publish, and must consult `registry` before publishing.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use remesh_scheduler::core::{Attempt, AttemptExecutor, AttemptOutcome, StalenessRegistry};
///
/// #[derive(Clone)]
/// struct AlwaysSuperseded;
///
/// #[async_trait]
/// impl AttemptExecutor for AlwaysSuperseded {
///     async fn execute(&self, _attempt: Attempt, _registry: Arc<StalenessRegistry>) -> AttemptOutcome {
///         AttemptOutcome::Superseded
///     }
/// }
/// ```
#[async_trait]
pub trait AttemptExecutor: Send + Sync + Clone + 'static {
    /// Run `attempt` to completion.
    async fn execute(&self, attempt: Attempt, registry: Arc<StalenessRegistry>) -> AttemptOutcome;
}
