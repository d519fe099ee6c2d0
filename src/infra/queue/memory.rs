//! In-memory two-tier queue with preemption of pending low-priority duplicates.

use std::collections::VecDeque;

use crate::core::{EnqueueReport, QueueLengths, RemeshError, RemeshRequest, TaskQueue};
use crate::util::serde::{Priority, TaskId};

/// In-memory queue holding `high` and `low` tiers, FIFO within each.
///
/// Requests are never reordered inside a tier. The only removal besides dequeue is the
/// purge of pending low entries when a high request for the same task arrives.
#[derive(Debug, Default)]
pub struct InMemoryQueue {
    high: VecDeque<RemeshRequest>,
    low: VecDeque<RemeshRequest>,
}

impl InMemoryQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Task ids pending in one tier, head first.
    #[must_use]
    pub fn pending(&self, priority: Priority) -> Vec<TaskId> {
        self.tier(priority).iter().map(|r| r.task_id).collect()
    }

    const fn tier(&self, priority: Priority) -> &VecDeque<RemeshRequest> {
        match priority {
            Priority::High => &self.high,
            Priority::Low => &self.low,
        }
    }

    fn tier_mut(&mut self, priority: Priority) -> &mut VecDeque<RemeshRequest> {
        match priority {
            Priority::High => &mut self.high,
            Priority::Low => &mut self.low,
        }
    }
}

impl TaskQueue for InMemoryQueue {
    fn enqueue(&mut self, request: RemeshRequest) -> Result<EnqueueReport, RemeshError> {
        let mut report = EnqueueReport::default();

        if request.priority == Priority::High {
            let before = self.low.len();
            self.low.retain(|pending| pending.task_id != request.task_id);
            report.preempted = before - self.low.len();
        }

        let follow_up = request
            .is_preview()
            .then(|| request.full_resolution_follow_up());

        self.tier_mut(request.priority).push_back(request);

        if let Some(follow_up) = follow_up {
            self.low.push_back(follow_up);
            report.follow_up = true;
        }

        Ok(report)
    }

    fn requeue(&mut self, request: RemeshRequest) -> Result<(), RemeshError> {
        self.tier_mut(request.priority).push_back(request);
        Ok(())
    }

    fn dequeue_next(&mut self) -> Option<RemeshRequest> {
        self.high.pop_front().or_else(|| self.low.pop_front())
    }

    fn lengths(&self) -> QueueLengths {
        QueueLengths {
            high: self.high.len(),
            low: self.low.len(),
        }
    }
}
