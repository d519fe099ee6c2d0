//! Admission control: whether the next queued request may start now.

use serde::{Deserialize, Serialize};

/// Pending work per priority tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueLengths {
    /// Requests waiting in the high tier.
    pub high: usize,
    /// Requests waiting in the low tier.
    pub low: usize,
}

impl QueueLengths {
    /// Total pending requests.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.high + self.low
    }

    /// True when both tiers are empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Result of one admission evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// Nothing is queued.
    Idle,
    /// Every slot is occupied.
    AtCapacity,
    /// The last free slot is held back for a future high-priority arrival.
    ReservedForHigh,
    /// Host memory is too tight to start another concurrent attempt.
    MemoryPressure,
    /// Dequeue and dispatch the next request.
    Admit,
}

/// Capacity and memory limits applied to every admission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdmissionPolicy {
    capacity: usize,
    memory_threshold: f64,
}

impl AdmissionPolicy {
    /// Smallest capacity that lets one low and one high attempt coexist.
    pub const MIN_CAPACITY: usize = 2;

    /// Build a policy. `capacity` is raised to [`Self::MIN_CAPACITY`] if smaller.
    #[must_use]
    pub fn new(capacity: usize, memory_threshold: f64) -> Self {
        Self {
            capacity: capacity.max(Self::MIN_CAPACITY),
            memory_threshold,
        }
    }

    /// Configured worker slots.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pressure above which additional concurrent attempts are refused.
    #[must_use]
    pub const fn memory_threshold(&self) -> f64 {
        self.memory_threshold
    }

    /// Decide whether to dispatch, given the in-flight count and queue lengths.
    ///
    /// `memory_pressure` is sampled only when the outcome depends on it. With nothing in
    /// flight, memory never blocks admission, so the scheduler always makes progress.
    pub fn decide(
        &self,
        in_flight: usize,
        lengths: QueueLengths,
        memory_pressure: impl FnOnce() -> f64,
    ) -> AdmissionDecision {
        if lengths.is_empty() {
            return AdmissionDecision::Idle;
        }
        if in_flight >= self.capacity {
            return AdmissionDecision::AtCapacity;
        }
        if in_flight >= self.capacity - 1 && lengths.high == 0 {
            return AdmissionDecision::ReservedForHigh;
        }
        if in_flight > 0 && memory_pressure() > self.memory_threshold {
            return AdmissionDecision::MemoryPressure;
        }
        AdmissionDecision::Admit
    }
}
