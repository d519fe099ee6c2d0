//! API-facing request/response models.

use serde::{Deserialize, Serialize};

use crate::core::{
    AttemptExecutor, Dimensions, EnqueueReport, RemeshError, RemeshRequest, RemeshScheduler,
    SchedulerSnapshot, Spawn, TaskQueue, VoxelType,
};
use crate::util::serde::{CellId, Priority, TaskId};

/// Remesh submission payload, in the wire shape of the public endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemeshSubmission {
    /// Task identifier.
    pub task_id: TaskId,
    /// Cell identifier.
    pub cell_id: CellId,
    /// Voxel width: `uint8`, `uint16` or `uint32`.
    #[serde(rename = "type")]
    pub voxel_type: VoxelType,
    /// Volume extent.
    pub task_dim: Dimensions,
    /// Storage bucket.
    pub bucket: String,
    /// Object prefix within the bucket.
    pub path: String,
    /// Segment ids to mesh.
    pub segments: Vec<u64>,
    /// `high` or `low`.
    pub priority: Priority,
    /// Preview extent; absent for full-resolution jobs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_dim: Option<Dimensions>,
}

impl TryFrom<RemeshSubmission> for RemeshRequest {
    type Error = RemeshError;

    fn try_from(sub: RemeshSubmission) -> Result<Self, Self::Error> {
        let request = Self {
            task_id: sub.task_id,
            cell_id: sub.cell_id,
            voxel_type: sub.voxel_type,
            dimensions: sub.task_dim,
            source_bucket: sub.bucket,
            source_path: sub.path,
            segments: sub.segments,
            priority: sub.priority,
            preview_dimensions: sub.preview_dim,
        };
        request.validate()?;
        Ok(request)
    }
}

/// Submission acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitResponse {
    /// Human-readable acknowledgement, `added {task_id} to queue`.
    pub message: String,
    /// Pending low-priority duplicates removed by this submission.
    pub preempted: usize,
    /// Whether a full-resolution follow-up was queued.
    pub follow_up: bool,
}

impl SubmitResponse {
    fn new(task_id: TaskId, report: EnqueueReport) -> Self {
        Self {
            message: format!("added {task_id} to queue"),
            preempted: report.preempted,
            follow_up: report.follow_up,
        }
    }
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
    /// Attempts holding a slot.
    pub in_flight: usize,
    /// Requests waiting in either tier.
    pub queued: usize,
}

/// Validate a submission and hand it to the scheduler.
///
/// # Errors
///
/// [`RemeshError::InvalidRequest`] for malformed submissions, or the queue backend's error.
pub fn submit_remesh<Q, E, S>(
    scheduler: &RemeshScheduler<Q, E, S>,
    submission: RemeshSubmission,
) -> Result<SubmitResponse, RemeshError>
where
    Q: TaskQueue + Send + 'static,
    E: AttemptExecutor,
    S: Spawn + Clone + Send + Sync + 'static,
{
    let request = RemeshRequest::try_from(submission)?;
    let task_id = request.task_id;
    let report = scheduler.submit(request)?;
    Ok(SubmitResponse::new(task_id, report))
}

/// Current queue lengths and in-flight attempts.
pub fn queue_snapshot<Q, E, S>(scheduler: &RemeshScheduler<Q, E, S>) -> SchedulerSnapshot
where
    Q: TaskQueue + Send + 'static,
{
    scheduler.snapshot()
}

/// Return a health payload.
pub fn health<Q, E, S>(scheduler: &RemeshScheduler<Q, E, S>) -> Health
where
    Q: TaskQueue + Send + 'static,
{
    let snapshot = scheduler.snapshot();
    Health {
        ok: true,
        in_flight: snapshot.in_flight,
        queued: snapshot.high + snapshot.low,
    }
}
