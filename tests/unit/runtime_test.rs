//! Tests for tokio spawner and the API surface

use std::future::Future;

use async_trait::async_trait;
use remesh_scheduler::core::{
    AdmissionPolicy, Attempt, AttemptExecutor, AttemptOutcome, Dimensions, RemeshError,
    RemeshScheduler, Spawn, StalenessRegistry, VoxelType,
};
use remesh_scheduler::infra::InMemoryQueue;
use remesh_scheduler::runtime::tokio_spawner::TokioSpawner;
use remesh_scheduler::runtime::{health, queue_snapshot, submit_remesh, RemeshSubmission};
use remesh_scheduler::util::Priority;
use std::sync::Arc;

#[derive(Clone)]
struct Idle;

#[async_trait]
impl AttemptExecutor for Idle {
    async fn execute(&self, _: Attempt, _: Arc<StalenessRegistry>) -> AttemptOutcome {
        AttemptOutcome::Superseded
    }
}

/// Keeps attempts in flight by never polling them.
#[derive(Clone)]
struct Parked;

impl Spawn for Parked {
    fn spawn<F>(&self, _fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
    }
}

fn submission_json(task_id: u64, priority: &str) -> String {
    format!(
        r#"{{
            "task_id": {task_id},
            "cell_id": 3,
            "type": "uint16",
            "task_dim": {{"x": 8, "y": 8, "z": 2}},
            "bucket": "zebrafish",
            "path": "cells/3/",
            "segments": [1, 2],
            "priority": "{priority}"
        }}"#
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[tokio::test]
async fn test_tokio_spawner_current() {
    assert!(TokioSpawner::current().is_ok());
}

#[test]
fn test_tokio_spawner_outside_runtime() {
    assert!(matches!(TokioSpawner::current(), Err(RemeshError::Config(_))));
}

#[test]
fn test_submission_wire_format() {
    let submission: RemeshSubmission = serde_json::from_str(&submission_json(42, "high")).unwrap();
    assert_eq!(submission.voxel_type, VoxelType::Uint16);
    assert_eq!(submission.task_dim, Dimensions::new(8, 8, 2));
    assert_eq!(submission.priority, Priority::High);
    assert!(submission.preview_dim.is_none());
}

#[test]
fn test_submit_remesh_acknowledges() {
    let scheduler = RemeshScheduler::new(
        AdmissionPolicy::new(2, 0.9),
        InMemoryQueue::new(),
        Idle,
        Parked,
    );
    let submission: RemeshSubmission = serde_json::from_str(&submission_json(42, "low")).unwrap();
    let ack = submit_remesh(&scheduler, submission).unwrap();
    assert_eq!(ack.message, "added 42 to queue");
    assert_eq!(ack.preempted, 0);
    assert!(!ack.follow_up);

    let snapshot = queue_snapshot(&scheduler);
    assert_eq!(snapshot.in_flight, 1);
    assert_eq!(snapshot.active[0].task_id, 42);

    let status = health(&scheduler);
    assert!(status.ok);
    assert_eq!(status.in_flight, 1);
    assert_eq!(status.queued, 0);
}

#[test]
fn test_submit_remesh_rejects_invalid() {
    let scheduler = RemeshScheduler::new(
        AdmissionPolicy::new(2, 0.9),
        InMemoryQueue::new(),
        Idle,
        Parked,
    );
    let mut submission: RemeshSubmission =
        serde_json::from_str(&submission_json(1, "high")).unwrap();
    submission.segments = vec![70_000];
    assert!(matches!(
        submit_remesh(&scheduler, submission),
        Err(RemeshError::InvalidRequest(_))
    ));
    assert_eq!(queue_snapshot(&scheduler).in_flight, 0);
}
