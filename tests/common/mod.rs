//! In-memory fakes for every external collaborator of the scheduler.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use remesh_scheduler::core::{
    Attempt, AttemptExecutor, AttemptOutcome, BlobStore, CacheStore, CompletionNotifier,
    ContentSource, Dimensions, MeshHandle, MeshInput, MeshProducer, RemeshError, RemeshRequest,
    RemoteFetcher, Spawn, StalenessRegistry, VoxelType,
};
use remesh_scheduler::util::{Priority, TaskId};
use tokio::sync::Semaphore;

/// Spawner backed by the ambient tokio runtime.
#[derive(Clone)]
pub struct TestSpawner;

impl Spawn for TestSpawner {
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(fut);
    }
}

pub fn request(task_id: TaskId, priority: Priority) -> RemeshRequest {
    RemeshRequest {
        task_id,
        cell_id: 3,
        voxel_type: VoxelType::Uint8,
        dimensions: Dimensions::new(4, 4, 2),
        source_bucket: "zebrafish".into(),
        source_path: format!("cells/{task_id}/"),
        segments: vec![1, 2],
        priority,
        preview_dimensions: None,
    }
}

pub fn preview_request(task_id: TaskId, priority: Priority) -> RemeshRequest {
    RemeshRequest {
        preview_dimensions: Some(Dimensions::new(2, 2, 2)),
        ..request(task_id, priority)
    }
}

/// Poll `condition` until it holds, panicking after five seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Encode strip vertices as little-endian `f32` sextuples.
pub fn strip(vertices: &[[f32; 6]]) -> Vec<u8> {
    vertices
        .iter()
        .flat_map(|v| v.iter().flat_map(|f| f.to_le_bytes()))
        .collect()
}

pub fn floats(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

type Script = dyn Fn(&Attempt, &StalenessRegistry, usize) -> AttemptOutcome + Send + Sync;

/// Executor that blocks every attempt on a gate and returns a scripted outcome.
///
/// The script receives the attempt, the registry and how many attempts its task has
/// started so far (1 on the first).
#[derive(Clone)]
pub struct ScriptedExecutor {
    gate: Arc<Semaphore>,
    started: Arc<Mutex<Vec<Attempt>>>,
    finished: Arc<AtomicUsize>,
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    script: Arc<Script>,
}

impl ScriptedExecutor {
    /// Attempts wait for [`Self::release`] and then publish.
    pub fn gated() -> Self {
        Self::with_script(0, |_, _, _| AttemptOutcome::Published { lods: 1 })
    }

    /// Attempts run without waiting and then publish.
    pub fn open() -> Self {
        Self::with_script(Semaphore::MAX_PERMITS, |_, _, _| AttemptOutcome::Published {
            lods: 1,
        })
    }

    pub fn with_script(
        permits: usize,
        script: impl Fn(&Attempt, &StalenessRegistry, usize) -> AttemptOutcome + Send + Sync + 'static,
    ) -> Self {
        Self {
            gate: Arc::new(Semaphore::new(permits)),
            started: Arc::new(Mutex::new(Vec::new())),
            finished: Arc::new(AtomicUsize::new(0)),
            running: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
            script: Arc::new(script),
        }
    }

    /// Let `n` more attempts past the gate.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub fn started(&self) -> Vec<Attempt> {
        self.started.lock().clone()
    }

    pub fn started_tasks(&self) -> Vec<TaskId> {
        self.started.lock().iter().map(Attempt::task_id).collect()
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AttemptExecutor for ScriptedExecutor {
    async fn execute(&self, attempt: Attempt, registry: Arc<StalenessRegistry>) -> AttemptOutcome {
        let runs = {
            let mut started = self.started.lock();
            started.push(attempt.clone());
            started
                .iter()
                .filter(|a| a.task_id() == attempt.task_id())
                .count()
        };
        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);

        if let Ok(permit) = self.gate.acquire().await {
            permit.forget();
        }

        let outcome = (self.script)(&attempt, &registry, runs);
        self.running.fetch_sub(1, Ordering::SeqCst);
        self.finished.fetch_add(1, Ordering::SeqCst);
        outcome
    }
}

/// Content source serving one fixed payload, optionally failing the first calls.
pub struct StaticSource {
    payload: Vec<u8>,
    failures_left: AtomicUsize,
    calls: Arc<AtomicUsize>,
}

impl StaticSource {
    pub fn new(payload: Vec<u8>) -> Self {
        Self::failing(payload, 0)
    }

    pub fn failing(payload: Vec<u8>, failures: usize) -> Self {
        Self {
            payload,
            failures_left: AtomicUsize::new(failures),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl ContentSource for StaticSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, RemeshError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(RemeshError::Fetch(format!("{url} unavailable")));
        }
        Ok(self.payload.clone())
    }
}

/// Remote fetcher serving a URL map and counting requests.
#[derive(Default)]
pub struct MapFetcher {
    objects: HashMap<String, Vec<u8>>,
    calls: Arc<AtomicUsize>,
}

impl MapFetcher {
    pub fn with(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.objects.insert(url.to_string(), bytes);
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl RemoteFetcher for MapFetcher {
    async fn get(&self, url: &str) -> Result<Vec<u8>, RemeshError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.objects
            .get(url)
            .cloned()
            .ok_or_else(|| RemeshError::Fetch(format!("HTTP 404 Not Found from {url}")))
    }
}

/// Cache store that is always unreachable.
pub struct DownCacheStore;

#[async_trait]
impl CacheStore for DownCacheStore {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, RemeshError> {
        Err(RemeshError::CacheStore("connection refused".into()))
    }

    async fn set(&self, _key: &str, _value: Vec<u8>) -> Result<(), RemeshError> {
        Err(RemeshError::CacheStore("connection refused".into()))
    }
}

/// Shared counters observed by [`FakeProducer`] and its handles.
#[derive(Default)]
pub struct ProducerLog {
    pub inputs: Mutex<Vec<MeshInput>>,
    pub releases: AtomicUsize,
}

/// Mesh producer returning fixed LOD blobs.
pub struct FakeProducer {
    lods: Vec<Vec<u8>>,
    delay: Option<Duration>,
    gate: Option<Arc<Semaphore>>,
    fail: bool,
    log: Arc<ProducerLog>,
}

impl FakeProducer {
    /// Produce `lods` blobs, one per level.
    pub fn new(lods: Vec<Vec<u8>>) -> Self {
        Self {
            lods,
            delay: None,
            gate: None,
            fail: false,
            log: Arc::new(ProducerLog::default()),
        }
    }

    /// Produce `count` levels, each a single vertex at `(1, 2, 3)`.
    pub fn uniform(count: usize) -> Self {
        Self::new(vec![strip(&[[1.0, 2.0, 3.0, 0.0, 0.0, 1.0]]); count])
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn log(&self) -> Arc<ProducerLog> {
        Arc::clone(&self.log)
    }
}

#[async_trait]
impl MeshProducer for FakeProducer {
    async fn generate(&self, input: MeshInput) -> Result<Box<dyn MeshHandle>, RemeshError> {
        self.log.inputs.lock().push(input);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        if self.fail {
            return Err(RemeshError::Generation("producer crashed".into()));
        }
        Ok(Box::new(FakeHandle {
            lods: self.lods.clone(),
            log: Arc::clone(&self.log),
        }))
    }
}

struct FakeHandle {
    lods: Vec<Vec<u8>>,
    log: Arc<ProducerLog>,
}

impl MeshHandle for FakeHandle {
    fn lod(&self, lod: u8) -> Result<Vec<u8>, RemeshError> {
        self.lods
            .get(usize::from(lod))
            .cloned()
            .ok_or_else(|| RemeshError::Generation(format!("lod {lod} missing")))
    }

    fn release(&mut self) {
        self.log.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Blob store that fails writes whose path ends with `suffix`.
#[derive(Default)]
pub struct FlakyBlobStore {
    suffix: String,
    written: Arc<Mutex<Vec<String>>>,
}

impl FlakyBlobStore {
    pub fn failing_on(suffix: &str) -> Self {
        Self {
            suffix: suffix.to_string(),
            written: Arc::default(),
        }
    }

    pub fn written(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.written)
    }
}

#[async_trait]
impl BlobStore for FlakyBlobStore {
    async fn write_blob(&self, path: &str, _bytes: Vec<u8>) -> Result<(), RemeshError> {
        if path.ends_with(&self.suffix) {
            return Err(RemeshError::Publish(format!("{path}: permission denied")));
        }
        self.written.lock().push(path.to_string());
        Ok(())
    }
}

/// Notifier recording every task it was told about.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub notified: Arc<Mutex<Vec<TaskId>>>,
}

#[async_trait]
impl CompletionNotifier for RecordingNotifier {
    async fn notify(&self, task_id: TaskId) -> Result<(), RemeshError> {
        self.notified.lock().push(task_id);
        Ok(())
    }
}
