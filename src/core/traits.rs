//! Seams between the scheduler core and its collaborators.
//!
//! The core owns queueing, admission, staleness and the attempt pipeline. Everything
//! else (queue storage, runtime, remote fetch, cache store, durable storage, the
//! completion callback and the native mesh producer) is reached through these traits.

use std::future::Future;

use async_trait::async_trait;

use crate::core::{Dimensions, QueueLengths, RemeshError, RemeshRequest, VoxelType};
use crate::util::serde::TaskId;

/// What an enqueue did besides appending the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnqueueReport {
    /// Pending low-priority duplicates removed by a high-priority insertion.
    pub preempted: usize,
    /// Whether a full-resolution follow-up was appended for a preview.
    pub follow_up: bool,
}

/// Two-tier pending request storage.
pub trait TaskQueue {
    /// Insert a fresh submission, applying preemption and preview follow-up rules.
    ///
    /// # Errors
    ///
    /// Backend-specific failures.
    fn enqueue(&mut self, request: RemeshRequest) -> Result<EnqueueReport, RemeshError>;
    /// Append a retried request to the tail of its tier, with no other side effects.
    ///
    /// # Errors
    ///
    /// Backend-specific failures.
    fn requeue(&mut self, request: RemeshRequest) -> Result<(), RemeshError>;
    /// Remove and return the head of `high`, else the head of `low`.
    fn dequeue_next(&mut self) -> Option<RemeshRequest>;
    /// Pending requests per tier.
    fn lengths(&self) -> QueueLengths;
}

/// Abstraction for spawning attempt execution on a runtime.
pub trait Spawn {
    /// Spawn a detached future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Source of decoded segmentation bytes, keyed by URL.
#[async_trait]
pub trait ContentSource: Send + Sync + 'static {
    /// Return the decoded payload behind `url`.
    ///
    /// # Errors
    ///
    /// [`RemeshError::Fetch`] when the payload cannot be retrieved or decoded.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, RemeshError>;
}

/// Raw remote retrieval, with no caching or decoding.
#[async_trait]
pub trait RemoteFetcher: Send + Sync + 'static {
    /// Download the bytes behind `url`.
    ///
    /// # Errors
    ///
    /// [`RemeshError::Fetch`] on transport or status failures.
    async fn get(&self, url: &str) -> Result<Vec<u8>, RemeshError>;
}

/// External key-value store used to memoize fetches.
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    /// Look up `key`; `Ok(None)` is a miss.
    ///
    /// # Errors
    ///
    /// [`RemeshError::CacheStore`] when the store is unreachable.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, RemeshError>;
    /// Store `value` under `key`.
    ///
    /// # Errors
    ///
    /// [`RemeshError::CacheStore`] when the write is rejected.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), RemeshError>;
}

/// Durable storage for published mesh blobs.
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Write `bytes` at `path`, replacing any previous object.
    ///
    /// # Errors
    ///
    /// [`RemeshError::Publish`] when the write fails.
    async fn write_blob(&self, path: &str, bytes: Vec<u8>) -> Result<(), RemeshError>;
}

/// External endpoint told when a task's meshes are published.
#[async_trait]
pub trait CompletionNotifier: Send + Sync + 'static {
    /// Announce that `task_id` has fresh meshes.
    ///
    /// # Errors
    ///
    /// [`RemeshError::Notify`]; callers log it and move on.
    async fn notify(&self, task_id: TaskId) -> Result<(), RemeshError>;
}

/// Input handed to the mesh producer.
#[derive(Debug, Clone)]
pub struct MeshInput {
    /// Decoded (and possibly downscaled) segmentation volume.
    pub volume: Vec<u8>,
    /// Extent of `volume`.
    pub dimensions: Dimensions,
    /// Voxel width of `volume`.
    pub voxel_type: VoxelType,
    /// Segment ids packed at `voxel_type` width.
    pub segments: Vec<u8>,
    /// Number of levels of detail to produce.
    pub lod_count: u8,
}

/// Native mesh generator.
#[async_trait]
pub trait MeshProducer: Send + Sync + 'static {
    /// Generate meshes for the selected segments.
    ///
    /// # Errors
    ///
    /// [`RemeshError::Generation`] when the producer fails.
    async fn generate(&self, input: MeshInput) -> Result<Box<dyn MeshHandle>, RemeshError>;
}

/// Handle to generated meshes owned by the producer.
pub trait MeshHandle: Send {
    /// Extract the blob for one level of detail.
    ///
    /// # Errors
    ///
    /// [`RemeshError::Generation`] when the level is missing.
    fn lod(&self, lod: u8) -> Result<Vec<u8>, RemeshError>;
    /// Free the native resources behind this handle.
    fn release(&mut self);
}

/// Owns a [`MeshHandle`] and releases it exactly once, on drop at the latest.
pub struct MeshLease {
    handle: Option<Box<dyn MeshHandle>>,
}

impl MeshLease {
    /// Take ownership of a freshly generated handle.
    #[must_use]
    pub fn new(handle: Box<dyn MeshHandle>) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Extract the blob for one level of detail.
    ///
    /// # Errors
    ///
    /// [`RemeshError::Generation`] when the level is missing or the lease was released.
    pub fn lod(&self, lod: u8) -> Result<Vec<u8>, RemeshError> {
        self.handle
            .as_ref()
            .ok_or_else(|| RemeshError::Generation("mesh handle already released".into()))?
            .lod(lod)
    }

    /// Release the handle now.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.release();
        }
    }
}

impl Drop for MeshLease {
    fn drop(&mut self) {
        self.release_inner();
    }
}
