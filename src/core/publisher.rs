//! Writes per-LOD mesh blobs to durable storage.

use crate::core::{BlobStore, RemeshError, RemeshRequest};
use crate::util::serde::{CellId, TaskId};

/// Outcome of publishing one attempt's levels of detail.
#[derive(Debug, Default)]
pub struct PublishReport {
    /// Levels written successfully.
    pub written: Vec<u8>,
    /// Levels that failed, with their errors.
    pub failed: Vec<(u8, RemeshError)>,
}

impl PublishReport {
    /// True when every level was written.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Maps mesh blobs onto object paths and writes them through a [`BlobStore`].
pub struct ResultPublisher<B> {
    store: B,
    prefix: String,
    extension: String,
}

impl<B: BlobStore> ResultPublisher<B> {
    /// Publish under `{prefix}/{cell_id}/{task_id}/{lod}.{extension}`.
    pub fn new(store: B, prefix: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            extension: extension.into(),
        }
    }

    /// The backing store.
    pub const fn store(&self) -> &B {
        &self.store
    }

    /// Object path for one level of detail.
    #[must_use]
    pub fn object_path(&self, cell_id: CellId, task_id: TaskId, lod: u8) -> String {
        if self.extension.is_empty() {
            format!("{}/{cell_id}/{task_id}/{lod}", self.prefix)
        } else {
            format!("{}/{cell_id}/{task_id}/{lod}.{}", self.prefix, self.extension)
        }
    }

    /// Write every blob, index = level of detail.
    ///
    /// A failing level does not stop the others; each failure is logged and reported.
    pub async fn publish(&self, request: &RemeshRequest, lods: Vec<Vec<u8>>) -> PublishReport {
        let mut report = PublishReport::default();
        for (lod, blob) in (0u8..).zip(lods) {
            let path = self.object_path(request.cell_id, request.task_id, lod);
            if blob.is_empty() {
                tracing::warn!(task_id = request.task_id, lod, "empty mesh blob");
            }
            match self.store.write_blob(&path, blob).await {
                Ok(()) => report.written.push(lod),
                Err(e) => {
                    tracing::warn!(task_id = request.task_id, lod, path = %path, error = %e, "mesh write failed");
                    report.failed.push((lod, e));
                }
            }
        }
        report
    }
}
