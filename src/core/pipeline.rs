//! The remesh job pipeline: fetch, downscale, generate, rescale, publish.
//!
//! Each attempt walks
//! `Dispatched -> Fetching -> (Downscaling) -> Generating -> (Rescaling) -> Completing`
//! and ends `Published`, `Superseded` or `Failed`. Side effects happen strictly in that
//! order. The native mesh handle is held in a [`MeshLease`], so it is released exactly
//! once on every path, including early returns.
//!
//! The generation watchdog and the detached completion notice run on tokio. Without a
//! current tokio runtime the notice is skipped with a warning, so leave the watchdog
//! disabled when driving the pipeline from another executor.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::geometry::{downscale_volume, rescale_strip};
use crate::core::{
    Attempt, AttemptExecutor, AttemptOutcome, BlobStore, CompletionNotifier, ContentSource,
    MeshHandle, MeshInput, MeshLease, MeshProducer, RemeshError, RemeshRequest, ResultPublisher,
    StalenessRegistry,
};
use crate::util::serde::TaskId;

/// Knobs the pipeline needs from configuration.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Base URL of the object store serving segmentations.
    pub storage_base_url: String,
    /// File name appended to `{bucket}/{path}`.
    pub segmentation_file: String,
    /// Levels of detail generated for full-resolution jobs.
    pub mip_count: u8,
    /// Watchdog for the mesh producer; `None` waits forever.
    pub generation_timeout: Option<Duration>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            storage_base_url: "https://storage.googleapis.com".into(),
            segmentation_file: "segmentation.lzma".into(),
            mip_count: 4,
            generation_timeout: None,
        }
    }
}

impl PipelineSettings {
    /// URL of the segmentation for `request`.
    #[must_use]
    pub fn source_url(&self, request: &RemeshRequest) -> String {
        format!(
            "{}/{}/{}{}",
            self.storage_base_url.trim_end_matches('/'),
            request.source_bucket,
            request.source_path,
            self.segmentation_file
        )
    }
}

struct Collaborators<C, P, B, N> {
    source: C,
    producer: P,
    publisher: ResultPublisher<B>,
    notifier: Arc<N>,
}

/// [`AttemptExecutor`] running the full remesh pipeline.
pub struct RemeshPipeline<C, P, B, N> {
    parts: Arc<Collaborators<C, P, B, N>>,
    settings: Arc<PipelineSettings>,
}

impl<C, P, B, N> Clone for RemeshPipeline<C, P, B, N> {
    fn clone(&self) -> Self {
        Self {
            parts: Arc::clone(&self.parts),
            settings: Arc::clone(&self.settings),
        }
    }
}

impl<C, P, B, N> RemeshPipeline<C, P, B, N>
where
    C: ContentSource,
    P: MeshProducer,
    B: BlobStore,
    N: CompletionNotifier,
{
    /// Assemble a pipeline from its collaborators.
    pub fn new(
        source: C,
        producer: P,
        publisher: ResultPublisher<B>,
        notifier: N,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            parts: Arc::new(Collaborators {
                source,
                producer,
                publisher,
                notifier: Arc::new(notifier),
            }),
            settings: Arc::new(settings),
        }
    }

    /// Settings in effect.
    #[must_use]
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// The result publisher.
    #[must_use]
    pub fn publisher(&self) -> &ResultPublisher<B> {
        &self.parts.publisher
    }

    async fn run(
        &self,
        attempt: &Attempt,
        registry: &StalenessRegistry,
    ) -> Result<AttemptOutcome, RemeshError> {
        let request = &attempt.request;
        let task_id = request.task_id;
        let attempt_id = attempt.attempt_id;

        let url = self.settings.source_url(request);
        let volume = self.parts.source.fetch(&url).await?;
        let expected = request
            .dimensions
            .byte_len(request.voxel_type)
            .ok_or_else(|| {
                RemeshError::Fetch(format!("{url}: volume size of {} overflows", request.dimensions))
            })?;
        if volume.len() != expected {
            return Err(RemeshError::Fetch(format!(
                "{url} decoded to {} bytes, expected {expected}",
                volume.len()
            )));
        }

        let volume = match request.preview_dimensions {
            Some(preview) => {
                tracing::debug!(task_id, attempt_id, from = %request.dimensions, to = %preview, "downscaling");
                downscale_volume(&volume, request.dimensions, preview, request.voxel_type)?
            }
            None => volume,
        };

        let lod_count = request.lod_count(self.settings.mip_count);
        let input = MeshInput {
            volume,
            dimensions: request.effective_dimensions(),
            voxel_type: request.voxel_type,
            segments: request.voxel_type.encode_segments(&request.segments),
            lod_count,
        };
        let lease = MeshLease::new(self.generate(input).await?);

        let mut lods = (0..lod_count)
            .map(|lod| lease.lod(lod))
            .collect::<Result<Vec<_>, _>>()?;
        lease.release();

        if let Some(preview) = request.preview_dimensions {
            let scale = request.dimensions.scale_from(&preview);
            lods = lods
                .iter()
                .map(|blob| rescale_strip(blob, scale))
                .collect::<Result<_, _>>()?;
        }

        if !registry.is_current(task_id, attempt_id) {
            tracing::info!(
                task_id,
                attempt_id,
                current = ?registry.current(task_id),
                "aborted save, not newest mesh"
            );
            return Ok(AttemptOutcome::Superseded);
        }

        let report = self.parts.publisher.publish(request, lods).await;
        if let Some((lod, first)) = report.failed.first() {
            return Err(RemeshError::Publish(format!(
                "{} of {lod_count} levels failed, lod {lod}: {first}",
                report.failed.len()
            )));
        }

        registry.clear(task_id, attempt_id);
        self.notify_detached(task_id);
        Ok(AttemptOutcome::Published {
            lods: report.written.len(),
        })
    }

    async fn generate(&self, input: MeshInput) -> Result<Box<dyn MeshHandle>, RemeshError> {
        let generation = self.parts.producer.generate(input);
        match self.settings.generation_timeout {
            Some(limit) => tokio::time::timeout(limit, generation)
                .await
                .map_err(|_| RemeshError::Generation(format!("timed out after {limit:?}")))?,
            None => generation.await,
        }
    }

    fn notify_detached(&self, task_id: TaskId) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(task_id, "no tokio runtime, completion not sent");
            return;
        };
        let notifier = Arc::clone(&self.parts.notifier);
        drop(handle.spawn(async move {
            match notifier.notify(task_id).await {
                Ok(()) => tracing::debug!(task_id, "completion sent"),
                Err(e) => tracing::warn!(task_id, error = %e, "failed to send mesh update"),
            }
        }));
    }
}

#[async_trait]
impl<C, P, B, N> AttemptExecutor for RemeshPipeline<C, P, B, N>
where
    C: ContentSource,
    P: MeshProducer,
    B: BlobStore,
    N: CompletionNotifier,
{
    async fn execute(&self, attempt: Attempt, registry: Arc<StalenessRegistry>) -> AttemptOutcome {
        let started = std::time::Instant::now();
        match self.run(&attempt, &registry).await {
            Ok(outcome) => {
                tracing::info!(
                    task_id = attempt.task_id(),
                    attempt_id = attempt.attempt_id,
                    outcome = outcome.label(),
                    elapsed = ?started.elapsed(),
                    "attempt finished"
                );
                outcome
            }
            Err(e) => {
                tracing::error!(
                    task_id = attempt.task_id(),
                    attempt_id = attempt.attempt_id,
                    error = %e,
                    "attempt failed"
                );
                AttemptOutcome::Failed(e)
            }
        }
    }
}
