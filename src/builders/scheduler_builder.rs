//! Builders to construct the scheduler and its pipeline from configuration.

use std::sync::Arc;

use crate::config::SchedulerConfig;
use crate::core::{
    AttemptExecutor, AuditSink, BlobStore, CompletionNotifier, ContentSource, MeshProducer,
    RemeshError, RemeshPipeline, RemeshScheduler, RemoteFetcher, ResultPublisher, Spawn,
    TaskQueue,
};
use crate::infra::{FetchCache, InMemoryCacheStore};

/// Build a scheduler from configuration using the provided components.
///
/// # Errors
///
/// [`RemeshError::Config`] when `cfg` fails validation.
pub fn build_scheduler<Q, E, S>(
    cfg: &SchedulerConfig,
    queue: Q,
    executor: E,
    spawner: S,
    audit: Option<Arc<dyn AuditSink>>,
) -> Result<RemeshScheduler<Q, E, S>, RemeshError>
where
    Q: TaskQueue + Send + 'static,
    E: AttemptExecutor,
    S: Spawn + Clone + Send + Sync + 'static,
{
    cfg.validate()
        .map_err(|e| RemeshError::Config(format!("config invalid: {e}")))?;

    let mut scheduler = RemeshScheduler::new(cfg.admission_policy(), queue, executor, spawner)
        .with_max_retries(cfg.max_retries);
    if let Some(audit) = audit {
        scheduler = scheduler.with_audit(audit);
    }
    tracing::info!(
        capacity = scheduler.capacity(),
        memory_threshold = cfg.memory_pressure_threshold,
        max_retries = ?cfg.max_retries,
        "scheduler built"
    );
    Ok(scheduler)
}

/// Build the remesh pipeline from configuration.
///
/// # Errors
///
/// [`RemeshError::Config`] when `cfg` fails validation.
pub fn build_pipeline<C, P, B, N>(
    cfg: &SchedulerConfig,
    source: C,
    producer: P,
    store: B,
    notifier: N,
) -> Result<RemeshPipeline<C, P, B, N>, RemeshError>
where
    C: ContentSource,
    P: MeshProducer,
    B: BlobStore,
    N: CompletionNotifier,
{
    cfg.validate()
        .map_err(|e| RemeshError::Config(format!("config invalid: {e}")))?;
    let publisher = ResultPublisher::new(store, &cfg.output_prefix, &cfg.mesh_extension);
    Ok(RemeshPipeline::new(
        source,
        producer,
        publisher,
        notifier,
        cfg.pipeline_settings(),
    ))
}

/// Put a bounded in-memory cache store in front of `fetcher`.
pub fn build_fetch_cache<F: RemoteFetcher>(
    cfg: &SchedulerConfig,
    fetcher: F,
) -> FetchCache<F, InMemoryCacheStore> {
    FetchCache::new(fetcher, InMemoryCacheStore::new(cfg.cache_max_entries))
}
