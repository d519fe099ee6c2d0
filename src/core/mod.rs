//! Core scheduling abstractions: requests, admission, staleness and the attempt pipeline.

pub mod admission;
pub mod audit;
pub mod error;
pub mod executor;
pub mod geometry;
pub mod pipeline;
pub mod publisher;
pub mod request;
pub mod scheduler;
pub mod staleness;
pub mod traits;

pub use admission::{AdmissionDecision, AdmissionPolicy, QueueLengths};
pub use audit::{build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink};
pub use error::{AppResult, RemeshError};
pub use executor::{Attempt, AttemptExecutor, AttemptOutcome};
pub use pipeline::{PipelineSettings, RemeshPipeline};
pub use publisher::{PublishReport, ResultPublisher};
pub use request::{Dimensions, RemeshRequest, VoxelType};
pub use scheduler::{ActiveAttempt, RemeshScheduler, SchedulerSnapshot};
pub use staleness::StalenessRegistry;
pub use traits::{
    BlobStore, CacheStore, CompletionNotifier, ContentSource, EnqueueReport, MeshHandle,
    MeshInput, MeshLease, MeshProducer, RemoteFetcher, Spawn, TaskQueue,
};
