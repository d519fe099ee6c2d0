//! Runtime adapters and API surface.

pub mod api;
pub mod tokio_spawner;

pub use api::{health, queue_snapshot, submit_remesh, Health, RemeshSubmission, SubmitResponse};
pub use tokio_spawner::TokioSpawner;
