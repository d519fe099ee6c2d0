//! # Remesh Scheduler
//!
//! A two-tier scheduler for mesh regeneration jobs over voxel segmentations.
//!
//! Clients submit remesh requests for a task; the scheduler queues them by priority, admits
//! them under a worker-slot and memory budget, and runs each admitted attempt through a
//! pipeline that fetches the segmentation, produces meshes at one or more levels of detail
//! and publishes them to durable storage. Only the newest attempt for a task may publish.
//!
//! ## Key Features
//!
//! - **Two priority tiers**: high-priority requests preempt pending low-priority duplicates
//! - **Reserved slot**: the last worker slot is held back for high-priority arrivals
//! - **Memory gate**: no additional attempt starts while host memory pressure is high
//! - **Preview jobs**: downscaled fast meshes, followed by a full-resolution job
//! - **Staleness guard**: superseded attempts never overwrite newer results
//! - **Fetch cache**: decoded sources are memoized with a fast codec
//!
//! ## Usage
//!
//! ```rust,ignore
//! use remesh_scheduler::builders::{build_fetch_cache, build_pipeline, build_scheduler};
//! use remesh_scheduler::config::SchedulerConfig;
//! use remesh_scheduler::infra::{ConfiguredNotifier, FileBlobStore, HttpFetcher, InMemoryQueue};
//! use remesh_scheduler::runtime::{submit_remesh, TokioSpawner};
//!
//! let cfg = SchedulerConfig::from_env()?;
//! let source = build_fetch_cache(&cfg, HttpFetcher::new(Duration::from_secs(60))?);
//! let notifier = ConfiguredNotifier::from_template(client, cfg.notify_url_template.as_deref());
//! let pipeline = build_pipeline(&cfg, source, my_producer, FileBlobStore::new("/srv/meshes"), notifier)?;
//! let scheduler = build_scheduler(&cfg, InMemoryQueue::new(), pipeline, TokioSpawner::current()?, None)?;
//!
//! let ack = submit_remesh(&scheduler, submission)?;
//! assert_eq!(ack.message, "added 42 to queue");
//! ```
//!
//! For complete examples, see:
//! - `tests/scheduler_test.rs` - admission and lifecycle scenarios
//! - `tests/pipeline_test.rs` - the attempt pipeline against fake collaborators

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: requests, admission, staleness and the attempt pipeline.
pub mod core;
/// Configuration models for the scheduler, pipeline and telemetry.
pub mod config;
/// Builders to construct scheduler components from configuration.
pub mod builders;
/// Infrastructure adapters for queues, caches, storage and notification.
pub mod infra;
/// Runtime adapters and API surface.
pub mod runtime;
/// Shared utilities.
pub mod util;
