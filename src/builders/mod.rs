//! Builders to construct scheduler components from configuration.

pub mod scheduler_builder;

pub use scheduler_builder::{build_fetch_cache, build_pipeline, build_scheduler};
